use std::{
    env,
    fs::{File, OpenOptions},
    io::{self, IsTerminal, Write},
    path::Path,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{ArgMatches, Command, error::ErrorKind};
use once_cell::sync::OnceCell;
use renderflow_engine::{ExecutionRequest, execute_workflow, find_workflow};
use renderflow_registry::{ProviderRegistry, RenderflowConfig, build_provider_command, build_root_command, param_help_line};
use renderflow_render::{image_engine_from_argv, normalize_figure_formats, render_results_to_html, render_terminal, save_figures};
use renderflow_tui::TuiOptions;
use renderflow_types::{AppSpec, ProgressReporter};
use renderflow_util::config_file_path;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, reload, util::SubscriberInitExt};

/// Environment variable overriding where the interactive UI writes its log.
const LOG_PATH_ENV: &str = "RENDERFLOW_LOG_PATH";
const LOG_FILE_NAME: &str = "renderflow.log";
const ROOT_PROGRAM: &str = "renderflow";

static LOG_FILE: OnceCell<File> = OnceCell::new();

type FilterHandle = reload::Handle<EnvFilter, Registry>;

#[tokio::main]
async fn main() -> ExitCode {
    let filter = init_tracing();
    match run(filter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

/// Installs the fmt subscriber. Output goes to stderr until the interactive UI
/// takes over the screen, see [`redirect_logs_for_tui`].
fn init_tracing() -> Option<FilterHandle> {
    let filter = env_filter("info");
    let (filter, handle) = reload::Layer::new(filter);
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(log_writer))
        .try_init();
    installed.ok().map(|_| handle)
}

fn env_filter(default: &str) -> EnvFilter {
    let directives = env::var("RUST_LOG").unwrap_or_else(|_| default.into());
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(default))
}

fn log_writer() -> Box<dyn Write> {
    if let Some(file) = LOG_FILE.get()
        && let Ok(file) = file.try_clone()
    {
        return Box::new(file);
    }
    Box::new(io::stderr())
}

/// Sends logs to the log file at `warn` (unless `RUST_LOG` says otherwise).
fn redirect_logs_for_tui(filter: Option<&FilterHandle>) -> Result<()> {
    let path = config_file_path(LOG_PATH_ENV, LOG_FILE_NAME);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create log directory {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;
    if LOG_FILE.set(file).is_err() {
        debug!(path = %path.display(), "log file already set, keeping the existing one");
    }
    if let Some(handle) = filter {
        handle.reload(env_filter("warn")).context("reconfigure log filter")?;
    }
    Ok(())
}

async fn run(filter: Option<FilterHandle>) -> Result<()> {
    let config = RenderflowConfig::load();
    let registry = build_registry(&config);
    let args: Vec<String> = env::args().collect();

    if let Some(provider) = invoked_provider(&args, &registry) {
        return run_provider_mode(&registry, &config, &provider, args, filter.as_ref()).await;
    }

    let mut command = build_root_command();
    let matches = command.clone().get_matches_from(args);
    match matches.subcommand() {
        Some(("list-providers", _)) => {
            for name in registry.list_provider_names() {
                println!("{name}");
            }
            Ok(())
        }
        Some(("list-workflows", sub)) => {
            let app = registry.load_app_spec(required(sub, "provider")?)?;
            list_workflows(&app);
            Ok(())
        }
        Some(("show-params", sub)) => {
            let app = registry.load_app_spec(required(sub, "provider")?)?;
            show_params(&app, required(sub, "workflow")?)
        }
        Some(("execute", sub)) => {
            let app = registry.load_app_spec(required(sub, "provider")?)?;
            let execute = command.find_subcommand_mut("execute").context("execute subcommand")?;
            execute_command(&app, sub, &config, execute)
        }
        Some(("run", sub)) => {
            let provider = required(sub, "provider")?;
            launch_tui(&registry, &config, provider, filter.as_ref()).await
        }
        _ => {
            let provider = matches
                .get_one::<String>("provider")
                .or_else(|| matches.get_one::<String>("target-package"));
            match provider {
                Some(provider) => launch_tui(&registry, &config, provider, filter.as_ref()).await,
                None => command
                    .error(ErrorKind::MissingRequiredArgument, "a provider is required, use: renderflow run --provider <name>")
                    .exit(),
            }
        }
    }
}

/// Compiled-in providers first; configured providers may not shadow them.
fn build_registry(config: &RenderflowConfig) -> ProviderRegistry {
    let mut registry = ProviderRegistry::new();
    minimal_provider::register(&mut registry);
    registry.with_config(config)
}

/// The provider name when the binary runs under a registered provider's name.
fn invoked_provider(args: &[String], registry: &ProviderRegistry) -> Option<String> {
    let program = Path::new(args.first()?).file_stem()?.to_str()?;
    (program != ROOT_PROGRAM && registry.contains(program)).then(|| program.to_string())
}

async fn run_provider_mode(
    registry: &ProviderRegistry,
    config: &RenderflowConfig,
    provider: &str,
    args: Vec<String>,
    filter: Option<&FilterHandle>,
) -> Result<()> {
    let app = registry.load_app_spec(provider)?;
    let mut command = build_provider_command(provider, &app);
    let matches = command.clone().get_matches_from(args);
    debug!(provider, subcommand = ?matches.subcommand_name(), "provider mode");
    match matches.subcommand() {
        Some(("list", _)) => {
            list_workflows(&app);
            Ok(())
        }
        Some(("params", sub)) => show_params(&app, required(sub, "workflow")?),
        Some(("execute", sub)) => {
            let execute = command.find_subcommand_mut("execute").context("execute subcommand")?;
            execute_command(&app, sub, config, execute)
        }
        _ => launch_tui(registry, config, provider, filter).await,
    }
}

fn required<'a>(matches: &'a ArgMatches, id: &str) -> Result<&'a str> {
    matches
        .get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("missing --{id}"))
}

fn repeated(matches: &ArgMatches, id: &str) -> Vec<String> {
    matches
        .get_many::<String>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn list_workflows(app: &AppSpec) {
    for workflow in &app.workflows {
        println!("{}: {}", workflow.id, workflow.name);
    }
}

fn show_params(app: &AppSpec, workflow_id: &str) -> Result<()> {
    let workflow = find_workflow(app, workflow_id)?;
    if workflow.params.is_empty() {
        println!("(no parameters)");
    }
    for param in &workflow.params {
        println!("{}", param_help_line(param));
    }
    Ok(())
}

/// Runs one workflow headless, then renders and exports what was asked for.
///
/// Figure formats are validated before the workflow runs; a bad one is a usage
/// error reported through `command`.
fn execute_command(app: &AppSpec, matches: &ArgMatches, config: &RenderflowConfig, command: &mut Command) -> Result<()> {
    let workflow_id = required(matches, "workflow")?;
    let formats = match normalize_figure_formats(&repeated(matches, "figure-format")) {
        Ok(formats) => formats,
        Err(error) => command.error(ErrorKind::InvalidValue, error.to_string()).exit(),
    };

    let request = ExecutionRequest::from_cli_args(app, workflow_id, &repeated(matches, "init"), &repeated(matches, "param"))?;
    let progress = ProgressReporter::new(|event| eprintln!("[{}] {}", event.status, event.line()));
    let result = execute_workflow(app, &request, &progress)?;

    if matches.get_one::<String>("output").map(String::as_str) == Some("terminal") {
        print!("{}", render_terminal(&result.items, io::stdout().is_terminal()));
    }

    if let Some(html) = matches.get_one::<String>("html") {
        let title = format!("{} - {}", app.app_name, result.workflow_name);
        let path = render_results_to_html(&result.items, Path::new(html), &title)?;
        println!("Saved HTML report: {}", path.display());
    }

    if let Some(directory) = matches.get_one::<String>("save-figures-dir") {
        let engine = image_engine_from_argv(config.image_engine_command());
        let saved = save_figures(&result.items, Path::new(directory), &formats, &*engine)?;
        info!(count = saved.len(), directory = %directory, "exported figures");
        for path in saved {
            println!("Saved figure: {}", path.display());
        }
    }
    Ok(())
}

async fn launch_tui(registry: &ProviderRegistry, config: &RenderflowConfig, provider: &str, filter: Option<&FilterHandle>) -> Result<()> {
    let app = registry.load_app_spec(provider)?;
    redirect_logs_for_tui(filter)?;
    info!(provider, "launching interactive UI");
    let options = TuiOptions {
        provider_name: provider.to_string(),
        image_engine: config.image_engine_command(),
    };
    renderflow_tui::run(app, options).await
}
