//! Clap command trees for the renderflow binary.
//!
//! Two shapes exist: the general `renderflow` command, which takes a
//! `--provider` on every subcommand, and the provider-scoped command used when
//! the binary runs under a provider's name. Both share the execute arguments
//! built here.

use clap::{Arg, ArgAction, Command as ClapCommand};
use renderflow_types::{AppSpec, ParamSpec, scalar_to_string};
use serde_json::Value;

/// Output modes accepted by `--output`.
pub const OUTPUT_MODES: [&str; 2] = ["terminal", "none"];

/// Builds the general `renderflow` command.
///
/// A bare `--provider` (or its legacy alias `--target-package`) without a
/// subcommand behaves like `run --provider`.
pub fn build_root_command() -> ClapCommand {
    ClapCommand::new("renderflow")
        .about("Renderflow workflow app runner")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("provider")
                .long("provider")
                .action(ArgAction::Set)
                .help("Compatibility flag: when provided without subcommand, behaves like 'run --provider ...'"),
        )
        .arg(
            Arg::new("target-package")
                .long("target-package")
                .action(ArgAction::Set)
                .hide(true)
                .help("Backward compatibility alias for --provider"),
        )
        .subcommand(ClapCommand::new("list-providers").about("List installed providers"))
        .subcommand(
            ClapCommand::new("list-workflows")
                .about("List workflows for a provider")
                .arg(provider_arg()),
        )
        .subcommand(
            ClapCommand::new("show-params")
                .about("Show parameters for a provider workflow")
                .arg(provider_arg())
                .arg(workflow_arg()),
        )
        .subcommand(
            ClapCommand::new("execute")
                .about("Execute a provider workflow without the interactive UI")
                .arg(provider_arg())
                .args(execute_args()),
        )
        .subcommand(
            ClapCommand::new("run")
                .about("Run the interactive UI for a provider")
                .arg(provider_arg()),
        )
}

/// Builds the command used when the binary is invoked as `provider_name`.
///
/// The help output ends with every workflow and its parameters.
pub fn build_provider_command(provider_name: &str, app: &AppSpec) -> ClapCommand {
    let name: &'static str = Box::leak(provider_name.to_string().into_boxed_str());
    let about: &'static str = Box::leak(format!("{} workflow runner", app.app_name).into_boxed_str());
    let after_help: &'static str = Box::leak(provider_help_text(app).into_boxed_str());

    ClapCommand::new(name)
        .about(about)
        .after_help(after_help)
        .subcommand(ClapCommand::new("list").about("List workflows"))
        .subcommand(
            ClapCommand::new("params")
                .about("Show parameters for one workflow")
                .arg(workflow_arg()),
        )
        .subcommand(
            ClapCommand::new("execute")
                .about("Execute one workflow")
                .args(execute_args()),
        )
        .subcommand(ClapCommand::new("run").about("Run the interactive UI"))
}

fn provider_arg() -> Arg {
    Arg::new("provider")
        .long("provider")
        .required(true)
        .action(ArgAction::Set)
        .help("Provider name")
}

fn workflow_arg() -> Arg {
    Arg::new("workflow")
        .long("workflow")
        .required(true)
        .action(ArgAction::Set)
        .help("Workflow id")
}

/// Arguments shared by both `execute` subcommands.
pub fn execute_args() -> Vec<Arg> {
    vec![
        workflow_arg(),
        Arg::new("init")
            .long("init")
            .value_name("KEY=VALUE")
            .action(ArgAction::Append)
            .help("Initializer parameter (repeatable)"),
        Arg::new("param")
            .long("param")
            .value_name("KEY=VALUE")
            .action(ArgAction::Append)
            .help("Workflow parameter (repeatable)"),
        Arg::new("output")
            .long("output")
            .action(ArgAction::Set)
            .value_parser(clap::builder::PossibleValuesParser::new(OUTPUT_MODES))
            .default_value("terminal")
            .help("Where to render results"),
        Arg::new("html")
            .long("html")
            .value_name("PATH")
            .action(ArgAction::Set)
            .help("Write a standalone HTML report"),
        Arg::new("save-figures-dir")
            .long("save-figures-dir")
            .value_name("DIR")
            .action(ArgAction::Set)
            .help("Export each saved plot into this directory"),
        Arg::new("figure-format")
            .long("figure-format")
            .value_name("FMT")
            .action(ArgAction::Append)
            .help("Figure export format: html, json, png, jpg, jpeg, svg, pdf (repeatable, comma separated)"),
    ]
}

/// Renders the `Workflows and parameters:` section of provider help.
pub fn provider_help_text(app: &AppSpec) -> String {
    let mut lines = vec!["Workflows and parameters:".to_string()];
    for workflow in &app.workflows {
        lines.push(format!("  - {}: {}", workflow.id, workflow.name));
        if workflow.params.is_empty() {
            lines.push("      (no parameters)".to_string());
        }
        for param in &workflow.params {
            lines.push(format!("      {}", param_help_line(param)));
        }
    }
    lines.join("\n")
}

/// One `key: type | default=... | help` line.
pub fn param_help_line(param: &ParamSpec) -> String {
    let mut line = format!("{}: {} | default={}", param.key, param.r#type, format_default(param.default.as_ref()));
    if !param.help.is_empty() {
        line.push_str(" | ");
        line.push_str(&param.help);
    }
    line
}

/// Formats a default value for help output; strings are single-quoted.
pub fn format_default(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "none".to_string(),
        Some(Value::String(text)) => format!("'{text}'"),
        Some(other) => scalar_to_string(other),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use renderflow_types::{ParamType, WorkflowCall, WorkflowSpec};
    use serde_json::json;

    use super::*;

    fn crsd_app() -> AppSpec {
        AppSpec {
            app_name: "CRSD Inspector".into(),
            initializers: Vec::new(),
            workflows: vec![WorkflowSpec {
                id: "signal_analysis".into(),
                name: "Signal Analysis".into(),
                description: "Analyze one CRSD file.".into(),
                params: vec![
                    ParamSpec::new("crsd_file", "CRSD File")
                        .with_default(json!("sample.crsd"))
                        .with_help("Path to the CRSD file."),
                    ParamSpec::new("window_size", "Window Size")
                        .with_type(ParamType::Number)
                        .with_default(json!(1024))
                        .with_help("FFT window size."),
                ],
                run: Arc::new(|_call: WorkflowCall<'_>| -> anyhow::Result<Value> { Ok(json!({"results": []})) }),
            }],
        }
    }

    #[test]
    fn provider_help_lists_workflows_and_params() {
        let help = provider_help_text(&crsd_app());
        assert!(help.contains("Workflows and parameters:"));
        assert!(help.contains("- signal_analysis: Signal Analysis"));
        assert!(help.contains("crsd_file: text | default='sample.crsd' | Path to the CRSD file."));
        assert!(help.contains("window_size: number | default=1024 | FFT window size."));
    }

    #[test]
    fn rendered_provider_help_contains_section() {
        let mut command = build_provider_command("crsd-inspector", &crsd_app());
        let help = command.render_long_help().to_string();
        assert!(help.contains("Workflows and parameters:"), "{help}");
        assert!(help.contains("execute"), "{help}");
    }

    #[test]
    fn default_formatting() {
        assert_eq!(format_default(None), "none");
        assert_eq!(format_default(Some(&json!(true))), "true");
        assert_eq!(format_default(Some(&json!(0.5))), "0.5");
        assert_eq!(format_default(Some(&json!("x"))), "'x'");
    }

    #[test]
    fn execute_collects_repeated_arguments() {
        let matches = build_root_command()
            .try_get_matches_from([
                "renderflow",
                "execute",
                "--provider",
                "p",
                "--workflow",
                "w",
                "--param",
                "a=1",
                "--param",
                "b=2",
                "--figure-format",
                "png,svg",
                "--figure-format",
                "html",
            ])
            .expect("parse");
        let (_, sub) = matches.subcommand().expect("subcommand");
        let params: Vec<&String> = sub.get_many::<String>("param").expect("params").collect();
        assert_eq!(params, ["a=1", "b=2"]);
        assert_eq!(sub.get_one::<String>("output").map(String::as_str), Some("terminal"));
        assert_eq!(sub.get_many::<String>("figure-format").expect("formats").count(), 2);
    }

    #[test]
    fn unknown_output_mode_is_a_usage_error() {
        let err = build_root_command()
            .try_get_matches_from(["renderflow", "execute", "--provider", "p", "--workflow", "w", "--output", "pdf"])
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
