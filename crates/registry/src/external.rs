//! Providers implemented as external programs.
//!
//! A manifest (YAML or JSON) describes the app spec; running an initializer
//! or workflow spawns the manifest's `command`, writes one JSON request on
//! stdin and reads one JSON object back from stdout. Lines written to stderr
//! as `{"progress": {...}}` are forwarded as progress events; anything else
//! on stderr is kept for error reporting.

use std::{
    io::{self, BufRead, BufReader, Read, Write},
    path::{Path, PathBuf},
    process::{Command, Stdio},
    sync::Arc,
    thread,
};

use renderflow_types::{
    AppSpec, Context, InitializeFn, InitializerSpec, ParamValues, ProgressEvent, ProgressReporter, RunFn, WorkflowCall,
    WorkflowSpec,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{ParamSource, RegistryError, coerce_param_specs};

const REQUIRED_KEYS: [&str; 3] = ["app_name", "initializers", "workflows"];

/// On-disk description of an external provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderManifest {
    pub app_name: String,
    /// Program and arguments spawned for every call.
    pub command: Vec<String>,
    /// Working directory for the program; relative to the manifest.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    pub initializers: Vec<ManifestInitializer>,
    pub workflows: Vec<ManifestWorkflow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestInitializer {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ManifestWorkflow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub params: Value,
}

impl ProviderManifest {
    /// Parses a manifest document, reporting missing top-level keys by name.
    pub fn from_document(path: &Path, document: Value) -> Result<Self, RegistryError> {
        let invalid = |reason: String| RegistryError::InvalidManifest {
            path: path.to_path_buf(),
            reason,
        };
        let Value::Object(map) = &document else {
            return Err(invalid("manifest must be a mapping".to_string()));
        };
        if REQUIRED_KEYS.iter().any(|key| !map.contains_key(*key)) {
            return Err(invalid(format!("manifest missing one of: {}", REQUIRED_KEYS.join(", "))));
        }
        let manifest: ProviderManifest = serde_json::from_value(document).map_err(|error| invalid(error.to_string()))?;
        if manifest.command.is_empty() {
            return Err(invalid("'command' must name a program".to_string()));
        }
        Ok(manifest)
    }

    pub fn from_file(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        // YAML is a superset of JSON, so one parser covers both manifest flavors.
        let document: Value = serde_yaml::from_str(&content).map_err(|error| RegistryError::InvalidManifest {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        Self::from_document(path, document)
    }
}

/// Loads a manifest and turns it into an [`AppSpec`] whose functions call the program.
pub fn load_manifest_app_spec(provider_name: &str, manifest_path: &Path) -> Result<AppSpec, RegistryError> {
    let manifest = ProviderManifest::from_file(manifest_path)?;
    let working_dir = manifest.working_dir.as_ref().map(|dir| {
        if dir.is_absolute() {
            dir.clone()
        } else {
            manifest_path.parent().unwrap_or_else(|| Path::new(".")).join(dir)
        }
    });
    let bridge = Arc::new(ProcessBridge {
        provider: provider_name.to_string(),
        command: manifest.command.clone(),
        working_dir,
    });

    let mut initializers = Vec::with_capacity(manifest.initializers.len());
    for initializer in &manifest.initializers {
        let bridge = Arc::clone(&bridge);
        let id = initializer.id.clone();
        let initialize: InitializeFn = Arc::new(move |params: &ParamValues| {
            let request = json!({"action": "initialize", "initializer": id, "params": params});
            match bridge.call(&request, &ProgressReporter::disabled())? {
                Value::Object(context) => Ok(context),
                other => Err(anyhow::anyhow!("initializer '{}' must return a JSON object, got {}", id, other)),
            }
        });
        initializers.push(InitializerSpec {
            id: initializer.id.clone(),
            name: initializer.name.clone(),
            description: initializer.description.clone(),
            params: coerce_param_specs(&ParamSource::Document(initializer.params.clone()))?,
            initialize,
        });
    }

    let mut workflows = Vec::with_capacity(manifest.workflows.len());
    for workflow in &manifest.workflows {
        let bridge = Arc::clone(&bridge);
        let id = workflow.id.clone();
        let run: RunFn = Arc::new(move |call: WorkflowCall<'_>| {
            let request = json!({
                "action": "run",
                "workflow": id,
                "context": call.context,
                "params": call.params,
            });
            Ok(bridge.call(&request, call.progress)?)
        });
        workflows.push(WorkflowSpec {
            id: workflow.id.clone(),
            name: workflow.name.clone(),
            description: workflow.description.clone(),
            params: coerce_param_specs(&ParamSource::Document(workflow.params.clone()))?,
            run,
        });
    }

    info!(
        provider = provider_name,
        manifest = %manifest_path.display(),
        workflow_count = workflows.len(),
        "loaded external provider manifest"
    );
    Ok(AppSpec {
        app_name: manifest.app_name,
        initializers,
        workflows,
    })
}

#[derive(Debug)]
struct ProcessBridge {
    provider: String,
    command: Vec<String>,
    working_dir: Option<PathBuf>,
}

impl ProcessBridge {
    fn failure(&self, reason: impl Into<String>) -> RegistryError {
        RegistryError::ProviderProcess {
            provider: self.provider.clone(),
            reason: reason.into(),
        }
    }

    fn call(&self, request: &Value, progress: &ProgressReporter) -> Result<Value, RegistryError> {
        let (program, args) = self.command.split_first().ok_or_else(|| self.failure("empty command"))?;
        let mut command = Command::new(program);
        command
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }
        let payload = serde_json::to_vec(request).map_err(|error| self.failure(error.to_string()))?;
        debug!(provider = %self.provider, program = %program, action = %request["action"], "spawning provider process");

        let mut child = command
            .spawn()
            .map_err(|error| self.failure(format!("failed to spawn '{program}': {error}")))?;

        // Both output pipes drain on their own threads before the request is
        // written, so a provider that exits early still reports its stderr.
        let stderr = child.stderr.take();
        let reporter = progress.clone();
        let stderr_reader = thread::spawn(move || {
            let mut diagnostics = Vec::new();
            if let Some(stderr) = stderr {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    match parse_progress_line(&line) {
                        Some(event) => reporter.forward(&event),
                        None => diagnostics.push(line),
                    }
                }
            }
            diagnostics
        });

        let stdout_pipe = child.stdout.take();
        let stdout_reader = thread::spawn(move || -> io::Result<String> {
            let mut stdout = String::new();
            if let Some(mut out) = stdout_pipe {
                out.read_to_string(&mut stdout)?;
            }
            Ok(stdout)
        });

        // Dropping stdin closes the pipe so the provider sees EOF.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Ok(()),
        };
        let status = child.wait()?;
        let stdout = stdout_reader
            .join()
            .map_err(|_| self.failure("stdout reader panicked"))??;
        let diagnostics = stderr_reader.join().unwrap_or_default();

        if !status.success() {
            let detail = diagnostics.join("\n");
            return Err(self.failure(format!(
                "exited with {status}{}{}",
                if detail.is_empty() { "" } else { ": " },
                detail
            )));
        }

        match written {
            Err(error) if error.kind() == io::ErrorKind::BrokenPipe => {
                debug!(provider = %self.provider, "provider closed stdin before reading the request");
            }
            Err(error) => return Err(self.failure(format!("failed to write request: {error}"))),
            Ok(()) => {}
        }

        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Err(self.failure("produced no output; expected one JSON object on stdout"));
        }
        serde_json::from_str(trimmed).map_err(|error| self.failure(format!("invalid JSON on stdout: {error}")))
    }
}

fn parse_progress_line(line: &str) -> Option<ProgressEvent> {
    #[derive(Deserialize)]
    struct ProgressLine {
        progress: ProgressEvent,
    }
    let trimmed = line.trim();
    if !trimmed.starts_with('{') {
        return None;
    }
    serde_json::from_str::<ProgressLine>(trimmed).ok().map(|line| line.progress)
}
