//! Background work for the TUI: workflow runs and figure exports.
//!
//! Both run on Tokio's blocking pool so the event loop keeps redrawing while a
//! provider computes. Progress events cross back over an unbounded channel.

use std::{path::PathBuf, sync::Arc};

use renderflow_engine::{ExecutionRequest, execute_workflow};
use renderflow_render::{image_engine_from_argv, save_figures};
use renderflow_types::{AppSpec, ExecutionResult, FigureFormat, ProgressEvent, ProgressReporter, ResultItem};
use tokio::{sync::mpsc, task::JoinHandle};

/// A run in flight: its progress stream and the task producing the result.
pub struct ExecutionHandle {
    pub progress: mpsc::UnboundedReceiver<ProgressEvent>,
    pub task: JoinHandle<Result<ExecutionResult, String>>,
}

pub fn spawn_execution(spec: Arc<AppSpec>, request: ExecutionRequest) -> ExecutionHandle {
    let (sender, receiver) = mpsc::unbounded_channel();
    let reporter = ProgressReporter::new(move |event: &ProgressEvent| {
        // The receiver goes away only when the UI is shutting down.
        let _ = sender.send(event.clone());
    });
    let task = tokio::task::spawn_blocking(move || {
        execute_workflow(&spec, &request, &reporter).map_err(error_chain)
    });
    ExecutionHandle { progress: receiver, task }
}

pub fn spawn_export(
    items: Vec<ResultItem>,
    directory: PathBuf,
    formats: Vec<FigureFormat>,
    image_engine: Option<Vec<String>>,
) -> JoinHandle<Result<Vec<PathBuf>, String>> {
    tokio::task::spawn_blocking(move || {
        let engine = image_engine_from_argv(image_engine);
        save_figures(&items, &directory, &formats, &*engine).map_err(error_chain)
    })
}

/// The error and its sources on one line, as the status bar shows them.
fn error_chain(error: impl std::error::Error + Send + Sync + 'static) -> String {
    format!("{:#}", anyhow::Error::new(error))
}
