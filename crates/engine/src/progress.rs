//! Progress and timing helpers for workflow steps.

use std::time::Instant;

use anyhow::Result;
use renderflow_types::{JsonMap, ProgressReporter, ProgressStatus};
use serde_json::{Number, Value};

pub const TIMING_KEY: &str = "_timing";
pub const NODE_ERROR_KEY: &str = "_node_error";
pub const NODE_TRACEBACK_KEY: &str = "_node_error_traceback";
pub const NODE_FAILED_KEY: &str = "_node_failed";

/// Emits a progress event when a reporter is present.
pub fn emit_progress(progress: Option<&ProgressReporter>, step: &str, status: ProgressStatus, detail: &str) {
    if let Some(progress) = progress {
        progress.emit(step, status, detail);
    }
}

/// Wraps a node function with timing and progress reporting.
///
/// The wrapped function emits `running` then `done` or `failed`, adds
/// `_timing` (seconds) to the output mapping, and wraps non-mapping outputs
/// as `{"result": ...}`. Failures never propagate; they come back as a
/// mapping with `_node_error`, `_node_error_traceback` and `_node_failed`.
pub fn wrap_with_timing<F>(node: F, label: impl Into<String>, description: impl Into<String>, progress: ProgressReporter) -> impl Fn(&JsonMap) -> JsonMap
where
    F: Fn(&JsonMap) -> Result<Value>,
{
    let label = label.into();
    let description = description.into();
    move |inputs: &JsonMap| {
        progress.emit(label.as_str(), ProgressStatus::Running, description.as_str());
        let started = Instant::now();
        let outcome = node(inputs);
        let elapsed = timing_value(started.elapsed().as_secs_f64());
        match outcome {
            Ok(output) => {
                let mut output = match output {
                    Value::Object(map) => map,
                    other => {
                        let mut wrapped = JsonMap::new();
                        wrapped.insert("result".into(), other);
                        wrapped
                    }
                };
                output.insert(TIMING_KEY.into(), elapsed);
                progress.emit(label.as_str(), ProgressStatus::Done, description.as_str());
                output
            }
            Err(error) => {
                progress.emit(label.as_str(), ProgressStatus::Failed, description.as_str());
                let mut failure = JsonMap::new();
                failure.insert(TIMING_KEY.into(), elapsed);
                failure.insert(NODE_ERROR_KEY.into(), Value::String(format!("ERROR in {label}: {error}")));
                failure.insert(NODE_TRACEBACK_KEY.into(), Value::String(format!("{error:?}")));
                failure.insert(NODE_FAILED_KEY.into(), Value::Bool(true));
                failure
            }
        }
    }
}

/// Whether a wrapped node reported failure.
pub fn node_failed(output: &JsonMap) -> bool {
    output.get(NODE_FAILED_KEY).and_then(Value::as_bool).unwrap_or(false)
}

fn timing_value(seconds: f64) -> Value {
    Number::from_f64(seconds).map(Value::Number).unwrap_or(Value::Null)
}
