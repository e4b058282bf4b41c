//! Progress events emitted by running workflows.

use std::{fmt, sync::Arc};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Running,
    Done,
    Failed,
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProgressStatus::Running => "running",
            ProgressStatus::Done => "done",
            ProgressStatus::Failed => "failed",
        })
    }
}

/// A single step transition reported by a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: String,
    pub status: ProgressStatus,
    #[serde(default)]
    pub detail: String,
}

impl ProgressEvent {
    /// `step - detail`, or just the step when there is no detail.
    pub fn line(&self) -> String {
        if self.detail.is_empty() {
            self.step.clone()
        } else {
            format!("{} - {}", self.step, self.detail)
        }
    }
}

type ProgressSink = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Handle workflows use to report progress. A default reporter discards events.
#[derive(Clone, Default)]
pub struct ProgressReporter {
    sink: Option<ProgressSink>,
}

impl ProgressReporter {
    pub fn new(sink: impl Fn(&ProgressEvent) + Send + Sync + 'static) -> Self {
        Self { sink: Some(Arc::new(sink)) }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn emit(&self, step: impl Into<String>, status: ProgressStatus, detail: impl Into<String>) {
        if let Some(sink) = &self.sink {
            sink(&ProgressEvent {
                step: step.into(),
                status,
                detail: detail.into(),
            });
        }
    }

    pub fn forward(&self, event: &ProgressEvent) {
        if let Some(sink) = &self.sink {
            sink(event);
        }
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter").field("enabled", &self.is_enabled()).finish()
    }
}
