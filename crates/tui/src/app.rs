//! Application state and message handling for the renderflow TUI.
//!
//! `App` owns everything the views draw: the provider's workflows, the two
//! parameter forms (provider settings and workflow parameters), the progress
//! log of the active run, the last result, and the export panel. Components
//! mutate it in response to keys and return [`Effect`]s; background work
//! reports back through [`Msg`]s handled by [`App::update`].

use std::{
    collections::HashMap,
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::{DateTime, Local};
use ratatui::widgets::ListState;
use renderflow_engine::ExecutionRequest;
use renderflow_render::normalize_figure_formats;
use renderflow_types::{AppSpec, ExecutionResult, FigureFormat, ProgressEvent, ProgressStatus, ResultItem, WorkflowSpec};
use tracing::{info, warn};

use crate::{TuiOptions, form::ParamForm, text_input::TextInputState};

/// Formats offered by the export panel.
pub const EXPORT_FORMATS: [&str; 4] = ["html", "json", "png", "svg"];

pub const DEFAULT_EXPORT_DIR: &str = "output/figures";

/// Completed progress lines kept for display.
const MAX_PROGRESS_LINES: usize = 500;

/// Panel that receives key input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Workflows,
    Settings,
    Parameters,
    Results,
    Export,
}

impl Focus {
    const ORDER: [Focus; 5] = [Focus::Workflows, Focus::Settings, Focus::Parameters, Focus::Results, Focus::Export];

    /// Next panel in tab order, skipping the settings panel when the provider has none.
    pub fn next(self, has_settings: bool) -> Focus {
        self.cycle(1, has_settings)
    }

    pub fn previous(self, has_settings: bool) -> Focus {
        self.cycle(Self::ORDER.len() - 1, has_settings)
    }

    fn cycle(self, offset: usize, has_settings: bool) -> Focus {
        let position = Self::ORDER.iter().position(|focus| *focus == self).unwrap_or(0);
        let mut candidate = Self::ORDER[(position + offset) % Self::ORDER.len()];
        if candidate == Focus::Settings && !has_settings {
            candidate = Self::ORDER[(position + offset * 2) % Self::ORDER.len()];
        }
        candidate
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunStatus {
    Idle,
    /// The launched workflow is kept so completion does not depend on the list selection.
    Running { started: Instant, workflow_id: String, workflow_name: String },
    Succeeded { elapsed: Duration },
    Failed { message: String },
}

/// One rendered line of the progress panel.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressLine {
    pub at: DateTime<Local>,
    pub text: String,
    pub status: ProgressStatus,
}

/// Progress of the active run: finished steps plus the step still running.
#[derive(Debug, Default)]
pub struct ProgressLog {
    completed: Vec<ProgressLine>,
    active: Option<ProgressLine>,
    started: HashMap<String, Instant>,
}

impl ProgressLog {
    pub fn clear(&mut self) {
        self.completed.clear();
        self.active = None;
        self.started.clear();
    }

    pub fn record(&mut self, event: &ProgressEvent) {
        let line = event.line();
        match event.status {
            ProgressStatus::Running => {
                self.started.insert(event.step.clone(), Instant::now());
                self.active = Some(ProgressLine {
                    at: Local::now(),
                    text: line,
                    status: ProgressStatus::Running,
                });
            }
            ProgressStatus::Done => {
                let text = match self.started.remove(&event.step) {
                    Some(started) => format!("OK {line} ({:.3}s)", started.elapsed().as_secs_f64()),
                    None => format!("OK {line}"),
                };
                self.push_completed(text, ProgressStatus::Done);
            }
            ProgressStatus::Failed => {
                self.started.remove(&event.step);
                self.push_completed(format!("FAILED {line}"), ProgressStatus::Failed);
            }
        }
    }

    fn push_completed(&mut self, text: String, status: ProgressStatus) {
        self.active = None;
        self.completed.push(ProgressLine {
            at: Local::now(),
            text,
            status,
        });
        if self.completed.len() > MAX_PROGRESS_LINES {
            self.completed.remove(0);
        }
    }

    /// Latest first; the running step, if any, leads.
    pub fn lines(&self) -> impl Iterator<Item = &ProgressLine> {
        self.active.iter().chain(self.completed.iter().rev())
    }

    pub fn active(&self) -> Option<&ProgressLine> {
        self.active.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportField {
    #[default]
    Directory,
    Format,
}

#[derive(Debug)]
pub struct ExportState {
    pub directory: TextInputState,
    pub format_idx: usize,
    pub field: ExportField,
    pub exporting: bool,
}

impl Default for ExportState {
    fn default() -> Self {
        Self {
            directory: TextInputState::with_text(DEFAULT_EXPORT_DIR),
            format_idx: 0,
            field: ExportField::Directory,
            exporting: false,
        }
    }
}

impl ExportState {
    pub fn format(&self) -> &'static str {
        EXPORT_FORMATS[self.format_idx % EXPORT_FORMATS.len()]
    }

    pub fn cycle_format(&mut self, direction: i32) {
        let len = EXPORT_FORMATS.len() as i64;
        self.format_idx = (self.format_idx as i64 + i64::from(direction)).rem_euclid(len) as usize;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
}

/// Events delivered to [`App::update`].
#[derive(Debug)]
pub enum Msg {
    /// Periodic UI tick (throbber)
    Tick,
    /// A step transition reported by the running workflow
    Progress(ProgressEvent),
    /// The background execution finished
    ExecutionCompleted(Result<ExecutionResult, String>),
    /// The background figure export finished
    ExportCompleted { directory: PathBuf, outcome: Result<Vec<PathBuf>, String> },
}

/// Side effects requested by state changes, carried out by the runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Execute(ExecutionRequest),
    ExportFigures { directory: PathBuf, formats: Vec<FigureFormat> },
    Quit,
}

pub struct App {
    pub spec: Arc<AppSpec>,
    pub provider_name: String,
    pub image_engine: Option<Vec<String>>,
    pub focus: Focus,
    pub workflow_list: ListState,
    /// Initializer parameters
    pub settings: ParamForm,
    /// Parameters of the selected workflow
    pub params: ParamForm,
    pub run: RunStatus,
    pub progress: ProgressLog,
    pub result: Option<ExecutionResult>,
    pub results_scroll: u16,
    pub export: ExportState,
    pub status: Option<StatusMessage>,
    /// Animation frame for the execution throbber
    pub throbber_idx: usize,
}

impl App {
    pub fn new(spec: AppSpec, options: TuiOptions) -> Self {
        let settings = ParamForm::new(&spec.init_params().cloned().collect::<Vec<_>>());
        let mut app = Self {
            spec: Arc::new(spec),
            provider_name: options.provider_name,
            image_engine: options.image_engine,
            focus: Focus::default(),
            workflow_list: ListState::default(),
            settings,
            params: ParamForm::default(),
            run: RunStatus::Idle,
            progress: ProgressLog::default(),
            result: None,
            results_scroll: 0,
            export: ExportState::default(),
            status: None,
            throbber_idx: 0,
        };
        if app.spec.workflows.is_empty() {
            app.set_status("No workflows discovered.", true);
        } else {
            app.select_workflow(0);
        }
        app
    }

    pub fn selected_workflow(&self) -> Option<&WorkflowSpec> {
        self.workflow_list.selected().and_then(|index| self.spec.workflows.get(index))
    }

    /// Selects a workflow and rebuilds its parameter form from defaults.
    pub fn select_workflow(&mut self, index: usize) {
        let Some(workflow) = self.spec.workflows.get(index) else {
            return;
        };
        if self.workflow_list.selected() == Some(index) {
            return;
        }
        self.params = ParamForm::new(&workflow.params);
        self.workflow_list.select(Some(index));
    }

    pub fn select_next_workflow(&mut self) {
        let count = self.spec.workflows.len();
        if count > 0 {
            let next = self.workflow_list.selected().map_or(0, |index| (index + 1) % count);
            self.select_workflow(next);
        }
    }

    pub fn select_previous_workflow(&mut self) {
        let count = self.spec.workflows.len();
        if count > 0 {
            let previous = self.workflow_list.selected().map_or(0, |index| (index + count - 1) % count);
            self.select_workflow(previous);
        }
    }

    pub fn has_settings(&self) -> bool {
        !self.settings.is_empty()
    }

    pub fn is_running(&self) -> bool {
        matches!(self.run, RunStatus::Running { .. })
    }

    pub fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusMessage {
            text: text.into(),
            is_error,
        });
    }

    /// Validates both forms and starts a run unless one is already active.
    pub fn request_execution(&mut self) -> Option<Effect> {
        if self.is_running() {
            self.set_status("A workflow is already running.", true);
            return None;
        }
        let workflow = self.selected_workflow()?;
        let (workflow_id, workflow_name) = (workflow.id.clone(), workflow.name.clone());
        let values = self.settings.values().and_then(|init| Ok((init, self.params.values()?)));
        let (init_values, param_values) = match values {
            Ok(values) => values,
            Err(error) => {
                self.set_status(format!("{error:#}"), true);
                return None;
            }
        };

        self.progress.clear();
        self.result = None;
        self.results_scroll = 0;
        self.run = RunStatus::Running {
            started: Instant::now(),
            workflow_id: workflow_id.clone(),
            workflow_name,
        };
        self.throbber_idx = 0;
        self.set_status(format!("Executing {workflow_id}..."), false);
        info!(workflow = %workflow_id, "starting workflow from the interactive UI");
        Some(Effect::Execute(ExecutionRequest {
            workflow_id,
            init_values,
            param_values,
        }))
    }

    /// Validates the export panel against the last result.
    pub fn request_export(&mut self) -> Option<Effect> {
        if self.export.exporting {
            return None;
        }
        let Some(result) = &self.result else {
            self.set_status("Run a workflow before exporting figures.", true);
            return None;
        };
        if !result.plots().any(|item| matches!(item, ResultItem::Plot { save: true, .. })) {
            self.set_status("No figures to save.", false);
            return None;
        }
        if self.export.directory.is_blank() {
            self.set_status("Output directory is required.", true);
            return None;
        }
        let formats = match normalize_figure_formats(&[self.export.format()]) {
            Ok(formats) => formats,
            Err(error) => {
                self.set_status(error.to_string(), true);
                return None;
            }
        };
        self.export.exporting = true;
        Some(Effect::ExportFigures {
            directory: PathBuf::from(self.export.directory.input().trim()),
            formats,
        })
    }

    /// Applies a message from the runtime.
    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::Tick => {
                if self.is_running() {
                    self.throbber_idx = (self.throbber_idx + 1) % 10;
                }
            }
            Msg::Progress(event) => self.progress.record(&event),
            Msg::ExecutionCompleted(Ok(result)) => {
                let elapsed = match &self.run {
                    RunStatus::Running { started, .. } => started.elapsed(),
                    _ => Duration::ZERO,
                };
                self.set_status(
                    format!("Workflow complete: {} item(s) in {:.2}s", result.items.len(), elapsed.as_secs_f64()),
                    false,
                );
                self.run = RunStatus::Succeeded { elapsed };
                self.result = Some(result);
                self.focus = Focus::Results;
            }
            Msg::ExecutionCompleted(Err(message)) => {
                warn!(error = %message, "workflow failed in the interactive UI");
                self.set_status(format!("Workflow failed: {message}"), true);
                let launched = match std::mem::replace(&mut self.run, RunStatus::Idle) {
                    RunStatus::Running { workflow_id, workflow_name, .. } => Some((workflow_id, workflow_name)),
                    _ => self.selected_workflow().map(|workflow| (workflow.id.clone(), workflow.name.clone())),
                };
                self.result = launched.map(|(workflow_id, workflow_name)| ExecutionResult {
                    workflow_id,
                    workflow_name,
                    items: vec![ResultItem::text(format!("FAILED Workflow failed: {message}"))],
                });
                self.run = RunStatus::Failed { message };
            }
            Msg::ExportCompleted { directory, outcome } => {
                self.export.exporting = false;
                match outcome {
                    Ok(saved) if saved.is_empty() => self.set_status("No figures to save.", false),
                    Ok(saved) => self.set_status(format!("Saved {} figure(s) to {}", saved.len(), directory.display()), false),
                    Err(message) => self.set_status(format!("Figure export failed: {message}"), true),
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use renderflow_types::{Context, InitializerSpec, ParamSpec, ParamType, ParamValues, RunFn, WorkflowCall};
    use serde_json::{Value, json};

    use super::*;

    pub(crate) fn sample_spec() -> AppSpec {
        let run: RunFn = Arc::new(|_call: WorkflowCall<'_>| -> anyhow::Result<Value> { Ok(json!({"results": []})) });
        AppSpec {
            app_name: "Sample".into(),
            initializers: vec![InitializerSpec {
                id: "default_initializer".into(),
                name: "Initialization".into(),
                description: String::new(),
                params: vec![ParamSpec::new("name", "Name").with_default("World")],
                initialize: Arc::new(|params: &ParamValues| -> anyhow::Result<Context> { Ok(params.clone()) }),
            }],
            workflows: vec![
                WorkflowSpec {
                    id: "alpha".into(),
                    name: "Alpha".into(),
                    description: "First".into(),
                    params: vec![
                        ParamSpec::new("count", "Count")
                            .with_type(ParamType::Number)
                            .with_default(3)
                            .with_range(Some(1.0), Some(5.0), None),
                    ],
                    run: run.clone(),
                },
                WorkflowSpec {
                    id: "beta".into(),
                    name: "Beta".into(),
                    description: String::new(),
                    params: Vec::new(),
                    run,
                },
            ],
        }
    }

    pub(crate) fn sample_app() -> App {
        App::new(
            sample_spec(),
            TuiOptions {
                provider_name: "sample".into(),
                image_engine: None,
            },
        )
    }

    #[test]
    fn focus_skips_settings_without_init_params() {
        assert_eq!(Focus::Workflows.next(true), Focus::Settings);
        assert_eq!(Focus::Workflows.next(false), Focus::Parameters);
        assert_eq!(Focus::Parameters.previous(false), Focus::Workflows);
        assert_eq!(Focus::Export.next(false), Focus::Workflows);
        assert_eq!(Focus::Workflows.previous(true), Focus::Export);
    }

    #[test]
    fn execution_request_carries_both_forms() {
        let mut app = sample_app();
        let Some(Effect::Execute(request)) = app.request_execution() else {
            panic!("expected an execute effect");
        };
        assert_eq!(request.workflow_id, "alpha");
        assert_eq!(request.init_values["name"], json!("World"));
        assert_eq!(request.param_values["count"], json!(3));
        assert!(app.is_running());
        assert!(app.request_execution().is_none());
        assert_eq!(app.status.as_ref().map(|status| status.is_error), Some(true));
    }

    #[test]
    fn invalid_params_block_execution() {
        let mut app = sample_app();
        app.params.fields[0].text_input_mut().expect("number").set_input("8");
        assert!(app.request_execution().is_none());
        assert_eq!(app.status.as_ref().map(|status| status.text.as_str()), Some("Count must be at most 5"));
        assert!(!app.is_running());
    }

    #[test]
    fn selecting_a_workflow_rebuilds_its_form() {
        let mut app = sample_app();
        app.select_next_workflow();
        assert_eq!(app.selected_workflow().map(|workflow| workflow.id.as_str()), Some("beta"));
        assert!(app.params.is_empty());
        app.select_next_workflow();
        assert_eq!(app.params.fields.len(), 1);
    }

    #[test]
    fn progress_log_lists_latest_first() {
        let mut log = ProgressLog::default();
        let event = |step: &str, status| ProgressEvent {
            step: step.into(),
            status,
            detail: String::new(),
        };
        log.record(&event("Load", ProgressStatus::Running));
        assert_eq!(log.active().map(|line| line.text.as_str()), Some("Load"));
        log.record(&event("Load", ProgressStatus::Done));
        log.record(&event("Plot", ProgressStatus::Failed));
        let lines: Vec<&str> = log.lines().map(|line| line.text.as_str()).collect();
        assert_eq!(lines[0], "FAILED Plot");
        assert!(lines[1].starts_with("OK Load ("));
        assert!(log.active().is_none());
    }

    #[test]
    fn failed_runs_show_a_failure_item() {
        let mut app = sample_app();
        app.request_execution();
        app.update(Msg::ExecutionCompleted(Err("boom".into())));
        assert!(matches!(app.run, RunStatus::Failed { .. }));
        let items = &app.result.as_ref().expect("failure result").items;
        assert_eq!(items[0], ResultItem::text("FAILED Workflow failed: boom"));
    }

    #[test]
    fn failure_item_names_the_launched_workflow() {
        let mut app = sample_app();
        app.request_execution();
        app.select_next_workflow();
        assert_eq!(app.selected_workflow().map(|workflow| workflow.id.as_str()), Some("beta"));

        app.update(Msg::ExecutionCompleted(Err("boom".into())));
        let result = app.result.as_ref().expect("failure result");
        assert_eq!(result.workflow_id, "alpha");
        assert_eq!(result.workflow_name, "Alpha");
    }

    #[test]
    fn export_needs_saveable_plots() {
        let mut app = sample_app();
        assert!(app.request_export().is_none());

        app.result = Some(ExecutionResult {
            workflow_id: "alpha".into(),
            workflow_name: "Alpha".into(),
            items: vec![ResultItem::Plot {
                figure: json!({"data": []}),
                id: Some("fig".into()),
                title: None,
                save: true,
            }],
        });
        app.export.cycle_format(1);
        let Some(Effect::ExportFigures { directory, formats }) = app.request_export() else {
            panic!("expected an export effect");
        };
        assert_eq!(directory, PathBuf::from(DEFAULT_EXPORT_DIR));
        assert_eq!(formats, vec![FigureFormat::Json]);
        assert!(app.request_export().is_none());

        app.update(Msg::ExportCompleted {
            directory,
            outcome: Ok(vec![PathBuf::from("output/figures/fig.json")]),
        });
        assert_eq!(
            app.status.map(|status| status.text),
            Some("Saved 1 figure(s) to output/figures".to_string())
        );
    }
}
