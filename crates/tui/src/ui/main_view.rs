//! Main view: panel layout and global key routing.
//!
//! Global keys (quit, run, export, focus cycling) are handled here; everything
//! else goes to the focused panel.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::{
    components::{
        ExportComponent, FormTarget, HintBarComponent, ParamsComponent, ProgressComponent, ResultsComponent, WorkflowsComponent,
        component::Component,
    },
    theme::NORD,
};
use crate::app::{App, Effect, Focus, Msg};

const MAX_WORKFLOW_ROWS: u16 = 10;

pub struct MainView {
    workflows: WorkflowsComponent,
    settings: ParamsComponent,
    params: ParamsComponent,
    results: ResultsComponent,
    progress: ProgressComponent,
    export: ExportComponent,
    hint_bar: HintBarComponent,
}

impl Default for MainView {
    fn default() -> Self {
        Self {
            workflows: WorkflowsComponent,
            settings: ParamsComponent::new(FormTarget::Settings),
            params: ParamsComponent::new(FormTarget::Parameters),
            results: ResultsComponent,
            progress: ProgressComponent,
            export: ExportComponent,
            hint_bar: HintBarComponent,
        }
    }
}

impl MainView {
    pub fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return vec![Effect::Quit],
            KeyCode::Char('r') if ctrl => return app.request_execution().into_iter().collect(),
            KeyCode::F(5) => return app.request_execution().into_iter().collect(),
            KeyCode::Char('e') if ctrl => return app.request_export().into_iter().collect(),
            KeyCode::Tab => {
                app.focus = app.focus.next(app.has_settings());
                return Vec::new();
            }
            KeyCode::BackTab => {
                app.focus = app.focus.previous(app.has_settings());
                return Vec::new();
            }
            _ => {}
        }
        match app.focus {
            Focus::Workflows => self.workflows.handle_key_events(app, key),
            Focus::Settings => self.settings.handle_key_events(app, key),
            Focus::Parameters => self.params.handle_key_events(app, key),
            Focus::Results => self.results.handle_key_events(app, key),
            Focus::Export => self.export.handle_key_events(app, key),
        }
    }

    pub fn handle_message(&mut self, app: &mut App, msg: Msg) {
        app.update(msg)
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, app: &mut App) {
        let [title_area, body, hints_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Min(0), Constraint::Length(2)]).areas(area);
        let [left, right] = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)]).areas(body);

        let title = Line::from(vec![
            Span::styled(" renderflow ", NORD.accent_style()),
            Span::styled(format!("{} ", app.spec.app_name), NORD.text_style()),
            Span::styled(format!("({})", app.provider_name), NORD.text_muted_style()),
        ]);
        frame.render_widget(Paragraph::new(title), title_area);

        let workflow_rows = (app.spec.workflows.len() as u16).clamp(1, MAX_WORKFLOW_ROWS) + 2;
        if app.has_settings() {
            let settings_rows = app.settings.fields.len() as u16 + 3;
            let [workflows_area, settings_area, params_area] = Layout::vertical([
                Constraint::Length(workflow_rows),
                Constraint::Length(settings_rows),
                Constraint::Min(3),
            ])
            .areas(left);
            self.workflows.render(frame, workflows_area, app);
            self.settings.render(frame, settings_area, app);
            self.params.render(frame, params_area, app);
        } else {
            let [workflows_area, params_area] =
                Layout::vertical([Constraint::Length(workflow_rows), Constraint::Min(3)]).areas(left);
            self.workflows.render(frame, workflows_area, app);
            self.params.render(frame, params_area, app);
        }

        let [results_area, progress_area, export_area] =
            Layout::vertical([Constraint::Min(5), Constraint::Length(8), Constraint::Length(4)]).areas(right);
        self.results.render(frame, results_area, app);
        self.progress.render(frame, progress_area, app);
        self.export.render(frame, export_area, app);
        self.hint_bar.render(frame, hints_area, app);
    }
}
