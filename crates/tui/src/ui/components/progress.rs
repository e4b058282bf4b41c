//! Live progress panel: run state with a throbber, then step lines latest first.

use ratatui::{
    Frame,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};
use renderflow_types::ProgressStatus;

use super::component::Component;
use crate::{
    app::{App, RunStatus},
    ui::theme::NORD,
};

pub const THROBBER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

#[derive(Debug, Default)]
pub struct ProgressComponent;

fn run_line(app: &App) -> Line<'static> {
    match &app.run {
        RunStatus::Idle => Line::from(Span::styled("Idle", NORD.text_muted_style())),
        RunStatus::Running { started, .. } => Line::from(vec![
            Span::styled(
                format!("{} ", THROBBER_FRAMES[app.throbber_idx % THROBBER_FRAMES.len()]),
                NORD.accent_style(),
            ),
            Span::styled(format!("Running ({:.1}s)", started.elapsed().as_secs_f64()), NORD.pending_style()),
        ]),
        RunStatus::Succeeded { elapsed } => Line::from(Span::styled(
            format!("Completed in {:.2}s", elapsed.as_secs_f64()),
            NORD.status_style(false),
        )),
        RunStatus::Failed { message } => Line::from(Span::styled(format!("Failed: {message}"), NORD.status_style(true))),
    }
}

fn line_style(status: ProgressStatus) -> Style {
    match status {
        ProgressStatus::Running => NORD.pending_style(),
        ProgressStatus::Done => NORD.text_style(),
        ProgressStatus::Failed => NORD.status_style(true),
    }
}

impl Component for ProgressComponent {
    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let block = NORD.block("Progress", false);
        let mut lines = vec![run_line(app)];
        lines.extend(app.progress.lines().map(|line| {
            Line::from(vec![
                Span::styled(format!("{} ", line.at.format("%H:%M:%S")), NORD.info_style()),
                Span::styled(line.text.clone(), line_style(line.status)),
            ])
        }));
        frame.render_widget(Paragraph::new(lines).block(block), rect);
    }
}

#[cfg(test)]
mod tests {
    use ratatui::{Terminal, backend::TestBackend};
    use renderflow_types::ProgressEvent;

    use super::*;
    use crate::app::{Msg, tests::sample_app};

    #[test]
    fn renders_active_step_above_completed_ones() {
        let mut app = sample_app();
        app.request_execution();
        for (step, status) in [("Load", ProgressStatus::Running), ("Load", ProgressStatus::Done), ("Plot", ProgressStatus::Running)] {
            app.update(Msg::Progress(ProgressEvent {
                step: step.into(),
                status,
                detail: String::new(),
            }));
        }

        let mut terminal = Terminal::new(TestBackend::new(50, 6)).expect("terminal");
        terminal
            .draw(|frame| ProgressComponent.render(frame, frame.area(), &mut app))
            .expect("draw");
        let buffer = terminal.backend().buffer();
        let rows: Vec<String> = (0..buffer.area.height)
            .map(|y| (0..buffer.area.width).map(|x| buffer[(x, y)].symbol()).collect())
            .collect();
        assert!(rows[1].contains("⠋ Running"));
        assert!(rows[2].contains("Plot"));
        assert!(rows[3].contains("OK Load ("));
    }
}
