//! Bottom strip: status message on the first line, key hints for the focused
//! panel on the second.

use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
};

use super::component::Component;
use crate::{
    app::{App, Focus},
    ui::theme::NORD,
};

#[derive(Debug, Default)]
pub struct HintBarComponent;

fn hints(focus: Focus) -> &'static [(&'static str, &'static str)] {
    match focus {
        Focus::Workflows => &[("↑/↓", "select"), ("Enter", "edit params")],
        Focus::Settings | Focus::Parameters => &[("↑/↓", "field"), ("←/→", "step"), ("Space", "toggle"), ("Enter", "run")],
        Focus::Results => &[("↑/↓", "scroll"), ("PgUp/PgDn", "page")],
        Focus::Export => &[("↑/↓", "field"), ("←/→", "format"), ("Enter", "export")],
    }
}

impl Component for HintBarComponent {
    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let status = match &app.status {
            Some(status) => Line::from(Span::styled(status.text.clone(), NORD.status_style(status.is_error))),
            None => Line::default(),
        };

        let mut spans = Vec::new();
        let common = [("Tab", "next panel"), ("Ctrl+R", "run"), ("Ctrl+E", "export"), ("Esc", "quit")];
        for (key, action) in hints(app.focus).iter().chain(common.iter()) {
            spans.push(Span::styled(*key, NORD.accent_style()));
            spans.push(Span::styled(format!(" {action}  "), NORD.text_muted_style()));
        }
        frame.render_widget(Paragraph::new(vec![status, Line::from(spans)]), rect);
    }
}
