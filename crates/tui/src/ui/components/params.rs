//! Parameter form panel, used for both provider settings and workflow parameters.
//!
//! Text and number fields are edited in place; checkboxes toggle with Space;
//! dropdowns and numbers step with Left/Right or PageUp/PageDown. Dropdown
//! options are re-resolved after every edit.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Position, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};
use unicode_width::UnicodeWidthStr;

use super::component::Component;
use crate::{
    app::{App, Effect, Focus},
    form::{FieldValue, ParamForm},
    ui::theme::NORD,
};

/// Which form a [`ParamsComponent`] edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTarget {
    Settings,
    Parameters,
}

impl FormTarget {
    fn focus(self) -> Focus {
        match self {
            FormTarget::Settings => Focus::Settings,
            FormTarget::Parameters => Focus::Parameters,
        }
    }

    fn title(self) -> &'static str {
        match self {
            FormTarget::Settings => "Settings",
            FormTarget::Parameters => "Parameters",
        }
    }

    fn form(self, app: &App) -> &ParamForm {
        match self {
            FormTarget::Settings => &app.settings,
            FormTarget::Parameters => &app.params,
        }
    }

    fn form_mut(self, app: &mut App) -> &mut ParamForm {
        match self {
            FormTarget::Settings => &mut app.settings,
            FormTarget::Parameters => &mut app.params,
        }
    }
}

#[derive(Debug)]
pub struct ParamsComponent {
    target: FormTarget,
}

impl ParamsComponent {
    pub fn new(target: FormTarget) -> Self {
        Self { target }
    }

    /// Applies an editing key to the selected field; true when its value changed.
    fn edit(form: &mut ParamForm, key: KeyEvent) -> bool {
        let Some(field) = form.selected_field_mut() else {
            return false;
        };
        let is_number = matches!(field.value, FieldValue::Number(_));
        match (key.code, field.text_input_mut()) {
            (KeyCode::Char(c), Some(input)) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                input.insert_char(c);
                true
            }
            (KeyCode::Backspace, Some(input)) => {
                input.backspace();
                true
            }
            (KeyCode::Delete, Some(input)) => {
                input.delete();
                true
            }
            (KeyCode::Left, Some(input)) => {
                input.move_left();
                false
            }
            (KeyCode::Right, Some(input)) => {
                input.move_right();
                false
            }
            (KeyCode::Home, Some(input)) => {
                input.move_home();
                false
            }
            (KeyCode::End, Some(input)) => {
                input.move_end();
                false
            }
            (KeyCode::PageUp, Some(_)) if is_number => field.step(1),
            (KeyCode::PageDown, Some(_)) if is_number => field.step(-1),
            (KeyCode::Char(' ') | KeyCode::Right | KeyCode::PageUp, None) => field.step(1),
            (KeyCode::Left | KeyCode::PageDown, None) => field.step(-1),
            _ => false,
        }
    }
}

impl Component for ParamsComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Up => self.target.form_mut(app).select_previous(),
            KeyCode::Down => self.target.form_mut(app).select_next(),
            KeyCode::Enter => return app.request_execution().into_iter().collect(),
            _ => {
                let form = self.target.form_mut(app);
                if Self::edit(form, key) {
                    form.refresh_options();
                }
            }
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let focused = app.focus == self.target.focus();
        let block = NORD.block(self.target.title(), focused);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let form = self.target.form(app);
        if form.is_empty() {
            frame.render_widget(Paragraph::new(Span::styled("(no parameters)", NORD.text_muted_style())), inner);
            return;
        }

        let label_width = form.fields.iter().map(|field| field.label().width()).max().unwrap_or(0);
        let visible = usize::from(inner.height.saturating_sub(1)).max(1);
        let offset = form.selected.saturating_sub(visible - 1);

        let mut lines: Vec<Line> = form
            .fields
            .iter()
            .enumerate()
            .skip(offset)
            .take(visible)
            .map(|(index, field)| {
                let selected = index == form.selected;
                let marker = if selected { "> " } else { "  " };
                let padding = " ".repeat(label_width.saturating_sub(field.label().width()));
                let label_style = if selected && focused { NORD.accent_style() } else { NORD.text_style() };
                Line::from(vec![
                    Span::raw(marker),
                    Span::styled(format!("{}{padding}: ", field.label()), label_style),
                    Span::styled(field.display_value(), NORD.text_style()),
                    Span::styled(format!("  {}", field.spec.r#type.as_str()), NORD.text_muted_style()),
                ])
            })
            .collect();
        if let Some(help) = form.selected_field().map(|field| field.spec.help.as_str()).filter(|help| !help.is_empty()) {
            lines.push(Line::from(Span::styled(help.to_string(), NORD.text_muted_style())));
        }
        frame.render_widget(Paragraph::new(lines), inner);

        if focused
            && let Some(input) = form.selected_field().and_then(|field| field.text_input())
        {
            let row = (form.selected - offset) as u16;
            let column = 2 + label_width as u16 + 2 + input.cursor_column();
            frame.set_cursor_position(Position::new(inner.x + column, inner.y + row));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::app::tests::sample_app;

    fn press(component: &mut ParamsComponent, app: &mut App, code: KeyCode) -> Vec<Effect> {
        component.handle_key_events(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn typing_edits_the_selected_number() {
        let mut app = sample_app();
        let mut component = ParamsComponent::new(FormTarget::Parameters);
        press(&mut component, &mut app, KeyCode::Backspace);
        press(&mut component, &mut app, KeyCode::Char('4'));
        assert_eq!(app.params.values().expect("values")["count"], json!(4));

        press(&mut component, &mut app, KeyCode::PageUp);
        press(&mut component, &mut app, KeyCode::PageUp);
        assert_eq!(app.params.fields[0].display_value(), "5");
    }

    #[test]
    fn enter_requests_execution() {
        let mut app = sample_app();
        let mut component = ParamsComponent::new(FormTarget::Settings);
        let effects = press(&mut component, &mut app, KeyCode::Enter);
        assert!(matches!(effects.as_slice(), [Effect::Execute(_)]));
    }

    #[test]
    fn settings_edits_stay_in_the_settings_form() {
        let mut app = sample_app();
        let mut component = ParamsComponent::new(FormTarget::Settings);
        press(&mut component, &mut app, KeyCode::Char('!'));
        assert_eq!(app.settings.values().expect("values")["name"], json!("World!"));
        assert_eq!(app.params.values().expect("values")["count"], json!(3));
    }
}
