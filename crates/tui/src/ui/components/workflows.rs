//! Workflow picker: the provider's workflows in registration order.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    text::{Line, Span},
    widgets::{List, ListItem},
};

use super::component::Component;
use crate::{
    app::{App, Effect, Focus},
    ui::theme::NORD,
};

#[derive(Debug, Default)]
pub struct WorkflowsComponent;

impl Component for WorkflowsComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => app.select_previous_workflow(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next_workflow(),
            KeyCode::Home => app.select_workflow(0),
            KeyCode::End => app.select_workflow(app.spec.workflows.len().saturating_sub(1)),
            KeyCode::Enter if app.selected_workflow().is_some() => {
                app.focus = if app.params.is_empty() { Focus::Results } else { Focus::Parameters };
            }
            _ => {}
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let block = NORD.block("Workflows", app.focus == Focus::Workflows);
        let items: Vec<ListItem> = app
            .spec
            .workflows
            .iter()
            .map(|workflow| {
                ListItem::new(Line::from(vec![
                    Span::styled(workflow.name.clone(), NORD.text_style()),
                    Span::styled(format!("  {}", workflow.id), NORD.text_muted_style()),
                ]))
            })
            .collect();
        let list = List::new(items)
            .block(block)
            .highlight_style(NORD.selection_style())
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, rect, &mut app.workflow_list);
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::app::tests::sample_app;

    #[test]
    fn arrows_move_the_selection_and_enter_focuses_parameters() {
        let mut app = sample_app();
        let mut component = WorkflowsComponent;
        component.handle_key_events(&mut app, KeyEvent::new(KeyCode::Down, KeyModifiers::NONE));
        assert_eq!(app.workflow_list.selected(), Some(1));
        component.handle_key_events(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(app.focus, Focus::Results);

        component.handle_key_events(&mut app, KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE));
        component.handle_key_events(&mut app, KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
        assert_eq!(app.workflow_list.selected(), Some(0));
        assert_eq!(app.focus, Focus::Parameters);
    }
}
