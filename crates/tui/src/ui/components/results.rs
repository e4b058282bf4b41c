//! Results view: the last execution's items as scrollable styled text.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};
use renderflow_render::{NO_RESULTS, render_table};
use renderflow_types::ResultItem;
use serde_json::Value;

use super::component::Component;
use crate::{
    app::{App, Effect, Focus},
    ui::theme::NORD,
};

const PAGE: u16 = 10;

#[derive(Debug, Default)]
pub struct ResultsComponent;

/// Styled lines for the result items, separated by blank lines.
pub fn result_lines(items: &[ResultItem]) -> Vec<Line<'static>> {
    if items.is_empty() {
        return vec![Line::from(Span::styled(NO_RESULTS, NORD.text_muted_style()))];
    }
    let title_style = NORD.accent_style();
    let mut lines = Vec::new();
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            lines.push(Line::default());
        }
        match item {
            ResultItem::Text { content } => {
                for line in content {
                    let style = if line.starts_with("FAILED ") { NORD.status_style(true) } else { NORD.text_style() };
                    lines.push(Line::from(Span::styled(line.clone(), style)));
                }
            }
            ResultItem::Table { title, data } => {
                lines.push(Line::from(Span::styled(title.clone(), title_style)));
                lines.extend(
                    render_table(data)
                        .lines()
                        .map(|line| Line::from(Span::styled(line.to_string(), NORD.text_style()))),
                );
            }
            ResultItem::Plot { figure, id, title, save } => {
                let name = title.as_deref().or(id.as_deref()).unwrap_or("untitled");
                let traces = figure.get("data").and_then(Value::as_array).map_or(0, Vec::len);
                let mut spans = vec![
                    Span::styled("[plot] ", NORD.info_style()),
                    Span::styled(name.to_string(), title_style),
                    Span::styled(format!(" ({traces} trace{})", if traces == 1 { "" } else { "s" }), NORD.text_muted_style()),
                ];
                if !save {
                    spans.push(Span::styled(" [not exported]", NORD.text_muted_style()));
                }
                lines.push(Line::from(spans));
            }
            ResultItem::Code { content, language } => {
                lines.push(Line::from(Span::styled(format!("--- {language} ---"), title_style)));
                lines.extend(content.iter().map(|line| {
                    Line::from(Span::styled(format!("    {line}"), NORD.text_style().add_modifier(Modifier::DIM)))
                }));
            }
        }
    }
    lines
}

impl Component for ResultsComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        let scroll = &mut app.results_scroll;
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => *scroll = scroll.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => *scroll = scroll.saturating_add(1),
            KeyCode::PageUp => *scroll = scroll.saturating_sub(PAGE),
            KeyCode::PageDown => *scroll = scroll.saturating_add(PAGE),
            KeyCode::Home => *scroll = 0,
            _ => {}
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let title = match &app.result {
            Some(result) => format!("Results: {}", result.workflow_name),
            None => "Results".to_string(),
        };
        let block = NORD.block(&title, app.focus == Focus::Results);
        let lines = match &app.result {
            Some(result) => result_lines(&result.items),
            None => vec![Line::from(Span::styled(
                "Press Ctrl+R to run the selected workflow.",
                NORD.text_muted_style(),
            ))],
        };
        let max_scroll = u16::try_from(lines.len().saturating_sub(1)).unwrap_or(u16::MAX);
        app.results_scroll = app.results_scroll.min(max_scroll);
        let paragraph = Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((app.results_scroll, 0));
        frame.render_widget(paragraph, rect);
    }
}

#[cfg(test)]
mod tests {
    use renderflow_types::TableData;
    use serde_json::json;

    use super::*;

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn each_item_kind_renders() {
        let items = vec![
            ResultItem::text("hello"),
            ResultItem::Table {
                title: "Stats".into(),
                data: TableData::Records(vec![json!({"n": 1})]),
            },
            ResultItem::Plot {
                figure: json!({"data": [{}, {}]}),
                id: Some("series".into()),
                title: None,
                save: false,
            },
            ResultItem::Code {
                content: vec!["{}".into()],
                language: "json".into(),
            },
        ];
        let lines = plain(&result_lines(&items));
        assert_eq!(lines[0], "hello");
        assert_eq!(lines[2], "Stats");
        assert!(lines.contains(&"[plot] series (2 traces) [not exported]".to_string()));
        assert_eq!(lines.last().map(String::as_str), Some("    {}"));
    }

    #[test]
    fn empty_results_say_so() {
        assert_eq!(plain(&result_lines(&[])), vec![NO_RESULTS.to_string()]);
    }
}
