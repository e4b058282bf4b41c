//! Figure export panel: target directory plus one output format.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Position, Rect},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::component::Component;
use crate::{
    app::{App, EXPORT_FORMATS, Effect, ExportField, Focus},
    ui::theme::NORD,
};

const DIRECTORY_LABEL: &str = "Directory: ";

#[derive(Debug, Default)]
pub struct ExportComponent;

impl Component for ExportComponent {
    fn handle_key_events(&mut self, app: &mut App, key: KeyEvent) -> Vec<Effect> {
        if key.code == KeyCode::Enter {
            return app.request_export().into_iter().collect();
        }
        let export = &mut app.export;
        match (key.code, export.field) {
            (KeyCode::Up | KeyCode::Down, ExportField::Directory) => export.field = ExportField::Format,
            (KeyCode::Up | KeyCode::Down, ExportField::Format) => export.field = ExportField::Directory,
            (KeyCode::Char(c), ExportField::Directory) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                export.directory.insert_char(c)
            }
            (KeyCode::Backspace, ExportField::Directory) => export.directory.backspace(),
            (KeyCode::Delete, ExportField::Directory) => export.directory.delete(),
            (KeyCode::Left, ExportField::Directory) => export.directory.move_left(),
            (KeyCode::Right, ExportField::Directory) => export.directory.move_right(),
            (KeyCode::Home, ExportField::Directory) => export.directory.move_home(),
            (KeyCode::End, ExportField::Directory) => export.directory.move_end(),
            (KeyCode::Left, ExportField::Format) => export.cycle_format(-1),
            (KeyCode::Right | KeyCode::Char(' '), ExportField::Format) => export.cycle_format(1),
            _ => {}
        }
        Vec::new()
    }

    fn render(&mut self, frame: &mut Frame, rect: Rect, app: &mut App) {
        let focused = app.focus == Focus::Export;
        let block = NORD.block("Export figures", focused);
        let inner = block.inner(rect);
        frame.render_widget(block, rect);

        let export = &app.export;
        let marker = |field: ExportField| if focused && export.field == field { "> " } else { "  " };
        let formats: Vec<Span> = EXPORT_FORMATS
            .iter()
            .flat_map(|format| {
                let style = if *format == export.format() { NORD.selection_style() } else { NORD.text_muted_style() };
                [Span::styled(format!(" {format} "), style), Span::raw(" ")]
            })
            .collect();
        let mut format_line = vec![Span::raw(marker(ExportField::Format)), Span::styled("Format:    ", NORD.text_style())];
        format_line.extend(formats);
        if export.exporting {
            format_line.push(Span::styled("exporting...", NORD.pending_style()));
        }

        let lines = vec![
            Line::from(vec![
                Span::raw(marker(ExportField::Directory)),
                Span::styled(DIRECTORY_LABEL, NORD.text_style()),
                Span::styled(export.directory.input().to_string(), NORD.text_style()),
            ]),
            Line::from(format_line),
        ];
        frame.render_widget(Paragraph::new(lines), inner);

        if focused && export.field == ExportField::Directory {
            let column = 2 + DIRECTORY_LABEL.len() as u16 + export.directory.cursor_column();
            frame.set_cursor_position(Position::new(inner.x + column, inner.y));
        }
    }
}
