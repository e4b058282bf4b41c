//! Plain-text rendering for the `execute` command.

use renderflow_types::{ResultItem, TableData, scalar_to_string};
use renderflow_util::{display_width, pad_to_width, truncate_to_width};
use serde_json::Value;

pub const NO_RESULTS: &str = "No results returned.";

/// Widest a table cell may get before it is truncated.
const MAX_CELL_WIDTH: usize = 40;

/// Renders result items as terminal text. `styled` enables ANSI bold titles.
pub fn render_terminal(items: &[ResultItem], styled: bool) -> String {
    if items.is_empty() {
        return format!("{NO_RESULTS}\n");
    }
    let bold = |text: &str| if styled { format!("\x1b[1m{text}\x1b[0m") } else { text.to_string() };

    let mut blocks = Vec::with_capacity(items.len());
    for item in items {
        let block = match item {
            ResultItem::Text { content } => content.join("\n"),
            ResultItem::Table { title, data } => format!("{}\n{}", bold(title.as_str()), render_table(data)),
            ResultItem::Plot { figure, id, title, save } => {
                let name = title.as_deref().or(id.as_deref()).unwrap_or("untitled");
                let traces = figure.get("data").and_then(Value::as_array).map_or(0, Vec::len);
                let mut line = format!("[plot] {name} ({traces} trace{})", if traces == 1 { "" } else { "s" });
                if !save {
                    line.push_str(" [not exported]");
                }
                line
            }
            ResultItem::Code { content, language } => {
                let mut lines = vec![bold(format!("--- {language} ---").as_str())];
                lines.extend(content.iter().map(|line| format!("    {line}")));
                lines.join("\n")
            }
        };
        blocks.push(block);
    }
    let mut out = blocks.join("\n\n");
    out.push('\n');
    out
}

/// Aligned columns with a dashed header rule.
pub fn render_table(data: &TableData) -> String {
    let (headers, rows) = data.grid();
    if headers.is_empty() {
        return "(empty table)".to_string();
    }
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| truncate_to_width(&scalar_to_string(cell), MAX_CELL_WIDTH)).collect())
        .collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(column, header)| {
            cells
                .iter()
                .filter_map(|row| row.get(column))
                .map(|cell| display_width(cell))
                .chain(std::iter::once(display_width(header)))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let format_row = |row: &[String]| -> String {
        row.iter()
            .zip(&widths)
            .map(|(cell, width)| pad_to_width(cell, *width))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(headers.as_slice())];
    lines.push(widths.iter().map(|width| "-".repeat(*width)).collect::<Vec<_>>().join("  "));
    lines.extend(cells.iter().map(|row| format_row(row.as_slice())));
    lines.join("\n")
}
