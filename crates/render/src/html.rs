//! Standalone HTML report covering every result item.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::Local;
use html_escape::encode_text;
use renderflow_types::{ResultItem, scalar_to_string};
use tracing::info;

use crate::{ExportError, figures::plotly_cdn_url, figures::script_safe_json, figures::to_builtin_json};

pub const DEFAULT_REPORT_TITLE: &str = "Workflow Report";

const STYLE: [&str; 6] = [
    "        body { font-family: system-ui, sans-serif; max-width: 1200px; margin: 0 auto; padding: 1.5rem; }",
    "        .section { margin: 1rem 0; padding: 1rem; border: 1px solid #ddd; border-radius: 6px; }",
    "        .section h2 { margin-top: 0; }",
    "        table { width: 100%; border-collapse: collapse; }",
    "        th, td { border-bottom: 1px solid #ddd; text-align: left; padding: 0.45rem; }",
    "        pre { background: #f6f8fa; padding: 0.75rem; border-radius: 6px; overflow-x: auto; }",
];

/// Renders the report document.
///
/// Plots are included regardless of their `save` flag.
pub fn render_html_report(items: &[ResultItem], title: &str) -> Result<String, ExportError> {
    let title = encode_text(title);
    let mut lines = vec![
        "<!DOCTYPE html>".to_string(),
        "<html>".to_string(),
        "<head>".to_string(),
        format!("    <title>{title}</title>"),
        "    <meta charset='utf-8'>".to_string(),
        format!("    <script src='{}'></script>", plotly_cdn_url()),
        "    <style>".to_string(),
    ];
    lines.extend(STYLE.iter().map(|line| line.to_string()));
    lines.extend([
        "    </style>".to_string(),
        "</head>".to_string(),
        "<body>".to_string(),
        format!("    <h1>{title}</h1>"),
        format!("    <p>Generated on {}</p>", Local::now().format("%Y-%m-%d %H:%M:%S")),
    ]);

    let mut plot_counter = 0;
    for item in items {
        match item {
            ResultItem::Text { content } => {
                lines.push("    <div class='section'>".to_string());
                lines.extend(content.iter().map(|line| format!("        <p>{}</p>", encode_text(line))));
                lines.push("    </div>".to_string());
            }
            ResultItem::Table { title, data } => {
                lines.push("    <div class='section'>".to_string());
                lines.push(format!("        <h2>{}</h2>", encode_text(title)));
                lines.push("        <table>".to_string());
                let (headers, rows) = data.grid();
                if !headers.is_empty() {
                    lines.push("            <tr>".to_string());
                    lines.extend(headers.iter().map(|header| format!("                <th>{}</th>", encode_text(header))));
                    lines.push("            </tr>".to_string());
                    for row in rows {
                        lines.push("            <tr>".to_string());
                        lines.extend(
                            row.iter()
                                .map(|cell| format!("                <td>{}</td>", encode_text(&scalar_to_string(cell)))),
                        );
                        lines.push("            </tr>".to_string());
                    }
                }
                lines.push("        </table>".to_string());
                lines.push("    </div>".to_string());
            }
            ResultItem::Code { content, language } => {
                lines.push("    <div class='section'>".to_string());
                lines.push(format!("        <h2>Code ({})</h2>", encode_text(language)));
                lines.push(format!("        <pre>{}</pre>", encode_text(&content.join("\n"))));
                lines.push("    </div>".to_string());
            }
            ResultItem::Plot { figure, title, .. } => {
                if figure.is_null() {
                    continue;
                }
                plot_counter += 1;
                let div_id = format!("plot-{plot_counter}");
                let payload = script_safe_json(&to_builtin_json(figure))?;
                lines.push("    <div class='section'>".to_string());
                if let Some(title) = title.as_deref().filter(|title| !title.is_empty()) {
                    lines.push(format!("        <h2>{}</h2>", encode_text(title)));
                }
                lines.push(format!("        <div id='{div_id}'></div>"));
                lines.push("        <script>".to_string());
                lines.push(format!("            var plotData = {payload};"));
                lines.push(format!(
                    "            Plotly.newPlot('{div_id}', plotData.data || [], plotData.layout || {{}}, {{responsive: true}});"
                ));
                lines.push("        </script>".to_string());
                lines.push("    </div>".to_string());
            }
        }
    }

    lines.push("</body>".to_string());
    lines.push("</html>".to_string());
    Ok(lines.join("\n"))
}

/// Writes the report to `output_path`, creating parent directories.
pub fn render_results_to_html(items: &[ResultItem], output_path: &Path, title: &str) -> Result<PathBuf, ExportError> {
    if let Some(parent) = output_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(ExportError::io(parent))?;
    }
    let document = render_html_report(items, title)?;
    fs::write(output_path, document).map_err(ExportError::io(output_path))?;
    info!(path = %output_path.display(), items = items.len(), "HTML report written");
    Ok(output_path.to_path_buf())
}
