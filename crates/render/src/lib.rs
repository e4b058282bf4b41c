//! Renderers for normalized workflow results.
//!
//! The terminal renderer backs `execute --output terminal`, the HTML report
//! backs `--html`, and per-figure export backs `--save-figures-dir` and the
//! interactive export panel. Image formats go through an [`ImageEngine`].

pub mod error;
pub mod figures;
pub mod html;
pub mod image_engine;
pub mod terminal;

pub use error::ExportError;
pub use figures::{PLOTLY_JS_VERSION, figure_name, normalize_figure_formats, save_figures, to_builtin_json};
pub use html::{DEFAULT_REPORT_TITLE, render_html_report, render_results_to_html};
pub use image_engine::{ExternalCommandEngine, ImageEngine, NoImageEngine, image_engine_from_argv};
pub use terminal::{NO_RESULTS, render_table, render_terminal};
