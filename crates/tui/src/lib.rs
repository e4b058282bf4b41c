//! # Renderflow TUI
//!
//! Interactive front-end for a single provider: pick a workflow, fill its
//! parameters, run it with live progress, browse the results and export the
//! figures.
//!
//! ## Architecture
//!
//! [`app::App`] holds all state. Panels under `ui::components` route keys into
//! it and return [`app::Effect`]s; the runtime in `ui::runtime` turns those
//! into background tasks (see [`exec`]) and feeds their outcomes back as
//! [`app::Msg`]s.

mod app;
mod exec;
mod form;
mod text_input;
mod ui;

use anyhow::Result;
use renderflow_types::AppSpec;

/// Launch settings resolved by the CLI.
#[derive(Debug, Clone, Default)]
pub struct TuiOptions {
    /// Provider name shown in the title bar
    pub provider_name: String,
    /// External image engine argv used by the export panel
    pub image_engine: Option<Vec<String>>,
}

/// Runs the interactive UI until the user quits.
pub async fn run(app: AppSpec, options: TuiOptions) -> Result<()> {
    ui::runtime::run_app(app::App::new(app, options)).await
}
