//! # Renderflow Engine
//!
//! Executes provider workflows and turns their raw return values into
//! canonical result items.
//!
//! - **`executor`**: initializer context, parameter defaults, invocation metadata
//! - **`normalize`**: result contract validation for modern and legacy payloads
//! - **`params`**: `KEY=VALUE` parsing and typed coercion
//! - **`options`**: dropdown option resolution
//! - **`progress`**: progress events and step timing
//! - **`builder`**: the [`Workflow`] result builder used by providers

pub mod builder;
pub mod error;
pub mod executor;
pub mod normalize;
pub mod options;
pub mod params;
pub mod progress;

pub use builder::{TextContent, Workflow};
pub use error::{ExecutionError, InvalidWorkflowResults};
pub use executor::{ExecutionRequest, execute_workflow, find_workflow, initialize_context, invocation_metadata, run_workflow};
pub use normalize::{normalize_results, validate_results_contract};
pub use options::{NO_OPTIONS_LABEL, normalize_dropdown_options, resolve_dropdown_options};
pub use params::{coerce_assignments, coerce_value, parse_assignments, values_with_defaults};
pub use progress::{emit_progress, node_failed, wrap_with_timing};
