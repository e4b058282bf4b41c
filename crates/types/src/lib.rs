//! Shared type definitions for renderflow providers, the engine, and renderers.
//!
//! Everything a provider hands to renderflow (app specs, parameter schemas,
//! run functions) and everything renderflow hands back (result items,
//! progress events) lives here so the registry, engine, render, and TUI
//! crates agree on one vocabulary.

pub mod figure;
pub mod params;
pub mod progress;
pub mod results;
pub mod spec;

pub use figure::{FigureFormat, InvalidFigureFormat, VALID_FIGURE_FORMATS};
pub use params::{DropdownOption, OptionsFn, ParamOptions, ParamSpec, ParamType};
pub use progress::{ProgressEvent, ProgressReporter, ProgressStatus};
pub use results::{ExecutionResult, ResultItem, ResultKind, TableData, VALID_RESULT_TYPES, lines_from_value, scalar_to_string};
pub use spec::{AppSpec, InitializeFn, InitializerSpec, RunFn, WorkflowCall, WorkflowSpec};

/// JSON object used for parameter values, initializer contexts, and metadata.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// Parameter values keyed by [`ParamSpec::key`], in schema order.
pub type ParamValues = JsonMap;

/// Output of a provider initializer, handed to every workflow run.
pub type Context = JsonMap;
