use renderflow_types::ParamType;
use serde_json::Value;
use thiserror::Error;

/// A workflow returned a payload that does not follow the result contract.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidWorkflowResults {
    #[error("Workflow returned null; expected a mapping result payload.")]
    Null,

    #[error("Workflow must return a mapping result payload, got {0}.")]
    NotAMapping(&'static str),

    #[error("Workflow result mapping must contain 'results' or legacy keys ('text', 'tables', 'plots'). Received keys: {0}")]
    MissingKeys(String),

    #[error("'results' must be a list of result items, got {0}.")]
    ResultsNotAList(&'static str),

    #[error("Result item #{index} must be a mapping, got {found}.")]
    ItemNotAMapping { index: usize, found: &'static str },

    #[error("Result item #{index} has invalid type {found}. Allowed: text, table, plot, code")]
    InvalidType { index: usize, found: String },

    #[error("Result item #{index} has type 'plot' but is missing required key 'figure'.")]
    PlotMissingFigure { index: usize },

    #[error("Result item #{index} is malformed: {reason}")]
    MalformedItem { index: usize, reason: String },

    #[error("Legacy '{key}' entry #{index} is malformed: {reason}")]
    MalformedLegacy { key: &'static str, index: usize, reason: String },
}

/// Failures while preparing or running one workflow execution.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("unknown workflow '{workflow}' (available: {available})")]
    UnknownWorkflow { workflow: String, available: String },

    #[error("invalid {flag} argument '{argument}'; expected KEY=VALUE")]
    MalformedArgument { flag: &'static str, argument: String },

    #[error("parameter '{key}' expects a {expected} value, got '{value}'")]
    InvalidValue { key: String, expected: ParamType, value: String },

    #[error("initializer '{initializer}' failed")]
    Initializer {
        initializer: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("workflow '{workflow}' failed")]
    Workflow {
        workflow: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Invalid workflow result payload")]
    InvalidResults(#[from] InvalidWorkflowResults),
}

/// JSON type name used in contract error messages.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
