use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced while discovering providers or resolving their app specs.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown provider '{name}' (available: {available})")]
    UnknownProvider { name: String, available: String },

    #[error("no workflow modules with run_workflow() found for provider '{0}'")]
    NoWorkflows(String),

    #[error("invalid parameter schema: {0}")]
    InvalidParams(String),

    #[error("invalid provider manifest {}: {reason}", path.display())]
    InvalidManifest { path: PathBuf, reason: String },

    #[error("provider '{provider}' process failed: {reason}")]
    ProviderProcess { provider: String, reason: String },

    #[error("failed to load provider '{provider}'")]
    Load {
        provider: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("configuration error at {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("registry I/O error")]
    Io(#[from] std::io::Error),
}
