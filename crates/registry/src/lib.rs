//! Registry crate for discovering renderflow providers and resolving their
//! app specifications.
//!
//! Providers reach the registry three ways:
//!
//! - an explicit [`AppSpec`] factory registered under a name,
//! - a [`ProviderModule`] whose optional hooks are introspected into an
//!   [`AppSpec`] by [`auto_build_app_spec`],
//! - a manifest declared in the configuration file, executed as an external
//!   process speaking JSON on stdin/stdout.

pub mod clap_builder;
pub mod config;
pub mod error;
pub mod external;
pub mod interpret;
pub mod models;
pub mod module;

pub use clap_builder::{build_provider_command, build_root_command, execute_args, format_default, param_help_line, provider_help_text};
pub use config::{ImageEngineConfig, ProviderDeclaration, RenderflowConfig};
pub use error::RegistryError;
pub use external::{ProviderManifest, load_manifest_app_spec};
pub use interpret::{ParamSource, SignatureParam, coerce_param_specs, infer_params_from_signature, interpret_params, param_specs_from_mapping};
pub use models::{ProviderRegistry, ProviderSource};
pub use module::{ProviderModule, WorkflowDescriptor, WorkflowModule, auto_build_app_spec};
pub use renderflow_types::{AppSpec, InitializerSpec, ParamSpec, WorkflowSpec};
