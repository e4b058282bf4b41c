//! Minimal renderflow provider.
//!
//! Shows each way a provider can describe itself to the registry: init
//! parameters with an initializer, and workflow modules whose parameters come
//! from a descriptor, a module-level mapping, or the run signature.

use std::sync::Arc;

use anyhow::Result;
use renderflow_registry::{ParamSource, ProviderModule, ProviderRegistry, WorkflowModule};
use renderflow_types::{Context, InitializeFn, ParamValues};
use serde_json::{Value, json};
use tracing::debug;

pub mod workflows;

/// Name the provider is registered under.
pub const PROVIDER_NAME: &str = "minimal-provider";

pub const APP_NAME: &str = "Minimal Provider";

const DEFAULT_NAME: &str = "World";
const DEFAULT_BASE_VALUE: i64 = 10;

#[derive(Debug, Clone, Copy, Default)]
pub struct MinimalProvider;

impl ProviderModule for MinimalProvider {
    fn app_name(&self) -> Option<String> {
        Some(APP_NAME.to_string())
    }

    fn init_params(&self) -> Option<ParamSource> {
        Some(ParamSource::Document(json!([
            {
                "key": "name",
                "label": "Name",
                "type": "text",
                "default": DEFAULT_NAME,
                "help": "Name used by workflows.",
            },
            {
                "key": "base_value",
                "label": "Base Value",
                "type": "number",
                "default": DEFAULT_BASE_VALUE,
                "help": "Default numeric value for workflows.",
            },
        ])))
    }

    fn initializer(&self) -> Option<InitializeFn> {
        Some(Arc::new(initialize) as InitializeFn)
    }

    fn workflows(&self) -> Vec<Arc<dyn WorkflowModule>> {
        workflows::all()
    }
}

/// Builds the workflow context from init parameters.
pub fn initialize(params: &ParamValues) -> Result<Context> {
    let mut context = Context::new();
    context.insert(
        "name".into(),
        params.get("name").cloned().unwrap_or_else(|| Value::from(DEFAULT_NAME)),
    );
    context.insert(
        "base_value".into(),
        params.get("base_value").cloned().unwrap_or_else(|| Value::from(DEFAULT_BASE_VALUE)),
    );
    debug!(keys = context.len(), "initialized minimal provider context");
    Ok(context)
}

/// Registers the provider as a compiled-in module.
pub fn register(registry: &mut ProviderRegistry) {
    registry.register_module(PROVIDER_NAME, Arc::new(MinimalProvider));
}

#[cfg(test)]
mod tests {
    use renderflow_registry::auto_build_app_spec;
    use renderflow_types::ParamType;

    use super::*;

    #[test]
    fn app_spec_exposes_initializer_and_workflows() {
        let app = auto_build_app_spec(PROVIDER_NAME, &MinimalProvider).expect("app spec");
        assert_eq!(app.app_name, "Minimal Provider");
        assert_eq!(app.initializers.len(), 1);
        let init_keys: Vec<&str> = app.init_params().map(|spec| spec.key.as_str()).collect();
        assert_eq!(init_keys, ["name", "base_value"]);
        assert_eq!(app.initializers[0].params[1].r#type, ParamType::Number);
        assert_eq!(app.workflow_ids(), ["channel_report", "greeting", "series_summary"]);
    }

    #[test]
    fn initialize_applies_defaults() {
        let context = initialize(&ParamValues::new()).expect("initialize");
        assert_eq!(context["name"], json!("World"));
        assert_eq!(context["base_value"], json!(10));
    }
}
