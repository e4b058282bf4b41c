//! Automatic app spec definition from provider and workflow modules.
//!
//! A provider that does not hand over a complete [`AppSpec`] implements
//! [`ProviderModule`] instead; every optional hook maps to an attribute the
//! resolver looks for, and anything left out falls back to a convention.

use std::sync::Arc;

use anyhow::Result;
use renderflow_types::{AppSpec, InitializeFn, InitializerSpec, RunFn, WorkflowCall, WorkflowSpec};
use serde_json::Value;
use tracing::debug;

use crate::{ParamSource, RegistryError, SignatureParam, coerce_param_specs, interpret_params};

/// Descriptor object a workflow module may expose.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowDescriptor {
    pub name: Option<String>,
    pub description: Option<String>,
    pub params: Option<ParamSource>,
}

/// One workflow contributed by a provider.
pub trait WorkflowModule: Send + Sync {
    /// Module identifier. Becomes the workflow id; ids starting with `_` are private.
    fn id(&self) -> &str;

    fn descriptor(&self) -> Option<WorkflowDescriptor> {
        None
    }

    /// Module-level name, used when the descriptor has none.
    fn workflow_name(&self) -> Option<String> {
        None
    }

    /// Module-level description, used when the descriptor has none.
    fn workflow_description(&self) -> Option<String> {
        None
    }

    /// Module-level parameter defaults.
    fn module_params(&self) -> Option<ParamSource> {
        None
    }

    /// Declared arguments of [`WorkflowModule::run_workflow`], used for inference.
    fn signature(&self) -> Vec<SignatureParam> {
        Vec::new()
    }

    fn run_workflow(&self, call: WorkflowCall<'_>) -> Result<Value>;
}

/// Convention-based provider definition.
pub trait ProviderModule: Send + Sync {
    /// Display name; defaults to the provider name.
    fn app_name(&self) -> Option<String> {
        None
    }

    fn init_params(&self) -> Option<ParamSource> {
        None
    }

    /// Context initializer; providers without one run workflows with an empty context.
    fn initializer(&self) -> Option<InitializeFn> {
        None
    }

    fn workflows(&self) -> Vec<Arc<dyn WorkflowModule>>;
}

/// Introspects a provider module into an [`AppSpec`].
pub fn auto_build_app_spec(provider_name: &str, module: &dyn ProviderModule) -> Result<AppSpec, RegistryError> {
    let app_name = module
        .app_name()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| provider_name.to_string());

    let mut initializers = Vec::new();
    if let Some(initialize) = module.initializer() {
        let params = match module.init_params() {
            Some(source) => coerce_param_specs(&source)?,
            None => Vec::new(),
        };
        initializers.push(InitializerSpec {
            id: "default_initializer".to_string(),
            name: "Initialization".to_string(),
            description: "Provider initialization context".to_string(),
            params,
            initialize,
        });
    }

    let workflows = discover_workflows(provider_name, module)?;
    Ok(AppSpec {
        app_name,
        initializers,
        workflows,
    })
}

fn discover_workflows(provider_name: &str, module: &dyn ProviderModule) -> Result<Vec<WorkflowSpec>, RegistryError> {
    let mut modules = module.workflows();
    modules.sort_by(|a, b| a.id().cmp(b.id()));

    let mut specs = Vec::with_capacity(modules.len());
    for workflow_module in modules {
        let id = workflow_module.id().to_string();
        if id.starts_with('_') {
            debug!(provider = provider_name, workflow = %id, "skipping private workflow module");
            continue;
        }
        let descriptor = workflow_module.descriptor().unwrap_or_default();
        let name = descriptor
            .name
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| workflow_module.workflow_name())
            .unwrap_or_else(|| id.clone());
        let description = descriptor
            .description
            .clone()
            .filter(|description| !description.is_empty())
            .or_else(|| workflow_module.workflow_description())
            .unwrap_or_default();
        let params = interpret_params(workflow_module.as_ref())?;

        let runner = Arc::clone(&workflow_module);
        let run: RunFn = Arc::new(move |call: WorkflowCall<'_>| runner.run_workflow(call));
        specs.push(WorkflowSpec {
            id,
            name,
            description,
            params,
            run,
        });
    }

    if specs.is_empty() {
        return Err(RegistryError::NoWorkflows(provider_name.to_string()));
    }
    Ok(specs)
}

#[cfg(test)]
mod tests {
    use renderflow_types::{Context, JsonMap, ParamValues, ProgressReporter};
    use serde_json::json;

    use super::*;

    struct Echo(&'static str);

    impl WorkflowModule for Echo {
        fn id(&self) -> &str {
            self.0
        }
        fn workflow_name(&self) -> Option<String> {
            (self.0 == "b_echo").then(|| "Echo B".to_string())
        }
        fn run_workflow(&self, call: WorkflowCall<'_>) -> Result<Value> {
            Ok(json!({"results": [{"type": "text", "content": call.context.get("name").cloned().unwrap_or_default()}]}))
        }
    }

    struct Provider {
        with_initializer: bool,
        workflows: Vec<&'static str>,
    }

    impl ProviderModule for Provider {
        fn app_name(&self) -> Option<String> {
            Some("Probe App".into())
        }
        fn init_params(&self) -> Option<ParamSource> {
            Some(ParamSource::Document(json!({"name": {"default": "World"}})))
        }
        fn initializer(&self) -> Option<InitializeFn> {
            self.with_initializer.then(|| {
                let initialize: InitializeFn = Arc::new(|params: &ParamValues| -> Result<Context> { Ok(params.clone()) });
                initialize
            })
        }
        fn workflows(&self) -> Vec<Arc<dyn WorkflowModule>> {
            self.workflows
                .iter()
                .map(|id| Arc::new(Echo(id)) as Arc<dyn WorkflowModule>)
                .collect()
        }
    }

    #[test]
    fn workflows_are_sorted_and_private_modules_skipped() {
        let provider = Provider {
            with_initializer: true,
            workflows: vec!["b_echo", "_helpers", "a_echo"],
        };
        let app = auto_build_app_spec("probe", &provider).expect("build app spec");
        assert_eq!(app.app_name, "Probe App");
        assert_eq!(app.workflow_ids(), vec!["a_echo", "b_echo"]);
        assert_eq!(app.workflows[0].name, "a_echo");
        assert_eq!(app.workflows[1].name, "Echo B");
        assert_eq!(app.initializers.len(), 1);
        assert_eq!(app.initializers[0].id, "default_initializer");
        assert_eq!(app.initializers[0].params[0].key, "name");
    }

    #[test]
    fn run_closure_dispatches_to_module() {
        let provider = Provider {
            with_initializer: false,
            workflows: vec!["a_echo"],
        };
        let app = auto_build_app_spec("probe", &provider).expect("build app spec");
        assert!(app.initializers.is_empty());
        let mut context = Context::new();
        context.insert("name".into(), json!("hi"));
        let params = ParamValues::new();
        let metadata = JsonMap::new();
        let progress = ProgressReporter::disabled();
        let out = app.workflows[0]
            .invoke(WorkflowCall {
                context: &context,
                params: &params,
                metadata: &metadata,
                progress: &progress,
            })
            .expect("run");
        assert_eq!(out["results"][0]["content"], json!("hi"));
    }

    #[test]
    fn provider_without_workflows_is_an_error() {
        let provider = Provider {
            with_initializer: false,
            workflows: vec!["_only_private"],
        };
        let err = auto_build_app_spec("probe", &provider).unwrap_err();
        assert!(matches!(err, RegistryError::NoWorkflows(name) if name == "probe"));
    }
}
