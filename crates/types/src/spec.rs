//! Contracts used by workflow providers and generic renderers.

use std::{fmt, sync::Arc};

use anyhow::Result;
use serde_json::Value;

use crate::{Context, JsonMap, ParamSpec, ParamValues, ProgressReporter};

/// Everything a workflow run receives.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowCall<'a> {
    /// Output of the provider initializer (empty when the provider has none).
    pub context: &'a Context,
    /// Interpreted parameter values, defaults applied.
    pub params: &'a ParamValues,
    /// `context.metadata`, then the remaining context keys, then `params`.
    pub metadata: &'a JsonMap,
    pub progress: &'a ProgressReporter,
}

impl WorkflowCall<'_> {
    /// Parameter value with a fallback to the metadata view.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.params.get(key).or_else(|| self.metadata.get(key))
    }

    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.value(key).and_then(Value::as_str)
    }

    pub fn f64_value(&self, key: &str) -> Option<f64> {
        self.value(key).and_then(|value| match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn bool_value(&self, key: &str) -> Option<bool> {
        self.value(key).and_then(Value::as_bool)
    }
}

/// Workflow entry point: returns the raw result payload (expected to be an object).
pub type RunFn = Arc<dyn for<'a> Fn(WorkflowCall<'a>) -> Result<Value> + Send + Sync>;

/// Initializer entry point: turns init parameter values into a workflow context.
pub type InitializeFn = Arc<dyn Fn(&ParamValues) -> Result<Context> + Send + Sync>;

/// Definition of a context initialization API for a provider.
#[derive(Clone)]
pub struct InitializerSpec {
    pub id: String,
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub initialize: InitializeFn,
}

impl fmt::Debug for InitializerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitializerSpec")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Definition of a workflow with parameters and execution function.
#[derive(Clone)]
pub struct WorkflowSpec {
    pub id: String,
    pub name: String,
    pub description: String,
    pub params: Vec<ParamSpec>,
    pub run: RunFn,
}

impl WorkflowSpec {
    pub fn invoke(&self, call: WorkflowCall<'_>) -> Result<Value> {
        (self.run)(call)
    }

    pub fn param(&self, key: &str) -> Option<&ParamSpec> {
        self.params.iter().find(|spec| spec.key == key)
    }
}

impl fmt::Debug for WorkflowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowSpec")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("description", &self.description)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Full provider definition consumed by generic renderers.
#[derive(Debug, Clone)]
pub struct AppSpec {
    pub app_name: String,
    pub initializers: Vec<InitializerSpec>,
    pub workflows: Vec<WorkflowSpec>,
}

impl AppSpec {
    pub fn workflow(&self, id: &str) -> Option<&WorkflowSpec> {
        self.workflows.iter().find(|workflow| workflow.id == id)
    }

    pub fn workflow_ids(&self) -> Vec<&str> {
        self.workflows.iter().map(|workflow| workflow.id.as_str()).collect()
    }

    /// Init parameters across all initializers, in declaration order.
    pub fn init_params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.initializers.iter().flat_map(|initializer| initializer.params.iter())
    }
}
