//! Parameter interpreter: derives a workflow's parameter schema.
//!
//! Sources are tried in a fixed order and the first one present wins:
//!
//! 1. `params` on the workflow descriptor,
//! 2. the module-level parameter mapping,
//! 3. defaults inferred from the declared run signature.
//!
//! Sources are never merged. A module without any of them runs with an empty
//! schema.

use renderflow_types::{JsonMap, ParamOptions, ParamSpec, ParamType};
use renderflow_util::title_label;
use serde_json::Value;
use tracing::warn;

use crate::{RegistryError, WorkflowModule};

/// Signature names that carry runtime plumbing rather than user parameters.
const RESERVED_SIGNATURE_NAMES: [&str; 6] = ["signal_data", "metadata", "context", "kwargs", "args", "self"];

/// A parameter schema as authored by a provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSource {
    /// Ready-made specs, returned as-is.
    Specs(Vec<ParamSpec>),
    /// A mapping (`key -> config`) or a list of spec objects.
    Document(Value),
}

impl From<Vec<ParamSpec>> for ParamSource {
    fn from(specs: Vec<ParamSpec>) -> Self {
        ParamSource::Specs(specs)
    }
}

impl From<Value> for ParamSource {
    fn from(document: Value) -> Self {
        ParamSource::Document(document)
    }
}

/// One declared argument of a workflow's run function.
#[derive(Debug, Clone, PartialEq)]
pub struct SignatureParam {
    pub name: String,
    pub default: Option<Value>,
    /// Catch-all arguments (`*args`/`**kwargs` style) never become parameters.
    pub variadic: bool,
}

impl SignatureParam {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            variadic: false,
        }
    }

    pub fn with_default(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(default.into()),
            variadic: false,
        }
    }

    pub fn variadic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
            variadic: true,
        }
    }
}

/// Resolves the parameter schema of a workflow module.
pub fn interpret_params(module: &dyn WorkflowModule) -> Result<Vec<ParamSpec>, RegistryError> {
    if let Some(descriptor) = module.descriptor()
        && let Some(params) = descriptor.params
    {
        return coerce_param_specs(&params);
    }
    if let Some(params) = module.module_params() {
        return coerce_param_specs(&params);
    }
    Ok(infer_params_from_signature(&module.signature()))
}

/// Normalizes any authored schema form into specs.
pub fn coerce_param_specs(source: &ParamSource) -> Result<Vec<ParamSpec>, RegistryError> {
    match source {
        ParamSource::Specs(specs) => Ok(specs.clone()),
        ParamSource::Document(Value::Null) => Ok(Vec::new()),
        ParamSource::Document(Value::Object(mapping)) => param_specs_from_mapping(mapping),
        ParamSource::Document(Value::Array(items)) => {
            let mut specs = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Object(_) => {
                        let mut spec: ParamSpec = serde_json::from_value(item.clone())
                            .map_err(|error| RegistryError::InvalidParams(error.to_string()))?;
                        if spec.label.trim().is_empty() {
                            spec.label = spec.key.clone();
                        }
                        specs.push(spec);
                    }
                    other => warn!(entry = %other, "ignoring parameter entry that is not an object"),
                }
            }
            Ok(specs)
        }
        ParamSource::Document(other) => Err(RegistryError::InvalidParams(format!(
            "expected a mapping or a list of parameter objects, got {other}"
        ))),
    }
}

/// Builds specs from `key -> {type, default, label, help|description, min, max, step, options}`.
pub fn param_specs_from_mapping(mapping: &JsonMap) -> Result<Vec<ParamSpec>, RegistryError> {
    let empty = JsonMap::new();
    let mut specs = Vec::with_capacity(mapping.len());
    for (key, config) in mapping {
        let config = match config {
            Value::Object(map) => map,
            Value::Null => &empty,
            other => {
                return Err(RegistryError::InvalidParams(format!(
                    "parameter '{key}' must be described by an object, got {other}"
                )));
            }
        };
        let text = |name: &str| config.get(name).and_then(Value::as_str).map(str::to_string);
        let number = |name: &str| config.get(name).and_then(Value::as_f64);
        let options = match config.get("options") {
            Some(Value::Array(items)) => ParamOptions::Static(items.clone()),
            _ => ParamOptions::default(),
        };
        let r#type = text("type")
            .map(|tag| tag.parse::<ParamType>().unwrap_or_default())
            .unwrap_or_default();
        specs.push(ParamSpec {
            key: key.clone(),
            label: text("label").unwrap_or_else(|| key.clone()),
            r#type,
            default: config.get("default").filter(|value| !value.is_null()).cloned(),
            min: number("min"),
            max: number("max"),
            step: number("step"),
            options,
            help: text("help").or_else(|| text("description")).unwrap_or_default(),
        });
    }
    Ok(specs)
}

/// Infers specs from a run signature: booleans become checkboxes, numbers
/// become number inputs, everything else is text.
pub fn infer_params_from_signature(signature: &[SignatureParam]) -> Vec<ParamSpec> {
    signature
        .iter()
        .filter(|param| !param.variadic && !RESERVED_SIGNATURE_NAMES.contains(&param.name.as_str()))
        .map(|param| {
            let r#type = match &param.default {
                Some(Value::Bool(_)) => ParamType::Checkbox,
                Some(Value::Number(_)) => ParamType::Number,
                _ => ParamType::Text,
            };
            ParamSpec {
                key: param.name.clone(),
                label: title_label(&param.name),
                r#type,
                default: param.default.clone(),
                min: None,
                max: None,
                step: None,
                options: ParamOptions::default(),
                help: String::new(),
            }
        })
        .collect()
}
