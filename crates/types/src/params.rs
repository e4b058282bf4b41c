//! Declarative parameter definitions used to build CLI flags and UI widgets.

use std::{fmt, str::FromStr, sync::Arc};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::ParamValues;

/// Widget/coercion kind of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Number,
    Checkbox,
    Dropdown,
    /// Free-form text; also the fallback for unknown type tags.
    #[default]
    #[serde(other)]
    Text,
}

impl ParamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamType::Text => "text",
            ParamType::Number => "number",
            ParamType::Checkbox => "checkbox",
            ParamType::Dropdown => "dropdown",
        }
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "number" => ParamType::Number,
            "checkbox" => ParamType::Checkbox,
            "dropdown" => ParamType::Dropdown,
            _ => ParamType::Text,
        })
    }
}

/// A resolved dropdown entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropdownOption {
    pub label: String,
    pub value: Value,
}

/// Callback producing dropdown options from the values entered so far.
pub type OptionsFn = Arc<dyn Fn(&ParamValues, &ParamSpec) -> Vec<Value> + Send + Sync>;

/// Options attached to a parameter.
///
/// Static lists hold raw entries (`{label, value}` objects or bare scalars);
/// normalization into [`DropdownOption`]s happens at resolution time.
#[derive(Clone)]
pub enum ParamOptions {
    Static(Vec<Value>),
    Dynamic(OptionsFn),
}

impl Default for ParamOptions {
    fn default() -> Self {
        ParamOptions::Static(Vec::new())
    }
}

impl ParamOptions {
    pub fn is_empty(&self) -> bool {
        matches!(self, ParamOptions::Static(items) if items.is_empty())
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ParamOptions::Dynamic(_))
    }
}

impl fmt::Debug for ParamOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamOptions::Static(items) => f.debug_tuple("Static").field(items).finish(),
            ParamOptions::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

impl PartialEq for ParamOptions {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ParamOptions::Static(a), ParamOptions::Static(b)) => a == b,
            (ParamOptions::Dynamic(a), ParamOptions::Dynamic(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Serialize for ParamOptions {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParamOptions::Static(items) => items.serialize(serializer),
            // Dynamic options only exist in-process; describe them as an empty list.
            ParamOptions::Dynamic(_) => Vec::<Value>::new().serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ParamOptions {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Option::<Vec<Value>>::deserialize(deserializer)?;
        Ok(ParamOptions::Static(items.unwrap_or_default()))
    }
}

/// Declarative parameter definition for initializer and workflow inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Key the value is submitted under.
    pub key: String,
    /// Human-readable label; empty labels fall back to the key.
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub r#type: ParamType,
    #[serde(default)]
    pub default: Option<Value>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub step: Option<f64>,
    #[serde(default)]
    pub options: ParamOptions,
    /// Help text; `description` is accepted as an alias.
    #[serde(default, alias = "description")]
    pub help: String,
}

impl ParamSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            r#type: ParamType::Text,
            default: None,
            min: None,
            max: None,
            step: None,
            options: ParamOptions::default(),
            help: String::new(),
        }
    }

    pub fn with_type(mut self, r#type: ParamType) -> Self {
        self.r#type = r#type;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>, step: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self.step = step;
        self
    }

    pub fn with_options(mut self, options: ParamOptions) -> Self {
        self.options = options;
        self
    }

    /// Label to display, falling back to the key when none was authored.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() { &self.key } else { &self.label }
    }
}
