//! Parameter forms: one editable field per [`ParamSpec`].
//!
//! Number fields keep their text as typed and are coerced when the form is
//! submitted; stepping honors `min`, `max` and `step`. Dropdown options are
//! re-resolved against the other values whenever the form changes, so dynamic
//! options follow the inputs they depend on.

use anyhow::{Result, bail};
use renderflow_engine::{coerce_value, resolve_dropdown_options};
use renderflow_types::{DropdownOption, ParamSpec, ParamType, ParamValues, scalar_to_string};
use serde_json::Value;

use crate::text_input::TextInputState;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(TextInputState),
    Number(TextInputState),
    Checkbox(bool),
    Dropdown { options: Vec<DropdownOption>, selected: usize },
}

/// A single input bound to its parameter spec.
#[derive(Debug, Clone)]
pub struct Field {
    pub spec: ParamSpec,
    pub value: FieldValue,
}

impl Field {
    pub fn new(spec: ParamSpec) -> Self {
        let default = spec.default.as_ref().filter(|value| !value.is_null());
        let value = match spec.r#type {
            ParamType::Text => FieldValue::Text(TextInputState::with_text(default.map(scalar_to_string).unwrap_or_default())),
            ParamType::Number => {
                let initial = default
                    .map(scalar_to_string)
                    .or_else(|| spec.min.map(|min| format_number(min, spec.step)))
                    .unwrap_or_default();
                FieldValue::Number(TextInputState::with_text(initial))
            }
            ParamType::Checkbox => FieldValue::Checkbox(default.is_some_and(|value| match value {
                Value::Bool(flag) => *flag,
                other => matches!(scalar_to_string(other).to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"),
            })),
            ParamType::Dropdown => FieldValue::Dropdown {
                options: Vec::new(),
                selected: 0,
            },
        };
        Self { spec, value }
    }

    pub fn label(&self) -> &str {
        self.spec.display_label()
    }

    /// Text shown in the form row.
    pub fn display_value(&self) -> String {
        match &self.value {
            FieldValue::Text(input) | FieldValue::Number(input) => input.input().to_string(),
            FieldValue::Checkbox(checked) => if *checked { "[x]" } else { "[ ]" }.to_string(),
            FieldValue::Dropdown { options, selected } => options
                .get(*selected)
                .map(|option| format!("< {} >", option.label))
                .unwrap_or_default(),
        }
    }

    pub fn text_input_mut(&mut self) -> Option<&mut TextInputState> {
        match &mut self.value {
            FieldValue::Text(input) | FieldValue::Number(input) => Some(input),
            _ => None,
        }
    }

    pub fn text_input(&self) -> Option<&TextInputState> {
        match &self.value {
            FieldValue::Text(input) | FieldValue::Number(input) => Some(input),
            _ => None,
        }
    }

    /// The submitted value; `None` for a blank number field.
    pub fn value(&self) -> Result<Option<Value>> {
        match &self.value {
            FieldValue::Text(input) => Ok(Some(Value::String(input.input().to_string()))),
            FieldValue::Number(input) => {
                if input.is_blank() {
                    return Ok(None);
                }
                let value = coerce_value(&self.spec, input.input())?;
                let number = value.as_f64().unwrap_or_default();
                if let Some(min) = self.spec.min
                    && number < min
                {
                    bail!("{} must be at least {}", self.label(), format_number(min, self.spec.step));
                }
                if let Some(max) = self.spec.max
                    && number > max
                {
                    bail!("{} must be at most {}", self.label(), format_number(max, self.spec.step));
                }
                Ok(Some(value))
            }
            FieldValue::Checkbox(checked) => Ok(Some(Value::Bool(*checked))),
            FieldValue::Dropdown { options, selected } => Ok(options.get(*selected).map(|option| option.value.clone())),
        }
    }

    /// Steps a number by `step` (default 1) within bounds, cycles a dropdown,
    /// or toggles a checkbox. Text fields are left alone.
    pub fn step(&mut self, direction: i32) -> bool {
        let spec = &self.spec;
        match &mut self.value {
            FieldValue::Number(input) => {
                let current = input
                    .input()
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .or_else(|| spec.default.as_ref().and_then(Value::as_f64))
                    .or(spec.min)
                    .unwrap_or_default();
                let mut next = current + spec.step.unwrap_or(1.0) * f64::from(direction);
                if let Some(min) = spec.min {
                    next = next.max(min);
                }
                if let Some(max) = spec.max {
                    next = next.min(max);
                }
                input.set_input(format_number(next, spec.step));
                true
            }
            FieldValue::Checkbox(checked) => {
                *checked = !*checked;
                true
            }
            FieldValue::Dropdown { options, selected } if !options.is_empty() => {
                let len = options.len() as i64;
                *selected = (*selected as i64 + i64::from(direction)).rem_euclid(len) as usize;
                true
            }
            _ => false,
        }
    }
}

/// Formats with as many decimals as `step` carries; integral values print bare.
fn format_number(value: f64, step: Option<f64>) -> String {
    let decimals = step
        .map(|step| step.to_string())
        .and_then(|text| text.split_once('.').map(|(_, fraction)| fraction.len()))
        .unwrap_or(0);
    if decimals == 0 && value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    if decimals == 0 {
        return value.to_string();
    }
    format!("{value:.decimals$}")
}

/// Ordered fields with a selection cursor.
#[derive(Debug, Clone, Default)]
pub struct ParamForm {
    pub fields: Vec<Field>,
    pub selected: usize,
}

impl ParamForm {
    pub fn new(specs: &[ParamSpec]) -> Self {
        let mut form = Self {
            fields: specs.iter().cloned().map(Field::new).collect(),
            selected: 0,
        };
        form.refresh_options();
        form
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn selected_field(&self) -> Option<&Field> {
        self.fields.get(self.selected)
    }

    pub fn selected_field_mut(&mut self) -> Option<&mut Field> {
        self.fields.get_mut(self.selected)
    }

    pub fn select_next(&mut self) {
        if !self.fields.is_empty() {
            self.selected = (self.selected + 1) % self.fields.len();
        }
    }

    pub fn select_previous(&mut self) {
        if !self.fields.is_empty() {
            self.selected = (self.selected + self.fields.len() - 1) % self.fields.len();
        }
    }

    /// Values to submit. Fails on the first field that does not coerce.
    pub fn values(&self) -> Result<ParamValues> {
        let mut values = ParamValues::new();
        for field in &self.fields {
            if let Some(value) = field.value()? {
                values.insert(field.spec.key.clone(), value);
            }
        }
        Ok(values)
    }

    /// Best-effort values for option callbacks; fields that do not coerce are skipped.
    pub fn current_values(&self) -> ParamValues {
        self.fields
            .iter()
            .filter_map(|field| field.value().ok().flatten().map(|value| (field.spec.key.clone(), value)))
            .collect()
    }

    /// Re-resolves every dropdown, keeping the chosen value when it survives.
    pub fn refresh_options(&mut self) {
        let values = self.current_values();
        for field in &mut self.fields {
            let FieldValue::Dropdown { options, selected } = &mut field.value else {
                continue;
            };
            let previous = options.get(*selected).map(|option| option.value.clone());
            let resolved = resolve_dropdown_options(&field.spec, &values);
            let wanted = previous.or_else(|| field.spec.default.clone());
            *selected = wanted
                .and_then(|wanted| {
                    resolved
                        .iter()
                        .position(|option| option.value == wanted || scalar_to_string(&option.value) == scalar_to_string(&wanted))
                })
                .unwrap_or(0);
            *options = resolved;
        }
    }
}
