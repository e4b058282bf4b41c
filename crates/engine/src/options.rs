//! Dropdown option resolution.

use renderflow_types::{DropdownOption, ParamOptions, ParamSpec, ParamValues, scalar_to_string};
use serde_json::Value;

/// Label shown when a dropdown resolves to no options.
pub const NO_OPTIONS_LABEL: &str = "(no options)";

/// Normalizes raw entries: `{label, value}` mappings or bare scalars.
pub fn normalize_dropdown_options(raw: &[Value]) -> Vec<DropdownOption> {
    raw.iter()
        .map(|entry| match entry {
            Value::Object(map) => {
                let value = map.get("value").cloned().unwrap_or(Value::Null);
                let label = map
                    .get("label")
                    .map(scalar_to_string)
                    .unwrap_or_else(|| scalar_to_string(&value));
                DropdownOption { label, value }
            }
            scalar => DropdownOption {
                label: scalar_to_string(scalar),
                value: scalar.clone(),
            },
        })
        .collect()
}

/// Resolves the options of `spec` against the values entered so far.
///
/// Never returns an empty list: an empty resolution becomes a single
/// `(no options)` placeholder with an empty value.
pub fn resolve_dropdown_options(spec: &ParamSpec, values: &ParamValues) -> Vec<DropdownOption> {
    let raw = match &spec.options {
        ParamOptions::Static(entries) => entries.clone(),
        ParamOptions::Dynamic(callback) => callback(values, spec),
    };
    let mut options = normalize_dropdown_options(&raw);
    if options.is_empty() {
        options.push(DropdownOption {
            label: NO_OPTIONS_LABEL.to_string(),
            value: Value::String(String::new()),
        });
    }
    options
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use renderflow_types::ParamType;
    use serde_json::json;

    use super::*;

    #[test]
    fn static_options_accept_mappings_and_scalars() {
        let spec = ParamSpec::new("mode", "Mode")
            .with_type(ParamType::Dropdown)
            .with_options(ParamOptions::Static(vec![json!("fast"), json!({"value": 2}), json!({"label": "Slow", "value": "slow"})]));
        let options = resolve_dropdown_options(&spec, &ParamValues::new());
        let labels: Vec<&str> = options.iter().map(|option| option.label.as_str()).collect();
        assert_eq!(labels, ["fast", "2", "Slow"]);
        assert_eq!(options[1].value, json!(2));
    }

    #[test]
    fn dynamic_options_see_current_values() {
        let spec = ParamSpec::new("channel", "Channel")
            .with_type(ParamType::Dropdown)
            .with_options(ParamOptions::Dynamic(Arc::new(|values: &ParamValues, _spec: &ParamSpec| {
                let count = values.get("channels").and_then(Value::as_u64).unwrap_or(0);
                (0..count).map(|index| json!(format!("ch{index}"))).collect()
            })));

        let mut values = ParamValues::new();
        values.insert("channels".into(), json!(2));
        let options = resolve_dropdown_options(&spec, &values);
        assert_eq!(options.len(), 2);
        assert_eq!(options[1].value, json!("ch1"));

        let empty = resolve_dropdown_options(&spec, &ParamValues::new());
        assert_eq!(
            empty,
            vec![DropdownOption {
                label: "(no options)".into(),
                value: json!(""),
            }]
        );
    }
}
