//! `KEY=VALUE` argument parsing and typed coercion against a schema.

use renderflow_types::{ParamOptions, ParamSpec, ParamType, ParamValues, scalar_to_string};
use serde_json::{Number, Value};

use crate::ExecutionError;

/// Splits `KEY=VALUE` arguments. The value may itself contain `=`.
pub fn parse_assignments(flag: &'static str, arguments: &[String]) -> Result<Vec<(String, String)>, ExecutionError> {
    arguments
        .iter()
        .map(|argument| {
            let malformed = || ExecutionError::MalformedArgument {
                flag,
                argument: argument.clone(),
            };
            let (key, value) = argument.split_once('=').ok_or_else(malformed)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(malformed());
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Coerces a raw string to the JSON value a parameter of `spec` expects.
pub fn coerce_value(spec: &ParamSpec, raw: &str) -> Result<Value, ExecutionError> {
    let invalid = || ExecutionError::InvalidValue {
        key: spec.key.clone(),
        expected: spec.r#type,
        value: raw.to_string(),
    };
    match spec.r#type {
        ParamType::Text => Ok(Value::String(raw.to_string())),
        ParamType::Number => parse_number(raw).ok_or_else(invalid),
        ParamType::Checkbox => parse_bool(raw).map(Value::Bool).ok_or_else(invalid),
        ParamType::Dropdown => Ok(match_static_option(&spec.options, raw).unwrap_or_else(|| Value::String(raw.to_string()))),
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if let Ok(integer) = trimmed.parse::<i64>() {
        return Some(Value::Number(integer.into()));
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// Keeps non-string option values (numbers, booleans) when the text matches one.
fn match_static_option(options: &ParamOptions, raw: &str) -> Option<Value> {
    let ParamOptions::Static(entries) = options else {
        return None;
    };
    entries.iter().find_map(|entry| {
        let value = match entry {
            Value::Object(map) => map.get("value").cloned().unwrap_or(Value::Null),
            scalar => scalar.clone(),
        };
        (scalar_to_string(&value) == raw).then_some(value)
    })
}

/// Coerces parsed assignments against `specs`; undeclared keys stay strings.
pub fn coerce_assignments(specs: &[ParamSpec], assignments: &[(String, String)]) -> Result<ParamValues, ExecutionError> {
    let mut values = ParamValues::new();
    for (key, raw) in assignments {
        let value = match specs.iter().find(|spec| &spec.key == key) {
            Some(spec) => coerce_value(spec, raw)?,
            None => Value::String(raw.clone()),
        };
        values.insert(key.clone(), value);
    }
    Ok(values)
}

/// Schema defaults in declaration order, overlaid with `overrides`.
pub fn values_with_defaults<'a>(specs: impl IntoIterator<Item = &'a ParamSpec>, overrides: &ParamValues) -> ParamValues {
    let mut values = ParamValues::new();
    for spec in specs {
        if let Some(default) = &spec.default {
            values.insert(spec.key.clone(), default.clone());
        }
    }
    for (key, value) in overrides {
        values.insert(key.clone(), value.clone());
    }
    values
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn specs() -> Vec<ParamSpec> {
        vec![
            ParamSpec::new("count", "Count").with_type(ParamType::Number).with_default(3),
            ParamSpec::new("ratio", "Ratio").with_type(ParamType::Number),
            ParamSpec::new("verbose", "Verbose").with_type(ParamType::Checkbox),
            ParamSpec::new("mode", "Mode")
                .with_type(ParamType::Dropdown)
                .with_options(ParamOptions::Static(vec![json!(1), json!({"label": "Two", "value": 2})])),
            ParamSpec::new("name", "Name").with_default("World"),
        ]
    }

    #[test]
    fn assignments_split_on_first_equals() {
        let parsed = parse_assignments("--param", &["query=a=b".to_string(), "empty=".to_string()]).expect("parse");
        assert_eq!(parsed, [("query".into(), "a=b".into()), ("empty".into(), String::new())]);
    }

    #[test]
    fn malformed_assignments_are_rejected() {
        let err = parse_assignments("--init", &["novalue".to_string()]).unwrap_err();
        assert_eq!(err.to_string(), "invalid --init argument 'novalue'; expected KEY=VALUE");
        assert!(parse_assignments("--param", &["=x".to_string()]).is_err());
    }

    #[test]
    fn values_are_coerced_by_declared_type() {
        let assignments = vec![
            ("count".to_string(), "12".to_string()),
            ("ratio".to_string(), "0.25".to_string()),
            ("verbose".to_string(), "yes".to_string()),
            ("mode".to_string(), "2".to_string()),
            ("extra".to_string(), "7".to_string()),
        ];
        let values = coerce_assignments(&specs(), &assignments).expect("coerce");
        assert_eq!(values["count"], json!(12));
        assert_eq!(values["ratio"], json!(0.25));
        assert_eq!(values["verbose"], json!(true));
        assert_eq!(values["mode"], json!(2));
        assert_eq!(values["extra"], json!("7"));
    }

    #[test]
    fn uncoercible_values_name_the_parameter() {
        let err = coerce_assignments(&specs(), &[("count".into(), "many".into())]).unwrap_err();
        assert_eq!(err.to_string(), "parameter 'count' expects a number value, got 'many'");
        assert!(coerce_assignments(&specs(), &[("verbose".into(), "maybe".into())]).is_err());
    }

    #[test]
    fn defaults_fill_unset_values() {
        let mut overrides = ParamValues::new();
        overrides.insert("name".into(), json!("Ada"));
        let values = values_with_defaults(&specs(), &overrides);
        assert_eq!(values["count"], json!(3));
        assert_eq!(values["name"], json!("Ada"));
        assert!(!values.contains_key("ratio"));
    }
}
