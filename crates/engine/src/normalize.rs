//! Result contract validation and normalization.
//!
//! Workflows return either the modern shape (`{"results": [...]}`) or the
//! legacy shape (`{"text": [...], "tables": [...], "plots": [...]}`). Both
//! normalize into an ordered list of [`ResultItem`]s.

use renderflow_types::{JsonMap, ResultItem, TableData, VALID_RESULT_TYPES, lines_from_value, scalar_to_string};
use serde_json::Value;

use crate::error::{InvalidWorkflowResults, json_type_name};

const LEGACY_KEYS: [&str; 3] = ["text", "tables", "plots"];

/// Checks a raw workflow return value against the result contract.
pub fn validate_results_contract(raw: &Value) -> Result<(), InvalidWorkflowResults> {
    let map = match raw {
        Value::Null => return Err(InvalidWorkflowResults::Null),
        Value::Object(map) => map,
        other => return Err(InvalidWorkflowResults::NotAMapping(json_type_name(other))),
    };

    let has_modern = map.contains_key("results");
    let has_legacy = LEGACY_KEYS.iter().any(|key| map.contains_key(*key));
    if !has_modern && !has_legacy && !map.is_empty() {
        let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
        keys.sort_unstable();
        return Err(InvalidWorkflowResults::MissingKeys(keys.join(", ")));
    }
    if !has_modern {
        return Ok(());
    }

    let items = match map.get("results") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Array(items)) => items,
        Some(other) => return Err(InvalidWorkflowResults::ResultsNotAList(json_type_name(other))),
    };
    for (offset, item) in items.iter().enumerate() {
        let index = offset + 1;
        let Value::Object(item) = item else {
            return Err(InvalidWorkflowResults::ItemNotAMapping {
                index,
                found: json_type_name(item),
            });
        };
        let item_type = item.get("type").and_then(Value::as_str);
        match item_type {
            Some(kind) if VALID_RESULT_TYPES.contains(&kind) => {}
            _ => {
                return Err(InvalidWorkflowResults::InvalidType {
                    index,
                    found: describe_type_tag(item.get("type")),
                });
            }
        }
        if item_type == Some("plot") && !item.contains_key("figure") {
            return Err(InvalidWorkflowResults::PlotMissingFigure { index });
        }
    }
    Ok(())
}

fn describe_type_tag(tag: Option<&Value>) -> String {
    match tag {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::String(text)) => format!("'{text}'"),
        Some(other) => other.to_string(),
    }
}

/// Validates and normalizes a raw workflow return value.
///
/// An empty mapping and `{"results": null}` both yield no items.
pub fn normalize_results(raw: &Value) -> Result<Vec<ResultItem>, InvalidWorkflowResults> {
    validate_results_contract(raw)?;
    let Value::Object(map) = raw else {
        return Ok(Vec::new());
    };
    if map.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(results) = map.get("results") {
        let Value::Array(items) = results else {
            return Ok(Vec::new());
        };
        return items
            .iter()
            .enumerate()
            .map(|(offset, item)| parse_item(offset + 1, item))
            .collect();
    }

    normalize_legacy(map)
}

fn parse_item(index: usize, item: &Value) -> Result<ResultItem, InvalidWorkflowResults> {
    let mut fields = item.as_object().cloned().unwrap_or_default();
    // Explicit nulls mean "not set"; the figure is the only field where null is kept.
    fields.retain(|key, value| key == "figure" || !value.is_null());
    serde_json::from_value(Value::Object(fields)).map_err(|error| InvalidWorkflowResults::MalformedItem {
        index,
        reason: error.to_string(),
    })
}

fn normalize_legacy(map: &JsonMap) -> Result<Vec<ResultItem>, InvalidWorkflowResults> {
    let mut items = Vec::new();

    for text in legacy_entries(map, "text") {
        items.push(ResultItem::Text {
            content: lines_from_value(text),
        });
    }

    for (offset, table) in legacy_entries(map, "tables").enumerate() {
        let title = match table.get("title") {
            None | Some(Value::Null) => "Table".to_string(),
            Some(title) => scalar_to_string(title),
        };
        let data = match table.get("data") {
            None | Some(Value::Null) => TableData::default(),
            Some(data) => serde_json::from_value(data.clone()).map_err(|error| InvalidWorkflowResults::MalformedLegacy {
                key: "tables",
                index: offset + 1,
                reason: error.to_string(),
            })?,
        };
        items.push(ResultItem::Table { title, data });
    }

    for (offset, figure) in legacy_entries(map, "plots").enumerate() {
        items.push(ResultItem::Plot {
            figure: figure.clone(),
            id: Some(format!("figure_{}", offset + 1)),
            title: None,
            save: true,
        });
    }

    Ok(items)
}

fn legacy_entries<'a>(map: &'a JsonMap, key: &str) -> Box<dyn Iterator<Item = &'a Value> + 'a> {
    match map.get(key) {
        None | Some(Value::Null) => Box::new(std::iter::empty()),
        Some(Value::Array(entries)) => Box::new(entries.iter()),
        Some(single) => Box::new(std::iter::once(single)),
    }
}

#[cfg(test)]
mod tests {
    use renderflow_types::ResultKind;
    use serde_json::json;

    use super::*;

    #[test]
    fn modern_items_pass_through() {
        let raw = json!({"results": [
            {"type": "text", "content": ["a", "b"]},
            {"type": "table", "title": "Stats", "data": {"x": [1, 2]}},
            {"type": "plot", "figure": {"data": []}, "id": "main", "save": false},
            {"type": "code", "content": "print(1)", "language": "python"},
        ]});
        let items = normalize_results(&raw).expect("normalize");
        let kinds: Vec<ResultKind> = items.iter().map(ResultItem::kind).collect();
        assert_eq!(kinds, [ResultKind::Text, ResultKind::Table, ResultKind::Plot, ResultKind::Code]);
        assert_eq!(
            items[2],
            ResultItem::Plot {
                figure: json!({"data": []}),
                id: Some("main".into()),
                title: None,
                save: false,
            }
        );
    }

    #[test]
    fn scalar_labels_and_truthy_save_flags_are_accepted() {
        let raw = json!({"results": [
            {"type": "plot", "figure": {"data": []}, "id": 1},
            {"type": "table", "title": 2024, "data": {"x": [1]}},
            {"type": "plot", "figure": {"data": []}, "save": 0},
        ]});
        let items = normalize_results(&raw).expect("normalize");
        assert!(matches!(&items[0], ResultItem::Plot { id: Some(id), save: true, .. } if id == "1"));
        assert!(matches!(&items[1], ResultItem::Table { title, .. } if title == "2024"));
        assert!(matches!(&items[2], ResultItem::Plot { save: true, .. }));
    }

    #[test]
    fn value_is_accepted_for_text_content() {
        let items = normalize_results(&json!({"results": [{"type": "text", "value": "hi"}]})).expect("normalize");
        assert_eq!(items, vec![ResultItem::text("hi")]);
    }

    #[test]
    fn legacy_shape_yields_one_item_per_entry() {
        let raw = json!({
            "text": ["one", "two"],
            "tables": [{"title": "T", "data": {"a": [1]}}, {}],
            "plots": [{"data": []}, {"data": [1]}],
        });
        let items = normalize_results(&raw).expect("normalize");
        assert_eq!(items.len(), 6);
        assert_eq!(items[0], ResultItem::text("one"));
        assert!(matches!(&items[3], ResultItem::Table { title, data } if title == "Table" && data.is_empty()));
        assert!(matches!(&items[5], ResultItem::Plot { id: Some(id), .. } if id == "figure_2"));
    }

    #[test]
    fn empty_payloads_yield_nothing() {
        assert!(normalize_results(&json!({})).expect("empty").is_empty());
        assert!(normalize_results(&json!({"results": null})).expect("null results").is_empty());
    }

    #[test]
    fn contract_violations_are_reported() {
        assert_eq!(normalize_results(&Value::Null).unwrap_err(), InvalidWorkflowResults::Null);
        assert_eq!(
            normalize_results(&json!([1])).unwrap_err(),
            InvalidWorkflowResults::NotAMapping("list")
        );

        let err = normalize_results(&json!({"zeta": 1, "alpha": 2})).unwrap_err();
        assert!(err.to_string().ends_with("Received keys: alpha, zeta"), "{err}");

        let err = normalize_results(&json!({"results": {"type": "text"}})).unwrap_err();
        assert_eq!(err, InvalidWorkflowResults::ResultsNotAList("mapping"));

        let err = normalize_results(&json!({"results": [{"type": "text"}, {"type": "chart"}]})).unwrap_err();
        assert_eq!(err.to_string(), "Result item #2 has invalid type 'chart'. Allowed: text, table, plot, code");

        let err = normalize_results(&json!({"results": [{"type": "plot"}]})).unwrap_err();
        assert_eq!(err, InvalidWorkflowResults::PlotMissingFigure { index: 1 });
    }
}
