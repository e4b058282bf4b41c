//! Canonical result items produced by a workflow execution.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::JsonMap;

/// Result item `type` tags accepted in workflow payloads.
pub const VALID_RESULT_TYPES: [&str; 4] = ["text", "table", "plot", "code"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Text,
    Table,
    Plot,
    Code,
}

/// One renderable piece of workflow output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ResultItem {
    Text {
        #[serde(default, alias = "value", deserialize_with = "deserialize_lines")]
        content: Vec<String>,
    },
    Table {
        #[serde(default = "default_table_title", deserialize_with = "deserialize_scalar")]
        title: String,
        #[serde(default)]
        data: TableData,
    },
    Plot {
        /// Plotly-style figure document (`{"data": [...], "layout": {...}}`).
        figure: Value,
        #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_optional_scalar")]
        id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "deserialize_optional_scalar")]
        title: Option<String>,
        /// Only an explicit `false` keeps the plot out of per-figure exports.
        #[serde(default = "default_save", deserialize_with = "deserialize_save")]
        save: bool,
    },
    Code {
        #[serde(default, deserialize_with = "deserialize_lines")]
        content: Vec<String>,
        #[serde(default = "default_language", deserialize_with = "deserialize_scalar")]
        language: String,
    },
}

impl ResultItem {
    pub fn text(content: impl Into<String>) -> Self {
        ResultItem::Text {
            content: vec![content.into()],
        }
    }

    pub fn kind(&self) -> ResultKind {
        match self {
            ResultItem::Text { .. } => ResultKind::Text,
            ResultItem::Table { .. } => ResultKind::Table,
            ResultItem::Plot { .. } => ResultKind::Plot,
            ResultItem::Code { .. } => ResultKind::Code,
        }
    }

    pub fn is_plot(&self) -> bool {
        self.kind() == ResultKind::Plot
    }
}

fn default_table_title() -> String {
    "Table".to_string()
}

fn default_save() -> bool {
    true
}

fn default_language() -> String {
    "text".to_string()
}

/// Flattens a string or a list of values into display lines.
pub fn lines_from_value(value: &Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(text) => vec![text.clone()],
        Value::Array(items) => items.iter().map(scalar_to_string).collect(),
        other => vec![scalar_to_string(other)],
    }
}

/// Renders a JSON value the way it reads in a report: strings unquoted.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Any scalar, rendered as its display string.
fn deserialize_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(scalar_to_string(&value))
}

fn deserialize_optional_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok((!value.is_null()).then(|| scalar_to_string(&value)))
}

fn deserialize_save<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value != Value::Bool(false))
}

fn deserialize_lines<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(lines_from_value(&value))
}

/// Tabular payload: either a column mapping or a list of records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableData {
    /// `{"column": [values...]}`
    Columns(JsonMap),
    /// `[{"column": value}, ...]` or `[[v1, v2], ...]`
    Records(Vec<Value>),
}

impl Default for TableData {
    fn default() -> Self {
        TableData::Columns(JsonMap::new())
    }
}

impl TableData {
    /// Headers plus row-major cells. Ragged columns are padded with nulls.
    pub fn grid(&self) -> (Vec<String>, Vec<Vec<Value>>) {
        match self {
            TableData::Columns(columns) => {
                let headers: Vec<String> = columns.keys().cloned().collect();
                let column_values: Vec<Vec<Value>> = columns
                    .values()
                    .map(|column| match column {
                        Value::Array(values) => values.clone(),
                        Value::Null => Vec::new(),
                        scalar => vec![scalar.clone()],
                    })
                    .collect();
                let row_count = column_values.iter().map(Vec::len).max().unwrap_or(0);
                let rows = (0..row_count)
                    .map(|row| {
                        column_values
                            .iter()
                            .map(|column| column.get(row).cloned().unwrap_or(Value::Null))
                            .collect()
                    })
                    .collect();
                (headers, rows)
            }
            TableData::Records(records) => {
                let mut headers: Vec<String> = Vec::new();
                for record in records {
                    match record {
                        Value::Object(map) => {
                            for key in map.keys() {
                                if !headers.contains(key) {
                                    headers.push(key.clone());
                                }
                            }
                        }
                        Value::Array(cells) => {
                            for index in headers.len()..cells.len() {
                                headers.push(index.to_string());
                            }
                        }
                        _ => {
                            if headers.is_empty() {
                                headers.push("value".to_string());
                            }
                        }
                    }
                }
                let rows = records
                    .iter()
                    .map(|record| match record {
                        Value::Object(map) => headers.iter().map(|h| map.get(h).cloned().unwrap_or(Value::Null)).collect(),
                        Value::Array(cells) => (0..headers.len()).map(|i| cells.get(i).cloned().unwrap_or(Value::Null)).collect(),
                        scalar => vec![scalar.clone()],
                    })
                    .collect();
                (headers, rows)
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            TableData::Columns(columns) => columns.is_empty(),
            TableData::Records(records) => records.is_empty(),
        }
    }
}

/// Ordered result items of one workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub workflow_id: String,
    pub workflow_name: String,
    pub items: Vec<ResultItem>,
}

impl ExecutionResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn plots(&self) -> impl Iterator<Item = &ResultItem> {
        self.items.iter().filter(|item| item.is_plot())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_item_accepts_value_alias_and_plain_string() {
        let item: ResultItem = serde_json::from_value(json!({"type": "text", "value": "hi"})).expect("deserialize text");
        assert_eq!(item, ResultItem::text("hi"));
    }

    #[test]
    fn plot_item_defaults_to_saved() {
        let item: ResultItem =
            serde_json::from_value(json!({"type": "plot", "figure": {"data": []}, "id": "fig1"})).expect("deserialize plot");
        match item {
            ResultItem::Plot { save, id, .. } => {
                assert!(save);
                assert_eq!(id.as_deref(), Some("fig1"));
            }
            other => panic!("expected plot, got {other:?}"),
        }
    }

    #[test]
    fn plot_labels_accept_any_scalar_and_only_false_skips_export() {
        let item: ResultItem =
            serde_json::from_value(json!({"type": "plot", "figure": {}, "id": 1, "title": 2.5, "save": 0})).expect("deserialize plot");
        assert_eq!(
            item,
            ResultItem::Plot {
                figure: json!({}),
                id: Some("1".into()),
                title: Some("2.5".into()),
                save: true,
            }
        );

        let item: ResultItem = serde_json::from_value(json!({"type": "plot", "figure": {}, "save": false})).expect("deserialize plot");
        assert!(matches!(item, ResultItem::Plot { save: false, .. }));
    }

    #[test]
    fn code_item_splits_content_lines_and_defaults_language() {
        let item: ResultItem = serde_json::from_value(json!({"type": "code", "content": ["a = 1", 2]})).expect("deserialize code");
        assert_eq!(
            item,
            ResultItem::Code {
                content: vec!["a = 1".into(), "2".into()],
                language: "text".into()
            }
        );
    }

    #[test]
    fn column_tables_keep_column_order_and_pad_ragged_rows() {
        let data: TableData = serde_json::from_value(json!({"b": [1, 2], "a": ["x"]})).expect("deserialize table");
        let (headers, rows) = data.grid();
        assert_eq!(headers, vec!["b", "a"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec![json!(2), Value::Null]);
    }

    #[test]
    fn record_tables_collect_headers_in_first_seen_order() {
        let data: TableData =
            serde_json::from_value(json!([{"name": "a", "size": 1}, {"size": 2, "kind": "z"}])).expect("deserialize records");
        let (headers, rows) = data.grid();
        assert_eq!(headers, vec!["name", "size", "kind"]);
        assert_eq!(rows[1], vec![Value::Null, json!(2), json!("z")]);
    }
}
