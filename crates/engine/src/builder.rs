//! Result builder used by provider workflows.

use serde_json::{Value, json};

/// Collects ordered text, table, plot, and code results.
///
/// ```
/// use renderflow_engine::Workflow;
/// use serde_json::json;
///
/// let mut workflow = Workflow::new("Stats", "Summary statistics");
/// workflow
///     .add_text("Loaded 3 rows")
///     .add_table("Rows", json!({"x": [1, 2, 3]}));
/// assert_eq!(workflow.build()["results"].as_array().map(Vec::len), Some(2));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    pub name: String,
    pub description: String,
    results: Vec<Value>,
}

impl Workflow {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            results: Vec::new(),
        }
    }

    /// Adds a text item; a single string becomes one line.
    pub fn add_text(&mut self, content: impl Into<TextContent>) -> &mut Self {
        let TextContent(lines) = content.into();
        self.results.push(json!({"type": "text", "content": lines}));
        self
    }

    pub fn add_table(&mut self, title: impl Into<String>, data: Value) -> &mut Self {
        self.results.push(json!({"type": "table", "title": title.into(), "data": data}));
        self
    }

    pub fn add_plot(&mut self, figure: Value) -> &mut Self {
        self.results.push(json!({"type": "plot", "figure": figure}));
        self
    }

    /// Adds a plot with an explicit export id and the `save` flag.
    pub fn add_named_plot(&mut self, id: impl Into<String>, title: Option<&str>, figure: Value, save: bool) -> &mut Self {
        let mut item = json!({"type": "plot", "figure": figure, "id": id.into(), "save": save});
        if let Some(title) = title {
            item["title"] = Value::String(title.to_string());
        }
        self.results.push(item);
        self
    }

    pub fn add_code(&mut self, content: impl Into<TextContent>, language: impl Into<String>) -> &mut Self {
        let TextContent(lines) = content.into();
        self.results.push(json!({"type": "code", "content": lines, "language": language.into()}));
        self
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// The result payload: `{"results": [...]}`.
    pub fn build(&self) -> Value {
        json!({"results": self.results})
    }

    pub fn clear(&mut self) -> &mut Self {
        self.results.clear();
        self
    }
}

/// Lines of a text or code item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextContent(pub Vec<String>);

impl From<&str> for TextContent {
    fn from(line: &str) -> Self {
        TextContent(vec![line.to_string()])
    }
}

impl From<String> for TextContent {
    fn from(line: String) -> Self {
        TextContent(vec![line])
    }
}

impl From<Vec<String>> for TextContent {
    fn from(lines: Vec<String>) -> Self {
        TextContent(lines)
    }
}

impl From<&[&str]> for TextContent {
    fn from(lines: &[&str]) -> Self {
        TextContent(lines.iter().map(|line| line.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for TextContent {
    fn from(lines: [&str; N]) -> Self {
        TextContent(lines.iter().map(|line| line.to_string()).collect())
    }
}
