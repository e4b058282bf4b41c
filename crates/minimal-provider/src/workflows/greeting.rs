//! Greeting workflow. Parameters come from the module-level mapping.

use anyhow::Result;
use renderflow_engine::Workflow;
use renderflow_registry::{ParamSource, WorkflowModule};
use renderflow_types::WorkflowCall;
use serde_json::{Value, json};

pub struct Greeting;

impl WorkflowModule for Greeting {
    fn id(&self) -> &str {
        "greeting"
    }

    fn workflow_name(&self) -> Option<String> {
        Some("Greeting".to_string())
    }

    fn workflow_description(&self) -> Option<String> {
        Some("Greets the configured name and shows the provider context.".to_string())
    }

    fn module_params(&self) -> Option<ParamSource> {
        Some(ParamSource::Document(json!({
            "salutation": {
                "type": "dropdown",
                "default": "Hello",
                "options": ["Hello", "Hi", {"label": "Good day", "value": "Good day"}],
                "description": "Word used to open the greeting.",
            },
            "repeat": {
                "type": "number",
                "default": 1,
                "min": 1,
                "max": 5,
                "step": 1,
                "description": "How many times to repeat the greeting.",
            },
            "shout": {
                "label": "Shout",
                "type": "checkbox",
                "default": false,
            },
        })))
    }

    fn run_workflow(&self, call: WorkflowCall<'_>) -> Result<Value> {
        let name = call.context.get("name").and_then(Value::as_str).unwrap_or("World");
        let salutation = call.str_value("salutation").unwrap_or("Hello");
        let repeat = call.f64_value("repeat").unwrap_or(1.0).clamp(1.0, 5.0) as usize;
        let shout = call.bool_value("shout").unwrap_or(false);

        let mut line = format!("{salutation}, {name}!");
        if shout {
            line = line.to_uppercase();
        }

        let mut workflow = Workflow::new("Greeting", "");
        workflow.add_text(vec![line; repeat]);
        workflow.add_code(
            serde_json::to_string_pretty(&Value::Object(call.context.clone()))?.as_str(),
            "json",
        );
        Ok(workflow.build())
    }
}
