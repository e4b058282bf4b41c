//! Workflow executor: initializers, parameter values, invocation, normalization.

use std::time::Instant;

use renderflow_types::{AppSpec, Context, ExecutionResult, JsonMap, ParamValues, ProgressReporter, WorkflowCall, WorkflowSpec};
use renderflow_util::redact_json;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{ExecutionError, coerce_assignments, normalize_results, parse_assignments, values_with_defaults};

/// What to run and with which explicitly supplied values.
///
/// Values not present here fall back to the schema defaults at execution time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionRequest {
    pub workflow_id: String,
    pub init_values: ParamValues,
    pub param_values: ParamValues,
}

impl ExecutionRequest {
    pub fn new(workflow_id: impl Into<String>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            ..Self::default()
        }
    }

    /// Builds a request from repeated `--init K=V` and `--param K=V` arguments.
    ///
    /// `--init` keys no initializer declares but the workflow does are
    /// forwarded to the workflow parameters; explicit `--param` values win.
    pub fn from_cli_args(app: &AppSpec, workflow_id: &str, init_args: &[String], param_args: &[String]) -> Result<Self, ExecutionError> {
        let workflow = find_workflow(app, workflow_id)?;
        let init_params: Vec<_> = app.init_params().cloned().collect();

        let mut init_assignments = Vec::new();
        let mut forwarded = Vec::new();
        for (key, value) in parse_assignments("--init", init_args)? {
            let declared_by_initializer = init_params.iter().any(|spec| spec.key == key);
            if !declared_by_initializer && workflow.param(&key).is_some() {
                warn!(
                    parameter = %key,
                    workflow = %workflow.id,
                    "--init for a workflow parameter is deprecated; use --param instead"
                );
                forwarded.push((key, value));
            } else {
                init_assignments.push((key, value));
            }
        }

        let mut param_assignments = forwarded;
        param_assignments.extend(parse_assignments("--param", param_args)?);

        Ok(Self {
            workflow_id: workflow.id.clone(),
            init_values: coerce_assignments(&init_params, &init_assignments)?,
            param_values: coerce_assignments(&workflow.params, &param_assignments)?,
        })
    }
}

/// Looks up a workflow by id.
pub fn find_workflow<'a>(app: &'a AppSpec, workflow_id: &str) -> Result<&'a WorkflowSpec, ExecutionError> {
    app.workflow(workflow_id).ok_or_else(|| ExecutionError::UnknownWorkflow {
        workflow: workflow_id.to_string(),
        available: app.workflow_ids().join(", "),
    })
}

/// Runs every initializer in order and merges their contexts.
pub fn initialize_context(app: &AppSpec, init_values: &ParamValues) -> Result<Context, ExecutionError> {
    let mut context = Context::new();
    for initializer in &app.initializers {
        let values = values_with_defaults(&initializer.params, init_values);
        debug!(
            initializer = %initializer.id,
            values = %redact_json(&serde_json::Value::Object(values.clone())),
            "running initializer"
        );
        let produced = (initializer.initialize)(&values).map_err(|error| ExecutionError::Initializer {
            initializer: initializer.id.clone(),
            source: error.into(),
        })?;
        context.extend(produced);
    }
    Ok(context)
}

/// Metadata view handed to workflows.
///
/// `context["metadata"]` entries come first, then the other context keys,
/// then the parameter values; later sources override earlier ones.
pub fn invocation_metadata(context: &Context, params: &ParamValues) -> JsonMap {
    let mut metadata = JsonMap::new();
    if let Some(Value::Object(nested)) = context.get("metadata") {
        metadata.extend(nested.clone());
    }
    for (key, value) in context {
        if key != "metadata" {
            metadata.insert(key.clone(), value.clone());
        }
    }
    metadata.extend(params.clone());
    metadata
}

/// Runs one workflow with a context produced elsewhere.
pub fn run_workflow(
    workflow: &WorkflowSpec,
    context: &Context,
    param_values: &ParamValues,
    progress: &ProgressReporter,
) -> Result<ExecutionResult, ExecutionError> {
    let params = values_with_defaults(&workflow.params, param_values);
    let metadata = invocation_metadata(context, &params);
    debug!(
        workflow = %workflow.id,
        params = %redact_json(&serde_json::Value::Object(params.clone())),
        progress = progress.is_enabled(),
        "invoking workflow"
    );

    let started = Instant::now();
    let raw = workflow
        .invoke(WorkflowCall {
            context,
            params: &params,
            metadata: &metadata,
            progress,
        })
        .map_err(|error| ExecutionError::Workflow {
            workflow: workflow.id.clone(),
            source: error.into(),
        })?;
    let items = normalize_results(&raw)?;
    info!(
        workflow = %workflow.id,
        items = items.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "workflow finished"
    );

    Ok(ExecutionResult {
        workflow_id: workflow.id.clone(),
        workflow_name: workflow.name.clone(),
        items,
    })
}

/// Initializes the provider context, runs the workflow, and normalizes its results.
pub fn execute_workflow(app: &AppSpec, request: &ExecutionRequest, progress: &ProgressReporter) -> Result<ExecutionResult, ExecutionError> {
    let workflow = find_workflow(app, &request.workflow_id)?;
    let context = initialize_context(app, &request.init_values)?;
    run_workflow(workflow, &context, &request.param_values, progress)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use renderflow_types::{InitializerSpec, ParamSpec, ParamType, ResultItem};
    use serde_json::json;

    use super::*;

    fn app(run_result: Value) -> AppSpec {
        AppSpec {
            app_name: "Test".into(),
            initializers: vec![InitializerSpec {
                id: "default_initializer".into(),
                name: "Initialization".into(),
                description: String::new(),
                params: vec![ParamSpec::new("name", "Name").with_default("World")],
                initialize: Arc::new(|values: &ParamValues| -> anyhow::Result<Context> {
                    let mut context = Context::new();
                    context.insert("greeting".into(), json!(format!("Hello {}", values["name"].as_str().unwrap_or(""))));
                    context.insert("metadata".into(), json!({"source": "init", "limit": 1}));
                    Ok(context)
                }),
            }],
            workflows: vec![
                WorkflowSpec {
                    id: "fixed".into(),
                    name: "Fixed".into(),
                    description: String::new(),
                    params: Vec::new(),
                    run: Arc::new(move |_call: WorkflowCall<'_>| -> anyhow::Result<Value> { Ok(run_result.clone()) }),
                },
                WorkflowSpec {
                    id: "echo".into(),
                    name: "Echo".into(),
                    description: String::new(),
                    params: vec![
                        ParamSpec::new("limit", "Limit").with_type(ParamType::Number).with_default(5),
                        ParamSpec::new("flag", "Flag").with_type(ParamType::Checkbox),
                    ],
                    run: Arc::new(|call: WorkflowCall<'_>| -> anyhow::Result<Value> {
                        Ok(json!({"results": [
                            {"type": "text", "content": call.context["greeting"].clone()},
                            {"type": "code", "content": serde_json::to_string(&Value::Object(call.metadata.clone()))?, "language": "json"},
                            {"type": "code", "content": serde_json::to_string(&Value::Object(call.params.clone()))?, "language": "json"},
                        ]}))
                    }),
                },
                WorkflowSpec {
                    id: "broken".into(),
                    name: "Broken".into(),
                    description: String::new(),
                    params: Vec::new(),
                    run: Arc::new(|_call: WorkflowCall<'_>| -> anyhow::Result<Value> { Err(anyhow::anyhow!("disk on fire")) }),
                },
            ],
        }
    }

    fn code_json(item: &ResultItem) -> Value {
        match item {
            ResultItem::Code { content, .. } => serde_json::from_str(&content.join("\n")).expect("json code"),
            other => panic!("expected code item, got {other:?}"),
        }
    }

    #[test]
    fn value_alias_yields_one_text_item() {
        let app = app(json!({"results": [{"type": "text", "value": "hi"}]}));
        let result = execute_workflow(&app, &ExecutionRequest::new("fixed"), &ProgressReporter::disabled()).expect("execute");
        assert_eq!(result.items, vec![ResultItem::text("hi")]);
        assert_eq!(result.workflow_name, "Fixed");
    }

    #[test]
    fn unknown_workflow_lists_available_ids() {
        let app = app(json!({}));
        let err = execute_workflow(&app, &ExecutionRequest::new("nope"), &ProgressReporter::disabled()).unwrap_err();
        assert_eq!(err.to_string(), "unknown workflow 'nope' (available: fixed, echo, broken)");
    }

    #[test]
    fn context_params_and_metadata_reach_the_workflow() {
        let app = app(json!({}));
        let request = ExecutionRequest::from_cli_args(&app, "echo", &["name=Ada".into()], &["flag=true".into()]).expect("request");
        let result = execute_workflow(&app, &request, &ProgressReporter::disabled()).expect("execute");

        assert_eq!(result.items[0], ResultItem::text("Hello Ada"));
        let metadata = code_json(&result.items[1]);
        assert_eq!(metadata["source"], json!("init"));
        assert_eq!(metadata["greeting"], json!("Hello Ada"));
        // Parameter values override metadata entries with the same key.
        assert_eq!(metadata["limit"], json!(5));
        let params = code_json(&result.items[2]);
        assert_eq!(params, json!({"limit": 5, "flag": true}));
    }

    #[test]
    fn init_values_for_workflow_params_are_forwarded() {
        let app = app(json!({}));
        let request =
            ExecutionRequest::from_cli_args(&app, "echo", &["limit=9".into(), "other=x".into()], &[]).expect("request");
        assert_eq!(request.param_values["limit"], json!(9));
        assert_eq!(request.init_values.get("limit"), None);
        assert_eq!(request.init_values["other"], json!("x"));

        let explicit = ExecutionRequest::from_cli_args(&app, "echo", &["limit=9".into()], &["limit=2".into()]).expect("request");
        assert_eq!(explicit.param_values["limit"], json!(2));
    }

    #[test]
    fn workflow_errors_and_invalid_payloads_surface() {
        let app = app(json!({"unexpected": true}));
        let err = execute_workflow(&app, &ExecutionRequest::new("broken"), &ProgressReporter::disabled()).unwrap_err();
        assert_eq!(err.to_string(), "workflow 'broken' failed");
        assert_eq!(format!("{:#}", anyhow::Error::new(err)), "workflow 'broken' failed: disk on fire");

        let err = execute_workflow(&app, &ExecutionRequest::new("fixed"), &ProgressReporter::disabled()).unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidResults(_)));
    }

    #[test]
    fn metadata_merge_order() {
        let mut context = Context::new();
        context.insert("metadata".into(), json!({"a": 1, "b": 1}));
        context.insert("b".into(), json!(2));
        let mut params = ParamValues::new();
        params.insert("a".into(), json!(3));
        let metadata = invocation_metadata(&context, &params);
        assert_eq!(Value::Object(metadata), json!({"a": 3, "b": 2}));
    }
}
