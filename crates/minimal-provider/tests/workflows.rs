use std::sync::{Arc, Mutex};

use minimal_provider::{PROVIDER_NAME, register};
use renderflow_engine::{ExecutionRequest, execute_workflow, resolve_dropdown_options};
use renderflow_registry::ProviderRegistry;
use renderflow_types::{AppSpec, ParamValues, ProgressReporter, ProgressStatus, ResultItem, ResultKind, TableData};
use serde_json::json;

fn app() -> AppSpec {
    let mut registry = ProviderRegistry::new();
    register(&mut registry);
    registry.load_app_spec(PROVIDER_NAME).expect("load minimal provider")
}

#[test]
fn greeting_uses_initializer_context() {
    let app = app();
    let request = ExecutionRequest::from_cli_args(&app, "greeting", &["name=Ada".to_string()], &["repeat=2".to_string(), "salutation=Hi".to_string()])
        .expect("request");
    let result = execute_workflow(&app, &request, &ProgressReporter::disabled()).expect("execute");
    assert_eq!(
        result.items[0],
        ResultItem::Text {
            content: vec!["Hi, Ada!".into(), "Hi, Ada!".into()],
        }
    );
    assert_eq!(result.items[1].kind(), ResultKind::Code);
}

#[test]
fn greeting_help_comes_from_description_alias() {
    let app = app();
    let workflow = app.workflow("greeting").expect("greeting");
    let salutation = workflow.param("salutation").expect("salutation");
    assert_eq!(salutation.help, "Word used to open the greeting.");
    assert_eq!(salutation.label, "salutation");
    assert_eq!(workflow.param("shout").map(|spec| spec.label.as_str()), Some("Shout"));
}

#[test]
fn channel_report_params_are_inferred_from_signature() {
    let app = app();
    let workflow = app.workflow("channel_report").expect("channel report");
    let keys: Vec<&str> = workflow.params.iter().map(|spec| spec.key.as_str()).collect();
    assert_eq!(keys, ["channel_count", "gain", "normalize", "prefix"]);
    assert_eq!(workflow.params[0].label, "Channel Count");

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let progress = ProgressReporter::new(move |event| sink.lock().unwrap().push(event.clone()));
    let request = ExecutionRequest::from_cli_args(&app, "channel_report", &[], &["channel_count=3".to_string(), "normalize=true".to_string()])
        .expect("request");
    let result = execute_workflow(&app, &request, &progress).expect("execute");

    let ResultItem::Table { data: TableData::Records(records), .. } = &result.items[1] else {
        panic!("expected a records table, got {:?}", result.items[1]);
    };
    assert_eq!(records.len(), 3);
    assert_eq!(records[2], json!({"channel": "ch2", "level": 1.0}));
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 6);
    assert_eq!(events[1].status, ProgressStatus::Done);
}

#[test]
fn series_summary_reports_timed_steps_and_hides_histogram_export() {
    let app = app();
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    let progress = ProgressReporter::new(move |event| sink.lock().unwrap().push(event.step.clone()));
    let request = ExecutionRequest::from_cli_args(&app, "series_summary", &[], &["points=16".to_string(), "shape=square".to_string()])
        .expect("request");
    let result = execute_workflow(&app, &request, &progress).expect("execute");

    assert_eq!(result.items.len(), 4);
    assert!(matches!(&result.items[3], ResultItem::Plot { save: false, .. }));
    let steps = events.lock().unwrap();
    assert_eq!(steps.as_slice(), ["Generate series", "Generate series", "Summarize", "Summarize"]);
}

#[test]
fn oversized_counts_are_rejected_before_allocating() {
    let app = app();
    for (workflow, param) in [
        ("channel_report", "channel_count=1e19"),
        ("channel_report", "channel_count=257"),
        ("series_summary", "points=1e19"),
    ] {
        let request = ExecutionRequest::from_cli_args(&app, workflow, &[], &[param.to_string()]).expect("request");
        let err = execute_workflow(&app, &request, &ProgressReporter::disabled()).unwrap_err();
        let message = format!("{:#}", anyhow::Error::new(err));
        assert!(message.contains("must be at most"), "{workflow} {param}: {message}");
    }
}

#[test]
fn channel_dropdown_depends_on_channel_count() {
    let app = app();
    let workflow = app.workflow("series_summary").expect("series summary");
    let spec = workflow.param("channel").expect("channel");

    let mut values = ParamValues::new();
    values.insert("channels".into(), json!(2));
    let options = resolve_dropdown_options(spec, &values);
    assert_eq!(options.len(), 2);

    values.insert("channels".into(), json!(0));
    let options = resolve_dropdown_options(spec, &values);
    assert_eq!(options[0].label, "(no options)");
}
