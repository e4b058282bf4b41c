//! Per-channel gain report. Parameters are inferred from the run signature.

use anyhow::{Result, ensure};
use renderflow_engine::Workflow;
use renderflow_registry::{SignatureParam, WorkflowModule};
use renderflow_types::{ProgressStatus, WorkflowCall};
use serde_json::{Value, json};

/// Upper bound on generated channels.
const MAX_CHANNELS: f64 = 256.0;

pub struct ChannelReport;

impl WorkflowModule for ChannelReport {
    fn id(&self) -> &str {
        "channel_report"
    }

    fn workflow_name(&self) -> Option<String> {
        Some("Channel Report".to_string())
    }

    fn signature(&self) -> Vec<SignatureParam> {
        vec![
            SignatureParam::required("context"),
            SignatureParam::with_default("channel_count", 4),
            SignatureParam::with_default("gain", 1.5),
            SignatureParam::with_default("normalize", false),
            SignatureParam::with_default("prefix", "ch"),
            SignatureParam::variadic("kwargs"),
        ]
    }

    fn run_workflow(&self, call: WorkflowCall<'_>) -> Result<Value> {
        let channel_count = call.f64_value("channel_count").unwrap_or(4.0);
        ensure!(channel_count >= 1.0, "channel_count must be at least 1, got {channel_count}");
        ensure!(channel_count <= MAX_CHANNELS, "channel_count must be at most {MAX_CHANNELS}, got {channel_count}");
        let channel_count = channel_count as usize;
        let gain = call.f64_value("gain").unwrap_or(1.5);
        let normalize = call.bool_value("normalize").unwrap_or(false);
        let prefix = call.str_value("prefix").unwrap_or("ch");
        let base = call.f64_value("base_value").unwrap_or(10.0);

        let mut rows = Vec::with_capacity(channel_count);
        for index in 0..channel_count {
            let step = format!("Channel {}", index + 1);
            call.progress.emit(step.as_str(), ProgressStatus::Running, "");
            let level = base * gain.powi(index as i32);
            rows.push((format!("{prefix}{index}"), level));
            call.progress.emit(step.as_str(), ProgressStatus::Done, "");
        }
        if normalize {
            let peak = rows.iter().map(|(_, level)| *level).fold(0.0_f64, f64::max);
            if peak > 0.0 {
                for (_, level) in &mut rows {
                    *level /= peak;
                }
            }
        }

        let records: Vec<Value> = rows
            .iter()
            .map(|(channel, level)| json!({"channel": channel, "level": (level * 1000.0).round() / 1000.0}))
            .collect();
        let labels: Vec<&str> = rows.iter().map(|(channel, _)| channel.as_str()).collect();
        let levels: Vec<f64> = rows.iter().map(|(_, level)| *level).collect();
        let mut workflow = Workflow::new("Channel Report", "");
        workflow
            .add_text(format!("{channel_count} channels, gain {gain} per channel"))
            .add_table("Levels", Value::Array(records))
            .add_plot(json!({
                "data": [{
                    "type": "bar",
                    "x": labels,
                    "y": levels,
                }],
                "layout": {"title": {"text": "Channel levels"}},
            }));
        Ok(workflow.build())
    }
}
