//! Synthetic series statistics. Parameters come from the workflow descriptor.

use std::{f64::consts::PI, sync::Arc};

use anyhow::{Result, bail, ensure};
use renderflow_engine::{Workflow, node_failed, wrap_with_timing};
use renderflow_registry::{ParamSource, WorkflowDescriptor, WorkflowModule};
use renderflow_types::{JsonMap, ParamOptions, ParamSpec, ParamType, ParamValues, WorkflowCall};
use serde_json::{Value, json};

/// Sample count bounds, shared by the parameter range and the run.
const MIN_POINTS: f64 = 2.0;
const MAX_POINTS: f64 = 2048.0;

pub struct SeriesSummary;

impl WorkflowModule for SeriesSummary {
    fn id(&self) -> &str {
        "series_summary"
    }

    fn descriptor(&self) -> Option<WorkflowDescriptor> {
        Some(WorkflowDescriptor {
            name: Some("Series Summary".to_string()),
            description: Some("Generates a waveform and summarizes it.".to_string()),
            params: Some(ParamSource::Specs(vec![
                ParamSpec::new("points", "Points")
                    .with_type(ParamType::Number)
                    .with_default(64)
                    .with_range(Some(MIN_POINTS), Some(MAX_POINTS), Some(1.0))
                    .with_help("Number of samples to generate."),
                ParamSpec::new("shape", "Shape")
                    .with_type(ParamType::Dropdown)
                    .with_default("sine")
                    .with_options(ParamOptions::Static(vec![json!("sine"), json!("square"), json!("triangle")])),
                ParamSpec::new("channels", "Channels")
                    .with_type(ParamType::Number)
                    .with_default(2)
                    .with_range(Some(0.0), Some(8.0), Some(1.0)),
                ParamSpec::new("channel", "Channel")
                    .with_type(ParamType::Dropdown)
                    .with_options(ParamOptions::Dynamic(Arc::new(channel_options)))
                    .with_help("Channels offered depend on the channel count."),
                ParamSpec::new("export_histogram", "Export Histogram")
                    .with_type(ParamType::Checkbox)
                    .with_default(false),
            ])),
        })
    }

    fn run_workflow(&self, call: WorkflowCall<'_>) -> Result<Value> {
        let points = call.f64_value("points").unwrap_or(64.0);
        ensure!(points <= MAX_POINTS, "points must be at most {MAX_POINTS}, got {points}");
        let points = points.max(MIN_POINTS) as usize;
        let shape = call.str_value("shape").unwrap_or("sine").to_string();
        let amplitude = call.f64_value("base_value").unwrap_or(10.0);
        let channel = call.str_value("channel").filter(|channel| !channel.is_empty()).unwrap_or("ch0").to_string();
        let export_histogram = call.bool_value("export_histogram").unwrap_or(false);

        let generate = wrap_with_timing(
            move |_inputs: &JsonMap| {
                let samples: Vec<f64> = (0..points)
                    .map(|index| waveform(&shape, index as f64 / points as f64).map(|value| amplitude * value))
                    .collect::<Result<_>>()?;
                Ok(json!({"samples": samples}))
            },
            "Generate series",
            format!("{points} samples"),
            call.progress.clone(),
        );
        let generated = generate(&JsonMap::new());
        if node_failed(&generated) {
            let reason = generated.get("_node_error").and_then(Value::as_str).unwrap_or("series generation failed");
            bail!("{reason}");
        }
        let samples: Vec<f64> = generated
            .get("samples")
            .and_then(Value::as_array)
            .map(|values| values.iter().filter_map(Value::as_f64).collect())
            .unwrap_or_default();

        let summarize = wrap_with_timing(|inputs: &JsonMap| Ok(summary_table(inputs)), "Summarize", "", call.progress.clone());
        let mut summary = summarize(&generated);
        summary.remove("_timing");

        let mut workflow = Workflow::new("Series Summary", "");
        workflow.add_text(format!(
            "{} samples on {channel}, amplitude {amplitude}, generated in {:.3}s",
            samples.len(),
            generated.get("_timing").and_then(Value::as_f64).unwrap_or_default()
        ));
        workflow.add_table("Statistics", Value::Object(summary));
        workflow.add_named_plot(
            "series",
            Some("Series"),
            json!({
                "data": [{"type": "scatter", "mode": "lines", "y": samples, "name": channel}],
                "layout": {"title": {"text": "Series"}},
            }),
            true,
        );
        workflow.add_named_plot(
            "histogram",
            Some("Histogram"),
            json!({"data": [{"type": "histogram", "x": samples}], "layout": {}}),
            export_histogram,
        );
        Ok(workflow.build())
    }
}

fn waveform(shape: &str, phase: f64) -> Result<f64> {
    let angle = 2.0 * PI * phase;
    Ok(match shape {
        "sine" => angle.sin(),
        "square" => angle.sin().signum(),
        "triangle" => 1.0 - 4.0 * (phase - (phase + 0.5).floor()).abs(),
        other => bail!("unsupported shape '{other}'"),
    })
}

fn summary_table(inputs: &JsonMap) -> Value {
    let samples: Vec<f64> = inputs
        .get("samples")
        .and_then(Value::as_array)
        .map(|values| values.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default();
    let count = samples.len().max(1) as f64;
    let mean = samples.iter().sum::<f64>() / count;
    let variance = samples.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / count;
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let round = |value: f64| if value.is_finite() { (value * 1000.0).round() / 1000.0 } else { 0.0 };
    json!({
        "statistic": ["mean", "std", "min", "max"],
        "value": [round(mean), round(variance.sqrt()), round(min), round(max)],
    })
}

/// One option per configured channel: `ch0`, `ch1`, ...
fn channel_options(values: &ParamValues, _spec: &ParamSpec) -> Vec<Value> {
    let count = values.get("channels").and_then(Value::as_f64).unwrap_or(0.0).clamp(0.0, 8.0) as usize;
    (0..count).map(|index| json!(format!("ch{index}"))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_options_follow_channel_count() {
        let mut values = ParamValues::new();
        values.insert("channels".into(), json!(3));
        let spec = ParamSpec::new("channel", "Channel");
        assert_eq!(channel_options(&values, &spec), [json!("ch0"), json!("ch1"), json!("ch2")]);
        assert!(channel_options(&ParamValues::new(), &spec).is_empty());
    }

    #[test]
    fn summary_of_constant_series() {
        let mut inputs = JsonMap::new();
        inputs.insert("samples".into(), json!([2.0, 2.0, 2.0]));
        let table = summary_table(&inputs);
        assert_eq!(table["value"], json!([2.0, 0.0, 2.0, 2.0]));
    }

    #[test]
    fn unknown_shape_is_rejected() {
        assert!(waveform("sawtooth", 0.1).is_err());
        assert!((waveform("triangle", 0.0).expect("triangle") - 1.0).abs() < 1e-9);
        assert!((waveform("square", 0.25).expect("square") - 1.0).abs() < 1e-9);
    }
}
