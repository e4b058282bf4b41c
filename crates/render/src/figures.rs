//! Per-figure export.

use std::{
    fs,
    path::{Path, PathBuf},
};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use renderflow_types::{FigureFormat, InvalidFigureFormat, ResultItem};
use renderflow_util::sanitize_file_stem;
use serde_json::{Number, Value};
use tracing::{debug, info};

use crate::{ExportError, ImageEngine};

/// Plotly.js release referenced from generated pages.
pub const PLOTLY_JS_VERSION: &str = "2.35.2";

pub fn plotly_cdn_url() -> String {
    format!("https://cdn.plot.ly/plotly-{PLOTLY_JS_VERSION}.min.js")
}

/// Parses repeated, comma-separated format arguments.
///
/// Tokens are trimmed and lower-cased, duplicates dropped in order; an empty
/// selection means `html`.
pub fn normalize_figure_formats<S: AsRef<str>>(raw: &[S]) -> Result<Vec<FigureFormat>, InvalidFigureFormat> {
    let mut formats = Vec::new();
    for token in raw {
        for part in token.as_ref().split(',') {
            if part.trim().is_empty() {
                continue;
            }
            let format: FigureFormat = part.parse()?;
            if !formats.contains(&format) {
                formats.push(format);
            }
        }
    }
    if formats.is_empty() {
        formats.push(FigureFormat::Html);
    }
    Ok(formats)
}

/// File stem for the `index`-th saved figure: id, then title, then `figure_<index>`.
pub fn figure_name(id: Option<&str>, title: Option<&str>, index: usize) -> String {
    let fallback = format!("figure_{index}");
    let raw = id
        .filter(|id| !id.is_empty())
        .or(title.filter(|title| !title.is_empty()))
        .unwrap_or(&fallback);
    sanitize_file_stem(raw, &fallback)
}

/// Writes every saveable plot once per format and returns the written paths.
///
/// Plots with `save: false` or a null figure are skipped and do not consume
/// an index.
pub fn save_figures(items: &[ResultItem], output_dir: &Path, formats: &[FigureFormat], engine: &dyn ImageEngine) -> Result<Vec<PathBuf>, ExportError> {
    let formats = if formats.is_empty() { &[FigureFormat::Html][..] } else { formats };
    fs::create_dir_all(output_dir).map_err(ExportError::io(output_dir))?;

    let mut saved = Vec::new();
    let mut index = 0;
    for item in items {
        let ResultItem::Plot { figure, id, title, save } = item else {
            continue;
        };
        if !save || figure.is_null() {
            continue;
        }
        index += 1;
        let name = figure_name(id.as_deref(), title.as_deref(), index);
        for format in formats {
            let path = output_dir.join(format!("{name}.{}", format.extension()));
            if format.requires_image_engine() {
                engine.render(&to_builtin_json(figure), *format, &path)?;
            } else if *format == FigureFormat::Json {
                let payload = serde_json::to_string(&to_builtin_json(figure))?;
                fs::write(&path, payload).map_err(ExportError::io(&path))?;
            } else {
                let page = figure_page(figure, title.as_deref().unwrap_or(&name))?;
                fs::write(&path, page).map_err(ExportError::io(&path))?;
            }
            debug!(path = %path.display(), format = %format, "figure written");
            saved.push(path);
        }
    }
    info!(count = saved.len(), dir = %output_dir.display(), "figures exported");
    Ok(saved)
}

/// Standalone page showing one figure.
fn figure_page(figure: &Value, title: &str) -> Result<String, ExportError> {
    let payload = script_safe_json(&to_builtin_json(figure))?;
    Ok([
        "<!DOCTYPE html>".to_string(),
        "<html>".to_string(),
        "<head>".to_string(),
        "    <meta charset='utf-8'>".to_string(),
        format!("    <title>{}</title>", html_escape::encode_text(title)),
        format!("    <script src='{}'></script>", plotly_cdn_url()),
        "</head>".to_string(),
        "<body>".to_string(),
        "    <div id='figure'></div>".to_string(),
        "    <script>".to_string(),
        format!("        var figure = {payload};"),
        "        Plotly.newPlot('figure', figure.data || [], figure.layout || {}, {responsive: true});".to_string(),
        "    </script>".to_string(),
        "</body>".to_string(),
        "</html>".to_string(),
    ]
    .join("\n"))
}

/// JSON safe to embed inside a `<script>` element.
pub(crate) fn script_safe_json(value: &Value) -> Result<String, ExportError> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

/// Replaces Plotly binary array payloads (`{dtype, bdata, shape}`) with plain lists.
///
/// Payloads that fail to decode are kept as ordinary mappings.
pub fn to_builtin_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            if let (Some(Value::String(dtype)), Some(Value::String(bdata))) = (map.get("dtype"), map.get("bdata"))
                && let Some(decoded) = decode_typed_array(dtype, bdata, map.get("shape"))
            {
                return decoded;
            }
            Value::Object(map.iter().map(|(key, value)| (key.clone(), to_builtin_json(value))).collect())
        }
        Value::Array(items) => Value::Array(items.iter().map(to_builtin_json).collect()),
        other => other.clone(),
    }
}

fn decode_typed_array(dtype: &str, bdata: &str, shape: Option<&Value>) -> Option<Value> {
    let bytes = STANDARD.decode(bdata).ok()?;
    let values = decode_elements(dtype, &bytes)?;
    match parse_shape(shape)? {
        Some(dims) => reshape(&values, &dims),
        None => Some(Value::Array(values)),
    }
}

fn decode_elements(dtype: &str, bytes: &[u8]) -> Option<Vec<Value>> {
    let code = dtype.trim_start_matches(['<', '|', '=']);
    let code = match code {
        "float64" | "double" => "f8",
        "float32" => "f4",
        "int8" => "i1",
        "int16" => "i2",
        "int32" => "i4",
        "int64" => "i8",
        "uint8" => "u1",
        "uint16" => "u2",
        "uint32" => "u4",
        "uint64" => "u8",
        other => other,
    };

    fn chunks<const N: usize>(bytes: &[u8]) -> Option<impl Iterator<Item = [u8; N]> + '_> {
        (bytes.len() % N == 0).then(|| bytes.chunks_exact(N).filter_map(|chunk| chunk.try_into().ok()))
    }
    fn float(value: f64) -> Value {
        Number::from_f64(value).map(Value::Number).unwrap_or(Value::Null)
    }

    let values = match code {
        "f8" => chunks::<8>(bytes)?.map(|c| float(f64::from_le_bytes(c))).collect(),
        "f4" => chunks::<4>(bytes)?.map(|c| float(f64::from(f32::from_le_bytes(c)))).collect(),
        "i1" => bytes.iter().map(|b| Value::from(*b as i8)).collect(),
        "u1" => bytes.iter().map(|b| Value::from(*b)).collect(),
        "i2" => chunks::<2>(bytes)?.map(|c| Value::from(i16::from_le_bytes(c))).collect(),
        "u2" => chunks::<2>(bytes)?.map(|c| Value::from(u16::from_le_bytes(c))).collect(),
        "i4" => chunks::<4>(bytes)?.map(|c| Value::from(i32::from_le_bytes(c))).collect(),
        "u4" => chunks::<4>(bytes)?.map(|c| Value::from(u32::from_le_bytes(c))).collect(),
        "i8" => chunks::<8>(bytes)?.map(|c| Value::from(i64::from_le_bytes(c))).collect(),
        "u8" => chunks::<8>(bytes)?.map(|c| Value::from(u64::from_le_bytes(c))).collect(),
        _ => return None,
    };
    Some(values)
}

/// `Some(None)` means no reshaping; `None` means the shape is unusable.
fn parse_shape(shape: Option<&Value>) -> Option<Option<Vec<usize>>> {
    let dims: Vec<usize> = match shape {
        None | Some(Value::Null) => return Some(None),
        Some(Value::String(text)) => {
            let mut dims = Vec::new();
            for part in text.split(',').map(str::trim).filter(|part| !part.is_empty()) {
                dims.push(part.parse().ok()?);
            }
            dims
        }
        Some(Value::Array(parts)) => parts
            .iter()
            .map(|part| part.as_u64().map(|dim| dim as usize))
            .collect::<Option<Vec<_>>>()?,
        Some(_) => return None,
    };
    Some((!dims.is_empty()).then_some(dims))
}

fn reshape(values: &[Value], dims: &[usize]) -> Option<Value> {
    if dims.iter().product::<usize>() != values.len() {
        return None;
    }
    let Some((&outer, inner)) = dims.split_first() else {
        return Some(Value::Array(values.to_vec()));
    };
    if inner.is_empty() {
        return Some(Value::Array(values.to_vec()));
    }
    let stride = values.len() / outer.max(1);
    if stride == 0 {
        return Some(Value::Array(vec![Value::Array(Vec::new()); outer]));
    }
    values
        .chunks(stride)
        .map(|chunk| reshape(chunk, inner))
        .collect::<Option<Vec<_>>>()
        .map(Value::Array)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::NoImageEngine;

    fn plot(id: Option<&str>, title: Option<&str>, save: bool) -> ResultItem {
        ResultItem::Plot {
            figure: json!({"data": [{"y": [1, 2]}], "layout": {}}),
            id: id.map(str::to_string),
            title: title.map(str::to_string),
            save,
        }
    }

    #[test]
    fn formats_are_split_lowercased_and_deduplicated() {
        let formats = normalize_figure_formats(&["HTML,json", " png ", "json", ""]).expect("valid");
        assert_eq!(formats, [FigureFormat::Html, FigureFormat::Json, FigureFormat::Png]);
        assert_eq!(normalize_figure_formats::<&str>(&[]).expect("empty"), [FigureFormat::Html]);
    }

    #[test]
    fn invalid_format_lists_allowed_values() {
        let err = normalize_figure_formats(&["html,gif"]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid figure format 'gif'. Allowed: html, json, png, jpg, jpeg, svg, pdf");
    }

    #[test]
    fn figure_names_prefer_id_then_title() {
        assert_eq!(figure_name(Some("range/doppler"), Some("T"), 1), "range_doppler");
        assert_eq!(figure_name(None, Some("Power Spectrum"), 2), "Power_Spectrum");
        assert_eq!(figure_name(None, None, 3), "figure_3");
        assert_eq!(figure_name(Some("!!"), None, 4), "figure_4");
    }

    #[test]
    fn comma_separated_formats_write_one_file_each() {
        let dir = tempfile::tempdir().expect("tempdir");
        let formats = normalize_figure_formats(&["html,json"]).expect("valid");
        let items = vec![ResultItem::text("intro"), plot(Some("main"), None, true)];
        let saved = save_figures(&items, dir.path(), &formats, &NoImageEngine).expect("save");
        assert_eq!(saved, [dir.path().join("main.html"), dir.path().join("main.json")]);

        let html = std::fs::read_to_string(&saved[0]).expect("html");
        assert!(html.contains("cdn.plot.ly"));
        assert!(html.contains("Plotly.newPlot"));
        let json: Value = serde_json::from_str(&std::fs::read_to_string(&saved[1]).expect("json")).expect("parse");
        assert_eq!(json["data"][0]["y"], json!([1, 2]));
    }

    #[test]
    fn unsaved_plots_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let items = vec![plot(Some("hidden"), None, false), plot(None, None, true)];
        let saved = save_figures(&items, dir.path(), &[FigureFormat::Json], &NoImageEngine).expect("save");
        assert_eq!(saved, [dir.path().join("figure_1.json")]);
    }

    #[test]
    fn image_formats_need_an_engine() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = save_figures(&[plot(None, None, true)], dir.path(), &[FigureFormat::Jpeg], &NoImageEngine).unwrap_err();
        assert!(matches!(err, ExportError::ImageEngineUnavailable { format: FigureFormat::Jpeg }));
    }

    #[test]
    fn binary_arrays_are_decoded() {
        let bytes: Vec<u8> = [1.5f64, -2.0, 3.0, 4.25].iter().flat_map(|v| v.to_le_bytes()).collect();
        let figure = json!({"data": [{"y": {"dtype": "f8", "bdata": STANDARD.encode(&bytes), "shape": "2, 2"}}]});
        assert_eq!(to_builtin_json(&figure)["data"][0]["y"], json!([[1.5, -2.0], [3.0, 4.25]]));

        let ints = json!({"dtype": "i2", "bdata": STANDARD.encode([1u8, 0, 255, 255])});
        assert_eq!(to_builtin_json(&ints), json!([1, -1]));

        let broken = json!({"dtype": "f8", "bdata": "***"});
        assert_eq!(to_builtin_json(&broken), broken);
    }
}
