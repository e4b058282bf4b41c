//! External rasterizer for png/jpg/svg/pdf figure exports.

use std::{
    io::{self, Read, Write},
    path::Path,
    process::{Command, Stdio},
    thread,
};

use renderflow_types::FigureFormat;
use serde_json::Value;
use tracing::debug;

use crate::ExportError;

/// Converts a figure document into an image file.
pub trait ImageEngine: Send + Sync {
    fn render(&self, figure: &Value, format: FigureFormat, output: &Path) -> Result<(), ExportError>;
}

/// Used when no engine is configured; every image export fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImageEngine;

impl ImageEngine for NoImageEngine {
    fn render(&self, _figure: &Value, format: FigureFormat, _output: &Path) -> Result<(), ExportError> {
        Err(ExportError::ImageEngineUnavailable { format })
    }
}

/// Runs `<argv> --format FMT --output PATH` with the figure JSON on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommandEngine {
    argv: Vec<String>,
}

impl ExternalCommandEngine {
    /// Returns `None` for an empty argv.
    pub fn new(argv: Vec<String>) -> Option<Self> {
        (!argv.is_empty()).then_some(Self { argv })
    }
}

impl ImageEngine for ExternalCommandEngine {
    fn render(&self, figure: &Value, format: FigureFormat, output: &Path) -> Result<(), ExportError> {
        let failure = |reason: String| ExportError::ImageEngine {
            path: output.to_path_buf(),
            reason,
        };
        let Some((program, args)) = self.argv.split_first() else {
            return Err(ExportError::ImageEngineUnavailable { format });
        };
        let payload = serde_json::to_vec(figure)?;
        debug!(program = %program, format = %format, output = %output.display(), "invoking image engine");

        let mut child = Command::new(program)
            .args(args)
            .arg("--format")
            .arg(format.extension())
            .arg("--output")
            .arg(output)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|error| failure(format!("failed to spawn '{program}': {error}")))?;

        let stderr_pipe = child.stderr.take();
        let stderr_reader = thread::spawn(move || {
            let mut stderr = String::new();
            if let Some(mut pipe) = stderr_pipe {
                // Partial output is still worth reporting.
                let _ = pipe.read_to_string(&mut stderr);
            }
            stderr
        });

        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Ok(()),
        };
        let status = child.wait().map_err(ExportError::io(output))?;
        let stderr = stderr_reader.join().unwrap_or_default();
        if !status.success() {
            return Err(failure(format!("exited with {status}: {}", stderr.trim())));
        }
        match written {
            Err(error) if error.kind() == io::ErrorKind::BrokenPipe => {
                debug!(program = %program, "image engine closed stdin before reading the figure");
            }
            Err(error) => return Err(failure(format!("failed to write figure: {error}"))),
            Ok(()) => {}
        }
        if !output.exists() {
            return Err(failure("engine reported success but wrote no file".to_string()));
        }
        Ok(())
    }
}

/// Engine for an optional argv: external command when present, otherwise none.
pub fn image_engine_from_argv(argv: Option<Vec<String>>) -> Box<dyn ImageEngine> {
    match argv.and_then(ExternalCommandEngine::new) {
        Some(engine) => Box::new(engine),
        None => Box::new(NoImageEngine),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn missing_engine_reports_format() {
        let err = NoImageEngine
            .render(&json!({}), FigureFormat::Png, Path::new("x.png"))
            .unwrap_err();
        assert!(err.to_string().contains("exporting png figures requires an image engine"));
        assert!(ExternalCommandEngine::new(Vec::new()).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn external_engine_receives_format_and_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("fig.svg");
        // $2 is the format and $4 the output path after `sh -c script sh`.
        let engine = ExternalCommandEngine::new(vec![
            "sh".into(),
            "-c".into(),
            r#"cat > "$4"; echo "$2" >> "$4""#.into(),
            "sh".into(),
        ])
        .expect("engine");
        engine
            .render(&json!({"data": []}), FigureFormat::Svg, &output)
            .expect("render");
        let written = std::fs::read_to_string(&output).expect("read output");
        assert!(written.starts_with(r#"{"data":[]}"#));
        assert!(written.trim_end().ends_with("svg"));
    }

    #[cfg(unix)]
    #[test]
    fn failing_engine_carries_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine = ExternalCommandEngine::new(vec!["sh".into(), "-c".into(), "cat >/dev/null; echo kaleido missing >&2; exit 1".into()])
            .expect("engine");
        let err = engine
            .render(&json!({}), FigureFormat::Pdf, &dir.path().join("f.pdf"))
            .unwrap_err();
        assert!(err.to_string().contains("kaleido missing"), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn engine_exiting_before_reading_keeps_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let engine =
            ExternalCommandEngine::new(vec!["sh".into(), "-c".into(), "echo 'ModuleNotFoundError: kaleido' >&2; exit 3".into()])
                .expect("engine");
        let figure = json!({"data": [{"y": vec![0.5_f64; 200_000]}]});
        let err = engine
            .render(&figure, FigureFormat::Png, &dir.path().join("f.png"))
            .unwrap_err();
        assert!(err.to_string().contains("ModuleNotFoundError: kaleido"), "{err}");
    }
}
