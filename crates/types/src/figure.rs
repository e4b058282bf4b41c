use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Accepted figure format tokens, in the order they are advertised.
pub const VALID_FIGURE_FORMATS: [&str; 7] = ["html", "json", "png", "jpg", "jpeg", "svg", "pdf"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid figure format '{0}'. Allowed: html, json, png, jpg, jpeg, svg, pdf")]
pub struct InvalidFigureFormat(pub String);

/// Output format for a single exported figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FigureFormat {
    Html,
    Json,
    Png,
    Jpg,
    Jpeg,
    Svg,
    Pdf,
}

impl FigureFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            FigureFormat::Html => "html",
            FigureFormat::Json => "json",
            FigureFormat::Png => "png",
            FigureFormat::Jpg => "jpg",
            FigureFormat::Jpeg => "jpeg",
            FigureFormat::Svg => "svg",
            FigureFormat::Pdf => "pdf",
        }
    }

    /// File extension written for this format (`jpeg` is stored as `jpg`).
    pub fn extension(&self) -> &'static str {
        match self {
            FigureFormat::Jpeg => "jpg",
            other => other.as_str(),
        }
    }

    /// Whether producing this format needs the external image engine.
    pub fn requires_image_engine(&self) -> bool {
        !matches!(self, FigureFormat::Html | FigureFormat::Json)
    }
}

impl fmt::Display for FigureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FigureFormat {
    type Err = InvalidFigureFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" => Ok(FigureFormat::Html),
            "json" => Ok(FigureFormat::Json),
            "png" => Ok(FigureFormat::Png),
            "jpg" => Ok(FigureFormat::Jpg),
            "jpeg" => Ok(FigureFormat::Jpeg),
            "svg" => Ok(FigureFormat::Svg),
            "pdf" => Ok(FigureFormat::Pdf),
            other => Err(InvalidFigureFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jpeg_is_written_as_jpg() {
        let format: FigureFormat = "JPEG".parse().expect("parse jpeg");
        assert_eq!(format, FigureFormat::Jpeg);
        assert_eq!(format.extension(), "jpg");
        assert!(format.requires_image_engine());
        assert!(!FigureFormat::Json.requires_image_engine());
    }

    #[test]
    fn unknown_format_is_rejected() {
        let err = "badformat".parse::<FigureFormat>().unwrap_err();
        assert!(err.to_string().contains("badformat"));
    }
}
