//! # Error Types
//!
//! Two layers of errors exist in papertag:
//!
//! - [`ElementError`]: a single drawing element could not be rendered. The
//!   pipeline catches these, records a [`Warning`] and moves on to the next
//!   element (unless the render is strict).
//! - [`PapertagError`]: the render as a whole cannot proceed, e.g. the canvas
//!   has no pixels or the payload is not a list.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Main error type for papertag operations
#[derive(Debug, Error)]
pub enum PapertagError {
    /// Canvas dimensions are zero or otherwise unusable
    #[error("Invalid canvas: {0}")]
    InvalidCanvas(String),

    /// Payload is structurally invalid (not a list, not JSON, ...)
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Rotation other than 0, 90, 180 or 270 degrees
    #[error("Invalid rotation: {0} (expected 0, 90, 180 or 270)")]
    InvalidRotation(i32),

    /// Global color option (e.g. background) could not be resolved
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Element failure in strict mode
    #[error("Element {index} ({kind}): {source}")]
    Element {
        index: usize,
        kind: String,
        #[source]
        source: ElementError,
    },

    /// Font loading error
    #[error("Font error: {0}")]
    Font(String),

    /// Image decode or fetch error
    #[error("Image error: {0}")]
    Image(String),

    /// Transport-level errors (delivery of the finished bitmap)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Configuration file error
    #[error("Config error: {0}")]
    Config(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of a single drawing element.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElementError {
    #[error("invalid color '{0}'")]
    InvalidColor(String),

    #[error("invalid coordinate '{0}'")]
    InvalidCoordinate(String),

    #[error("{element} requires field '{field}'")]
    MissingRequiredField { element: String, field: String },

    #[error("unknown element type '{0}'")]
    UnknownElement(String),

    #[error("invalid {element}: {message}")]
    InvalidField { element: String, message: String },

    #[error("{0}")]
    InvalidValue(String),

    /// Icon, glyph or image could not be found among the injected assets
    #[error("asset not found: {0}")]
    AssetLookupFailure(String),

    #[error("no series data for entity '{0}'")]
    MissingSeries(String),
}

/// Category of a non-fatal render warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    /// The element failed and was not drawn
    ElementSkipped,
    /// A font was not found and the bundled face was used
    FontFallback,
    /// Part of an element (e.g. one icon of a sequence) was missing
    AssetMissing,
}

/// A non-fatal problem encountered during a render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    /// Zero-based position of the element in the payload
    pub index: Option<usize>,
    /// Element type tag, when known
    pub element: Option<String>,
    pub kind: WarningKind,
    pub message: String,
}

impl Warning {
    pub fn skipped(index: usize, element: Option<&str>, error: &ElementError) -> Self {
        Self {
            index: Some(index),
            element: element.map(str::to_string),
            kind: WarningKind::ElementSkipped,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.index, &self.element) {
            (Some(i), Some(kind)) => write!(f, "Element {} ({}): {}", i + 1, kind, self.message),
            (Some(i), None) => write!(f, "Element {}: {}", i + 1, self.message),
            _ => f.write_str(&self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display_is_one_based() {
        let err = ElementError::MissingRequiredField {
            element: "text".into(),
            field: "x".into(),
        };
        let warning = Warning::skipped(2, Some("text"), &err);
        assert_eq!(
            warning.to_string(),
            "Element 3 (text): text requires field 'x'"
        );
    }

    #[test]
    fn test_strict_error_wraps_source() {
        let err = PapertagError::Element {
            index: 0,
            kind: "line".into(),
            source: ElementError::InvalidColor("purple".into()),
        };
        assert!(err.to_string().contains("invalid color 'purple'"));
    }
}
