//! Validation reports for interactive callers.
//!
//! A [`ValidationReport`] carries everything an editor widget shows next to
//! the text box: validity, a message, the segment strings, and the
//! classification. Invalid input also keeps the full [`ParseError`], so the
//! exact failing position can be highlighted.
//!
//! # Examples
//!
//! ```
//! use gts_core::{Classification, validate};
//!
//! let report = validate("gts.x.core.events.type.v1~vendor.app._.custom.v1~");
//! assert!(report.is_valid);
//! assert_eq!(report.message, "Valid chained GTS identifier with 2 segment(s)");
//! assert_eq!(report.classification, Some(Classification::Schema));
//!
//! let report = validate("gts.x.core.events.Type.v1~");
//! assert!(!report.is_valid);
//! assert_eq!(report.error.unwrap().offset, 18);
//! ```

use serde::Serialize;

use crate::error::{ParseError, Result};
use crate::identifier::{Classification, Identifier, parse};

/// Result of validating one raw identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Input exactly as received.
    pub input: String,
    pub is_valid: bool,
    /// Human-readable verdict.
    pub message: String,
    /// Segment texts without `~`; empty when invalid.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segments: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ParseError>,
}

impl ValidationReport {
    /// Builds a report from a parse result obtained elsewhere, e.g. from a
    /// [`ParseCache`](crate::ParseCache).
    pub fn from_result(input: &str, result: &Result<Identifier>) -> Self {
        match result {
            Ok(identifier) => Self {
                input: input.to_string(),
                is_valid: true,
                message: success_message(identifier),
                segments: identifier.segment_strings(),
                classification: Some(identifier.classification()),
                error: None,
            },
            Err(err) => Self {
                input: input.to_string(),
                is_valid: false,
                message: err.message.clone(),
                segments: Vec::new(),
                classification: None,
                error: Some(err.clone()),
            },
        }
    }
}

/// Parses `raw` and summarizes the outcome.
pub fn validate(raw: &str) -> ValidationReport {
    ValidationReport::from_result(raw, &parse(raw))
}

fn success_message(identifier: &Identifier) -> String {
    if identifier.is_chained() {
        return format!(
            "Valid chained GTS identifier with {} segment(s)",
            identifier.segment_count()
        );
    }
    match identifier.classification() {
        Classification::Schema => "Valid GTS schema (type) identifier".to_string(),
        Classification::Instance => "Valid GTS instance identifier".to_string(),
    }
}
