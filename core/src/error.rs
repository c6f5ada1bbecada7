//! Error values returned by every parse and match entry point.
//!
//! Malformed identifiers are an expected outcome, so rejections are plain
//! values: a closed [`ErrorKind`], the position where parsing stopped, and a
//! message meant for a human editing the identifier by hand.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Category of a rejected input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Input is empty or whitespace-only.
    EmptyIdentifier,
    /// A label or version field breaks the lexical rules.
    InvalidSegmentFormat,
    /// A chain link failed to parse, is empty, or breaks link ordering.
    InvalidChain,
    /// More than one `*`, or a `*` outside the trailing position.
    MultipleOrMisplacedWildcard,
    /// A `[` predicate or `@` attribute suffix never terminates.
    UnterminatedPredicate,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyIdentifier => write!(f, "empty_identifier"),
            Self::InvalidSegmentFormat => write!(f, "invalid_segment_format"),
            Self::InvalidChain => write!(f, "invalid_chain"),
            Self::MultipleOrMisplacedWildcard => write!(f, "multiple_or_misplaced_wildcard"),
            Self::UnterminatedPredicate => write!(f, "unterminated_predicate"),
        }
    }
}

/// Sub-field of a segment that failed to lex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentField {
    /// The literal `gts.` that opens an absolute segment.
    Prefix,
    Vendor,
    Package,
    Namespace,
    Type,
    /// `v<MAJOR>`.
    Major,
    /// The optional `.<MINOR>`.
    Minor,
    /// Text left over after the last permitted field.
    Trailing,
}

impl fmt::Display for SegmentField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Prefix => "prefix",
            Self::Vendor => "vendor",
            Self::Package => "package",
            Self::Namespace => "namespace",
            Self::Type => "type",
            Self::Major => "major version",
            Self::Minor => "minor version",
            Self::Trailing => "trailing text",
        };
        f.write_str(name)
    }
}

/// Why a chain was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFault {
    /// A link does not follow the segment grammar.
    BadSegment,
    /// Two separators with nothing between them.
    EmptyLink,
    /// An instance link appears before the end of the chain.
    NonTerminalInstance,
}

/// A rejected identifier, pattern, or query.
///
/// `offset` counts characters from the start of the caller's input,
/// including any leading whitespace that parsing trimmed away. `segment` is
/// the zero-based chain link the failure belongs to, when there is one.
///
/// # Examples
///
/// ```
/// use gts_core::{ErrorKind, SegmentField, parse};
///
/// let err = parse("gts.Acme.app.ns.type.v1").unwrap_err();
/// assert_eq!(err.kind, ErrorKind::InvalidSegmentFormat);
/// assert_eq!(err.field, Some(SegmentField::Vendor));
/// assert_eq!(err.offset, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{kind} at offset {offset}: {message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub offset: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<SegmentField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<ChainFault>,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(kind: ErrorKind, offset: usize, message: impl Into<String>) -> Self {
        Self {
            kind,
            offset,
            segment: None,
            field: None,
            fault: None,
            message: message.into(),
        }
    }

    pub(crate) fn empty() -> Self {
        Self::new(
            ErrorKind::EmptyIdentifier,
            0,
            "Please enter a GTS identifier",
        )
    }

    pub(crate) fn in_segment(mut self, index: usize) -> Self {
        self.segment = Some(index);
        self
    }

    pub(crate) fn with_field(mut self, field: Option<SegmentField>) -> Self {
        self.field = field;
        self
    }

    pub(crate) fn with_fault(mut self, fault: ChainFault) -> Self {
        self.fault = Some(fault);
        self
    }

    /// Re-labels a segment failure as a failure of the enclosing chain.
    pub(crate) fn into_chain_error(mut self) -> Self {
        if self.kind == ErrorKind::InvalidSegmentFormat {
            let link = self.segment.map_or(1, |index| index + 1);
            self.kind = ErrorKind::InvalidChain;
            self.fault = Some(ChainFault::BadSegment);
            self.message = format!("chain link {link}: {}", self.message);
        }
        self
    }

    /// Converts an internal byte offset into a character offset over `input`.
    pub(crate) fn at_char_offset(mut self, input: &str) -> Self {
        if let Some(head) = input.get(..self.offset) {
            self.offset = head.chars().count();
        }
        self
    }
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;
