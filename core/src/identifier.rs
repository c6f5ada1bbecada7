//! Chain parser: full GTS identifiers made of one or more `~`-joined links.
//!
//! ```text
//! identifier := absolute_segment ( "~" relative_segment )* [ "~" ]
//! ```
//!
//! A trailing `~` marks the last link as a schema; every other `~` separates
//! links. Link *i* derives from (conforms to) link *i − 1*, so every link
//! except the last is a schema.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChainFault, ErrorKind, ParseError, Result};
use crate::segment::{GTS_PREFIX, Link, SCHEMA_MARKER, Segment, lex_segment};

/// Whether an identifier names a schema (type) or an instance (object).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Schema,
    Instance,
}

impl Classification {
    /// Label shown next to a validated identifier.
    ///
    /// ```
    /// use gts_core::Classification;
    ///
    /// assert_eq!(Classification::Schema.label(), "schema (type)");
    /// assert_eq!(Classification::Instance.label(), "instance (object)");
    /// ```
    pub fn label(self) -> &'static str {
        match self {
            Self::Schema => "schema (type)",
            Self::Instance => "instance (object)",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema => write!(f, "schema"),
            Self::Instance => write!(f, "instance"),
        }
    }
}

/// A parsed GTS identifier: one or more segments in derivation order.
///
/// Equality is structural, so two inputs that differ only in surrounding
/// whitespace parse to equal identifiers. `Display` writes the canonical form,
/// and serde uses that same string.
///
/// # Examples
///
/// ```
/// use gts_core::{Classification, parse};
///
/// let id = parse("gts.x.core.acm.user.v1~ven.app._.admin.v1.2").unwrap();
/// assert_eq!(id.segment_count(), 2);
/// assert_eq!(id.classification(), Classification::Instance);
/// assert_eq!(id.terminal().version_string(), "v1.2");
/// assert_eq!(id.to_string(), "gts.x.core.acm.user.v1~ven.app._.admin.v1.2");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Identifier {
    segments: Vec<Segment>,
}

impl Identifier {
    /// Builds an identifier from segments constructed elsewhere, enforcing
    /// that every link before the last is a schema.
    ///
    /// # Errors
    ///
    /// [`ErrorKind::EmptyIdentifier`] for an empty list, and
    /// [`ErrorKind::InvalidChain`] with [`ChainFault::NonTerminalInstance`]
    /// when an instance link is followed by another link.
    ///
    /// ```
    /// use gts_core::{ChainFault, Identifier, parse_relative_segment, parse_segment};
    ///
    /// let base = parse_segment("gts.a.b.c.d.v1").unwrap();
    /// let child = parse_relative_segment("x.y.z.w.v1").unwrap();
    /// let err = Identifier::from_segments(vec![base, child]).unwrap_err();
    /// assert_eq!(err.fault, Some(ChainFault::NonTerminalInstance));
    /// assert_eq!(err.segment, Some(0));
    /// ```
    pub fn from_segments(segments: Vec<Segment>) -> Result<Self> {
        if segments.is_empty() {
            return Err(ParseError::empty());
        }
        let last = segments.len() - 1;
        let mut offset = GTS_PREFIX.len();
        for (index, segment) in segments.iter().enumerate() {
            if index < last && !segment.is_schema() {
                return Err(non_terminal_instance(index, offset));
            }
            offset += segment.to_string().len();
        }
        Ok(Self { segments })
    }

    /// Returns a new identifier with `child` appended as the next link.
    ///
    /// # Errors
    ///
    /// Fails with [`ChainFault::NonTerminalInstance`] when `self` ends in an
    /// instance, since instances cannot be derived from.
    ///
    /// ```
    /// use gts_core::{parse, parse_relative_segment};
    ///
    /// let base = parse("gts.x.core.events.type.v1~").unwrap();
    /// let child = parse_relative_segment("ven.app._.custom_event.v1~").unwrap();
    /// let derived = base.derive(child).unwrap();
    /// assert_eq!(derived.to_string(), "gts.x.core.events.type.v1~ven.app._.custom_event.v1~");
    /// assert_eq!(base.segment_count(), 1);
    /// ```
    pub fn derive(&self, child: Segment) -> Result<Self> {
        if !self.is_schema() {
            let index = self.segments.len() - 1;
            let offset = self.to_string().len() - self.terminal().to_string().len();
            return Err(non_terminal_instance(index, offset));
        }
        let mut segments = self.segments.clone();
        segments.push(child);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// First (absolute) link.
    pub fn root(&self) -> &Segment {
        &self.segments[0]
    }

    /// Last link; it alone decides the classification.
    pub fn terminal(&self) -> &Segment {
        &self.segments[self.segments.len() - 1]
    }

    pub fn is_chained(&self) -> bool {
        self.segments.len() > 1
    }

    /// Whether the raw text ended with `~`.
    pub fn terminal_is_schema(&self) -> bool {
        self.terminal().is_schema()
    }

    pub fn is_schema(&self) -> bool {
        self.terminal_is_schema()
    }

    pub fn is_instance(&self) -> bool {
        !self.terminal_is_schema()
    }

    pub fn classification(&self) -> Classification {
        if self.terminal_is_schema() {
            Classification::Schema
        } else {
            Classification::Instance
        }
    }

    /// The type this identifier derives from: the chain without its last
    /// link. `None` for single-segment identifiers.
    ///
    /// ```
    /// use gts_core::parse;
    ///
    /// let id = parse("gts.x.core.events.type.v1~ven.app._.custom.v1~").unwrap();
    /// assert_eq!(id.base().unwrap().to_string(), "gts.x.core.events.type.v1~");
    /// assert!(id.base().unwrap().base().is_none());
    /// ```
    pub fn base(&self) -> Option<Self> {
        if !self.is_chained() {
            return None;
        }
        let segments = self.segments[..self.segments.len() - 1].to_vec();
        Some(Self { segments })
    }

    /// Link texts without schema markers. The first keeps its `gts.` prefix.
    ///
    /// ```
    /// use gts_core::parse;
    ///
    /// let id = parse("gts.x.core.events.type.v1~vendor.app._.custom.v1~").unwrap();
    /// assert_eq!(
    ///     id.segment_strings(),
    ///     vec!["gts.x.core.events.type.v1", "vendor.app._.custom.v1"]
    /// );
    /// ```
    pub fn segment_strings(&self) -> Vec<String> {
        self.segments
            .iter()
            .enumerate()
            .map(|(index, segment)| {
                if index == 0 {
                    format!("{GTS_PREFIX}{}", segment.to_unmarked_string())
                } else {
                    segment.to_unmarked_string()
                }
            })
            .collect()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(GTS_PREFIX)?;
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromStr for Identifier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        parse(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self> {
        parse(&value)
    }
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        value.to_string()
    }
}

/// Parses a full GTS identifier.
///
/// Surrounding whitespace is ignored. A single-segment identifier whose text
/// breaks the grammar fails with [`ErrorKind::InvalidSegmentFormat`]. In a
/// chain, the same failure is reported as [`ErrorKind::InvalidChain`] and
/// keeps the link index and field of the underlying segment error.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying the kind, the character offset into
/// `raw`, and a message.
///
/// # Examples
///
/// ```
/// use gts_core::{Classification, ErrorKind, parse};
///
/// let id = parse("gts.x.core.events.type.v1~vendor.app._.custom.v1~").unwrap();
/// assert_eq!(id.segment_count(), 2);
/// assert_eq!(id.classification(), Classification::Schema);
///
/// let err = parse("gts.a.b.c.d.v1~x.y.z.w.v2~extra").unwrap_err();
/// assert_eq!(err.kind, ErrorKind::InvalidChain);
/// assert_eq!(err.segment, Some(2));
///
/// assert_eq!(parse("   ").unwrap_err().kind, ErrorKind::EmptyIdentifier);
/// ```
pub fn parse(raw: &str) -> Result<Identifier> {
    parse_bytes(raw).map_err(|err| err.at_char_offset(raw))
}

/// Like [`parse`], but error offsets stay in bytes for callers that embed
/// identifiers in larger inputs.
pub(crate) fn parse_bytes(raw: &str) -> Result<Identifier> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::empty());
    }
    let lead = raw.len() - raw.trim_start().len();

    let result = parse_chain(trimmed, lead);
    match &result {
        Ok(identifier) => debug!(
            identifier = %identifier,
            segments = identifier.segment_count(),
            "parsed GTS identifier"
        ),
        Err(err) => debug!(kind = %err.kind, offset = err.offset, "rejected GTS identifier"),
    }
    result
}

fn parse_chain(text: &str, base: usize) -> Result<Identifier> {
    let (body, terminal_is_schema) = match text.strip_suffix(SCHEMA_MARKER) {
        Some(body) => (body, true),
        None => (text, false),
    };

    let pieces = split_links(body, base);
    let chained = pieces.len() > 1;
    let last = pieces.len() - 1;

    let mut segments = Vec::with_capacity(pieces.len());
    for (index, (offset, piece)) in pieces.into_iter().enumerate() {
        if chained && piece.is_empty() {
            return Err(empty_link(index, offset));
        }
        let link = Link {
            index,
            offset,
            absolute: index == 0,
        };
        let mut segment = lex_segment(piece, link).map_err(|err| {
            if chained {
                err.into_chain_error()
            } else {
                err
            }
        })?;
        segment.set_schema(index < last || terminal_is_schema);
        segments.push(segment);
    }

    Ok(Identifier { segments })
}

/// Splits on `~` and pairs each piece with its byte offset.
pub(crate) fn split_links(text: &str, base: usize) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut at = base;
    for piece in text.split(SCHEMA_MARKER) {
        pieces.push((at, piece));
        at += piece.len() + SCHEMA_MARKER.len_utf8();
    }
    pieces
}

pub(crate) fn empty_link(index: usize, offset: usize) -> ParseError {
    ParseError::new(
        ErrorKind::InvalidChain,
        offset,
        format!("chain link {} is empty", index + 1),
    )
    .in_segment(index)
    .with_fault(ChainFault::EmptyLink)
}

fn non_terminal_instance(index: usize, offset: usize) -> ParseError {
    ParseError::new(
        ErrorKind::InvalidChain,
        offset,
        format!(
            "chain link {} is an instance; all segments except the last must be type IDs (ending with ~)",
            index + 1
        ),
    )
    .in_segment(index)
    .with_fault(ChainFault::NonTerminalInstance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SegmentField;
    use crate::segment::{parse_relative_segment, parse_segment};

    #[test]
    fn test_single_segment_instance() {
        let id = parse("gts.a.b.c.d.v1").unwrap();
        assert_eq!(id.segment_count(), 1);
        assert_eq!(id.classification(), Classification::Instance);
        assert!(!id.is_chained());
    }

    #[test]
    fn test_single_segment_schema() {
        let id = parse("gts.a.b.c.d.v1~").unwrap();
        assert_eq!(id.classification(), Classification::Schema);
        assert!(id.root().is_schema());
    }

    #[test]
    fn test_two_schema_links() {
        let id = parse("gts.a.b.c.d.v1~x.y.z.w.v2~").unwrap();
        assert_eq!(id.segment_count(), 2);
        assert!(id.segments().iter().all(Segment::is_schema));
        assert_eq!(id.terminal().vendor(), "x");
    }

    #[test]
    fn test_terminal_instance_with_minor() {
        let id = parse("gts.a.b.c.d.v1~x.y.z.w.v2.3").unwrap();
        assert!(id.root().is_schema());
        assert!(!id.terminal().is_schema());
        assert_eq!(id.terminal().major().to_u64(), Some(2));
        assert_eq!(id.terminal().minor().and_then(|minor| minor.to_u64()), Some(3));
    }

    #[test]
    fn test_three_links_every_separator_marks_schema() {
        let id = parse("gts.a.b.c.d.v1~x.y.z.w.v1~q.r.s.t.v1").unwrap();
        assert_eq!(id.segment_count(), 3);
        assert!(id.segments()[0].is_schema());
        assert!(id.segments()[1].is_schema());
        assert!(id.is_instance());
    }

    #[test]
    fn test_trailing_garbage_is_invalid_chain() {
        let err = parse("gts.a.b.c.d.v1~x.y.z.w.v2~extra").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidChain);
        assert_eq!(err.fault, Some(ChainFault::BadSegment));
        assert_eq!(err.segment, Some(2));
        // "extra" is a lone label; the package that should follow it is missing.
        assert_eq!(err.field, Some(SegmentField::Package));
        assert_eq!(err.offset, 31);
    }

    #[test]
    fn test_bad_label_in_chain_keeps_field() {
        let err = parse("gts.a.b.c.d.v1~x.Y.z.w.v2").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidChain);
        assert_eq!(err.segment, Some(1));
        assert_eq!(err.field, Some(SegmentField::Package));
        assert_eq!(err.offset, 17);
        assert!(err.message.starts_with("chain link 2:"));
    }

    #[test]
    fn test_relative_link_must_not_repeat_prefix() {
        let err = parse("gts.a.b.c.d.v1~gts.x.y.z.w.v2").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidChain);
        assert_eq!(err.segment, Some(1));
    }

    #[test]
    fn test_double_separator_is_empty_link() {
        let err = parse("gts.a.b.c.d.v1~~").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidChain);
        assert_eq!(err.fault, Some(ChainFault::EmptyLink));
        assert_eq!(err.segment, Some(1));
        assert_eq!(err.offset, 15);
    }

    #[test]
    fn test_lone_marker_is_segment_error() {
        let err = parse("~").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSegmentFormat);
    }

    #[test]
    fn test_whitespace_is_trimmed_and_offsets_include_it() {
        let id = parse("  gts.a.b.c.d.v1~  ").unwrap();
        assert_eq!(id, parse("gts.a.b.c.d.v1~").unwrap());

        let err = parse("  gts.a.B.c.d.v1").unwrap_err();
        assert_eq!(err.offset, 8);
    }

    #[test]
    fn test_interior_whitespace_is_rejected() {
        let err = parse("gts.a.b .c.d.v1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSegmentFormat);
        assert_eq!(err.field, Some(SegmentField::Package));
    }

    #[test]
    fn test_empty_and_blank_inputs() {
        assert_eq!(parse("").unwrap_err().kind, ErrorKind::EmptyIdentifier);
        assert_eq!(parse(" \t\n").unwrap_err().kind, ErrorKind::EmptyIdentifier);
    }

    #[test]
    fn test_display_round_trip() {
        for raw in [
            "gts.x.core.events.type.v1~",
            "gts.vendor.app.user.profile.v2.1",
            "gts.x.core.events.type.v1~vendor.app._.custom.v1~",
            "gts.x.core.acm.user.v1~ven.app._.admin.v1.2",
        ] {
            let id = parse(raw).unwrap();
            assert_eq!(id.to_string(), raw);
            assert_eq!(parse(&id.to_string()).unwrap(), id);
        }
    }

    #[test]
    fn test_from_segments_accepts_schema_prefix() {
        let base = parse_segment("gts.a.b.c.d.v1~").unwrap();
        let child = parse_relative_segment("x.y.z.w.v1").unwrap();
        let id = Identifier::from_segments(vec![base, child]).unwrap();
        assert_eq!(id.to_string(), "gts.a.b.c.d.v1~x.y.z.w.v1");
    }

    #[test]
    fn test_from_segments_reports_offset_of_instance_link() {
        let base = parse_segment("gts.a.b.c.d.v1~").unwrap();
        let middle = parse_relative_segment("x.y.z.w.v1").unwrap();
        let tail = parse_relative_segment("q.r.s.t.v1").unwrap();
        let err = Identifier::from_segments(vec![base, middle, tail]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidChain);
        assert_eq!(err.fault, Some(ChainFault::NonTerminalInstance));
        assert_eq!(err.segment, Some(1));
        assert_eq!(err.offset, 15);
    }

    #[test]
    fn test_from_segments_rejects_empty() {
        let err = Identifier::from_segments(Vec::new()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::EmptyIdentifier);
    }

    #[test]
    fn test_derive_from_instance_fails() {
        let instance = parse("gts.a.b.c.d.v1").unwrap();
        let child = parse_relative_segment("x.y.z.w.v1").unwrap();
        let err = instance.derive(child).unwrap_err();
        assert_eq!(err.fault, Some(ChainFault::NonTerminalInstance));
        assert_eq!(err.offset, 4);
    }

    #[test]
    fn test_serde_uses_canonical_string() {
        let id = parse("gts.x.core.events.type.v1~").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"gts.x.core.events.type.v1~\"");

        let back: Identifier = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);

        assert!(serde_json::from_str::<Identifier>("\"gts.X\"").is_err());
    }

    #[test]
    fn test_from_str() {
        let id: Identifier = "gts.a.b.c.d.v1".parse().unwrap();
        assert_eq!(id.terminal().type_name(), "d");
    }
}
