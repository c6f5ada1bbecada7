//! Query and access-control patterns: identifiers with an optional trailing
//! wildcard.
//!
//! A wildcard pattern keeps its literal prefix and matches any identifier
//! whose canonical text starts with it. Matching works on raw text, so
//! `gts.x.core.events.type.v1~*` also matches identifiers with further
//! `~`-separated links. Patterns are for queries only and never for stored
//! identifiers.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{ErrorKind, ParseError, Result};
use crate::identifier::{self, Identifier, empty_link, split_links};
use crate::segment::{Link, SCHEMA_MARKER, check_partial_segment, lex_segment};

/// Character that ends a wildcard pattern.
pub const WILDCARD: char = '*';

/// A parsed pattern.
///
/// # Examples
///
/// ```
/// use gts_core::{parse, parse_pattern};
///
/// let pattern = parse_pattern("gts.x.core.events.type.v1~*").unwrap();
/// assert!(pattern.has_wildcard());
/// assert_eq!(pattern.literal_prefix(), "gts.x.core.events.type.v1~");
///
/// assert!(pattern.matches(&parse("gts.x.core.events.type.v1~ven.app._.custom.v1~").unwrap()));
/// assert!(!pattern.matches(&parse("gts.x.core.events.topic.v1~").unwrap()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Pattern {
    literal_prefix: String,
    has_wildcard: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    identifier: Option<Identifier>,
}

/// Ordering key for "most specific pattern wins".
///
/// Exact patterns beat any wildcard. Among wildcards, a longer literal prefix
/// is more specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Specificity {
    exact: bool,
    prefix_len: usize,
}

impl Pattern {
    /// Wraps a parsed identifier as a pattern without a wildcard.
    pub fn exact(identifier: Identifier) -> Self {
        Self {
            literal_prefix: identifier.to_string(),
            has_wildcard: false,
            identifier: Some(identifier),
        }
    }

    /// Text before the wildcard, or the canonical identifier for exact patterns.
    pub fn literal_prefix(&self) -> &str {
        &self.literal_prefix
    }

    pub fn has_wildcard(&self) -> bool {
        self.has_wildcard
    }

    /// The full identifier of an exact pattern.
    pub fn identifier(&self) -> Option<&Identifier> {
        self.identifier.as_ref()
    }

    pub fn specificity(&self) -> Specificity {
        Specificity {
            exact: !self.has_wildcard,
            prefix_len: self.literal_prefix.chars().count(),
        }
    }

    /// Tests a parsed identifier against this pattern.
    ///
    /// Exact patterns compare structurally. Wildcard patterns compare the
    /// candidate's canonical text against the literal prefix.
    pub fn matches(&self, candidate: &Identifier) -> bool {
        match &self.identifier {
            Some(identifier) => identifier == candidate,
            None => candidate.to_string().starts_with(&self.literal_prefix),
        }
    }

    /// Parses `raw` and tests it. Text that is not a valid identifier never
    /// matches.
    ///
    /// ```
    /// use gts_core::parse_pattern;
    ///
    /// let pattern = parse_pattern("gts.vendor.app.user.profile.v2.1").unwrap();
    /// assert!(pattern.matches_raw("  gts.vendor.app.user.profile.v2.1 "));
    /// assert!(!pattern.matches_raw("gts.vendor.app.user.profile.v2.1~"));
    /// assert!(!pattern.matches_raw("not an identifier"));
    /// ```
    pub fn matches_raw(&self, raw: &str) -> bool {
        match identifier::parse(raw) {
            Ok(candidate) => self.matches(&candidate),
            Err(_) => false,
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal_prefix)?;
        if self.has_wildcard {
            write!(f, "{WILDCARD}")?;
        }
        Ok(())
    }
}

impl FromStr for Pattern {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self> {
        parse_pattern(s)
    }
}

/// Parses a pattern with at most one trailing wildcard.
///
/// The wildcard must be the last character and must directly follow `.` or
/// `~`, so it never splits a label. The text before it must be a valid
/// beginning of some identifier. Without a wildcard the text is parsed as a
/// full identifier.
///
/// # Errors
///
/// [`ErrorKind::MultipleOrMisplacedWildcard`] for a second `*` or one outside
/// the trailing boundary position. Otherwise the errors of
/// [`parse`](crate::parse) apply to the literal part.
///
/// # Examples
///
/// ```
/// use gts_core::{ErrorKind, parse_pattern};
///
/// assert!(parse_pattern("gts.x.llm.chat.message.v1.*").unwrap().has_wildcard());
/// assert!(!parse_pattern("gts.x.core.events.type.v1~").unwrap().has_wildcard());
///
/// let err = parse_pattern("gts.a.b.c.d.v1*~more").unwrap_err();
/// assert_eq!(err.kind, ErrorKind::MultipleOrMisplacedWildcard);
/// ```
pub fn parse_pattern(raw: &str) -> Result<Pattern> {
    parse_pattern_bytes(raw).map_err(|err| err.at_char_offset(raw))
}

/// Free-function form of [`Pattern::matches_raw`].
pub fn matches(pattern: &Pattern, candidate: &str) -> bool {
    pattern.matches_raw(candidate)
}

pub(crate) fn parse_pattern_bytes(raw: &str) -> Result<Pattern> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::empty());
    }
    let lead = raw.len() - raw.trim_start().len();

    let Some(star) = trimmed.find(WILDCARD) else {
        return identifier::parse_bytes(raw).map(Pattern::exact);
    };

    if star + WILDCARD.len_utf8() != trimmed.len() {
        let message = if trimmed[star + WILDCARD.len_utf8()..].contains(WILDCARD) {
            "only one wildcard is allowed per pattern"
        } else {
            "wildcard must appear at the end of the pattern"
        };
        return Err(misplaced(lead + star, message));
    }

    let prefix = &trimmed[..star];
    if !(prefix.ends_with('.') || prefix.ends_with(SCHEMA_MARKER)) {
        return Err(misplaced(
            lead + star,
            "wildcard must start a new label, directly after '.' or '~'",
        ));
    }

    check_prefix(prefix, lead)?;

    Ok(Pattern {
        literal_prefix: prefix.to_string(),
        has_wildcard: true,
        identifier: None,
    })
}

/// Every link before the last `~` must be complete; the last one may stop at
/// any `.` boundary.
fn check_prefix(prefix: &str, base: usize) -> Result<()> {
    let pieces = split_links(prefix, base);
    let chained = pieces.len() > 1;
    let last = pieces.len() - 1;

    for (index, (offset, piece)) in pieces.into_iter().enumerate() {
        let link = Link {
            index,
            offset,
            absolute: index == 0,
        };
        let checked = if index < last {
            if piece.is_empty() {
                return Err(empty_link(index, offset));
            }
            lex_segment(piece, link).map(|_| ())
        } else {
            check_partial_segment(piece, link)
        };
        checked.map_err(|err| {
            if chained {
                err.into_chain_error()
            } else {
                err
            }
        })?;
    }
    Ok(())
}

fn misplaced(offset: usize, message: &str) -> ParseError {
    ParseError::new(ErrorKind::MultipleOrMisplacedWildcard, offset, message)
}
