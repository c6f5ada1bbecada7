//! Segment grammar: one `gts.<vendor>.<package>.<namespace>.<type>.v<MAJOR>[.<MINOR>][~]` unit.
//!
//! The first link of a chain is *absolute* and carries the literal `gts.`
//! prefix. Later links are *relative* and omit it. Both forms share the same
//! label and version rules:
//!
//! ```text
//! label      := ("a"-"z" | "_") ("a"-"z" | "0"-"9" | "_")*
//! version    := "v" nonneg_int [ "." nonneg_int ]
//! nonneg_int := "0" | ("1"-"9") digit*
//! ```

use std::cmp::Ordering;
use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{ErrorKind, ParseError, Result, SegmentField};

/// Literal that opens the first (absolute) segment of every identifier.
pub const GTS_PREFIX: &str = "gts.";

/// Marks a schema segment and separates chain links.
pub const SCHEMA_MARKER: char = '~';

/// Fields in the order they appear after the prefix.
const FIELD_ORDER: [SegmentField; 6] = [
    SegmentField::Vendor,
    SegmentField::Package,
    SegmentField::Namespace,
    SegmentField::Type,
    SegmentField::Major,
    SegmentField::Minor,
];

/// Fields every segment must have (minor is optional).
const REQUIRED_FIELDS: usize = 5;

/// One parsed GTS segment.
///
/// Segments only come out of a successful parse, so every accessor returns a
/// value that already satisfies the grammar.
///
/// # Examples
///
/// ```
/// use gts_core::parse_segment;
///
/// let segment = parse_segment("gts.x.core.events.type.v1.2~").unwrap();
/// assert_eq!(segment.vendor(), "x");
/// assert_eq!(segment.type_name(), "type");
/// assert_eq!(segment.major().as_str(), "1");
/// assert_eq!(segment.minor().map(|minor| minor.as_str()), Some("2"));
/// assert!(segment.is_schema());
/// assert_eq!(segment.to_string(), "x.core.events.type.v1.2~");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Segment {
    vendor: String,
    package: String,
    namespace: String,
    #[serde(rename = "type")]
    type_name: String,
    major: VersionNumber,
    #[serde(skip_serializing_if = "Option::is_none")]
    minor: Option<VersionNumber>,
    is_schema: bool,
}

impl Segment {
    pub fn vendor(&self) -> &str {
        &self.vendor
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    /// Namespace label; `_` is the "not applicable" placeholder.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn major(&self) -> &VersionNumber {
        &self.major
    }

    pub fn minor(&self) -> Option<&VersionNumber> {
        self.minor.as_ref()
    }

    /// Whether this segment names a schema (type) rather than an instance.
    pub fn is_schema(&self) -> bool {
        self.is_schema
    }

    /// Renders `v<MAJOR>[.<MINOR>]`.
    ///
    /// ```
    /// use gts_core::parse_segment;
    ///
    /// assert_eq!(parse_segment("gts.a.b.c.d.v0").unwrap().version_string(), "v0");
    /// assert_eq!(parse_segment("gts.a.b.c.d.v3.12").unwrap().version_string(), "v3.12");
    /// ```
    pub fn version_string(&self) -> String {
        match &self.minor {
            Some(minor) => format!("v{}.{minor}", self.major),
            None => format!("v{}", self.major),
        }
    }

    /// Relative form without the schema marker.
    pub fn to_unmarked_string(&self) -> String {
        format!(
            "{}.{}.{}.{}.{}",
            self.vendor,
            self.package,
            self.namespace,
            self.type_name,
            self.version_string()
        )
    }

    pub(crate) fn set_schema(&mut self, is_schema: bool) {
        self.is_schema = is_schema;
    }
}

/// Relative form, followed by `~` for schema segments.
impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_unmarked_string())?;
        if self.is_schema {
            write!(f, "{SCHEMA_MARKER}")?;
        }
        Ok(())
    }
}

/// A version component exactly as written: `0` or digits without a leading
/// zero, of any length.
///
/// Ordering is numeric. Serializes as a JSON number when it fits in `u64`
/// and as a string otherwise.
///
/// ```
/// use gts_core::parse_segment;
///
/// let huge = parse_segment("gts.a.b.c.d.v18446744073709551616").unwrap();
/// assert_eq!(huge.major().to_u64(), None);
/// assert_eq!(huge.version_string(), "v18446744073709551616");
///
/// let small = parse_segment("gts.a.b.c.d.v9").unwrap();
/// assert!(small.major() < huge.major());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionNumber(String);

impl VersionNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric value, or `None` when it does not fit in `u64`.
    pub fn to_u64(&self) -> Option<u64> {
        self.0.parse().ok()
    }
}

impl Ord for VersionNumber {
    fn cmp(&self, other: &Self) -> Ordering {
        // No leading zeros, so the longer digit run is the larger number.
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl PartialOrd for VersionNumber {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for VersionNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.to_u64() {
            Some(number) => serializer.serialize_u64(number),
            None => serializer.serialize_str(&self.0),
        }
    }
}

/// Where a piece of text sits inside the identifier being parsed.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Link {
    /// Zero-based chain position.
    pub index: usize,
    /// Byte offset of the piece inside the caller's input.
    pub offset: usize,
    /// Whether the piece must start with `gts.`.
    pub absolute: bool,
}

impl Link {
    fn error(self, at: usize, field: Option<SegmentField>, message: String) -> ParseError {
        ParseError::new(ErrorKind::InvalidSegmentFormat, self.offset + at, message)
            .in_segment(self.index)
            .with_field(field)
    }
}

/// Parses an absolute segment such as `gts.x.core.events.type.v1~`.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidSegmentFormat`] naming the offending field when
/// the text is not a single well-formed segment.
///
/// # Examples
///
/// ```
/// use gts_core::{ErrorKind, SegmentField, parse_segment};
///
/// assert!(!parse_segment("gts.vendor.app.user.profile.v2.1").unwrap().is_schema());
///
/// let err = parse_segment("gts.vendor.app.user.profile.v01").unwrap_err();
/// assert_eq!(err.kind, ErrorKind::InvalidSegmentFormat);
/// assert_eq!(err.field, Some(SegmentField::Major));
/// ```
pub fn parse_segment(text: &str) -> Result<Segment> {
    let link = Link {
        index: 0,
        offset: 0,
        absolute: true,
    };
    lex_segment(text, link).map_err(|err| err.at_char_offset(text))
}

/// Parses a relative chain link such as `vendor.app._.custom.v1~`.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidSegmentFormat`] on malformed input.
pub fn parse_relative_segment(text: &str) -> Result<Segment> {
    let link = Link {
        index: 0,
        offset: 0,
        absolute: false,
    };
    lex_segment(text, link).map_err(|err| err.at_char_offset(text))
}

/// Lexes one complete segment. Offsets in the returned error are bytes.
pub(crate) fn lex_segment(text: &str, link: Link) -> Result<Segment> {
    if text.is_empty() {
        return Err(link.error(0, None, "segment is empty".to_string()));
    }

    let (body, is_schema) = match text.strip_suffix(SCHEMA_MARKER) {
        Some(body) => (body, true),
        None => (text, false),
    };
    if let Some(pos) = body.find(SCHEMA_MARKER) {
        return Err(link.error(
            pos,
            None,
            "unexpected chain separator '~' inside a segment".to_string(),
        ));
    }

    let start = strip_prefix(body, link)?;
    let tokens = split_tokens(&body[start..], start);

    let mut labels: Vec<&str> = Vec::with_capacity(4);
    let mut major = None;
    let mut minor = None;
    for (&(at, token), &field) in tokens.iter().zip(FIELD_ORDER.iter()) {
        match check_token(field, token) {
            Ok(Some(number)) if field == SegmentField::Major => major = Some(number),
            Ok(Some(number)) => minor = Some(number),
            Ok(None) => labels.push(token),
            Err((pos, message)) => return Err(link.error(at + pos, Some(field), message)),
        }
    }

    if let Some(&(at, token)) = tokens.get(FIELD_ORDER.len()) {
        return Err(link.error(
            at,
            Some(SegmentField::Trailing),
            format!("unexpected component '{token}' after the minor version"),
        ));
    }

    let (Some(major), [vendor, package, namespace, type_name]) = (major, labels.as_slice()) else {
        let missing = FIELD_ORDER[tokens.len().min(REQUIRED_FIELDS - 1)];
        return Err(link.error(
            body.len(),
            Some(missing),
            format!(
                "missing {missing}; expected <vendor>.<package>.<namespace>.<type>.v<MAJOR>[.<MINOR>]"
            ),
        ));
    };

    Ok(Segment {
        vendor: (*vendor).to_string(),
        package: (*package).to_string(),
        namespace: (*namespace).to_string(),
        type_name: (*type_name).to_string(),
        major,
        minor,
        is_schema,
    })
}

/// Checks the head of an unfinished segment that ends right before a
/// wildcard: every component present must be well-formed, and there must be
/// room for at least one more.
///
/// `text` is empty (wildcard right after `~`) or ends with `.`.
pub(crate) fn check_partial_segment(text: &str, link: Link) -> Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    let head = text.strip_suffix('.').unwrap_or(text);

    if link.absolute {
        if head == GTS_PREFIX.trim_end_matches('.') {
            return Ok(());
        }
        if !head.starts_with(GTS_PREFIX) {
            return Err(link.error(
                0,
                Some(SegmentField::Prefix),
                "absolute segment must start with 'gts.'".to_string(),
            ));
        }
    }
    let start = if link.absolute { GTS_PREFIX.len() } else { 0 };
    let tokens = split_tokens(&head[start..], start);

    if tokens.len() >= FIELD_ORDER.len() {
        return Err(link.error(
            head.len(),
            Some(SegmentField::Trailing),
            "nothing can follow the minor version".to_string(),
        ));
    }
    for (&(at, token), &field) in tokens.iter().zip(FIELD_ORDER.iter()) {
        check_token(field, token)
            .map_err(|(pos, message)| link.error(at + pos, Some(field), message))?;
    }
    Ok(())
}

/// Returns the byte index where fields start, after any required prefix.
fn strip_prefix(body: &str, link: Link) -> Result<usize> {
    if !link.absolute {
        return Ok(0);
    }
    if body.starts_with(GTS_PREFIX) {
        Ok(GTS_PREFIX.len())
    } else {
        Err(link.error(
            0,
            Some(SegmentField::Prefix),
            "absolute segment must start with 'gts.'".to_string(),
        ))
    }
}

/// Splits on `.` and pairs each token with its byte offset.
fn split_tokens(text: &str, base: usize) -> Vec<(usize, &str)> {
    let mut tokens = Vec::new();
    let mut at = base;
    for token in text.split('.') {
        tokens.push((at, token));
        at += token.len() + 1;
    }
    tokens
}

/// Validates one component. Returns the number for version fields.
/// Errors carry the byte position inside the token.
fn check_token(
    field: SegmentField,
    token: &str,
) -> std::result::Result<Option<VersionNumber>, (usize, String)> {
    match field {
        SegmentField::Major => match token.strip_prefix('v') {
            Some(digits) => parse_version_number(digits)
                .map(Some)
                .map_err(|(pos, message)| (pos + 1, message)),
            None => Err((0, format!("version '{token}' must start with 'v'"))),
        },
        SegmentField::Minor => parse_version_number(token).map(Some),
        _ => check_label(token).map(|()| None),
    }
}

fn check_label(token: &str) -> std::result::Result<(), (usize, String)> {
    let mut chars = token.char_indices();
    match chars.next() {
        None => return Err((0, "label is empty".to_string())),
        Some((_, c)) if c.is_ascii_lowercase() || c == '_' => {}
        Some((_, c)) if c.is_ascii_digit() => {
            return Err((0, format!("label '{token}' must not start with a digit")));
        }
        Some((_, c)) => {
            return Err((
                0,
                format!("label '{token}' must start with a lowercase letter or '_', found '{c}'"),
            ));
        }
    }
    match chars.find(|(_, c)| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')) {
        Some((pos, c)) => Err((pos, format!("label '{token}' contains invalid character '{c}'"))),
        None => Ok(()),
    }
}

fn parse_version_number(digits: &str) -> std::result::Result<VersionNumber, (usize, String)> {
    if digits.is_empty() {
        return Err((0, "missing version number".to_string()));
    }
    if let Some((pos, c)) = digits.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        return Err((pos, format!("version number '{digits}' contains invalid character '{c}'")));
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return Err((0, format!("version number '{digits}' has a leading zero")));
    }
    Ok(VersionNumber(digits.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn absolute(text: &str) -> Result<Segment> {
        parse_segment(text)
    }

    #[test]
    fn test_parses_all_fields() {
        let segment = absolute("gts.vendor.app.user.profile.v2.1").unwrap();
        assert_eq!(segment.vendor(), "vendor");
        assert_eq!(segment.package(), "app");
        assert_eq!(segment.namespace(), "user");
        assert_eq!(segment.type_name(), "profile");
        assert_eq!(segment.major().as_str(), "2");
        assert_eq!(segment.minor().map(VersionNumber::as_str), Some("1"));
        assert!(!segment.is_schema());
    }

    #[test]
    fn test_trailing_marker_makes_schema() {
        assert!(absolute("gts.a.b.c.d.v1~").unwrap().is_schema());
        assert!(!absolute("gts.a.b.c.d.v1").unwrap().is_schema());
    }

    #[test]
    fn test_namespace_placeholder_is_legal() {
        let segment = absolute("gts.ven.app._.admin.v1").unwrap();
        assert_eq!(segment.namespace(), "_");
    }

    #[test]
    fn test_version_zero_is_legal() {
        let segment = absolute("gts.a.b.c.d.v0.0").unwrap();
        assert_eq!(segment.major().to_u64(), Some(0));
        assert_eq!(segment.minor().and_then(VersionNumber::to_u64), Some(0));
    }

    #[test]
    fn test_relative_segment_has_no_prefix() {
        let segment = parse_relative_segment("vendor.app._.custom.v1~").unwrap();
        assert_eq!(segment.vendor(), "vendor");
        assert!(segment.is_schema());

        // Four labels plus "gts" is one label too many for a relative link.
        let err = parse_relative_segment("gts.vendor.app._.custom.v1").unwrap_err();
        assert_eq!(err.field, Some(SegmentField::Major));
    }

    #[test]
    fn test_missing_prefix_is_rejected() {
        let err = absolute("x.core.events.type.v1").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidSegmentFormat);
        assert_eq!(err.field, Some(SegmentField::Prefix));
        assert_eq!(err.offset, 0);
    }

    #[test]
    fn test_uppercase_label_reports_field_and_offset() {
        let err = absolute("gts.x.Core.events.type.v1").unwrap_err();
        assert_eq!(err.field, Some(SegmentField::Package));
        assert_eq!(err.offset, 6);
    }

    #[test]
    fn test_invalid_character_offset_points_at_character() {
        let err = absolute("gts.x.co-re.events.type.v1").unwrap_err();
        assert_eq!(err.field, Some(SegmentField::Package));
        assert_eq!(err.offset, 8);
    }

    #[test]
    fn test_digit_first_label_is_rejected() {
        let err = absolute("gts.1x.core.events.type.v1").unwrap_err();
        assert_eq!(err.field, Some(SegmentField::Vendor));
        assert!(err.message.contains("must not start with a digit"));
    }

    #[test]
    fn test_leading_zero_versions_are_rejected() {
        let err = absolute("gts.a.b.c.d.v01").unwrap_err();
        assert_eq!(err.field, Some(SegmentField::Major));
        assert_eq!(err.offset, 13);

        let err = absolute("gts.a.b.c.d.v1.02").unwrap_err();
        assert_eq!(err.field, Some(SegmentField::Minor));
    }

    #[test]
    fn test_versions_beyond_u64_are_kept_verbatim() {
        let segment =
            absolute("gts.a.b.c.d.v18446744073709551616.99999999999999999999999~").unwrap();
        assert_eq!(segment.major().as_str(), "18446744073709551616");
        assert_eq!(segment.major().to_u64(), None);
        assert_eq!(
            segment.to_string(),
            "a.b.c.d.v18446744073709551616.99999999999999999999999~"
        );

        let json = serde_json::to_value(&segment).unwrap();
        assert_eq!(json["major"], "18446744073709551616");
        assert_eq!(json["minor"], "99999999999999999999999");
    }

    #[test]
    fn test_version_order_is_numeric() {
        let version = |text: &str| absolute(text).unwrap().major().clone();
        assert!(version("gts.a.b.c.d.v9") < version("gts.a.b.c.d.v10"));
        assert!(version("gts.a.b.c.d.v0") < version("gts.a.b.c.d.v1"));
        assert!(
            version("gts.a.b.c.d.v99999999999999999999")
                < version("gts.a.b.c.d.v100000000000000000000")
        );
        assert_eq!(version("gts.a.b.c.d.v12"), version("gts.a.b.c.d.v12~"));
    }

    #[test]
    fn test_negative_version_is_rejected() {
        let err = absolute("gts.a.b.c.d.v-1").unwrap_err();
        assert_eq!(err.field, Some(SegmentField::Major));
    }

    #[test]
    fn test_missing_version_names_missing_field() {
        let err = absolute("gts.a.b.c.d").unwrap_err();
        assert_eq!(err.field, Some(SegmentField::Major));
        assert_eq!(err.offset, 11);

        let err = absolute("gts.a.b.c.v1").unwrap_err();
        assert_eq!(err.field, Some(SegmentField::Major));
    }

    #[test]
    fn test_extra_component_is_trailing() {
        let err = absolute("gts.a.b.c.d.v1.2.3").unwrap_err();
        assert_eq!(err.field, Some(SegmentField::Trailing));
        assert_eq!(err.offset, 17);
    }

    #[test]
    fn test_interior_separator_is_rejected() {
        let err = absolute("gts.a.b.c.d.v1~x").unwrap_err();
        assert_eq!(err.offset, 14);
        assert!(err.message.contains("chain separator"));
    }

    #[test]
    fn test_empty_label_is_rejected() {
        let err = absolute("gts.a..c.d.v1").unwrap_err();
        assert_eq!(err.field, Some(SegmentField::Package));
        assert_eq!(err.message, "label is empty");
    }

    #[test]
    fn test_display_round_trips_relative_form() {
        let segment = absolute("gts.a.b.c.d.v1.2~").unwrap();
        assert_eq!(segment.to_string(), "a.b.c.d.v1.2~");
        assert_eq!(segment.to_unmarked_string(), "a.b.c.d.v1.2");
        assert_eq!(parse_relative_segment(&segment.to_string()).unwrap(), segment);
    }

    #[test]
    fn test_partial_segment_accepts_boundaries() {
        let link = Link {
            index: 0,
            offset: 0,
            absolute: true,
        };
        assert!(check_partial_segment("gts.", link).is_ok());
        assert!(check_partial_segment("gts.x.core.", link).is_ok());
        assert!(check_partial_segment("gts.x.llm.chat.message.v1.", link).is_ok());
        assert!(check_partial_segment("gts.x.llm.chat.message.v1.2.", link).is_err());
        assert!(check_partial_segment("gtx.", link).is_err());
        assert!(check_partial_segment("gts.X.", link).is_err());
    }
}
