//! Runtime query suffixes: `[key="value"]` predicates and `@key.path`
//! attribute selectors.
//!
//! Only the split is done here. The text inside a selector is kept verbatim
//! as [`Unvalidated`] so it cannot be mistaken for a checked value. The part
//! before the selector is parsed as a [`Pattern`].

use serde::Serialize;

use crate::error::{ErrorKind, ParseError, Result};
use crate::pattern::{Pattern, parse_pattern_bytes};

const PREDICATE_OPEN: char = '[';
const PREDICATE_CLOSE: char = ']';
const ATTRIBUTE_MARKER: char = '@';

/// Selector text that has not been checked beyond its delimiters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Unvalidated(String);

impl Unvalidated {
    /// Raw selector text. Its contents were **not** validated.
    pub fn as_unvalidated_str(&self) -> &str {
        &self.0
    }
}

/// Suffix attached after an identifier or pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum Selector {
    /// Text between `[` and `]`, e.g. `user_type="gts.x.core.acm.user.v1~"`.
    Predicate(Unvalidated),
    /// Text after `@`, e.g. `foo.bar`.
    Attribute(Unvalidated),
}

impl Selector {
    /// Attribute path split on `.`, for display only.
    ///
    /// ```
    /// use gts_core::parse_attribute_selector;
    ///
    /// let query = parse_attribute_selector("gts.x.y.z.message.v1.0@foo.bar").unwrap();
    /// let selector = query.selector.unwrap();
    /// assert_eq!(selector.attribute_path(), Some(vec!["foo", "bar"]));
    /// ```
    pub fn attribute_path(&self) -> Option<Vec<&str>> {
        match self {
            Self::Attribute(path) => Some(path.as_unvalidated_str().split('.').collect()),
            Self::Predicate(_) => None,
        }
    }

    pub fn unvalidated(&self) -> &Unvalidated {
        match self {
            Self::Predicate(text) | Self::Attribute(text) => text,
        }
    }
}

/// An identifier or pattern plus an optional unvalidated selector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Query {
    pub target: Pattern,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<Selector>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Accept {
    Any,
    Predicate,
    Attribute,
}

/// Splits off a `[..]` or `@..` suffix, whichever opens first, and parses the
/// rest as a pattern.
///
/// # Errors
///
/// [`ErrorKind::UnterminatedPredicate`] when the suffix never closes, plus
/// any error from [`parse_pattern`](crate::parse_pattern) for the target.
///
/// # Examples
///
/// ```
/// use gts_core::{Selector, parse_query};
///
/// let query = parse_query(
///     r#"gts.x.ui.left_menu.menu_item.v1[screen_type="gts.x.ui.core_ui.screens.v1~abc.*"]"#,
/// )
/// .unwrap();
/// assert_eq!(query.target.literal_prefix(), "gts.x.ui.left_menu.menu_item.v1");
/// let Some(Selector::Predicate(text)) = query.selector else { panic!("expected predicate") };
/// assert_eq!(text.as_unvalidated_str(), r#"screen_type="gts.x.ui.core_ui.screens.v1~abc.*""#);
/// ```
pub fn parse_query(raw: &str) -> Result<Query> {
    split_query(raw, Accept::Any).map_err(|err| err.at_char_offset(raw))
}

/// Like [`parse_query`], but only a `[..]` suffix is split off.
///
/// # Errors
///
/// See [`parse_query`].
pub fn parse_predicate(raw: &str) -> Result<Query> {
    split_query(raw, Accept::Predicate).map_err(|err| err.at_char_offset(raw))
}

/// Like [`parse_query`], but only an `@..` suffix is split off.
///
/// # Errors
///
/// See [`parse_query`].
pub fn parse_attribute_selector(raw: &str) -> Result<Query> {
    split_query(raw, Accept::Attribute).map_err(|err| err.at_char_offset(raw))
}

fn split_query(raw: &str, accept: Accept) -> Result<Query> {
    if raw.trim().is_empty() {
        return Err(ParseError::empty());
    }

    let open = match accept {
        Accept::Any => raw.find([PREDICATE_OPEN, ATTRIBUTE_MARKER]),
        Accept::Predicate => raw.find(PREDICATE_OPEN),
        Accept::Attribute => raw.find(ATTRIBUTE_MARKER),
    };
    let Some(open) = open else {
        let target = parse_pattern_bytes(raw)?;
        return Ok(Query {
            target,
            selector: None,
        });
    };

    let (head, suffix) = raw.split_at(open);
    let suffix = suffix.trim_end();
    if head.trim().is_empty() {
        return Err(ParseError::empty());
    }
    if head.ends_with(char::is_whitespace) {
        return Err(ParseError::new(
            ErrorKind::InvalidSegmentFormat,
            open,
            "whitespace is not allowed before a selector",
        ));
    }

    let selector = if suffix.starts_with(PREDICATE_OPEN) {
        predicate(suffix, open)?
    } else {
        attribute(suffix, open)?
    };
    let target = parse_pattern_bytes(head)?;

    Ok(Query {
        target,
        selector: Some(selector),
    })
}

fn predicate(suffix: &str, open: usize) -> Result<Selector> {
    let mut in_quotes = false;
    let mut escaped = false;
    let mut close = None;
    for (pos, c) in suffix.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            PREDICATE_CLOSE if !in_quotes => {
                close = Some(pos);
                break;
            }
            _ => {}
        }
    }

    let Some(close) = close else {
        return Err(unterminated(open, "predicate opened with '[' is never closed"));
    };
    let after = close + PREDICATE_CLOSE.len_utf8();
    if after != suffix.len() {
        return Err(unterminated(
            open + after,
            "unexpected text after the closing ']' of a predicate",
        ));
    }

    let inner = &suffix[PREDICATE_OPEN.len_utf8()..close];
    Ok(Selector::Predicate(Unvalidated(inner.to_string())))
}

fn attribute(suffix: &str, open: usize) -> Result<Selector> {
    let path = &suffix[ATTRIBUTE_MARKER.len_utf8()..];
    if path.is_empty() {
        return Err(unterminated(open, "attribute selector '@' has no attribute path"));
    }
    if path.ends_with('.') {
        return Err(unterminated(
            open + suffix.len(),
            "attribute path must not end with '.'",
        ));
    }
    Ok(Selector::Attribute(Unvalidated(path.to_string())))
}

fn unterminated(offset: usize, message: &str) -> ParseError {
    ParseError::new(ErrorKind::UnterminatedPredicate, offset, message)
}
