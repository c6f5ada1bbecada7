//! Finds GTS identifiers embedded in free text such as logs or documents.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::identifier::{Identifier, parse};

/// An identifier found in a larger text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedId {
    /// Byte offset of the match in the scanned text.
    pub offset: usize,
    /// Matched text, without sentence punctuation.
    pub text: String,
    pub identifier: Identifier,
}

/// Returns every valid identifier in `text`, in order of appearance.
///
/// Candidates are runs of identifier characters that start with `gts.`.
/// Trailing dots are treated as sentence punctuation and dropped. Candidates
/// that do not parse are skipped.
///
/// # Examples
///
/// ```
/// use gts_core::extract_ids;
///
/// let log = "routing gts.x.core.events.type.v1~ven.app._.custom.v1~ to gts.ven.app._.sink.v2.";
/// let found = extract_ids(log);
/// assert_eq!(found.len(), 2);
/// assert_eq!(found[0].text, "gts.x.core.events.type.v1~ven.app._.custom.v1~");
/// assert_eq!(found[1].text, "gts.ven.app._.sink.v2");
/// assert_eq!(&log[found[1].offset..found[1].offset + 3], "gts");
/// ```
pub fn extract_ids(text: &str) -> Vec<ExtractedId> {
    // SAFETY: compile-time constant pattern, covered by tests.
    static CANDIDATE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\bgts\.[a-z0-9_.~]+").expect("static regex must compile"));

    CANDIDATE_RE
        .find_iter(text)
        .filter_map(|found| {
            let candidate = found.as_str().trim_end_matches('.');
            match parse(candidate) {
                Ok(identifier) => Some(ExtractedId {
                    offset: found.start(),
                    text: candidate.to_string(),
                    identifier,
                }),
                Err(err) => {
                    debug!(candidate, error = %err, "skipping invalid GTS candidate");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_schema_and_instance() {
        let found = extract_ids("type gts.x.core.events.type.v1~ instance gts.vendor.app.user.profile.v2.1");
        let texts: Vec<&str> = found.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(
            texts,
            vec!["gts.x.core.events.type.v1~", "gts.vendor.app.user.profile.v2.1"]
        );
        assert!(found[0].identifier.is_schema());
        assert!(found[1].identifier.is_instance());
    }

    #[test]
    fn test_skips_invalid_candidates() {
        let found = extract_ids("bad gts.a.b.c.v01 and gts.x.ui.core_ui.screens.v1~abc.*");
        assert!(found.is_empty());
    }

    #[test]
    fn test_requires_word_boundary() {
        assert!(extract_ids("mygts.a.b.c.d.v1").is_empty());
        assert_eq!(extract_ids("(gts.a.b.c.d.v1)").len(), 1);
    }

    #[test]
    fn test_offsets_are_byte_positions() {
        let text = "é gts.a.b.c.d.v1";
        let found = extract_ids(text);
        assert_eq!(found[0].offset, 3);
    }

    #[test]
    fn test_empty_text() {
        assert!(extract_ids("").is_empty());
    }
}
