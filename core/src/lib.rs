//! Parsing and validation for Global Type System (GTS) identifiers.
//!
//! A GTS identifier names a schema (type) or an instance (object) and can
//! chain several segments with `~` to express derivation:
//!
//! ```text
//! gts.x.core.events.type.v1~ven.app._.custom_event.v1.2~
//! └──────── absolute ──────┘ └────── relative ──────┘  └ schema marker
//! ```
//!
//! This crate provides:
//!
//! - [`parse`] to turn text into an [`Identifier`] made of [`Segment`]s, with
//!   a precise [`ParseError`] (kind, character offset, segment, field) on
//!   failure.
//! - [`parse_segment`] and [`parse_relative_segment`] for single segments.
//! - [`parse_pattern`] and [`Pattern`] for trailing-wildcard queries such as
//!   `gts.x.core.events.type.v1~*`.
//! - [`parse_query`], [`parse_predicate`] and [`parse_attribute_selector`]
//!   for `[..]` predicate and `@..` attribute suffixes, whose contents are
//!   kept as [`Unvalidated`] text.
//! - [`validate`] and [`ValidationReport`] for interactive feedback.
//! - [`ParseCache`] for memoized, thread-safe parsing.
//! - [`extract_ids`] to find identifiers inside free text.
//! - [`AccessPolicy`] to evaluate allow/deny rules written as patterns.
//!
//! Everything is pure and synchronous. Identifiers are immutable values.
//!
//! # Example
//!
//! ```
//! use gts_core::*;
//!
//! let id = parse("gts.x.core.events.type.v1~ven.app._.custom_event.v1.2~").unwrap();
//! assert_eq!(id.segment_count(), 2);
//! assert_eq!(id.classification(), Classification::Schema);
//! assert_eq!(id.terminal().vendor(), "ven");
//! assert_eq!(id.terminal().version_string(), "v1.2");
//!
//! let err = parse("gts.x.core.events.type.v01~").unwrap_err();
//! assert_eq!(err.kind, ErrorKind::InvalidSegmentFormat);
//! assert_eq!(err.field, Some(SegmentField::Major));
//!
//! let pattern = parse_pattern("gts.x.core.events.type.v1~*").unwrap();
//! assert!(pattern.matches(&id));
//! ```

mod cache;
mod error;
mod extract;
mod identifier;
mod pattern;
mod policy;
mod query;
mod segment;
mod validate;

pub use cache::ParseCache;
pub use error::{ChainFault, ErrorKind, ParseError, Result, SegmentField};
pub use extract::{ExtractedId, extract_ids};
pub use identifier::{Classification, Identifier, parse};
pub use pattern::{Pattern, Specificity, WILDCARD, matches, parse_pattern};
pub use policy::{AccessPolicy, Decision, Effect, PolicyError, PolicyRule};
pub use query::{Query, Selector, Unvalidated, parse_attribute_selector, parse_predicate, parse_query};
pub use segment::{
    GTS_PREFIX, SCHEMA_MARKER, Segment, VersionNumber, parse_relative_segment, parse_segment,
};
pub use validate::{ValidationReport, validate};
