//! Access-control evaluation over wildcard patterns.
//!
//! Rules pair an [`Effect`] with a pattern. Among the rules that match a
//! candidate, the most specific one decides: exact patterns beat wildcards,
//! and longer literal prefixes beat shorter ones. When equally specific rules
//! disagree, deny wins. A candidate that no rule matches is denied.
//!
//! # Examples
//!
//! ```
//! use gts_core::{AccessPolicy, Effect, PolicyRule, parse};
//!
//! let policy = AccessPolicy::compile(&[
//!     PolicyRule::allow("gts.x.core.events.type.v1~*"),
//!     PolicyRule::deny("gts.x.core.events.type.v1~x.core._.audit_event.v1~*"),
//! ])
//! .unwrap();
//!
//! let custom = parse("gts.x.core.events.type.v1~ven.app._.custom.v1~").unwrap();
//! assert_eq!(policy.evaluate(&custom).effect, Effect::Allow);
//!
//! let audit = parse("gts.x.core.events.type.v1~x.core._.audit_event.v1~xyz.app._.login.v1").unwrap();
//! assert_eq!(policy.evaluate(&audit).effect, Effect::Deny);
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::error::{ParseError, Result};
use crate::identifier::{Identifier, parse};
use crate::pattern::{Pattern, Specificity, parse_pattern};

/// Outcome a rule grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effect {
    Allow,
    Deny,
}

/// One uncompiled rule, as written in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub effect: Effect,
    pub pattern: String,
}

impl PolicyRule {
    pub fn allow(pattern: impl Into<String>) -> Self {
        Self {
            effect: Effect::Allow,
            pattern: pattern.into(),
        }
    }

    pub fn deny(pattern: impl Into<String>) -> Self {
        Self {
            effect: Effect::Deny,
            pattern: pattern.into(),
        }
    }
}

/// A rule whose pattern failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("policy rule {index} ('{pattern}') is invalid: {source}")]
pub struct PolicyError {
    /// Zero-based position of the rule.
    pub index: usize,
    pub pattern: String,
    #[source]
    pub source: ParseError,
}

/// Verdict for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub effect: Effect,
    /// Index of the deciding rule; `None` when nothing matched.
    pub rule: Option<usize>,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        self.effect == Effect::Allow
    }
}

/// Compiled rule set.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    rules: Vec<(Effect, Pattern)>,
}

impl AccessPolicy {
    /// Parses every rule pattern up front.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError`] for the first rule whose pattern is invalid.
    pub fn compile(rules: &[PolicyRule]) -> std::result::Result<Self, PolicyError> {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| {
                parse_pattern(&rule.pattern)
                    .map(|pattern| (rule.effect, pattern))
                    .map_err(|source| PolicyError {
                        index,
                        pattern: rule.pattern.clone(),
                        source,
                    })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn evaluate(&self, candidate: &Identifier) -> Decision {
        let mut best: Option<(Specificity, Effect, usize)> = None;
        for (index, (effect, pattern)) in self.rules.iter().enumerate() {
            if !pattern.matches(candidate) {
                continue;
            }
            let specificity = pattern.specificity();
            let wins = match best {
                None => true,
                Some((current, current_effect, _)) => {
                    specificity > current
                        || (specificity == current
                            && *effect == Effect::Deny
                            && current_effect == Effect::Allow)
                }
            };
            if wins {
                best = Some((specificity, *effect, index));
            }
        }

        let decision = match best {
            Some((_, effect, index)) => Decision {
                effect,
                rule: Some(index),
            },
            None => Decision {
                effect: Effect::Deny,
                rule: None,
            },
        };
        debug!(
            candidate = %candidate,
            effect = ?decision.effect,
            rule = ?decision.rule,
            "evaluated access policy"
        );
        decision
    }

    /// Parses `raw` and evaluates it.
    ///
    /// # Errors
    ///
    /// Same as [`parse`](crate::parse).
    pub fn evaluate_raw(&self, raw: &str) -> Result<Decision> {
        Ok(self.evaluate(&parse(raw)?))
    }
}
