//! Structured validation violations
//!
//! A rule that blocks or flags a request produces a [`ValidationViolation`]:
//! a stable rule identifier, a human-readable message, and a structured
//! parameter map. Formatting for end users is a presentation-layer concern;
//! the core only carries the data.

use serde::{Deserialize, Serialize};

/// How a violation affects the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    /// The request must not proceed
    Rejects,
    /// Recorded on the receipt, does not block
    Warns,
}

/// A structured rule violation
///
/// `params` carries the values the message was built from (limits, counts,
/// offending identifiers) so callers can re-render the message in their own
/// presentation layer without string parsing.
///
/// Violations flow outward only, so the type is `Serialize` but not
/// `Deserialize`: the rule identifier is a `&'static str` supplied by the
/// rule itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationViolation {
    /// Stable identifier of the violated rule
    pub rule: &'static str,
    /// Human-readable description of the violation
    pub message: String,
    /// Structured parameters behind the message
    pub params: serde_json::Value,
    /// Whether the violation blocks the request
    pub severity: Severity,
}

impl ValidationViolation {
    /// Create a violation with no parameters
    pub fn new(rule: &'static str, message: impl Into<String>, severity: Severity) -> Self {
        ValidationViolation {
            rule,
            message: message.into(),
            params: serde_json::Value::Null,
            severity,
        }
    }

    /// Create a violation carrying structured parameters
    pub fn with_params(
        rule: &'static str,
        message: impl Into<String>,
        params: serde_json::Value,
        severity: Severity,
    ) -> Self {
        ValidationViolation {
            rule,
            message: message.into(),
            params,
            severity,
        }
    }

    /// Whether this violation blocks the request
    pub fn rejects(&self) -> bool {
        self.severity == Severity::Rejects
    }
}

impl std::fmt::Display for ValidationViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.rule, self.message)
    }
}
