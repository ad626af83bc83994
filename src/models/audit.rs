//! Audit trail types.
//!
//! Each rule application records an [`AuditStep`] so callers can explain
//! why a day's numbers came out the way they did. Ambiguities that the
//! engine resolves by a documented rule are surfaced as [`AuditWarning`]s.

use serde::{Deserialize, Serialize};

/// One rule application: what went in, what came out and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// 1-based position in the trace.
    pub step_number: u32,
    /// Stable snake_case rule identifier.
    pub rule_id: String,
    /// Display name of the rule.
    pub rule_name: String,
    /// Values the rule read.
    pub input: serde_json::Value,
    /// Values the rule produced.
    pub output: serde_json::Value,
    /// Plain-language explanation.
    pub reasoning: String,
}

/// A non-fatal anomaly, such as an odd punch count or overlapping absences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// snake_case warning code.
    pub code: String,
    /// What happened, for a human reader.
    pub message: String,
    /// `low`, `medium` or `high`.
    pub severity: String,
}

impl AuditWarning {
    /// Creates a warning.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        severity: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity: severity.into(),
        }
    }
}

/// Steps and warnings of one computed day.
///
/// # Example
///
/// ```
/// use timebank_engine::models::AuditTrace;
///
/// let trace = AuditTrace::default();
/// assert!(trace.steps.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditTrace {
    /// Steps in application order.
    pub steps: Vec<AuditStep>,
    /// Warnings raised along the way.
    pub warnings: Vec<AuditWarning>,
}

impl AuditTrace {
    /// Returns the number the next pushed step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }
}
