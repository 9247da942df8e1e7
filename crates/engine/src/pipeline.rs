//! Ordered rule evaluation with short-circuit
//!
//! A [`ValidationPipeline`] runs caller-supplied rules in declaration order
//! against one snapshot. Evaluation stops at the first `Rejects` violation;
//! later rules never run, so a failed precondition cannot leak state into
//! rules that assume it held. `Warns` violations accumulate without
//! blocking.
//!
//! Rules are pure functions of `(snapshot, request)`: no side effects, no
//! transaction access, no clock reads (time comparisons use
//! `snapshot.captured_at`). The same pipeline re-runs on every retry
//! attempt against a freshly captured snapshot, so a rule that is not
//! deterministic over its inputs would make retry behavior unobservable.

use reserva_core::{BookingRequest, ResourceSnapshot, ValidationViolation};

/// One business rule
///
/// Return `None` to pass, or a [`ValidationViolation`] whose severity
/// decides whether the request blocks. Rules may read the snapshot and the
/// request; they receive nothing else.
pub trait ValidationRule: Send + Sync {
    /// Stable identifier, used in violations and logs
    fn id(&self) -> &'static str;

    /// Evaluate the rule against one consistent snapshot
    fn evaluate(
        &self,
        snapshot: &ResourceSnapshot,
        request: &BookingRequest,
    ) -> Option<ValidationViolation>;
}

/// Outcome of one pipeline run
#[derive(Debug, Clone)]
pub enum PipelineVerdict {
    /// Every rule passed (some may have warned)
    Pass {
        /// Non-blocking violations, in rule declaration order
        warnings: Vec<ValidationViolation>,
    },
    /// A rule blocked the request
    Reject {
        /// The first blocking violation; later rules never ran
        violation: ValidationViolation,
        /// Warnings collected before the rejection
        warnings: Vec<ValidationViolation>,
    },
}

impl PipelineVerdict {
    /// The blocking violation, if the run rejected
    pub fn rejection(&self) -> Option<&ValidationViolation> {
        match self {
            PipelineVerdict::Reject { violation, .. } => Some(violation),
            PipelineVerdict::Pass { .. } => None,
        }
    }
}

/// Ordered sequence of rules
pub struct ValidationPipeline {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationPipeline {
    /// Build a pipeline from rules in evaluation order
    pub fn new(rules: Vec<Box<dyn ValidationRule>>) -> Self {
        ValidationPipeline { rules }
    }

    /// An empty pipeline that passes everything
    pub fn empty() -> Self {
        ValidationPipeline { rules: Vec::new() }
    }

    /// Number of rules in the pipeline
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the pipeline has no rules
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run the rules in declaration order against one snapshot
    pub fn evaluate(
        &self,
        snapshot: &ResourceSnapshot,
        request: &BookingRequest,
    ) -> PipelineVerdict {
        let mut warnings = Vec::new();
        for rule in &self.rules {
            if let Some(violation) = rule.evaluate(snapshot, request) {
                if violation.rejects() {
                    tracing::debug!(rule = rule.id(), "rule rejected request");
                    return PipelineVerdict::Reject {
                        violation,
                        warnings,
                    };
                }
                warnings.push(violation);
            }
        }
        PipelineVerdict::Pass { warnings }
    }
}
