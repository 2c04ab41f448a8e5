//! # Domain Invariants
//!
//! Rules that MUST hold for every stored record and every executed operation.
//!
//! | Invariant | Check |
//! |-----------|-------|
//! | Score range | `check_score_range_invariant()` |
//! | Verification consistency | `check_verification_consistency_invariant()` |
//! | No state write after external call | `check_external_call_last_invariant()` |
//! | Failed operations leave no effects | `check_abort_atomicity_invariant()` |

use crate::domain::entities::{BiodiversityRecord, OperationStep, OperationTrace};
use crate::domain::value_objects::BiodiversityScore;

// =============================================================================
// RECORD INVARIANTS
// =============================================================================

/// Score stays within `0..=100`.
#[must_use]
pub fn check_score_range_invariant(record: &BiodiversityRecord) -> bool {
    u64::from(record.biodiversity_score) <= BiodiversityScore::MAX
}

/// Verified records carry a timestamp and a verifier; unverified records
/// carry neither.
#[must_use]
pub fn check_verification_consistency_invariant(record: &BiodiversityRecord) -> bool {
    let stamped = record.verification_timestamp > 0;
    let attributed = !record.verifier.is_zero();
    if record.is_verified {
        stamped && attributed
    } else {
        !stamped && !attributed
    }
}

// =============================================================================
// OPERATION INVARIANTS
// =============================================================================

/// No record-store write follows an external call within one operation.
///
/// Audit emission after the call is allowed; it is not local state.
#[must_use]
pub fn check_external_call_last_invariant(trace: &OperationTrace) -> bool {
    match trace
        .steps
        .iter()
        .position(|s| *s == OperationStep::ExternalCall)
    {
        Some(call) => !trace.steps[call..].contains(&OperationStep::StateWrite),
        None => true,
    }
}

/// An operation that did not commit wrote nothing and emitted nothing.
#[must_use]
pub fn check_abort_atomicity_invariant(trace: &OperationTrace) -> bool {
    trace.committed
        || !(trace.contains(OperationStep::StateWrite) || trace.contains(OperationStep::AuditEmit))
}

/// Checks every record invariant.
#[must_use]
pub fn check_record_invariants(record: &BiodiversityRecord) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_score_range_invariant(record) {
        violations.push(InvariantViolation::ScoreOutOfRange {
            score: u64::from(record.biodiversity_score),
        });
    }

    if !check_verification_consistency_invariant(record) {
        violations.push(InvariantViolation::InconsistentVerification {
            is_verified: record.is_verified,
            timestamp: record.verification_timestamp,
        });
    }

    InvariantCheckResult::from(violations)
}

/// Checks every operation invariant.
#[must_use]
pub fn check_trace_invariants(trace: &OperationTrace) -> InvariantCheckResult {
    let mut violations = Vec::new();

    if !check_external_call_last_invariant(trace) {
        violations.push(InvariantViolation::StateWriteAfterExternalCall);
    }

    if !check_abort_atomicity_invariant(trace) {
        violations.push(InvariantViolation::EffectsOnAbort);
    }

    InvariantCheckResult::from(violations)
}

// =============================================================================
// INVARIANT TYPES
// =============================================================================

/// Result of checking a set of invariants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// All invariants hold.
    Valid,
    /// One or more invariants violated.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if all invariants hold.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl From<Vec<InvariantViolation>> for InvariantCheckResult {
    fn from(violations: Vec<InvariantViolation>) -> Self {
        if violations.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(violations)
        }
    }
}

/// Specific invariant violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvariantViolation {
    /// Score above the allowed maximum.
    ScoreOutOfRange { score: u64 },
    /// Verified flag disagrees with timestamp/verifier.
    InconsistentVerification { is_verified: bool, timestamp: u64 },
    /// A store write happened after the external call.
    StateWriteAfterExternalCall,
    /// A failed operation left effects behind.
    EffectsOnAbort,
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ScoreOutOfRange { score } => write!(f, "score out of range: {score} > 100"),
            Self::InconsistentVerification {
                is_verified,
                timestamp,
            } => write!(
                f,
                "inconsistent verification: is_verified={is_verified}, timestamp={timestamp}"
            ),
            Self::StateWriteAfterExternalCall => {
                write!(f, "record store written after external call")
            }
            Self::EffectsOnAbort => write!(f, "aborted operation left effects"),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
