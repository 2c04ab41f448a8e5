//! # Error Types
//!
//! All error types for the biodiversity registry and its token-service bridge.

use crate::domain::value_objects::{Address, ResponseCode};
use thiserror::Error;

// =============================================================================
// REGISTRY ERRORS
// =============================================================================

/// Errors returned by the public registry operations.
///
/// Every variant aborts the whole enclosing operation before any effect
/// becomes observable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Score outside `0..=100`.
    #[error("invalid biodiversity score: {score} > {max}")]
    InvalidScore { score: u64, max: u64 },

    /// Verification timestamp of zero (reserved for "never verified").
    #[error("invalid verification timestamp: 0 is reserved for unverified records")]
    InvalidTimestamp,

    /// Verification attributed to the zero address (reserved for "no verifier").
    #[error("invalid verifier: the zero address is reserved for unverified records")]
    InvalidVerifier,

    /// No record to verify for this parcel.
    #[error("no biodiversity record for parcel {0:?}")]
    NotFound(Address),

    /// The authorization hook rejected the actor.
    #[error("actor {actor:?} is not authorized to verify parcel {parcel:?}")]
    Unauthorized { parcel: Address, actor: Address },

    /// The token-ledger service answered with a code other than `SUCCESS`.
    #[error("token service failure: {0}")]
    TokenServiceFailure(ResponseCode),

    /// The call to the token-ledger service did not complete.
    #[error("token service communication failure: {0}")]
    Communication(#[from] CommunicationFailure),

    /// An operation broke the "no state write after an external call" rule.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl RegistryError {
    /// Returns true for input-validation failures.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidScore { .. } | Self::InvalidTimestamp | Self::InvalidVerifier
        )
    }

    /// Response code carried by a token-service rejection, if any.
    #[must_use]
    pub fn response_code(&self) -> Option<ResponseCode> {
        match self {
            Self::TokenServiceFailure(code) => Some(*code),
            _ => None,
        }
    }
}

// =============================================================================
// COMMUNICATION FAILURES
// =============================================================================

/// Transport-level failures of the low-level call to the token service.
///
/// Distinct from a protocol-level rejection, which arrives as a decoded
/// [`ResponseCode`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommunicationFailure {
    /// The service address could not be reached.
    #[error("service at {0:?} unreachable")]
    Unreachable(Address),

    /// The call executed but did not complete (reverted).
    #[error("call reverted: {0}")]
    Reverted(String),

    /// The call completed but its result could not be decoded.
    #[error("malformed response: {0}")]
    MalformedResponse(#[from] AbiError),
}

// =============================================================================
// ABI ERRORS
// =============================================================================

/// Errors decoding the binary calling convention.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    /// Input shorter than required.
    #[error("input too short: expected at least {expected} bytes, got {actual}")]
    TooShort { expected: usize, actual: usize },

    /// Selector does not name a supported operation.
    #[error("unknown selector: 0x{}", hex::encode(.0))]
    UnknownSelector([u8; 4]),

    /// Address word has non-zero high bytes.
    #[error("dirty address word at position {0}")]
    DirtyAddress(usize),

    /// Integer word does not fit the target width.
    #[error("integer word at position {0} out of range")]
    IntegerOutOfRange(usize),
}

// =============================================================================
// AUDIT ERRORS
// =============================================================================

/// Errors from an audit sink.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuditError {
    /// Event could not be serialized.
    #[error("audit serialization failed: {0}")]
    Serialization(String),

    /// No observer accepted the event.
    #[error("audit sink closed")]
    Closed,
}

// =============================================================================
// CONFIGURATION ERRORS
// =============================================================================

/// Errors loading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable held an unsupported value.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

// =============================================================================
// TESTS
// =============================================================================
