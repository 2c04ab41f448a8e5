//! # Domain Entities
//!
//! Core entities for the biodiversity registry.

use crate::domain::value_objects::{Address, BiodiversityScore, ParcelId};
use serde::{Deserialize, Serialize};

// =============================================================================
// BIODIVERSITY RECORD
// =============================================================================

/// Biodiversity metadata for one land parcel.
///
/// Field order matches the persisted layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiodiversityRecord {
    /// Parcel token address.
    pub identifier: ParcelId,
    /// Score in `0..=100`.
    pub biodiversity_score: BiodiversityScore,
    /// Free-form ecosystem classification.
    pub ecosystem_type: String,
    /// Time of the last verification, `0` if never verified.
    pub verification_timestamp: u64,
    /// Identity of the last verifier, zero address if none.
    pub verifier: Address,
    /// Whether the record is verified.
    pub is_verified: bool,
}

impl BiodiversityRecord {
    /// Creates a fresh, unverified record.
    #[must_use]
    pub fn new(identifier: ParcelId, score: BiodiversityScore, ecosystem_type: String) -> Self {
        Self {
            identifier,
            biodiversity_score: score,
            ecosystem_type,
            verification_timestamp: 0,
            verifier: Address::ZERO,
            is_verified: false,
        }
    }

    /// The zero-valued record returned for parcels with no stored entry.
    #[must_use]
    pub fn unregistered(identifier: ParcelId) -> Self {
        Self::new(identifier, BiodiversityScore::ZERO, String::new())
    }

    /// Stamps the record as verified by `verifier` at `timestamp`.
    ///
    /// Overwrites any earlier verifier and timestamp.
    pub fn mark_verified(&mut self, verifier: Address, timestamp: u64) {
        self.is_verified = true;
        self.verification_timestamp = timestamp;
        self.verifier = verifier;
    }

    /// The last verifier, if any.
    #[must_use]
    pub fn verified_by(&self) -> Option<Address> {
        (!self.verifier.is_zero()).then_some(self.verifier)
    }

    /// Returns true if the record is indistinguishable from an absent one.
    #[must_use]
    pub fn is_zero_valued(&self) -> bool {
        self.biodiversity_score.is_zero()
            && self.ecosystem_type.is_empty()
            && !self.is_verified
            && self.verification_timestamp == 0
            && self.verifier.is_zero()
    }
}

// =============================================================================
// CALL CONTEXT
// =============================================================================

/// Execution context supplied by the hosting platform for one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallContext {
    /// Identity invoking the operation.
    pub caller: Address,
    /// Current platform time (seconds).
    pub timestamp: u64,
}

impl CallContext {
    /// Creates a new call context.
    #[must_use]
    pub const fn new(caller: Address, timestamp: u64) -> Self {
        Self { caller, timestamp }
    }
}

// =============================================================================
// TOKEN OPERATIONS
// =============================================================================

/// An operation understood by the external token-ledger service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum TokenOperation {
    /// Associate `account` with `token` so it may hold the token.
    Associate {
        /// Account to associate.
        account: Address,
        /// Token to associate with.
        token: Address,
    },
    /// Move `amount` units of `token` from `from` to `to`.
    Transfer {
        /// Token being moved.
        token: Address,
        /// Sending account.
        from: Address,
        /// Receiving account.
        to: Address,
        /// Amount in the token's smallest unit.
        amount: i64,
    },
}

impl TokenOperation {
    /// Short operation name for logs and traces.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Associate { .. } => "associate",
            Self::Transfer { .. } => "transfer",
        }
    }

    /// Token the operation acts on.
    #[must_use]
    pub const fn token(&self) -> Address {
        match self {
            Self::Associate { token, .. } | Self::Transfer { token, .. } => *token,
        }
    }
}

// =============================================================================
// OPERATION TRACE
// =============================================================================

/// Public operation a trace belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// `addBiodiversityData`
    AddRecord,
    /// `verifyBiodiversityData`
    VerifyRecord,
    /// `associateToken`
    AssociateToken,
    /// `transferToken`
    TransferToken,
}

/// One observable step taken by an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStep {
    /// Read from the record store.
    StateRead,
    /// Write to the record store.
    StateWrite,
    /// Call out to the external token-ledger service.
    ExternalCall,
    /// Audit notification emitted.
    AuditEmit,
}

/// Ordered steps recorded while one operation executed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationTrace {
    /// Operation that produced this trace.
    pub kind: OperationKind,
    /// Steps in execution order.
    pub steps: Vec<OperationStep>,
    /// Whether the operation committed.
    pub committed: bool,
}

impl OperationTrace {
    /// Starts an empty trace.
    #[must_use]
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            steps: Vec::new(),
            committed: false,
        }
    }

    /// Appends a step.
    pub fn record(&mut self, step: OperationStep) {
        self.steps.push(step);
    }

    /// Returns true if the trace contains `step`.
    #[must_use]
    pub fn contains(&self, step: OperationStep) -> bool {
        self.steps.contains(&step)
    }
}

// =============================================================================
// TESTS
// =============================================================================
