//! # Audit Event Schema
//!
//! Payloads appended to the externally observable audit log after each
//! committed operation. The core never reads these back.
//!
//! | Event | Payload |
//! |-------|---------|
//! | `RecordAdded` | `{identifier, score, ecosystem_type}` |
//! | `RecordVerified` | `{identifier, verifier, timestamp}` |
//! | `TokenAssociated` | `{account, token}` |
//! | `TokenTransferred` | `{token, from, to, amount}` |

use crate::domain::entities::{BiodiversityRecord, TokenOperation};
use crate::domain::value_objects::{Address, BiodiversityScore, ParcelId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Topic names for audit events.
pub mod topics {
    /// A record was written (or overwritten).
    pub const RECORD_ADDED: &str = "biodiversity.record_added";
    /// A record was verified.
    pub const RECORD_VERIFIED: &str = "biodiversity.record_verified";
    /// An account was associated with a token.
    pub const TOKEN_ASSOCIATED: &str = "token.associated";
    /// Token units were transferred.
    pub const TOKEN_TRANSFERRED: &str = "token.transferred";
}

/// A state change announced to external observers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// Record created or wholesale overwritten.
    RecordAdded {
        /// Parcel identifier.
        identifier: ParcelId,
        /// Stored score.
        score: BiodiversityScore,
        /// Stored ecosystem classification.
        ecosystem_type: String,
    },
    /// Record marked verified.
    RecordVerified {
        /// Parcel identifier.
        identifier: ParcelId,
        /// Verifying identity.
        verifier: Address,
        /// Verification time.
        timestamp: u64,
    },
    /// The ledger accepted an association.
    TokenAssociated {
        /// Associated account.
        account: Address,
        /// Token.
        token: Address,
    },
    /// The ledger accepted a transfer.
    TokenTransferred {
        /// Token.
        token: Address,
        /// Sender.
        from: Address,
        /// Recipient.
        to: Address,
        /// Amount moved.
        amount: i64,
    },
}

impl AuditEvent {
    /// "added" event for a freshly written record.
    #[must_use]
    pub fn added(record: &BiodiversityRecord) -> Self {
        Self::RecordAdded {
            identifier: record.identifier,
            score: record.biodiversity_score,
            ecosystem_type: record.ecosystem_type.clone(),
        }
    }

    /// "verified" event for a freshly verified record.
    #[must_use]
    pub fn verified(record: &BiodiversityRecord) -> Self {
        Self::RecordVerified {
            identifier: record.identifier,
            verifier: record.verifier,
            timestamp: record.verification_timestamp,
        }
    }

    /// Event for a token operation the ledger accepted.
    #[must_use]
    pub fn token_operation(operation: &TokenOperation) -> Self {
        match *operation {
            TokenOperation::Associate { account, token } => {
                Self::TokenAssociated { account, token }
            }
            TokenOperation::Transfer {
                token,
                from,
                to,
                amount,
            } => Self::TokenTransferred {
                token,
                from,
                to,
                amount,
            },
        }
    }

    /// Topic this event is published under.
    #[must_use]
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::RecordAdded { .. } => topics::RECORD_ADDED,
            Self::RecordVerified { .. } => topics::RECORD_VERIFIED,
            Self::TokenAssociated { .. } => topics::TOKEN_ASSOCIATED,
            Self::TokenTransferred { .. } => topics::TOKEN_TRANSFERRED,
        }
    }
}

/// One appended audit log entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in commit order, starting at 0.
    pub sequence: u64,
    /// Unique entry identifier.
    pub event_id: Uuid,
    /// The event.
    pub event: AuditEvent,
}

impl AuditEntry {
    /// Wraps an event at the given sequence number.
    #[must_use]
    pub fn new(sequence: u64, event: AuditEvent) -> Self {
        Self {
            sequence,
            event_id: Uuid::new_v4(),
            event,
        }
    }
}
