//! # Biodiversity Registry
//!
//! Registry of biodiversity metadata for tokenized land parcels, with a
//! verification workflow and a bridge to the external token-ledger service.
//!
//! ## Purpose
//!
//! Stores one [`BiodiversityRecord`](domain::BiodiversityRecord) per parcel,
//! lets designated parties mark that record verified, and associates or
//! transfers parcel tokens through the fixed-address token-ledger service
//! (`0x…0167`) using its selector + 32-byte word calling convention.
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | `0 ≤ score ≤ 100` | `domain/value_objects.rs` - `BiodiversityScore::new()` |
//! | `is_verified ⇔ timestamp > 0 ∧ verifier ≠ 0` | `domain/verification.rs` - `verify_record()` |
//! | Re-adding resets verification | `domain/store.rs` - `RecordStore::add_record()` |
//! | No store write after an external call | `domain/invariants.rs` - `check_external_call_last_invariant()` |
//! | Failed operations leave no effects | `domain/invariants.rs` - `check_abort_atomicity_invariant()` |
//!
//! ## Outbound Dependencies
//!
//! | Trait | Purpose | Adapters |
//! |-------|---------|----------|
//! | `LedgerCaller` | Raw call to the token-ledger service | `InMemoryTokenLedger`, `StubLedgerCaller` |
//! | `TokenService` | Response-code normalization | `StrictTokenService`, `DefensiveTokenService` |
//! | `AuditSink` | Append-only audit log | `InMemoryAuditLog`, `BroadcastAuditSink`, `TracingAuditSink` |
//! | `VerificationPolicy` | Who may verify | `AllowAllVerifiers` |
//!
//! ## Token Service Response Codes
//!
//! | Code | Name |
//! |------|------|
//! | 7 | `INVALID_TRANSACTION` |
//! | 15 | `INSUFFICIENT_ACCOUNT_BALANCE` |
//! | 22 | `SUCCESS` |
//! | 173 | `TOKEN_NOT_ASSOCIATED_TO_ACCOUNT` |
//! | 174 | `INSUFFICIENT_TOKEN_BALANCE` |
//! | 194 | `TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT` |
//!
//! ## Usage Example
//!
//! ```ignore
//! use biodiversity_registry::prelude::*;
//! use std::sync::Arc;
//!
//! let config = ServiceConfig::from_env()?;
//! let service = BiodiversityRegistryService::from_config(
//!     config,
//!     Arc::new(InMemoryTokenLedger::new()),
//!     Arc::new(TracingAuditSink),
//! );
//!
//! service.add_biodiversity_data(parcel, 75, "Tropical Rainforest".into()).await?;
//! service.verify_biodiversity_data(parcel, CallContext::new(verifier, now)).await?;
//! service.associate_token(account, parcel).await?;
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod ports;
pub mod service;
pub mod telemetry;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        BiodiversityRecord, CallContext, OperationKind, OperationStep, OperationTrace,
        TokenOperation,
    };

    // Value objects
    pub use crate::domain::value_objects::{
        Address, BiodiversityScore, Bytes, ParcelId, ResponseCode,
    };

    // Domain services
    pub use crate::domain::store::RecordStore;
    pub use crate::domain::verification::{verify_record, ExistenceCheck};

    // Invariants
    pub use crate::domain::invariants::{
        check_record_invariants, check_trace_invariants, InvariantCheckResult,
        InvariantViolation,
    };

    // Ports
    pub use crate::ports::inbound::BiodiversityRegistryApi;
    pub use crate::ports::outbound::{AuditSink, LedgerCaller, TokenService, VerificationPolicy};

    // Events
    pub use crate::events::{topics, AuditEntry, AuditEvent};

    // Errors
    pub use crate::errors::{AbiError, AuditError, CommunicationFailure, ConfigError, RegistryError};

    // Adapters
    pub use crate::adapters::{
        build_token_service, AllowAllVerifiers, BroadcastAuditSink, DefensiveTokenService,
        InMemoryAuditLog, InMemoryTokenLedger, StrictTokenService, StubLedgerCaller,
        TracingAuditSink,
    };

    // Configuration
    pub use crate::config::{ServiceConfig, TokenServiceMode, DEFAULT_TOKEN_SERVICE_ADDRESS};
    pub use crate::telemetry::{init_tracing, TelemetryConfig};

    // Service
    pub use crate::service::{create_test_service, BiodiversityRegistryService, ServiceStats};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Component name.
pub const COMPONENT_NAME: &str = "Biodiversity Registry";

// =============================================================================
// TESTS
// =============================================================================
