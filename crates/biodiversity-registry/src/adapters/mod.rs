//! # Adapters Layer (Outer Hexagon)
//!
//! Concrete implementations of the outbound ports.
//!
//! | Port | Adapters |
//! |------|----------|
//! | `LedgerCaller` | `InMemoryTokenLedger`, `StubLedgerCaller` |
//! | `TokenService` | `StrictTokenService`, `DefensiveTokenService` |
//! | `AuditSink` | `InMemoryAuditLog`, `BroadcastAuditSink`, `TracingAuditSink` |
//! | `VerificationPolicy` | `AllowAllVerifiers` |

pub mod audit;
pub mod ledger;
pub mod policy;
pub mod token_service;

pub use audit::{BroadcastAuditSink, InMemoryAuditLog, TracingAuditSink};
pub use ledger::{CallHook, InMemoryTokenLedger, RecordedCall, StubBehavior, StubLedgerCaller};
pub use policy::AllowAllVerifiers;
pub use token_service::{
    build_token_service, dispatch, DefensiveTokenService, StrictTokenService,
};
