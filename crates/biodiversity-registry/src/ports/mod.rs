//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions between the registry domain and the outside world.
//!
//! - **Driving Ports (Inbound)**: `BiodiversityRegistryApi`
//! - **Driven Ports (Outbound)**: `LedgerCaller`, `TokenService`, `AuditSink`,
//!   `VerificationPolicy`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
