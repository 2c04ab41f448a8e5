//! # Domain Layer (Inner Hexagon)
//!
//! Pure business logic for the biodiversity registry.
//! NO I/O, NO async, NO external dependencies.
//!
//! - `store` is the Record Store, sole owner of the parcel mapping.
//! - `verification` is the Verification Workflow, operating through the store.
//! - `abi` is the calling convention of the token-ledger service.

pub mod abi;
pub mod entities;
pub mod invariants;
pub mod store;
pub mod value_objects;
pub mod verification;

pub use entities::*;
pub use invariants::*;
pub use store::RecordStore;
pub use value_objects::*;
pub use verification::{verify_record, ExistenceCheck};
