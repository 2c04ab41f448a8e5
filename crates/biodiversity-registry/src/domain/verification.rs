//! # Verification Workflow
//!
//! Transitions a stored record from unverified to verified.
//!
//! The transition is not a one-way latch: verifying an already-verified
//! record succeeds and re-stamps verifier and timestamp with the latest
//! values. Authorization is evaluated by the caller before this runs.

use crate::domain::entities::BiodiversityRecord;
use crate::domain::store::RecordStore;
use crate::domain::value_objects::{Address, ParcelId};
use crate::errors::RegistryError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How verification decides that a parcel "exists".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistenceCheck {
    /// A stored score of zero counts as "not found" (bit-compatible with the
    /// deployed registry). A zero-score parcel can never be verified.
    #[default]
    ScoreSentinel,
    /// Only parcels that were never written are "not found".
    Presence,
}

impl ExistenceCheck {
    /// Returns the record to verify, or `None` if it counts as absent.
    #[must_use]
    pub fn locate<'a>(
        self,
        store: &'a RecordStore,
        identifier: &ParcelId,
    ) -> Option<&'a BiodiversityRecord> {
        let record = store.get(identifier);
        match self {
            Self::ScoreSentinel => record.filter(|r| !r.biodiversity_score.is_zero()),
            Self::Presence => record,
        }
    }
}

impl FromStr for ExistenceCheck {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "score" | "score_sentinel" => Ok(Self::ScoreSentinel),
            "presence" => Ok(Self::Presence),
            other => Err(format!("expected `score` or `presence`, got `{other}`")),
        }
    }
}

/// Marks the record for `identifier` as verified by `actor` at `timestamp`.
///
/// Returns the updated record.
///
/// # Errors
///
/// - [`RegistryError::InvalidTimestamp`] if `timestamp == 0`
/// - [`RegistryError::InvalidVerifier`] if `actor` is the zero address
/// - [`RegistryError::NotFound`] if `existence` rules the parcel absent
///
/// All are raised before the store is touched.
pub fn verify_record(
    store: &mut RecordStore,
    identifier: ParcelId,
    actor: Address,
    timestamp: u64,
    existence: ExistenceCheck,
) -> Result<BiodiversityRecord, RegistryError> {
    if timestamp == 0 {
        return Err(RegistryError::InvalidTimestamp);
    }
    if actor.is_zero() {
        return Err(RegistryError::InvalidVerifier);
    }

    let mut record = existence
        .locate(store, &identifier)
        .cloned()
        .ok_or(RegistryError::NotFound(identifier))?;

    record.mark_verified(actor, timestamp);
    store.put(record.clone());
    Ok(record)
}
