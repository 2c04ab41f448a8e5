//! # Record Store
//!
//! Exclusive owner of the parcel identifier → record mapping.
//!
//! Writes replace the whole record: re-adding data for a parcel discards any
//! verification it carried. Absence is never signalled by [`RecordStore::get_record`];
//! use [`RecordStore::get`] when the caller needs to tell "never registered"
//! apart from a zero-score record.

use crate::domain::entities::BiodiversityRecord;
use crate::domain::value_objects::{BiodiversityScore, ParcelId};
use crate::errors::RegistryError;
use std::collections::HashMap;

/// Keyed store of biodiversity records.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RecordStore {
    records: HashMap<ParcelId, BiodiversityRecord>,
}

impl RecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored record for `identifier`, if one was ever written.
    #[must_use]
    pub fn get(&self, identifier: &ParcelId) -> Option<&BiodiversityRecord> {
        self.records.get(identifier)
    }

    /// Replaces the entry keyed by `record.identifier`.
    ///
    /// Returns the previous record, if any.
    pub fn put(&mut self, record: BiodiversityRecord) -> Option<BiodiversityRecord> {
        self.records.insert(record.identifier, record)
    }

    /// Returns true if a record was ever written for `identifier`.
    #[must_use]
    pub fn contains(&self, identifier: &ParcelId) -> bool {
        self.records.contains_key(identifier)
    }

    /// Number of registered parcels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if no parcel is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validates and writes a fresh, unverified record.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidScore`] if `score > 100`. The store is left
    /// untouched in that case.
    pub fn add_record(
        &mut self,
        identifier: ParcelId,
        score: u64,
        ecosystem_type: impl Into<String>,
    ) -> Result<BiodiversityRecord, RegistryError> {
        let score = BiodiversityScore::new(score)?;
        let record = BiodiversityRecord::new(identifier, score, ecosystem_type.into());
        self.put(record.clone());
        Ok(record)
    }

    /// Stored record, or the zero-valued record when none exists.
    #[must_use]
    pub fn get_record(&self, identifier: &ParcelId) -> BiodiversityRecord {
        self.get(identifier)
            .cloned()
            .unwrap_or_else(|| BiodiversityRecord::unregistered(*identifier))
    }
}
