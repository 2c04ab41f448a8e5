//! # Driving Ports (API - Inbound)
//!
//! The public operation surface of the registry. The hosting platform
//! invokes these; each call runs to completion or has no effect.

use crate::domain::entities::{BiodiversityRecord, CallContext};
use crate::domain::value_objects::{Address, ParcelId, ResponseCode};
use crate::errors::RegistryError;
use async_trait::async_trait;

/// Public registry operations.
///
/// | Operation | Output |
/// |-----------|--------|
/// | `add_biodiversity_data` | `()` / validation error |
/// | `verify_biodiversity_data` | `()` / not found |
/// | `get_biodiversity_data` | record (zero-valued if absent) |
/// | `find_biodiversity_data` | `Option<record>` |
/// | `associate_token` | `SUCCESS` / failure |
/// | `transfer_token` | `SUCCESS` / failure |
#[async_trait]
pub trait BiodiversityRegistryApi: Send + Sync {
    /// Writes a fresh record for `identifier`, replacing any existing one.
    ///
    /// Any prior verification is discarded.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidScore`] if `score > 100`; nothing changes.
    async fn add_biodiversity_data(
        &self,
        identifier: ParcelId,
        score: u64,
        ecosystem_type: String,
    ) -> Result<(), RegistryError>;

    /// Marks the record verified by `ctx.caller` at `ctx.timestamp`.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::NotFound`] if no verifiable record exists
    /// - [`RegistryError::Unauthorized`] if the authorization hook refuses
    /// - [`RegistryError::InvalidTimestamp`] if `ctx.timestamp == 0`
    /// - [`RegistryError::InvalidVerifier`] if `ctx.caller` is the zero address
    async fn verify_biodiversity_data(
        &self,
        identifier: ParcelId,
        ctx: CallContext,
    ) -> Result<(), RegistryError>;

    /// Stored record, or a zero-valued record if none exists.
    async fn get_biodiversity_data(&self, identifier: ParcelId) -> BiodiversityRecord;

    /// Stored record, or `None` if the parcel was never registered.
    async fn find_biodiversity_data(&self, identifier: ParcelId) -> Option<BiodiversityRecord>;

    /// Associates `account` with `token` on the token ledger.
    async fn associate_token(
        &self,
        account: Address,
        token: Address,
    ) -> Result<ResponseCode, RegistryError>;

    /// Transfers `amount` of `token` from `from` to `to` on the token ledger.
    async fn transfer_token(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: i64,
    ) -> Result<ResponseCode, RegistryError>;
}
