//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the registry depends on. External adapters implement these
//! traits to provide:
//! - the low-level call into the fixed-address token-ledger service
//! - the token-service strategy (strict / defensive) built on that call
//! - audit log delivery
//! - the verification authorization hook
//!
//! Dependencies point INWARD: adapters implement these traits.

use crate::config::TokenServiceMode;
use crate::domain::entities::TokenOperation;
use crate::domain::value_objects::{Address, Bytes, ParcelId, ResponseCode};
use crate::errors::{AuditError, CommunicationFailure, RegistryError};
use crate::events::AuditEvent;
use async_trait::async_trait;

// =============================================================================
// LEDGER CALLER (low-level call interface)
// =============================================================================

/// Raw call into the external execution environment.
///
/// `Ok` means the call reached the target and completed, carrying the
/// returned bytes. `Err` means it did not complete.
///
/// ## Re-entrancy
///
/// The callee may call back into the registry before returning.
/// Implementations must not hold registry state across the call.
#[async_trait]
pub trait LedgerCaller: Send + Sync {
    /// Dispatches `input` to `target`.
    async fn call(&self, target: Address, input: Bytes) -> Result<Bytes, CommunicationFailure>;
}

// =============================================================================
// TOKEN SERVICE (strategy interface)
// =============================================================================

/// Token-ledger operations with response-code normalization.
///
/// Implementations return `Ok(ResponseCode::SUCCESS)` only when the service
/// reports the operation took effect. Every other outcome is an error.
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Which failure strategy this implementation applies.
    fn mode(&self) -> TokenServiceMode;

    /// Address the service is dispatched to.
    fn service_address(&self) -> Address;

    /// Encodes, dispatches and judges one operation.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::TokenServiceFailure`] for any non-`SUCCESS` code
    /// - [`RegistryError::Communication`] if the call failed and the
    ///   strategy propagates transport failures
    async fn execute(&self, operation: TokenOperation) -> Result<ResponseCode, RegistryError>;

    /// Associates `account` with `token`.
    async fn associate(
        &self,
        account: Address,
        token: Address,
    ) -> Result<ResponseCode, RegistryError> {
        self.execute(TokenOperation::Associate { account, token })
            .await
    }

    /// Transfers `amount` of `token` from `from` to `to`.
    async fn transfer(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: i64,
    ) -> Result<ResponseCode, RegistryError> {
        self.execute(TokenOperation::Transfer {
            token,
            from,
            to,
            amount,
        })
        .await
    }
}

// =============================================================================
// AUDIT SINK
// =============================================================================

/// Destination of audit notifications.
///
/// Called once, synchronously, while the triggering operation is still
/// inside its atomic unit. Delivery is best effort.
pub trait AuditSink: Send + Sync {
    /// Appends one event.
    fn emit(&self, event: &AuditEvent) -> Result<(), AuditError>;
}

// =============================================================================
// VERIFICATION POLICY (authorization hook)
// =============================================================================

/// Decides whether `actor` may verify the record for `parcel`.
///
/// Evaluated before any mutation. No policy ships beyond allow-all; tighter
/// rules plug in here.
pub trait VerificationPolicy: Send + Sync {
    /// Returns true if the verification may proceed.
    fn authorize(&self, parcel: &ParcelId, actor: &Address) -> bool;
}

// =============================================================================
// TESTS
// =============================================================================
