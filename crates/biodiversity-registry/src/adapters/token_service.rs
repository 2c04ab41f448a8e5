//! # Token Service Adapters
//!
//! Two interchangeable [`TokenService`] strategies over one [`LedgerCaller`]:
//!
//! | Strategy | Call did not complete | Non-`SUCCESS` code |
//! |----------|-----------------------|--------------------|
//! | [`StrictTokenService`] | `RegistryError::Communication` | `TokenServiceFailure(code)` |
//! | [`DefensiveTokenService`] | `TokenServiceFailure(INVALID_TRANSACTION)` | `TokenServiceFailure(code)` |
//!
//! Neither strategy holds mutable state, so a callback from the ledger
//! into the registry cannot observe a half-finished adapter call.

use crate::config::{ServiceConfig, TokenServiceMode};
use crate::domain::abi;
use crate::domain::entities::TokenOperation;
use crate::domain::value_objects::{Address, ResponseCode};
use crate::errors::{CommunicationFailure, RegistryError};
use crate::ports::outbound::{LedgerCaller, TokenService};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// Encodes `operation`, dispatches it to `address` and decodes the code.
///
/// This is the raw port: transport failures and protocol outcomes are
/// still separate here.
pub async fn dispatch(
    caller: &dyn LedgerCaller,
    address: Address,
    operation: &TokenOperation,
) -> Result<ResponseCode, CommunicationFailure> {
    let input = abi::encode_call(operation);
    debug!(
        operation = operation.name(),
        service = %address,
        calldata = ?input,
        "Dispatching token service call"
    );
    let output = caller.call(address, input).await?;
    Ok(abi::decode_response_code(output.as_slice())?)
}

/// `SUCCESS` passes through, every other code becomes an error.
fn judge(operation: &TokenOperation, code: ResponseCode) -> Result<ResponseCode, RegistryError> {
    if code.is_success() {
        Ok(code)
    } else {
        warn!(operation = operation.name(), %code, "Token service rejected operation");
        Err(RegistryError::TokenServiceFailure(code))
    }
}

// =============================================================================
// STRICT
// =============================================================================

/// Propagates transport failures unchanged.
pub struct StrictTokenService {
    caller: Arc<dyn LedgerCaller>,
    address: Address,
}

impl StrictTokenService {
    /// Create a strict adapter dispatching to `address`.
    pub fn new(caller: Arc<dyn LedgerCaller>, address: Address) -> Self {
        Self { caller, address }
    }
}

#[async_trait]
impl TokenService for StrictTokenService {
    fn mode(&self) -> TokenServiceMode {
        TokenServiceMode::Strict
    }

    fn service_address(&self) -> Address {
        self.address
    }

    async fn execute(&self, operation: TokenOperation) -> Result<ResponseCode, RegistryError> {
        let code = dispatch(self.caller.as_ref(), self.address, &operation).await?;
        judge(&operation, code)
    }
}

// =============================================================================
// DEFENSIVE
// =============================================================================

/// Folds transport failures into `INVALID_TRANSACTION`.
///
/// Callers see a single failure surface (a response code). A rejection by
/// the service and an unreachable service become indistinguishable.
pub struct DefensiveTokenService {
    caller: Arc<dyn LedgerCaller>,
    address: Address,
}

impl DefensiveTokenService {
    /// Create a defensive adapter dispatching to `address`.
    pub fn new(caller: Arc<dyn LedgerCaller>, address: Address) -> Self {
        Self { caller, address }
    }
}

#[async_trait]
impl TokenService for DefensiveTokenService {
    fn mode(&self) -> TokenServiceMode {
        TokenServiceMode::Defensive
    }

    fn service_address(&self) -> Address {
        self.address
    }

    async fn execute(&self, operation: TokenOperation) -> Result<ResponseCode, RegistryError> {
        let code = match dispatch(self.caller.as_ref(), self.address, &operation).await {
            Ok(code) => code,
            Err(failure) => {
                warn!(
                    operation = operation.name(),
                    %failure,
                    "Token service call failed; substituting INVALID_TRANSACTION"
                );
                ResponseCode::INVALID_TRANSACTION
            }
        };
        judge(&operation, code)
    }
}

/// Builds the strategy selected by `config`.
pub fn build_token_service(
    config: &ServiceConfig,
    caller: Arc<dyn LedgerCaller>,
) -> Arc<dyn TokenService> {
    match config.token_service_mode {
        TokenServiceMode::Strict => Arc::new(StrictTokenService::new(
            caller,
            config.token_service_address,
        )),
        TokenServiceMode::Defensive => Arc::new(DefensiveTokenService::new(
            caller,
            config.token_service_address,
        )),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ledger::StubLedgerCaller;
    use crate::config::DEFAULT_TOKEN_SERVICE_ADDRESS;
    use crate::domain::value_objects::Bytes;

    fn account() -> Address {
        Address::from_low_u64(0x1001)
    }

    fn token() -> Address {
        Address::from_low_u64(0x5005)
    }

    fn strict(stub: &Arc<StubLedgerCaller>) -> StrictTokenService {
        StrictTokenService::new(stub.clone(), DEFAULT_TOKEN_SERVICE_ADDRESS)
    }

    fn defensive(stub: &Arc<StubLedgerCaller>) -> DefensiveTokenService {
        DefensiveTokenService::new(stub.clone(), DEFAULT_TOKEN_SERVICE_ADDRESS)
    }

    #[tokio::test]
    async fn test_success_passes_through_both_strategies() {
        let stub = Arc::new(StubLedgerCaller::responding(ResponseCode::SUCCESS));
        assert_eq!(
            strict(&stub).associate(account(), token()).await,
            Ok(ResponseCode::SUCCESS)
        );
        assert_eq!(
            defensive(&stub).associate(account(), token()).await,
            Ok(ResponseCode::SUCCESS)
        );
    }

    #[tokio::test]
    async fn test_rejection_code_is_surfaced() {
        let stub = Arc::new(StubLedgerCaller::responding(
            ResponseCode::TOKEN_NOT_ASSOCIATED_TO_ACCOUNT,
        ));
        for service in [
            Box::new(strict(&stub)) as Box<dyn TokenService>,
            Box::new(defensive(&stub)),
        ] {
            let err = service
                .transfer(token(), account(), Address::from_low_u64(2), 10)
                .await
                .unwrap_err();
            assert_eq!(
                err.response_code(),
                Some(ResponseCode::TOKEN_NOT_ASSOCIATED_TO_ACCOUNT)
            );
        }
    }

    #[tokio::test]
    async fn test_communication_failure_handling_differs() {
        let stub = Arc::new(StubLedgerCaller::failing(CommunicationFailure::Unreachable(
            DEFAULT_TOKEN_SERVICE_ADDRESS,
        )));

        let err = strict(&stub).associate(account(), token()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Communication(CommunicationFailure::Unreachable(_))
        ));

        let err = defensive(&stub)
            .associate(account(), token())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::TokenServiceFailure(ResponseCode::INVALID_TRANSACTION)
        );
    }

    #[tokio::test]
    async fn test_malformed_result_is_a_communication_failure() {
        let stub = Arc::new(StubLedgerCaller::raw(Bytes::from(vec![0u8; 3])));

        let err = strict(&stub).associate(account(), token()).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Communication(CommunicationFailure::MalformedResponse(_))
        ));

        let err = defensive(&stub)
            .associate(account(), token())
            .await
            .unwrap_err();
        assert_eq!(err.response_code(), Some(ResponseCode::INVALID_TRANSACTION));
    }

    #[tokio::test]
    async fn test_calls_go_to_fixed_address_with_encoded_args() {
        let stub = Arc::new(StubLedgerCaller::responding(ResponseCode::SUCCESS));
        let service = defensive(&stub);
        service
            .transfer(token(), account(), Address::from_low_u64(2), 99)
            .await
            .unwrap();

        let call = stub.last_call().unwrap();
        assert_eq!(call.target, DEFAULT_TOKEN_SERVICE_ADDRESS);
        assert_eq!(&call.input.as_slice()[..4], &abi::transfer_selector());
        assert_eq!(
            abi::decode_call(call.input.as_slice()).unwrap(),
            TokenOperation::Transfer {
                token: token(),
                from: account(),
                to: Address::from_low_u64(2),
                amount: 99,
            }
        );
    }

    #[test]
    fn test_factory_honours_mode() {
        let stub: Arc<dyn LedgerCaller> =
            Arc::new(StubLedgerCaller::responding(ResponseCode::SUCCESS));

        let config = ServiceConfig::default();
        assert_eq!(
            build_token_service(&config, stub.clone()).mode(),
            TokenServiceMode::Defensive
        );

        let config = ServiceConfig {
            token_service_mode: TokenServiceMode::Strict,
            token_service_address: Address::from_low_u64(0x999),
            ..ServiceConfig::default()
        };
        let service = build_token_service(&config, stub);
        assert_eq!(service.mode(), TokenServiceMode::Strict);
        assert_eq!(service.service_address(), Address::from_low_u64(0x999));
    }
}
