//! End-to-end behaviour of the registry service.

use async_trait::async_trait;
use biodiversity_registry::domain::abi;
use biodiversity_registry::prelude::*;
use proptest::prelude::*;
use std::sync::{Arc, OnceLock};

const PARCEL: Address = Address::from_low_u64(0x0a11);
const VERIFIER_A: Address = Address::from_low_u64(0xaaaa);
const VERIFIER_B: Address = Address::from_low_u64(0xbbbb);
const ACCOUNT: Address = Address::from_low_u64(0xacc0);
const RECIPIENT: Address = Address::from_low_u64(0xacc1);

fn service_with(
    mode: TokenServiceMode,
    caller: Arc<dyn LedgerCaller>,
) -> (Arc<BiodiversityRegistryService>, Arc<InMemoryAuditLog>) {
    let audit = Arc::new(InMemoryAuditLog::new());
    let config = ServiceConfig {
        token_service_mode: mode,
        ..ServiceConfig::default()
    };
    let service = BiodiversityRegistryService::from_config(config, caller, audit.clone());
    (Arc::new(service), audit)
}

fn ledger_service() -> (
    Arc<BiodiversityRegistryService>,
    Arc<InMemoryAuditLog>,
    Arc<InMemoryTokenLedger>,
) {
    let ledger = Arc::new(InMemoryTokenLedger::new());
    let (service, audit) = service_with(TokenServiceMode::Defensive, ledger.clone());
    (service, audit, ledger)
}

// =============================================================================
// SCORE RANGE
// =============================================================================

proptest! {
    #[test]
    fn prop_scores_in_range_store_fresh_records(score in 0u64..=100, eco in "[A-Za-z ]{0,24}") {
        let mut store = RecordStore::new();
        store.add_record(PARCEL, score, eco.clone()).unwrap();

        let record = store.get_record(&PARCEL);
        prop_assert_eq!(u64::from(record.biodiversity_score.value()), score);
        prop_assert_eq!(record.ecosystem_type, eco);
        prop_assert!(!record.is_verified);
        prop_assert_eq!(record.verification_timestamp, 0);
        prop_assert_eq!(record.verifier, Address::ZERO);
    }

    #[test]
    fn prop_scores_above_range_leave_store_unchanged(score in 101u64..) {
        let mut store = RecordStore::new();
        store.add_record(PARCEL, 60, "Mangrove").unwrap();
        let before = store.clone();

        let err = store.add_record(PARCEL, score, "Mangrove").unwrap_err();
        prop_assert!(err.is_validation());
        prop_assert_eq!(store.get_record(&PARCEL), before.get_record(&PARCEL));
        prop_assert_eq!(store.len(), 1);
    }
}

#[tokio::test]
async fn test_out_of_range_score_through_service() {
    let (service, audit, _) = ledger_service();
    let err = service
        .add_biodiversity_data(PARCEL, 101, "Wetland".into())
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::InvalidScore { score: 101, max: 100 });
    assert!(service.get_biodiversity_data(PARCEL).await.is_zero_valued());
    assert!(audit.is_empty());
}

// =============================================================================
// VERIFICATION
// =============================================================================

#[tokio::test]
async fn test_verify_missing_or_zero_score_is_not_found() {
    let (service, _, _) = ledger_service();
    let ctx = CallContext::new(VERIFIER_A, 1_000);

    let err = service
        .verify_biodiversity_data(PARCEL, ctx)
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::NotFound(PARCEL));

    service
        .add_biodiversity_data(PARCEL, 0, "Barren".into())
        .await
        .unwrap();
    let err = service
        .verify_biodiversity_data(PARCEL, ctx)
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::NotFound(PARCEL));
    assert!(!service.get_biodiversity_data(PARCEL).await.is_verified);
}

#[tokio::test]
async fn test_add_then_verify_yields_full_record() {
    let (service, audit, _) = ledger_service();
    service
        .add_biodiversity_data(PARCEL, 75, "Tropical Rainforest".into())
        .await
        .unwrap();
    service
        .verify_biodiversity_data(PARCEL, CallContext::new(VERIFIER_A, 1_700_000_000))
        .await
        .unwrap();

    let record = service.get_biodiversity_data(PARCEL).await;
    assert_eq!(record.identifier, PARCEL);
    assert_eq!(record.biodiversity_score.value(), 75);
    assert_eq!(record.ecosystem_type, "Tropical Rainforest");
    assert!(record.is_verified);
    assert_eq!(record.verification_timestamp, 1_700_000_000);
    assert_eq!(record.verifier, VERIFIER_A);
    assert!(check_record_invariants(&record).is_valid());

    let events = audit.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].topic(), topics::RECORD_ADDED);
    assert_eq!(
        events[1],
        AuditEvent::RecordVerified {
            identifier: PARCEL,
            verifier: VERIFIER_A,
            timestamp: 1_700_000_000,
        }
    );
}

#[tokio::test]
async fn test_re_add_resets_verification() {
    let (service, _, _) = ledger_service();
    service
        .add_biodiversity_data(PARCEL, 75, "Tropical Rainforest".into())
        .await
        .unwrap();
    service
        .verify_biodiversity_data(PARCEL, CallContext::new(VERIFIER_A, 10))
        .await
        .unwrap();

    service
        .add_biodiversity_data(PARCEL, 30, "Secondary Forest".into())
        .await
        .unwrap();

    let record = service.get_biodiversity_data(PARCEL).await;
    assert_eq!(record.biodiversity_score.value(), 30);
    assert_eq!(record.ecosystem_type, "Secondary Forest");
    assert!(!record.is_verified);
    assert_eq!(record.verification_timestamp, 0);
    assert_eq!(record.verifier, Address::ZERO);
}

#[tokio::test]
async fn test_verify_twice_keeps_latest() {
    let (service, audit, _) = ledger_service();
    service
        .add_biodiversity_data(PARCEL, 50, "Wetland".into())
        .await
        .unwrap();
    service
        .verify_biodiversity_data(PARCEL, CallContext::new(VERIFIER_A, 100))
        .await
        .unwrap();
    service
        .verify_biodiversity_data(PARCEL, CallContext::new(VERIFIER_B, 200))
        .await
        .unwrap();

    let record = service.get_biodiversity_data(PARCEL).await;
    assert_eq!(record.verifier, VERIFIER_B);
    assert_eq!(record.verification_timestamp, 200);

    let sequences: Vec<u64> = audit.entries().iter().map(|e| e.sequence).collect();
    assert_eq!(sequences, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_zero_timestamp_rejected() {
    let (service, _, _) = ledger_service();
    service
        .add_biodiversity_data(PARCEL, 50, "Wetland".into())
        .await
        .unwrap();
    let err = service
        .verify_biodiversity_data(PARCEL, CallContext::new(VERIFIER_A, 0))
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::InvalidTimestamp);
    assert!(!service.get_biodiversity_data(PARCEL).await.is_verified);
}

#[tokio::test]
async fn test_zero_address_verifier_rejected() {
    let (service, audit, _) = ledger_service();
    service
        .add_biodiversity_data(PARCEL, 75, "Tropical Rainforest".into())
        .await
        .unwrap();

    let err = service
        .verify_biodiversity_data(PARCEL, CallContext::new(Address::ZERO, 1_000))
        .await
        .unwrap_err();
    assert_eq!(err, RegistryError::InvalidVerifier);

    let record = service.get_biodiversity_data(PARCEL).await;
    assert!(!record.is_verified);
    assert_eq!(record.verifier, Address::ZERO);
    assert_eq!(record.verification_timestamp, 0);
    assert!(check_record_invariants(&record).is_valid());
    assert_eq!(audit.len(), 1);
}

struct OnlyVerifier(Address);

impl VerificationPolicy for OnlyVerifier {
    fn authorize(&self, _parcel: &ParcelId, actor: &Address) -> bool {
        *actor == self.0
    }
}

#[tokio::test]
async fn test_denying_policy_aborts_before_mutation() {
    let audit = Arc::new(InMemoryAuditLog::new());
    let service = BiodiversityRegistryService::from_config(
        ServiceConfig::default(),
        Arc::new(InMemoryTokenLedger::new()),
        audit.clone(),
    )
    .with_policy(Arc::new(OnlyVerifier(VERIFIER_A)));

    service
        .add_biodiversity_data(PARCEL, 50, "Wetland".into())
        .await
        .unwrap();

    let err = service
        .verify_biodiversity_data(PARCEL, CallContext::new(VERIFIER_B, 5))
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Unauthorized { actor, .. } if actor == VERIFIER_B));
    assert!(!service.get_biodiversity_data(PARCEL).await.is_verified);
    assert_eq!(audit.len(), 1);

    service
        .verify_biodiversity_data(PARCEL, CallContext::new(VERIFIER_A, 5))
        .await
        .unwrap();
    assert!(service.get_biodiversity_data(PARCEL).await.is_verified);
}

// =============================================================================
// TOKEN SERVICE
// =============================================================================

#[tokio::test]
async fn test_token_ops_with_success_stub() {
    for mode in [TokenServiceMode::Strict, TokenServiceMode::Defensive] {
        let stub = Arc::new(StubLedgerCaller::responding(ResponseCode::SUCCESS));
        let (service, audit) = service_with(mode, stub.clone());

        assert_eq!(
            service.associate_token(ACCOUNT, PARCEL).await,
            Ok(ResponseCode::SUCCESS)
        );
        assert_eq!(
            service.transfer_token(PARCEL, ACCOUNT, RECIPIENT, 1).await,
            Ok(ResponseCode::SUCCESS)
        );
        assert_eq!(stub.calls().len(), 2);
        assert_eq!(audit.len(), 2);
    }
}

#[tokio::test]
async fn test_token_ops_surface_rejection_code() {
    let codes = [
        ResponseCode::INVALID_TRANSACTION,
        ResponseCode::INSUFFICIENT_ACCOUNT_BALANCE,
        ResponseCode::TOKEN_NOT_ASSOCIATED_TO_ACCOUNT,
        ResponseCode::INSUFFICIENT_TOKEN_BALANCE,
        ResponseCode(-1),
    ];
    for mode in [TokenServiceMode::Strict, TokenServiceMode::Defensive] {
        for code in codes {
            let (service, audit) =
                service_with(mode, Arc::new(StubLedgerCaller::responding(code)));
            let err = service
                .transfer_token(PARCEL, ACCOUNT, RECIPIENT, 5)
                .await
                .unwrap_err();
            assert_eq!(err, RegistryError::TokenServiceFailure(code));
            assert!(audit.is_empty());
        }
    }
}

#[tokio::test]
async fn test_communication_failure_by_strategy() {
    let failure = CommunicationFailure::Reverted("execution halted".into());

    let (defensive, _) = service_with(
        TokenServiceMode::Defensive,
        Arc::new(StubLedgerCaller::failing(failure.clone())),
    );
    assert_eq!(
        defensive.associate_token(ACCOUNT, PARCEL).await,
        Err(RegistryError::TokenServiceFailure(
            ResponseCode::INVALID_TRANSACTION
        ))
    );

    let (strict, _) = service_with(
        TokenServiceMode::Strict,
        Arc::new(StubLedgerCaller::failing(failure.clone())),
    );
    assert_eq!(
        strict.associate_token(ACCOUNT, PARCEL).await,
        Err(RegistryError::Communication(failure))
    );
}

#[tokio::test]
async fn test_calldata_layout() {
    let stub = Arc::new(StubLedgerCaller::responding(ResponseCode::SUCCESS));
    let (service, _) = service_with(TokenServiceMode::Defensive, stub.clone());
    service
        .transfer_token(PARCEL, ACCOUNT, RECIPIENT, -3)
        .await
        .unwrap();

    let call = stub.last_call().unwrap();
    let input = call.input.as_slice();
    assert_eq!(call.target, DEFAULT_TOKEN_SERVICE_ADDRESS);
    assert_eq!(input.len(), 4 + 4 * 32);
    assert_eq!(&input[..4], &[0xec, 0xa3, 0x69, 0x17]);

    // address words: 12 zero bytes, then the 20 address bytes
    assert_eq!(&input[4..16], &[0u8; 12]);
    assert_eq!(&input[16..36], PARCEL.as_bytes());
    assert_eq!(&input[48..68], ACCOUNT.as_bytes());
    assert_eq!(&input[80..100], RECIPIENT.as_bytes());

    // int64 word is sign-extended
    assert_eq!(&input[100..124], &[0xff; 24]);
    assert_eq!(&input[124..132], &(-3i64).to_be_bytes());
}

#[tokio::test]
async fn test_ledger_round_trip_through_service() {
    let (service, audit, ledger) = ledger_service();
    ledger.mint(ACCOUNT, PARCEL, 10);

    assert_eq!(
        service.transfer_token(PARCEL, ACCOUNT, RECIPIENT, 4).await,
        Err(RegistryError::TokenServiceFailure(
            ResponseCode::TOKEN_NOT_ASSOCIATED_TO_ACCOUNT
        ))
    );

    service.associate_token(RECIPIENT, PARCEL).await.unwrap();
    assert_eq!(
        service.associate_token(RECIPIENT, PARCEL).await,
        Err(RegistryError::TokenServiceFailure(
            ResponseCode::TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT
        ))
    );

    service
        .transfer_token(PARCEL, ACCOUNT, RECIPIENT, 4)
        .await
        .unwrap();
    assert_eq!(ledger.balance_of(ACCOUNT, PARCEL), 6);
    assert_eq!(ledger.balance_of(RECIPIENT, PARCEL), 4);

    ledger.set_unreachable(true);
    assert_eq!(
        service.transfer_token(PARCEL, ACCOUNT, RECIPIENT, 1).await,
        Err(RegistryError::TokenServiceFailure(
            ResponseCode::INVALID_TRANSACTION
        ))
    );

    assert_eq!(
        audit.events(),
        vec![
            AuditEvent::TokenAssociated {
                account: RECIPIENT,
                token: PARCEL,
            },
            AuditEvent::TokenTransferred {
                token: PARCEL,
                from: ACCOUNT,
                to: RECIPIENT,
                amount: 4,
            },
        ]
    );
}

// =============================================================================
// EXTERNAL CALL ORDERING AND RE-ENTRANCY
// =============================================================================

/// Ledger that calls back into the registry before answering.
struct CallbackLedger {
    registry: Arc<OnceLock<Arc<BiodiversityRegistryService>>>,
    inner: InMemoryTokenLedger,
}

#[async_trait]
impl LedgerCaller for CallbackLedger {
    async fn call(&self, target: Address, input: Bytes) -> Result<Bytes, CommunicationFailure> {
        let registry = self
            .registry
            .get()
            .ok_or_else(|| CommunicationFailure::Reverted("registry not wired".into()))?;

        registry
            .add_biodiversity_data(PARCEL, 88, "Cloud Forest".into())
            .await
            .map_err(|e| CommunicationFailure::Reverted(e.to_string()))?;
        registry
            .verify_biodiversity_data(PARCEL, CallContext::new(VERIFIER_B, 77))
            .await
            .map_err(|e| CommunicationFailure::Reverted(e.to_string()))?;

        self.inner.call(target, input).await
    }
}

#[tokio::test]
async fn test_re_entrant_callback_completes() {
    let slot = Arc::new(OnceLock::new());
    let ledger = Arc::new(CallbackLedger {
        registry: slot.clone(),
        inner: InMemoryTokenLedger::new(),
    });
    let (service, audit) = service_with(TokenServiceMode::Strict, ledger);
    assert!(slot.set(service.clone()).is_ok());

    let code = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        service.associate_token(ACCOUNT, PARCEL),
    )
    .await
    .expect("re-entrant call deadlocked")
    .unwrap();
    assert_eq!(code, ResponseCode::SUCCESS);

    let record = service.get_biodiversity_data(PARCEL).await;
    assert!(record.is_verified);
    assert_eq!(record.verifier, VERIFIER_B);

    // nested operations commit before the outer one
    let order: Vec<&str> = audit.events().iter().map(AuditEvent::topic).collect();
    assert_eq!(
        order,
        vec![
            topics::RECORD_ADDED,
            topics::RECORD_VERIFIED,
            topics::TOKEN_ASSOCIATED
        ]
    );

    let traces = service.recent_traces();
    assert_eq!(traces.len(), 3);
    assert_eq!(traces[2].kind, OperationKind::AssociateToken);
    for trace in &traces {
        assert!(check_trace_invariants(trace).is_valid());
    }
}

#[tokio::test]
async fn test_no_store_write_follows_external_call() {
    let (service, _, ledger) = ledger_service();
    ledger.mint(ACCOUNT, PARCEL, 5);
    ledger.associate(RECIPIENT, PARCEL);

    service
        .add_biodiversity_data(PARCEL, 20, "Heath".into())
        .await
        .unwrap();
    service
        .verify_biodiversity_data(PARCEL, CallContext::new(VERIFIER_A, 3))
        .await
        .unwrap();
    service.associate_token(ACCOUNT, PARCEL).await.ok();
    service
        .transfer_token(PARCEL, ACCOUNT, RECIPIENT, 5)
        .await
        .unwrap();
    service
        .transfer_token(PARCEL, ACCOUNT, RECIPIENT, 5)
        .await
        .unwrap_err();

    let traces = service.recent_traces();
    assert_eq!(traces.len(), 5);
    for trace in &traces {
        assert!(check_trace_invariants(trace).is_valid(), "{trace:?}");
        if trace.contains(OperationStep::ExternalCall) {
            assert!(!trace.contains(OperationStep::StateWrite));
            assert_eq!(trace.steps[0], OperationStep::ExternalCall);
        }
    }
}

#[test]
fn test_selectors_match_signatures() {
    assert_eq!(abi::associate_selector(), [0x49, 0x14, 0x6b, 0xde]);
    assert_eq!(abi::transfer_selector(), [0xec, 0xa3, 0x69, 0x17]);
}

#[tokio::test]
async fn test_token_operations_leave_store_untouched() {
    let (service, audit, ledger) = ledger_service();
    ledger.mint(ACCOUNT, PARCEL, 5);
    ledger.associate(RECIPIENT, PARCEL);

    service
        .add_biodiversity_data(PARCEL, 20, "Heath".into())
        .await
        .unwrap();
    service
        .verify_biodiversity_data(PARCEL, CallContext::new(VERIFIER_A, 3))
        .await
        .unwrap();
    let before = service.snapshot().await;

    service
        .transfer_token(PARCEL, ACCOUNT, RECIPIENT, 5)
        .await
        .unwrap();
    assert_eq!(service.snapshot().await, before);

    service
        .transfer_token(PARCEL, ACCOUNT, RECIPIENT, 5)
        .await
        .unwrap_err();
    service.associate_token(ACCOUNT, PARCEL).await.unwrap_err();
    ledger.set_unreachable(true);
    service.associate_token(RECIPIENT, PARCEL).await.unwrap_err();
    assert_eq!(service.snapshot().await, before);

    let stats = service.stats().await;
    assert_eq!(stats.token_operations_succeeded, 1);
    assert_eq!(stats.token_operations_failed, 3);
    assert_eq!(audit.len(), 3);
}
