//! # Biodiversity Registry Service
//!
//! Composes the Record Store, the Verification Workflow, the token-service
//! strategy and the audit sink behind [`BiodiversityRegistryApi`].
//!
//! ## Atomicity
//!
//! - `add` and `verify` hold the store write lock for the whole
//!   read-validate-write-emit sequence, so audit entries follow commit order.
//! - Token operations never take the store lock. The external call is the
//!   last step before the response decision, and a callback from the ledger
//!   into this service runs as its own independent operation.
//!
//! Each operation records an [`OperationTrace`]; trace invariants are
//! checked before the operation returns.
//!
//! [`ServiceStats`] and the retained traces are observability. They are
//! updated after a token call returns and are not registry state; only the
//! record store is.

use crate::adapters::{
    build_token_service, AllowAllVerifiers, InMemoryAuditLog, InMemoryTokenLedger,
};
use crate::config::ServiceConfig;
use crate::domain::entities::{
    BiodiversityRecord, CallContext, OperationKind, OperationStep, OperationTrace, TokenOperation,
};
use crate::domain::invariants::{
    check_record_invariants, check_trace_invariants, InvariantCheckResult,
};
use crate::domain::store::RecordStore;
use crate::domain::value_objects::{Address, ParcelId, ResponseCode};
use crate::domain::verification::verify_record;
use crate::errors::RegistryError;
use crate::events::AuditEvent;
use crate::ports::inbound::BiodiversityRegistryApi;
use crate::ports::outbound::{AuditSink, LedgerCaller, TokenService, VerificationPolicy};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, warn};

/// Statistics for the registry service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Records written.
    pub records_added: u64,
    /// Successful verifications.
    pub records_verified: u64,
    /// Writes or verifications rejected before mutation.
    pub rejected_requests: u64,
    /// Token operations answered with `SUCCESS`.
    pub token_operations_succeeded: u64,
    /// Token operations that failed for any reason.
    pub token_operations_failed: u64,
    /// Audit emissions the sink refused.
    pub audit_failures: u64,
}

/// The main registry service.
pub struct BiodiversityRegistryService {
    /// Service configuration.
    config: ServiceConfig,
    /// Parcel records, guarded for whole-operation atomicity.
    store: RwLock<RecordStore>,
    /// Token-service strategy.
    token_service: Arc<dyn TokenService>,
    /// Audit destination.
    audit: Arc<dyn AuditSink>,
    /// Verification authorization hook.
    policy: Arc<dyn VerificationPolicy>,
    /// Service statistics.
    stats: RwLock<ServiceStats>,
    /// Most recent operation traces, oldest first.
    traces: Mutex<VecDeque<OperationTrace>>,
}

impl BiodiversityRegistryService {
    /// Create a service from explicit collaborators.
    pub fn new(
        config: ServiceConfig,
        token_service: Arc<dyn TokenService>,
        audit: Arc<dyn AuditSink>,
        policy: Arc<dyn VerificationPolicy>,
    ) -> Self {
        Self {
            config,
            store: RwLock::new(RecordStore::new()),
            token_service,
            audit,
            policy,
            stats: RwLock::new(ServiceStats::default()),
            traces: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a service whose token strategy is chosen by `config`, with the
    /// allow-all verification policy.
    pub fn from_config(
        config: ServiceConfig,
        caller: Arc<dyn LedgerCaller>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let token_service = build_token_service(&config, caller);
        Self::new(config, token_service, audit, Arc::new(AllowAllVerifiers))
    }

    /// Replaces the verification policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn VerificationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Service configuration.
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Token-service strategy in use.
    pub fn token_service(&self) -> &Arc<dyn TokenService> {
        &self.token_service
    }

    /// Get current service statistics.
    pub async fn stats(&self) -> ServiceStats {
        self.stats.read().await.clone()
    }

    /// Copy of the record store as of now.
    pub async fn snapshot(&self) -> RecordStore {
        self.store.read().await.clone()
    }

    /// Number of stored records.
    pub async fn record_count(&self) -> usize {
        self.store.read().await.len()
    }

    /// Retained operation traces, oldest first.
    pub fn recent_traces(&self) -> Vec<OperationTrace> {
        self.traces.lock().iter().cloned().collect()
    }

    /// Trace of the most recently finished operation.
    pub fn last_trace(&self) -> Option<OperationTrace> {
        self.traces.lock().back().cloned()
    }

    /// Emits once; a refusal is logged and counted but never undoes the
    /// committed change.
    async fn emit(&self, event: &AuditEvent, trace: &mut OperationTrace) {
        match self.audit.emit(event) {
            Ok(()) => trace.record(OperationStep::AuditEmit),
            Err(e) => {
                warn!(topic = event.topic(), error = %e, "Audit emission failed");
                self.stats.write().await.audit_failures += 1;
            }
        }
    }

    /// Checks and retains `trace`.
    fn finish(&self, trace: OperationTrace) -> Result<(), RegistryError> {
        let verdict = check_trace_invariants(&trace);

        {
            let mut traces = self.traces.lock();
            traces.push_back(trace);
            while traces.len() > self.config.trace_history {
                traces.pop_front();
            }
        }

        match verdict {
            InvariantCheckResult::Valid => Ok(()),
            InvariantCheckResult::Invalid(violations) => {
                let reason = violations
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                error!(%reason, "Operation broke a trace invariant");
                Err(RegistryError::InvariantViolation(reason))
            }
        }
    }

    /// Aborts with `err` unless the trace itself is broken.
    fn abort<T>(&self, trace: OperationTrace, err: RegistryError) -> Result<T, RegistryError> {
        self.finish(trace)?;
        Err(err)
    }

    fn check_stored_record(record: &BiodiversityRecord) {
        if let InvariantCheckResult::Invalid(violations) = check_record_invariants(record) {
            error!(parcel = %record.identifier, ?violations, "Stored record breaks an invariant");
        }
    }

    async fn run_token_operation(
        &self,
        kind: OperationKind,
        operation: TokenOperation,
    ) -> Result<ResponseCode, RegistryError> {
        let mut trace = OperationTrace::new(kind);

        // Nothing local is touched from here on.
        trace.record(OperationStep::ExternalCall);
        let outcome = self.token_service.execute(operation).await;

        match outcome {
            Ok(code) => {
                trace.committed = true;
                self.emit(&AuditEvent::token_operation(&operation), &mut trace)
                    .await;
                self.stats.write().await.token_operations_succeeded += 1;
                info!(
                    operation = operation.name(),
                    token = %operation.token(),
                    "Token operation succeeded"
                );
                self.finish(trace)?;
                Ok(code)
            }
            Err(e) => {
                self.stats.write().await.token_operations_failed += 1;
                warn!(operation = operation.name(), error = %e, "Token operation failed");
                self.abort(trace, e)
            }
        }
    }
}

/// Create a service for testing: default configuration, an in-memory
/// token ledger and an in-memory audit log.
pub fn create_test_service() -> BiodiversityRegistryService {
    BiodiversityRegistryService::from_config(
        ServiceConfig::default(),
        Arc::new(InMemoryTokenLedger::new()),
        Arc::new(InMemoryAuditLog::new()),
    )
}

// =============================================================================
// BiodiversityRegistryApi Implementation
// =============================================================================

#[async_trait]
impl BiodiversityRegistryApi for BiodiversityRegistryService {
    #[instrument(skip_all, fields(parcel = %identifier, score = score))]
    async fn add_biodiversity_data(
        &self,
        identifier: ParcelId,
        score: u64,
        ecosystem_type: String,
    ) -> Result<(), RegistryError> {
        let mut trace = OperationTrace::new(OperationKind::AddRecord);
        let mut store = self.store.write().await;

        let record = match store.add_record(identifier, score, ecosystem_type) {
            Ok(record) => record,
            Err(e) => {
                drop(store);
                self.stats.write().await.rejected_requests += 1;
                warn!(score, error = %e, "Rejected biodiversity data");
                return self.abort(trace, e);
            }
        };
        trace.record(OperationStep::StateWrite);
        trace.committed = true;
        Self::check_stored_record(&record);

        self.emit(&AuditEvent::added(&record), &mut trace).await;
        drop(store);

        self.stats.write().await.records_added += 1;
        info!(
            score = record.biodiversity_score.value(),
            ecosystem = %record.ecosystem_type,
            "Biodiversity data added"
        );
        self.finish(trace)
    }

    #[instrument(skip_all, fields(parcel = %identifier, actor = %ctx.caller))]
    async fn verify_biodiversity_data(
        &self,
        identifier: ParcelId,
        ctx: CallContext,
    ) -> Result<(), RegistryError> {
        let mut trace = OperationTrace::new(OperationKind::VerifyRecord);

        if !self.policy.authorize(&identifier, &ctx.caller) {
            self.stats.write().await.rejected_requests += 1;
            warn!("Verification refused by policy");
            return self.abort(
                trace,
                RegistryError::Unauthorized {
                    parcel: identifier,
                    actor: ctx.caller,
                },
            );
        }

        let mut store = self.store.write().await;
        trace.record(OperationStep::StateRead);

        let record = match verify_record(
            &mut store,
            identifier,
            ctx.caller,
            ctx.timestamp,
            self.config.existence_check,
        ) {
            Ok(record) => record,
            Err(e) => {
                drop(store);
                self.stats.write().await.rejected_requests += 1;
                warn!(error = %e, "Verification rejected");
                return self.abort(trace, e);
            }
        };
        trace.record(OperationStep::StateWrite);
        trace.committed = true;
        Self::check_stored_record(&record);

        self.emit(&AuditEvent::verified(&record), &mut trace).await;
        drop(store);

        self.stats.write().await.records_verified += 1;
        info!(timestamp = ctx.timestamp, "Biodiversity data verified");
        self.finish(trace)
    }

    async fn get_biodiversity_data(&self, identifier: ParcelId) -> BiodiversityRecord {
        self.store.read().await.get_record(&identifier)
    }

    async fn find_biodiversity_data(&self, identifier: ParcelId) -> Option<BiodiversityRecord> {
        self.store.read().await.get(&identifier).cloned()
    }

    #[instrument(skip_all, fields(account = %account, token = %token))]
    async fn associate_token(
        &self,
        account: Address,
        token: Address,
    ) -> Result<ResponseCode, RegistryError> {
        self.run_token_operation(
            OperationKind::AssociateToken,
            TokenOperation::Associate { account, token },
        )
        .await
    }

    #[instrument(skip_all, fields(token = %token, from = %from, to = %to, amount = amount))]
    async fn transfer_token(
        &self,
        token: Address,
        from: Address,
        to: Address,
        amount: i64,
    ) -> Result<ResponseCode, RegistryError> {
        self.run_token_operation(
            OperationKind::TransferToken,
            TokenOperation::Transfer {
                token,
                from,
                to,
                amount,
            },
        )
        .await
    }
}

// =============================================================================
// TESTS
// =============================================================================
