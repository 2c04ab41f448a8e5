//! # Ledger Caller Adapters
//!
//! Implementations of the low-level [`LedgerCaller`] port.
//!
//! - [`InMemoryTokenLedger`]: deterministic simulator of the token-ledger
//!   service with associations and balances.
//! - [`StubLedgerCaller`]: canned answers for adapter tests.

use crate::config::DEFAULT_TOKEN_SERVICE_ADDRESS;
use crate::domain::abi;
use crate::domain::entities::TokenOperation;
use crate::domain::value_objects::{Address, Bytes, ResponseCode};
use crate::errors::CommunicationFailure;
use crate::ports::outbound::LedgerCaller;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Observation hook invoked with every call the ledger receives, before it
/// is applied.
pub type CallHook = Arc<dyn Fn(&TokenOperation) + Send + Sync>;

// =============================================================================
// IN-MEMORY TOKEN LEDGER
// =============================================================================

#[derive(Default)]
struct LedgerState {
    associations: HashSet<(Address, Address)>,
    balances: HashMap<(Address, Address), i64>,
    /// Remaining calls the paying account can cover; `None` is unlimited.
    fee_budget: Option<u64>,
}

/// In-memory simulator of the fixed-address token-ledger service.
///
/// Answers every decodable call with a response code word:
///
/// | Situation | Code |
/// |-----------|------|
/// | fee budget exhausted | `INSUFFICIENT_ACCOUNT_BALANCE` |
/// | duplicate association | `TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT` |
/// | non-positive transfer amount | `INVALID_TRANSACTION` |
/// | sender or receiver not associated | `TOKEN_NOT_ASSOCIATED_TO_ACCOUNT` |
/// | sender balance too low | `INSUFFICIENT_TOKEN_BALANCE` |
/// | receiver balance would overflow | `INVALID_TRANSACTION` |
/// | otherwise | `SUCCESS` |
///
/// Undecodable calldata reverts.
pub struct InMemoryTokenLedger {
    address: Address,
    state: RwLock<LedgerState>,
    unreachable: AtomicBool,
    hook: RwLock<Option<CallHook>>,
    received: Mutex<Vec<TokenOperation>>,
}

impl Default for InMemoryTokenLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTokenLedger {
    /// Ledger listening on the default service address.
    pub fn new() -> Self {
        Self::with_address(DEFAULT_TOKEN_SERVICE_ADDRESS)
    }

    /// Ledger listening on `address`.
    pub fn with_address(address: Address) -> Self {
        Self {
            address,
            state: RwLock::new(LedgerState::default()),
            unreachable: AtomicBool::new(false),
            hook: RwLock::new(None),
            received: Mutex::new(Vec::new()),
        }
    }

    /// Associates `account` with `token` directly, bypassing the call path.
    pub fn associate(&self, account: Address, token: Address) {
        self.state.write().associations.insert((account, token));
    }

    /// Associates `account` and credits it `amount` of `token`.
    ///
    /// The balance saturates at `i64::MAX`.
    pub fn mint(&self, account: Address, token: Address, amount: i64) {
        let mut state = self.state.write();
        state.associations.insert((account, token));
        let balance = state.balances.entry((account, token)).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Balance of `account` in `token`.
    pub fn balance_of(&self, account: Address, token: Address) -> i64 {
        self.state
            .read()
            .balances
            .get(&(account, token))
            .copied()
            .unwrap_or(0)
    }

    /// Returns true if `account` is associated with `token`.
    pub fn is_associated(&self, account: Address, token: Address) -> bool {
        self.state.read().associations.contains(&(account, token))
    }

    /// While set, every call fails with [`CommunicationFailure::Unreachable`].
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Limits how many further calls the paying account can cover.
    pub fn set_fee_budget(&self, budget: Option<u64>) {
        self.state.write().fee_budget = budget;
    }

    /// Installs a hook run on every decoded call.
    ///
    /// The hook runs with no ledger lock held, so it may call back into
    /// whoever invoked the ledger.
    pub fn set_hook(&self, hook: CallHook) {
        *self.hook.write() = Some(hook);
    }

    /// Operations received so far, in arrival order.
    pub fn received(&self) -> Vec<TokenOperation> {
        self.received.lock().clone()
    }

    fn apply(&self, operation: &TokenOperation) -> ResponseCode {
        let mut state = self.state.write();

        if let Some(budget) = state.fee_budget.as_mut() {
            if *budget == 0 {
                return ResponseCode::INSUFFICIENT_ACCOUNT_BALANCE;
            }
            *budget -= 1;
        }

        match *operation {
            TokenOperation::Associate { account, token } => {
                if state.associations.insert((account, token)) {
                    ResponseCode::SUCCESS
                } else {
                    ResponseCode::TOKEN_ALREADY_ASSOCIATED_TO_ACCOUNT
                }
            }
            TokenOperation::Transfer {
                token,
                from,
                to,
                amount,
            } => {
                if amount <= 0 {
                    return ResponseCode::INVALID_TRANSACTION;
                }
                if !state.associations.contains(&(from, token))
                    || !state.associations.contains(&(to, token))
                {
                    return ResponseCode::TOKEN_NOT_ASSOCIATED_TO_ACCOUNT;
                }
                let available = state.balances.get(&(from, token)).copied().unwrap_or(0);
                if available < amount {
                    return ResponseCode::INSUFFICIENT_TOKEN_BALANCE;
                }
                let received = if from == to {
                    available
                } else {
                    let held = state.balances.get(&(to, token)).copied().unwrap_or(0);
                    match held.checked_add(amount) {
                        Some(total) => total,
                        None => return ResponseCode::INVALID_TRANSACTION,
                    }
                };
                state.balances.insert((from, token), available - amount);
                state.balances.insert((to, token), received);
                ResponseCode::SUCCESS
            }
        }
    }
}

#[async_trait]
impl LedgerCaller for InMemoryTokenLedger {
    async fn call(&self, target: Address, input: Bytes) -> Result<Bytes, CommunicationFailure> {
        if self.unreachable.load(Ordering::SeqCst) || target != self.address {
            return Err(CommunicationFailure::Unreachable(target));
        }

        let operation = abi::decode_call(input.as_slice())
            .map_err(|e| CommunicationFailure::Reverted(e.to_string()))?;
        self.received.lock().push(operation);

        let hook = self.hook.read().clone();
        if let Some(hook) = hook {
            hook(&operation);
        }

        let code = self.apply(&operation);
        debug!(operation = operation.name(), %code, "Ledger applied call");
        Ok(abi::encode_response_code(code))
    }
}

// =============================================================================
// STUB LEDGER CALLER
// =============================================================================

/// What a [`StubLedgerCaller`] answers with.
#[derive(Clone, Debug)]
pub enum StubBehavior {
    /// Complete the call with this response code.
    Respond(ResponseCode),
    /// Complete the call with these raw result bytes.
    Raw(Bytes),
    /// Fail the call.
    Fail(CommunicationFailure),
}

/// One call observed by a [`StubLedgerCaller`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    /// Address the call was dispatched to.
    pub target: Address,
    /// Calldata sent.
    pub input: Bytes,
}

/// Ledger caller with a fixed answer.
pub struct StubLedgerCaller {
    behavior: Mutex<StubBehavior>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubLedgerCaller {
    /// Stub answering with `behavior`.
    pub fn new(behavior: StubBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Stub completing every call with `code`.
    pub fn responding(code: ResponseCode) -> Self {
        Self::new(StubBehavior::Respond(code))
    }

    /// Stub failing every call with `failure`.
    pub fn failing(failure: CommunicationFailure) -> Self {
        Self::new(StubBehavior::Fail(failure))
    }

    /// Stub completing every call with `output`.
    pub fn raw(output: Bytes) -> Self {
        Self::new(StubBehavior::Raw(output))
    }

    /// Replaces the answer for subsequent calls.
    pub fn set_behavior(&self, behavior: StubBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Calls observed so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Most recent call.
    pub fn last_call(&self) -> Option<RecordedCall> {
        self.calls.lock().last().cloned()
    }
}

#[async_trait]
impl LedgerCaller for StubLedgerCaller {
    async fn call(&self, target: Address, input: Bytes) -> Result<Bytes, CommunicationFailure> {
        self.calls.lock().push(RecordedCall { target, input });
        match self.behavior.lock().clone() {
            StubBehavior::Respond(code) => Ok(abi::encode_response_code(code)),
            StubBehavior::Raw(output) => Ok(output),
            StubBehavior::Fail(failure) => Err(failure),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
