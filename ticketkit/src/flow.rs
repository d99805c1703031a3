//! Ticket flow controller: identity selection, validation, intent
//! construction and submission for the buy and return flows.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alloy_primitives::{Address, Bytes, U256};
use chrono::Utc;
use thiserror::Error;

use crate::contract::{encode_buy_ticket, encode_refund_ticket, ContractClient};
use crate::error::TicketError;
use crate::keystore::{self, KeystoreError};
use crate::signer::{HostedSigner, IdentityKind, LocalSigner, Signer};
use crate::types::{BalanceReport, Direction, TokenDetails, TransactionIntent, TransactionOutcome};
use crate::utils::format_ether;

/// Most tickets a single purchase may request.
pub const MAX_TICKETS_PER_PURCHASE: u64 = 2;

/// User-facing failures. `Display` is the message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Please connect your wallet or upload a keystore file with a password.")]
    MissingIdentity,

    #[error("{0}")]
    InvalidAmount(String),

    #[error("{0}")]
    InvalidAddress(String),

    #[error("You do not have any tickets to return.")]
    NothingToReturn,

    #[error("Insufficient balance to purchase tickets: need {} ETH, have {} ETH.", ether(.required), ether(.available))]
    InsufficientFunds { required: U256, available: U256 },

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Wallet provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Another operation is still in progress.")]
    Busy,

    #[error("The previous operation has finished; reset before starting another.")]
    AwaitingReset,
}

fn ether(wei: &U256) -> String {
    format_ether(*wei)
}

fn unavailable(e: TicketError) -> FlowError {
    FlowError::ProviderUnavailable(e.to_string())
}

fn failed(e: TicketError) -> FlowError {
    FlowError::TransactionFailed(e.to_string())
}

/// Per-operation lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle,
    IdentityResolved,
    Validated,
    Submitting,
    Succeeded(TransactionOutcome),
    Failed(FlowError),
}

impl FlowState {
    fn accepts_new_operation(&self) -> bool {
        matches!(self, FlowState::Idle | FlowState::IdentityResolved)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Succeeded(_) | FlowState::Failed(_))
    }
}

/// Identity material supplied by the user.
pub enum IdentitySource {
    /// An account exposed by a connected hosted wallet.
    Hosted(HostedSigner),
    /// A keystore JSON blob and its password.
    Keystore { json: String, password: String },
}

impl std::fmt::Debug for IdentitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentitySource::Hosted(s) => f.debug_tuple("Hosted").field(&s.address()).finish(),
            IdentitySource::Keystore { json, .. } => f
                .debug_struct("Keystore")
                .field("json_len", &json.len())
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// At most one active identity: a hosted account or a decrypted keystore.
#[derive(Debug, Default)]
pub struct Session {
    signer: Option<Arc<Signer>>,
}

impl Session {
    pub fn selected_account_address(&self) -> Option<Address> {
        match self.signer.as_deref() {
            Some(Signer::Hosted(s)) => Some(s.address()),
            _ => None,
        }
    }

    pub fn decrypted_keystore_address(&self) -> Option<Address> {
        match self.signer.as_deref() {
            Some(Signer::Local(s)) => Some(s.address()),
            _ => None,
        }
    }

    pub fn has_decrypted_private_key(&self) -> bool {
        matches!(self.signer.as_deref(), Some(Signer::Local(_)))
    }

    pub fn active_address(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    pub fn identity_kind(&self) -> Option<IdentityKind> {
        self.signer.as_ref().map(|s| s.kind())
    }

    fn signer(&self) -> Option<Arc<Signer>> {
        self.signer.clone()
    }

    fn replace(&mut self, signer: Option<Signer>) {
        self.signer = signer.map(Arc::new);
    }
}

/// Check a requested ticket count against the purchase cap or current holdings.
///
/// Never clamps: out-of-range input is rejected.
pub fn validate_ticket_count(
    requested: i64,
    max_allowed: u64,
    current_holdings: U256,
    direction: Direction,
) -> Result<u64, FlowError> {
    match direction {
        Direction::Buy => {
            if requested <= 0 {
                return Err(FlowError::InvalidAmount(
                    "Ticket amount must be at least 1.".into(),
                ));
            }
            if requested as u64 > max_allowed {
                return Err(FlowError::InvalidAmount(format!(
                    "You can only buy a maximum of {max_allowed} tickets."
                )));
            }
            Ok(requested as u64)
        }
        Direction::Return => {
            if current_holdings.is_zero() {
                return Err(FlowError::NothingToReturn);
            }
            if requested <= 0 || U256::from(requested as u64) > current_holdings {
                return Err(FlowError::InvalidAmount(format!(
                    "Invalid ticket amount. You can return between 1 and {current_holdings} ticket(s)."
                )));
            }
            Ok(requested as u64)
        }
    }
}

/// Total cost in wei of `amount` tickets at `unit_price`, if `available` covers it.
pub fn check_sufficient_funds(
    unit_price: U256,
    amount: u64,
    available: U256,
) -> Result<U256, FlowError> {
    let total = unit_price
        .checked_mul(U256::from(amount))
        .ok_or_else(|| FlowError::InvalidAmount("Total ticket cost overflows.".into()))?;
    if available < total {
        return Err(FlowError::InsufficientFunds {
            required: total,
            available,
        });
    }
    Ok(total)
}

/// Intent for `buyTicket(amount)` carrying `total_value`, or `refundTicket(amount)` carrying nothing.
pub fn build_intent(
    contract: Address,
    gas_limit: u64,
    direction: Direction,
    amount: u64,
    total_value: U256,
) -> TransactionIntent {
    match direction {
        Direction::Buy => TransactionIntent::new(
            contract,
            encode_buy_ticket(U256::from(amount)),
            Some(total_value),
            gas_limit,
        ),
        Direction::Return => TransactionIntent::new(
            contract,
            encode_refund_ticket(U256::from(amount)),
            None,
            gas_limit,
        ),
    }
}

/// Clears the loading flag when an operation ends, however it ends.
pub(crate) struct LoadingGuard<'a>(&'a AtomicBool);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives one user flow at a time against a shared [`ContractClient`].
pub struct TicketFlowController {
    contract: Arc<ContractClient>,
    session: Mutex<Session>,
    state: Mutex<FlowState>,
    loading: AtomicBool,
}

impl TicketFlowController {
    pub fn new(contract: Arc<ContractClient>) -> Self {
        Self {
            contract,
            session: Mutex::new(Session::default()),
            state: Mutex::new(FlowState::Idle),
            loading: AtomicBool::new(false),
        }
    }

    pub fn contract(&self) -> &ContractClient {
        &self.contract
    }

    // --- State ---

    pub fn state(&self) -> FlowState {
        self.lock_state().clone()
    }

    /// True while an operation is between its start and its terminal state.
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    pub fn active_address(&self) -> Option<Address> {
        self.lock_session().active_address()
    }

    pub fn identity_kind(&self) -> Option<IdentityKind> {
        self.lock_session().identity_kind()
    }

    pub fn selected_account_address(&self) -> Option<Address> {
        self.lock_session().selected_account_address()
    }

    pub fn decrypted_keystore_address(&self) -> Option<Address> {
        self.lock_session().decrypted_keystore_address()
    }

    /// Return to `Idle` and forget the session identity.
    ///
    /// # Errors
    ///
    /// `Busy` while an operation is in flight.
    pub fn reset(&self) -> Result<(), FlowError> {
        if self.is_loading() {
            return Err(FlowError::Busy);
        }
        self.lock_session().replace(None);
        self.set_state(FlowState::Idle);
        Ok(())
    }

    fn lock_state(&self) -> MutexGuard<'_, FlowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, next: FlowState) {
        let mut state = self.lock_state();
        tracing::debug!(from = ?*state, to = ?next, "flow state");
        *state = next;
    }

    /// Claim the loading flag and check the state machine accepts a new operation.
    pub(crate) fn begin(&self) -> Result<LoadingGuard<'_>, FlowError> {
        if self
            .loading
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("operation rejected: another one is in progress");
            return Err(FlowError::Busy);
        }
        let guard = LoadingGuard(&self.loading);
        if !self.lock_state().accepts_new_operation() {
            return Err(FlowError::AwaitingReset);
        }
        Ok(guard)
    }

    /// Record the terminal state for `result` and pass it through.
    pub(crate) fn finish<T>(
        &self,
        result: Result<(T, TransactionOutcome), FlowError>,
    ) -> Result<T, FlowError> {
        match result {
            Ok((value, outcome)) => {
                tracing::info!(hash = %outcome.transaction_hash, message = %outcome.message, "operation succeeded");
                self.set_state(FlowState::Succeeded(outcome));
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "operation failed");
                self.set_state(FlowState::Failed(e.clone()));
                Err(e)
            }
        }
    }

    pub(crate) fn require_signer(&self) -> Result<Arc<Signer>, FlowError> {
        self.lock_session()
            .signer()
            .ok_or(FlowError::MissingIdentity)
    }

    pub(crate) fn mark_validated(&self) {
        self.set_state(FlowState::Validated);
    }

    // --- Identity ---

    /// Connect to the configured hosted wallet and return its first account.
    pub async fn connect_hosted(&self) -> Result<HostedSigner, FlowError> {
        HostedSigner::connect(self.contract.wallet_rpc.clone())
            .await
            .map_err(unavailable)
    }

    /// Resolve the identity used by subsequent operations.
    ///
    /// A keystore is decrypted off the async runtime. On any failure the
    /// session is left empty and the controller moves to `Failed`.
    pub async fn select_identity(&self, source: Option<IdentitySource>) -> Result<Address, FlowError> {
        let _guard = self.begin()?;
        let result = resolve_identity(source).await;
        match result {
            Ok(signer) => {
                let address = signer.address();
                let kind = signer.kind();
                self.lock_session().replace(Some(signer));
                self.set_state(FlowState::IdentityResolved);
                tracing::info!(%address, ?kind, "identity selected");
                Ok(address)
            }
            Err(e) => {
                self.lock_session().replace(None);
                tracing::warn!(error = %e, "identity selection failed");
                self.set_state(FlowState::Failed(e.clone()));
                Err(e)
            }
        }
    }

    // --- Reads ---

    /// Native and ticket balances of the active identity.
    pub async fn check_balances(&self) -> Result<BalanceReport, FlowError> {
        let address = self
            .active_address()
            .ok_or(FlowError::MissingIdentity)?;
        let native_balance = self
            .contract
            .native_balance(address)
            .await
            .map_err(unavailable)?;
        let ticket_balance = self.contract.balance_of(address).await.map_err(unavailable)?;
        Ok(BalanceReport {
            address,
            native_balance,
            ticket_balance,
        })
    }

    pub async fn ticket_details(&self) -> Result<TokenDetails, FlowError> {
        self.contract.details().await.map_err(unavailable)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, FlowError> {
        self.contract
            .allowance(owner, spender)
            .await
            .map_err(unavailable)
    }

    // --- Ticket flows ---

    /// Buy `requested` tickets with the active identity.
    pub async fn buy(&self, requested: i64) -> Result<TransactionOutcome, FlowError> {
        let _guard = self.begin()?;
        let result = self.run_buy(requested).await.map(|o| (o.clone(), o));
        self.finish(result)
    }

    async fn run_buy(&self, requested: i64) -> Result<TransactionOutcome, FlowError> {
        let signer = self.require_signer()?;
        let amount = validate_ticket_count(
            requested,
            MAX_TICKETS_PER_PURCHASE,
            U256::ZERO,
            Direction::Buy,
        )?;

        let price = self.contract.ticket_price().await.map_err(unavailable)?;
        let balance = self
            .contract
            .native_balance(signer.address())
            .await
            .map_err(unavailable)?;
        let total = check_sufficient_funds(price, amount, balance)?;
        self.mark_validated();

        let intent = build_intent(
            self.contract.address(),
            self.contract.gas_limit(),
            Direction::Buy,
            amount,
            total,
        );
        let message = format!("Successfully purchased {amount} ticket(s) for {} ETH.", format_ether(total));
        self.submit(&signer, &intent, message).await
    }

    /// Return `requested` tickets held by the active identity for a refund.
    pub async fn return_tickets(&self, requested: i64) -> Result<TransactionOutcome, FlowError> {
        let _guard = self.begin()?;
        let result = self.run_return(requested).await.map(|o| (o.clone(), o));
        self.finish(result)
    }

    async fn run_return(&self, requested: i64) -> Result<TransactionOutcome, FlowError> {
        let signer = self.require_signer()?;
        let address = signer.address();
        let holdings = self.contract.balance_of(address).await.map_err(unavailable)?;
        let amount = validate_ticket_count(
            requested,
            MAX_TICKETS_PER_PURCHASE,
            holdings,
            Direction::Return,
        )?;
        let price = self.contract.ticket_price().await.map_err(unavailable)?;
        self.mark_validated();

        let refund = price.saturating_mul(U256::from(amount));
        let intent = build_intent(
            self.contract.address(),
            self.contract.gas_limit(),
            Direction::Return,
            amount,
            U256::ZERO,
        );
        let message = format!(
            "Successfully returned {amount} ticket(s) for {} ETH.",
            format_ether(refund)
        );
        let mut outcome = self.submit(&signer, &intent, message).await?;

        match self.contract.balance_of(address).await {
            Ok(remaining) if remaining.is_zero() => {
                outcome.message = "You have returned all your tickets.".into();
            }
            Ok(remaining) => {
                tracing::debug!(%remaining, "tickets still held");
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not refresh ticket balance after return");
            }
        }
        Ok(outcome)
    }

    /// Build, send and confirm a contract call from `signer`.
    pub(crate) async fn submit(
        &self,
        signer: &Signer,
        intent: &TransactionIntent,
        message: String,
    ) -> Result<TransactionOutcome, FlowError> {
        self.set_state(FlowState::Submitting);
        let submitted_at = Utc::now();
        tracing::info!(
            from = %signer.address(),
            to = %intent.to(),
            kind = ?signer.kind(),
            value = ?intent.value(),
            "submitting transaction"
        );

        let hash = signer.send(&self.contract, intent).await.map_err(failed)?;
        tracing::info!(%hash, "transaction sent, waiting for receipt");

        let receipt = self.contract.wait_for_receipt(hash).await.map_err(failed)?;
        if !receipt.succeeded() {
            return Err(FlowError::TransactionFailed(format!(
                "transaction {hash} reverted"
            )));
        }

        Ok(TransactionOutcome::from_receipt(
            &receipt,
            signer.address(),
            submitted_at,
            message,
        ))
    }

    /// Validate, submit and record one contract call. Shared by the
    /// administrative operations.
    pub(crate) async fn run_call<F>(
        &self,
        validate: F,
        value: Option<U256>,
        message: String,
    ) -> Result<TransactionOutcome, FlowError>
    where
        F: FnOnce(&Signer) -> Result<Bytes, FlowError>,
    {
        let _guard = self.begin()?;
        let result = async {
            let signer = self.require_signer()?;
            let call_data = validate(signer.as_ref())?;
            self.mark_validated();
            let intent = TransactionIntent::new(
                self.contract.address(),
                call_data,
                value,
                self.contract.gas_limit(),
            );
            self.submit(&signer, &intent, message).await
        }
        .await
        .map(|o| (o.clone(), o));
        self.finish(result)
    }
}

async fn resolve_identity(source: Option<IdentitySource>) -> Result<Signer, FlowError> {
    match source {
        None => Err(FlowError::MissingIdentity),
        Some(IdentitySource::Hosted(signer)) => Ok(Signer::Hosted(signer)),
        Some(IdentitySource::Keystore { json, password }) => {
            if json.trim().is_empty() || password.is_empty() {
                return Err(FlowError::MissingIdentity);
            }
            let account = tokio::task::spawn_blocking(move || keystore::decrypt(&json, &password))
                .await
                .map_err(|e| FlowError::DecryptionFailed(format!("decryption task failed: {e}")))?
                .map_err(|e| match e {
                    KeystoreError::EmptyPassword | KeystoreError::EmptyKeystore => {
                        FlowError::MissingIdentity
                    }
                    other => FlowError::DecryptionFailed(other.to_string()),
                })?;
            Ok(Signer::Local(LocalSigner::new(account)))
        }
    }
}
