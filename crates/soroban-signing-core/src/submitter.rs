use std::pin::pin;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use crate::domain::{
    FailureReason, LedgerTxStatus, PollState, SendStatus, SignOptions, SignedTransaction,
    SubmissionOutcome, SubmissionRequest, TransactionLookup, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_POLL_INTERVAL_MS, RPC_NOT_FOUND_CODE, TESTNET_PASSPHRASE, TESTNET_RPC_URL,
};
use crate::ports::{ActiveIdentity, LedgerRpcPort, PortError, SigningGateway, SleepPort};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitterConfig {
    pub rpc_url: String,
    pub network_passphrase: String,
    pub poll_interval: Duration,
    pub max_attempts: u32,
}

impl Default for SubmitterConfig {
    fn default() -> Self {
        Self {
            rpc_url: TESTNET_RPC_URL.to_owned(),
            network_passphrase: TESTNET_PASSPHRASE.to_owned(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

type Callback = Box<dyn Fn(&SubmissionOutcome)>;

/// Completion hooks. Exactly one of them fires per submission.
#[derive(Default)]
pub struct SubmitCallbacks {
    on_success: Option<Callback>,
    on_error: Option<Callback>,
}

impl SubmitCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_success(mut self, f: impl Fn(&SubmissionOutcome) + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&SubmissionOutcome) + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for SubmitCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmitCallbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Aborts an in-flight poll loop, including one parked in its interval sleep.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    pub async fn cancelled(&self) {
        let mut notified = pin!(self.inner.notify.notified());
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

/// Count of submissions currently between invocation and resolution.
#[derive(Debug, Clone, Default)]
pub struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    pub fn is_active(&self) -> bool {
        self.count() > 0
    }

    fn enter(&self) -> InFlightGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        InFlightGuard(Arc::clone(&self.0))
    }
}

struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollVerdict {
    Continue(String),
    Success,
    Failed(String),
    Fatal { code: i64, message: String },
}

pub fn classify_poll(result: Result<TransactionLookup, PortError>) -> PollVerdict {
    match result {
        Err(PortError::Rpc { code, message })
            if code == RPC_NOT_FOUND_CODE || message.contains("not found") =>
        {
            PollVerdict::Continue(format!("not found yet ({code})"))
        }
        Err(PortError::Rpc { code, message }) => PollVerdict::Fatal { code, message },
        Err(e) => PollVerdict::Continue(format!("transient: {e}")),
        Ok(lookup) => match lookup.status {
            LedgerTxStatus::Success => PollVerdict::Success,
            LedgerTxStatus::Failed => PollVerdict::Failed(lookup.raw.to_string()),
            LedgerTxStatus::Pending => PollVerdict::Continue("PENDING".to_owned()),
            LedgerTxStatus::NotFound => PollVerdict::Continue("NOT_FOUND".to_owned()),
            LedgerTxStatus::Other(status) => PollVerdict::Continue(status),
        },
    }
}

pub struct Submitter<G, R, S>
where
    G: SigningGateway,
    R: LedgerRpcPort,
    S: SleepPort,
{
    pub gateway: G,
    pub rpc: R,
    pub sleeper: S,
    config: SubmitterConfig,
    callbacks: SubmitCallbacks,
    in_flight: InFlight,
}

impl<G, R, S> Submitter<G, R, S>
where
    G: SigningGateway,
    R: LedgerRpcPort,
    S: SleepPort,
{
    pub fn new(gateway: G, rpc: R, sleeper: S, config: SubmitterConfig) -> Self {
        Self {
            gateway,
            rpc,
            sleeper,
            config,
            callbacks: SubmitCallbacks::default(),
            in_flight: InFlight::default(),
        }
    }

    pub fn with_callbacks(mut self, callbacks: SubmitCallbacks) -> Self {
        self.callbacks = callbacks;
        self
    }

    pub fn config(&self) -> &SubmitterConfig {
        &self.config
    }

    /// Builds a request against the configured endpoint and network.
    pub fn request(&self, unsigned_envelope: impl Into<String>) -> SubmissionRequest {
        SubmissionRequest::new(
            unsigned_envelope,
            self.config.network_passphrase.clone(),
            self.config.rpc_url.clone(),
        )
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_active()
    }

    pub fn in_flight(&self) -> InFlight {
        self.in_flight.clone()
    }

    pub async fn submit(
        &self,
        identity: &impl ActiveIdentity,
        request: &SubmissionRequest,
    ) -> SubmissionOutcome {
        self.submit_with_cancel(identity, request, &CancelToken::new())
            .await
    }

    pub async fn submit_with_cancel(
        &self,
        identity: &impl ActiveIdentity,
        request: &SubmissionRequest,
        cancel: &CancelToken,
    ) -> SubmissionOutcome {
        let _guard = self.in_flight.enter();
        let outcome = self.drive(identity, request, cancel).await;
        self.dispatch(&outcome);
        outcome
    }

    async fn drive(
        &self,
        identity: &impl ActiveIdentity,
        request: &SubmissionRequest,
        cancel: &CancelToken,
    ) -> SubmissionOutcome {
        let Some(identity) = identity.active_identity() else {
            return SubmissionOutcome::Failed(FailureReason::NoActiveIdentity);
        };
        let options = SignOptions {
            address: identity.address.clone(),
            network_passphrase: request.network_passphrase().to_owned(),
        };
        tracing::debug!(
            provider_id = %identity.provider_id,
            address = %identity.address,
            "requesting signature"
        );
        let signed = match self
            .gateway
            .sign(request.unsigned_envelope(), &options)
            .await
        {
            Ok(signed) => signed,
            Err(PortError::ProviderUnavailable(reason)) => {
                return SubmissionOutcome::Failed(FailureReason::ProviderUnavailable(reason))
            }
            Err(e) => return SubmissionOutcome::Failed(FailureReason::SigningFailed(e.to_string())),
        };

        let tx = match SignedTransaction::from_envelope(&signed, request.network_passphrase()) {
            Ok(tx) => tx,
            Err(e) => return SubmissionOutcome::Failed(e.into()),
        };

        let sent = match self.rpc.send_transaction(request.rpc_endpoint(), &tx).await {
            Ok(sent) => sent,
            Err(e) => {
                return SubmissionOutcome::Failed(FailureReason::SubmissionRejected(e.to_string()))
            }
        };

        match sent.status {
            SendStatus::ImmediatelyFinal(status) => {
                tracing::info!(hash = %sent.hash, status = %status, "transaction final on submit");
                SubmissionOutcome::Success { hash: sent.hash }
            }
            SendStatus::Pending => {
                tracing::info!(hash = %sent.hash, "transaction pending, polling for confirmation");
                let state = PollState::new(
                    sent.hash,
                    self.config.max_attempts,
                    self.config.poll_interval,
                );
                self.poll(request.rpc_endpoint(), state, cancel).await
            }
        }
    }

    async fn poll(
        &self,
        endpoint: &str,
        mut state: PollState,
        cancel: &CancelToken,
    ) -> SubmissionOutcome {
        while !state.exhausted() {
            let cancelled = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                _ = self.sleeper.sleep(state.interval) => false,
            };
            if cancelled {
                tracing::warn!(hash = %state.hash, attempt = state.attempt, "polling cancelled");
                return SubmissionOutcome::Failed(FailureReason::Cancelled { hash: state.hash });
            }

            state.attempt += 1;
            let lookup = self.rpc.get_transaction(endpoint, &state.hash).await;
            match classify_poll(lookup) {
                PollVerdict::Continue(reason) => {
                    tracing::debug!(
                        hash = %state.hash,
                        attempt = state.attempt,
                        max_attempts = state.max_attempts,
                        reason = %reason,
                        "transaction not final yet"
                    );
                }
                PollVerdict::Success => {
                    tracing::info!(hash = %state.hash, attempt = state.attempt, "transaction confirmed");
                    return SubmissionOutcome::Success { hash: state.hash };
                }
                PollVerdict::Failed(details) => {
                    return SubmissionOutcome::Failed(FailureReason::TransactionFailed { details });
                }
                PollVerdict::Fatal { code, message } => {
                    return SubmissionOutcome::Failed(FailureReason::RpcFatal { code, message });
                }
            }
        }

        tracing::warn!(
            hash = %state.hash,
            attempts = state.attempt,
            waited_ms = state.interval.as_millis() as u64 * u64::from(state.attempt),
            "confirmation polling exhausted"
        );
        SubmissionOutcome::Timeout { hash: state.hash }
    }

    fn dispatch(&self, outcome: &SubmissionOutcome) {
        let callback = if outcome.is_success() {
            &self.callbacks.on_success
        } else {
            tracing::error!(outcome = ?outcome, "submission did not succeed");
            &self.callbacks.on_error
        };
        if let Some(callback) = callback {
            callback(outcome);
        }
    }
}
