//! Wallet session: the single active signing identity, its persisted selection,
//! and the change channel every session-bound consumer listens on.
//!
//! Handles are cheap to clone and share one state, so independent consumers
//! holding their own `Session` observe the same identity and the same
//! broadcasts.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use crate::domain::{SessionState, WalletIdentity};
use crate::ports::{ActiveIdentity, PortError, SessionStorePort, WalletProviderPort};
use crate::state_machine::{session_transition, SessionAction, TransitionError};

pub type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no compatible signing provider is available")]
    ProviderUnavailable,
    #[error("a connect flow is already in progress")]
    ConnectInProgress,
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Port(#[from] PortError),
}

/// Result of a connect flow that did not hit a hard error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(WalletIdentity),
    Dismissed,
    Failed(String),
}

pub struct Session<P, S> {
    inner: Arc<SessionInner<P, S>>,
}

struct SessionInner<P, S> {
    provider: P,
    store: S,
    state: Mutex<SessionState>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_subscription: AtomicU64,
    connect_pending: AtomicBool,
}

impl<P, S> Clone for Session<P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, S> std::fmt::Debug for Session<P, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &*self.lock_state())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl<P, S> Session<P, S>
where
    P: WalletProviderPort,
    S: SessionStorePort,
{
    /// Hydrates from the store. The session stays `Disconnected` until
    /// [`Session::refresh`] resolves the persisted selection to an address.
    pub fn new(provider: P, store: S) -> Self {
        if let Some(provider_id) = store.load() {
            tracing::debug!(provider_id = %provider_id, "hydrating persisted wallet selection");
            if let Err(e) = provider.set_wallet(&provider_id) {
                tracing::warn!(error = %e, "failed to preselect persisted wallet");
            }
        }
        Self {
            inner: Arc::new(SessionInner {
                provider,
                store,
                state: Mutex::new(SessionState::Disconnected),
                listeners: Mutex::new(Vec::new()),
                next_subscription: AtomicU64::new(1),
                connect_pending: AtomicBool::new(false),
            }),
        }
    }

    pub fn provider(&self) -> &P {
        &self.inner.provider
    }

    pub fn persisted_provider_id(&self) -> Option<String> {
        self.inner.store.load()
    }

    /// Runs the provider's selection flow. A connected session keeps its
    /// identity until a wallet is chosen; dropping the future mid-flow rolls
    /// back like a dismissal.
    pub async fn connect(&self) -> Result<ConnectOutcome, SessionError> {
        if !self.inner.provider.is_available() {
            return Err(SessionError::ProviderUnavailable);
        }
        let attempt = self.begin_connect()?;

        match self.select_and_resolve().await {
            Ok(Some(identity)) => {
                attempt.commit(identity.clone())?;
                self.broadcast();
                Ok(ConnectOutcome::Connected(identity))
            }
            Ok(None) => {
                tracing::info!("wallet selection dismissed");
                Ok(ConnectOutcome::Dismissed)
            }
            Err(e) => {
                tracing::error!(error = %e, "wallet selection failed");
                Ok(ConnectOutcome::Failed(e.to_string()))
            }
        }
    }

    pub fn disconnect(&self) -> Result<(), SessionError> {
        if self.is_connect_pending() {
            return Err(SessionError::ConnectInProgress);
        }
        if let Err(e) = self.inner.store.clear() {
            tracing::warn!(error = %e, "failed to clear persisted wallet selection");
        }
        if let Err(e) = self.inner.provider.disconnect() {
            tracing::warn!(error = %e, "provider disconnect failed");
        }
        apply(&mut self.lock_state(), SessionAction::Disconnect)?;
        self.broadcast();
        Ok(())
    }

    /// Re-resolves the persisted selection. Broadcasts only when the active
    /// identity changes.
    pub async fn refresh(&self) -> Result<Option<WalletIdentity>, SessionError> {
        if self.is_connect_pending() {
            return Err(SessionError::ConnectInProgress);
        }
        let resolved = match self.inner.store.load() {
            None => None,
            Some(provider_id) => match self.inner.provider.address().await {
                Ok(address) => Some(WalletIdentity {
                    provider_id,
                    address,
                }),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to resolve persisted wallet address");
                    None
                }
            },
        };

        let changed = {
            let mut state = self.lock_state();
            if self.is_connect_pending() {
                return Err(SessionError::ConnectInProgress);
            }
            if state.identity() == resolved.as_ref() {
                false
            } else {
                let action = match resolved.clone() {
                    Some(identity) => SessionAction::Resolve(identity),
                    None => SessionAction::Disconnect,
                };
                apply(&mut state, action)?;
                true
            }
        };
        if changed {
            self.broadcast();
        }
        Ok(resolved)
    }

    fn begin_connect(&self) -> Result<ConnectAttempt<'_, P, S>, SessionError> {
        if self.inner.connect_pending.swap(true, Ordering::SeqCst) {
            return Err(SessionError::ConnectInProgress);
        }
        let attempt = ConnectAttempt {
            session: self,
            previous_id: self.inner.store.load(),
            armed: true,
        };
        let mut state = self.lock_state();
        if matches!(*state, SessionState::Disconnected) {
            apply(&mut state, SessionAction::BeginConnect)?;
        }
        Ok(attempt)
    }

    async fn select_and_resolve(&self) -> Result<Option<WalletIdentity>, PortError> {
        let Some(provider_id) = self.inner.provider.select_wallet().await? else {
            return Ok(None);
        };
        self.inner.store.save(&provider_id)?;
        self.inner.provider.set_wallet(&provider_id)?;
        let address = self.inner.provider.address().await?;
        Ok(Some(WalletIdentity {
            provider_id,
            address,
        }))
    }
}

/// One in-flight connect. Unless committed, dropping it restores the
/// persisted selection and the provider's previous wallet, and returns a
/// fresh connect to `Disconnected`.
struct ConnectAttempt<'a, P, S>
where
    P: WalletProviderPort,
    S: SessionStorePort,
{
    session: &'a Session<P, S>,
    previous_id: Option<String>,
    armed: bool,
}

impl<P, S> ConnectAttempt<'_, P, S>
where
    P: WalletProviderPort,
    S: SessionStorePort,
{
    fn commit(mut self, identity: WalletIdentity) -> Result<(), TransitionError> {
        self.armed = false;
        let mut state = self.session.lock_state();
        apply(&mut state, SessionAction::Resolve(identity))
    }

    fn roll_back(&self) {
        let inner = &self.session.inner;
        if inner.store.load() != self.previous_id {
            let restored = match self.previous_id.as_deref() {
                Some(id) => inner.store.save(id),
                None => inner.store.clear(),
            };
            if let Err(e) = restored {
                tracing::warn!(error = %e, "failed to restore persisted wallet selection");
            }
        }
        if let Some(id) = self.previous_id.as_deref() {
            if let Err(e) = inner.provider.set_wallet(id) {
                tracing::warn!(error = %e, "failed to reselect previous wallet");
            }
        }
        let mut state = self.session.lock_state();
        if matches!(*state, SessionState::Connecting) {
            if let Err(e) = apply(&mut state, SessionAction::Abort) {
                tracing::error!(error = %e, "connect rollback rejected");
            }
        }
    }
}

impl<P, S> Drop for ConnectAttempt<'_, P, S>
where
    P: WalletProviderPort,
    S: SessionStorePort,
{
    fn drop(&mut self) {
        if self.armed {
            self.roll_back();
        }
        self.session
            .inner
            .connect_pending
            .store(false, Ordering::SeqCst);
    }
}

impl<P, S> Session<P, S> {
    pub fn state(&self) -> SessionState {
        self.lock_state().clone()
    }

    pub fn active_identity(&self) -> Option<WalletIdentity> {
        self.lock_state().identity().cloned()
    }

    pub fn is_connected(&self) -> bool {
        self.lock_state().identity().is_some()
    }

    /// True while a selection flow is open, including a re-connect from `Connected`.
    pub fn is_connect_pending(&self) -> bool {
        self.inner.connect_pending.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self, listener: impl Fn() + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::SeqCst));
        self.lock_listeners().push((id, Arc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock_listeners();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock_listeners().len()
    }

    fn broadcast(&self) {
        // Snapshot first so listeners can read the session or (un)subscribe.
        let listeners: Vec<Listener> = self
            .lock_listeners()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        tracing::debug!(subscribers = listeners.len(), "broadcasting wallet change");
        for listener in listeners {
            listener();
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P, S> ActiveIdentity for Session<P, S> {
    fn active_identity(&self) -> Option<WalletIdentity> {
        Session::active_identity(self)
    }
}

fn apply(state: &mut SessionState, action: SessionAction) -> Result<(), TransitionError> {
    let (next, transition) = session_transition(state, action)?;
    tracing::info!(
        from = transition.from,
        to = transition.to,
        reason = transition.reason,
        "session transition"
    );
    *state = next;
    Ok(())
}
