use thiserror::Error;

use crate::domain::{SessionState, WalletIdentity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    BeginConnect,
    Resolve(WalletIdentity),
    Abort,
    Disconnect,
}

impl SessionAction {
    fn label(&self) -> &'static str {
        match self {
            SessionAction::BeginConnect => "BeginConnect",
            SessionAction::Resolve(_) => "Resolve",
            SessionAction::Abort => "Abort",
            SessionAction::Disconnect => "Disconnect",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: &'static str,
    pub to: &'static str,
    pub reason: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("illegal session transition: {from} --{action}-->")]
pub struct TransitionError {
    pub from: &'static str,
    pub action: &'static str,
}

pub fn session_transition(
    from: &SessionState,
    action: SessionAction,
) -> Result<(SessionState, StateTransition), TransitionError> {
    let reason = action.label();
    let to = match (from, action) {
        // A re-connect from Connected keeps the identity until a wallet is chosen.
        (SessionState::Disconnected, SessionAction::BeginConnect) => SessionState::Connecting,
        // Disconnected -> Connected is the hydration path: a persisted selection resolved.
        (
            SessionState::Disconnected | SessionState::Connecting | SessionState::Connected(_),
            SessionAction::Resolve(identity),
        ) => SessionState::Connected(identity),
        (SessionState::Connecting, SessionAction::Abort) => SessionState::Disconnected,
        (SessionState::Disconnected | SessionState::Connected(_), SessionAction::Disconnect) => {
            SessionState::Disconnected
        }
        (from, action) => {
            return Err(TransitionError {
                from: from.label(),
                action: action.label(),
            })
        }
    };
    let transition = StateTransition {
        from: from.label(),
        to: to.label(),
        reason,
    };
    Ok((to, transition))
}
