use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    SendResponse, SignOptions, SignedEnvelope, SignedTransaction, TransactionLookup,
    WalletIdentity,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortError {
    #[error("port not implemented: {0}")]
    NotImplemented(&'static str),
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("validation error: {0}")]
    Validation(String),
}

/// External signing provider. `sign` may wait on user interaction without bound.
#[async_trait(?Send)]
pub trait SigningGateway {
    async fn sign(
        &self,
        envelope: &str,
        options: &SignOptions,
    ) -> Result<SignedEnvelope, PortError>;
}

/// Provider selection surface used by the wallet session.
#[async_trait(?Send)]
pub trait WalletProviderPort {
    fn is_available(&self) -> bool;
    /// Runs the provider's selection flow; `Ok(None)` when the user dismisses it.
    async fn select_wallet(&self) -> Result<Option<String>, PortError>;
    fn set_wallet(&self, provider_id: &str) -> Result<(), PortError>;
    async fn address(&self) -> Result<String, PortError>;
    fn disconnect(&self) -> Result<(), PortError>;
}

/// Durable record of the selected provider id. Reads never fail.
pub trait SessionStorePort {
    fn load(&self) -> Option<String>;
    fn save(&self, provider_id: &str) -> Result<(), PortError>;
    fn clear(&self) -> Result<(), PortError>;
}

#[async_trait(?Send)]
pub trait LedgerRpcPort {
    async fn send_transaction(
        &self,
        endpoint: &str,
        tx: &SignedTransaction,
    ) -> Result<SendResponse, PortError>;
    async fn get_transaction(
        &self,
        endpoint: &str,
        hash: &str,
    ) -> Result<TransactionLookup, PortError>;
}

#[async_trait(?Send)]
pub trait SleepPort {
    async fn sleep(&self, duration: Duration);
}

#[async_trait(?Send)]
pub trait BalancePort {
    /// Native balance in stroops; `None` when the account has no native entry.
    async fn native_balance(&self, address: &str) -> Result<Option<i128>, PortError>;
}

pub trait ActiveIdentity {
    fn active_identity(&self) -> Option<WalletIdentity>;
}

impl ActiveIdentity for Option<WalletIdentity> {
    fn active_identity(&self) -> Option<WalletIdentity> {
        self.clone()
    }
}
