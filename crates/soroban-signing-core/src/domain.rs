use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Passphrase of the public Soroban test network.
pub const TESTNET_PASSPHRASE: &str = "Test SDF Network ; September 2015";
pub const TESTNET_RPC_URL: &str = "https://soroban-testnet.stellar.org:443";

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 30;

/// JSON-RPC error code the ledger node returns for an unknown transaction hash.
pub const RPC_NOT_FOUND_CODE: i64 = -32602;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletIdentity {
    pub provider_id: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected(WalletIdentity),
}

impl SessionState {
    pub fn identity(&self) -> Option<&WalletIdentity> {
        match self {
            SessionState::Connected(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Disconnected => "Disconnected",
            SessionState::Connecting => "Connecting",
            SessionState::Connected(_) => "Connected",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRequest {
    unsigned_envelope: String,
    network_passphrase: String,
    rpc_endpoint: String,
}

impl SubmissionRequest {
    pub fn new(
        unsigned_envelope: impl Into<String>,
        network_passphrase: impl Into<String>,
        rpc_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            unsigned_envelope: unsigned_envelope.into(),
            network_passphrase: network_passphrase.into(),
            rpc_endpoint: rpc_endpoint.into(),
        }
    }

    pub fn unsigned_envelope(&self) -> &str {
        &self.unsigned_envelope
    }

    pub fn network_passphrase(&self) -> &str {
        &self.network_passphrase
    }

    pub fn rpc_endpoint(&self) -> &str {
        &self.rpc_endpoint
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignOptions {
    pub address: String,
    pub network_passphrase: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEnvelope {
    #[serde(rename = "signedTxXdr")]
    pub signed_tx_xdr: String,
}

/// A signed envelope bound to the network it targets, ready for `sendTransaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub envelope_xdr: String,
    pub envelope_bytes: Vec<u8>,
    pub network_passphrase: String,
}

impl SignedTransaction {
    pub fn from_envelope(
        signed: &SignedEnvelope,
        network_passphrase: &str,
    ) -> Result<Self, EnvelopeError> {
        let trimmed = signed.signed_tx_xdr.trim();
        if trimmed.is_empty() {
            return Err(EnvelopeError::Empty);
        }
        if network_passphrase.is_empty() {
            return Err(EnvelopeError::MissingPassphrase);
        }
        let envelope_bytes = STANDARD
            .decode(trimmed)
            .map_err(|e| EnvelopeError::Base64(e.to_string()))?;
        if envelope_bytes.is_empty() {
            return Err(EnvelopeError::Empty);
        }
        Ok(Self {
            envelope_xdr: trimmed.to_owned(),
            envelope_bytes,
            network_passphrase: network_passphrase.to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("signed envelope is empty")]
    Empty,
    #[error("network passphrase is empty")]
    MissingPassphrase,
    #[error("signed envelope is not valid base64: {0}")]
    Base64(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStatus {
    Pending,
    ImmediatelyFinal(String),
}

impl SendStatus {
    pub fn from_wire(status: &str) -> Self {
        if status == "PENDING" {
            SendStatus::Pending
        } else {
            SendStatus::ImmediatelyFinal(status.to_owned())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendResponse {
    pub status: SendStatus,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerTxStatus {
    Success,
    Failed,
    Pending,
    NotFound,
    Other(String),
}

impl LedgerTxStatus {
    pub fn from_wire(status: &str) -> Self {
        match status {
            "SUCCESS" => LedgerTxStatus::Success,
            "FAILED" => LedgerTxStatus::Failed,
            "PENDING" => LedgerTxStatus::Pending,
            "NOT_FOUND" => LedgerTxStatus::NotFound,
            other => LedgerTxStatus::Other(other.to_owned()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionLookup {
    pub status: LedgerTxStatus,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState {
    pub hash: String,
    pub attempt: u32,
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollState {
    pub fn new(hash: impl Into<String>, max_attempts: u32, interval: Duration) -> Self {
        Self {
            hash: hash.into(),
            attempt: 0,
            max_attempts,
            interval,
        }
    }

    pub fn exhausted(&self) -> bool {
        self.attempt >= self.max_attempts
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureReason {
    #[error("no compatible signing provider is available: {0}")]
    ProviderUnavailable(String),
    #[error("signing failed: {0}")]
    SigningFailed(String),
    #[error("no wallet identity is connected")]
    NoActiveIdentity,
    #[error("invalid signed envelope: {0}")]
    InvalidEnvelope(#[from] EnvelopeError),
    #[error("submission rejected: {0}")]
    SubmissionRejected(String),
    #[error("RPC error {code}: {message}")]
    RpcFatal { code: i64, message: String },
    #[error("transaction failed: {details}")]
    TransactionFailed { details: String },
    #[error("polling cancelled for {hash}")]
    Cancelled { hash: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success { hash: String },
    Failed(FailureReason),
    Timeout { hash: String },
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success { .. })
    }

    pub fn hash(&self) -> Option<&str> {
        match self {
            SubmissionOutcome::Success { hash } | SubmissionOutcome::Timeout { hash } => Some(hash),
            SubmissionOutcome::Failed(FailureReason::Cancelled { hash }) => Some(hash),
            SubmissionOutcome::Failed(_) => None,
        }
    }
}
