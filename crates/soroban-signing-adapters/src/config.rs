use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use soroban_signing_core::{
    SubmitterConfig, DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL_MS, TESTNET_PASSPHRASE,
    TESTNET_RPC_URL,
};

pub const TESTNET_HORIZON_URL: &str = "https://horizon-testnet.stellar.org";

mod env_vars {
    pub const RPC_URL: &str = "SOROBAN_RPC_URL";
    pub const NETWORK_PASSPHRASE: &str = "SOROBAN_NETWORK_PASSPHRASE";
    pub const HORIZON_URL: &str = "HORIZON_URL";
    pub const POLL_INTERVAL_MS: &str = "SUBMIT_POLL_INTERVAL_MS";
    pub const MAX_ATTEMPTS: &str = "SUBMIT_MAX_ATTEMPTS";
    pub const SIGNER_PROXY_URL: &str = "SIGNER_PROXY_URL";
    pub const SESSION_STORE_PATH: &str = "SESSION_STORE_PATH";
    pub const RPC_TIMEOUT_MS: &str = "RPC_TIMEOUT_MS";
    pub const RUNTIME_PROFILE: &str = "RUNTIME_PROFILE";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeProfile {
    Development,
    Production,
}

impl std::str::FromStr for RuntimeProfile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(RuntimeProfile::Development),
            "prod" | "production" => Ok(RuntimeProfile::Production),
            other => Err(ConfigError::Invalid {
                key: env_vars::RUNTIME_PROFILE,
                value: other.to_owned(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub runtime_profile: RuntimeProfile,
    pub rpc_url: String,
    pub network_passphrase: String,
    pub horizon_url: String,
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub rpc_timeout_ms: u64,
    pub signer_proxy_url: Option<String>,
    pub session_store_path: Option<PathBuf>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            rpc_url: TESTNET_RPC_URL.to_owned(),
            network_passphrase: TESTNET_PASSPHRASE.to_owned(),
            horizon_url: TESTNET_HORIZON_URL.to_owned(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            rpc_timeout_ms: 15_000,
            signer_proxy_url: None,
            session_store_path: None,
        }
    }
}

impl AdapterConfig {
    /// Defaults overridden by whatever is set in the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(env_vars::RUNTIME_PROFILE) {
            cfg.runtime_profile = v.parse()?;
        }
        if let Some(v) = get(env_vars::RPC_URL) {
            cfg.rpc_url = v;
        }
        if let Some(v) = get(env_vars::NETWORK_PASSPHRASE) {
            cfg.network_passphrase = v;
        }
        if let Some(v) = get(env_vars::HORIZON_URL) {
            cfg.horizon_url = v;
        }
        if let Some(v) = get(env_vars::POLL_INTERVAL_MS) {
            cfg.poll_interval_ms = parse_number(env_vars::POLL_INTERVAL_MS, &v)?;
        }
        if let Some(v) = get(env_vars::MAX_ATTEMPTS) {
            cfg.max_attempts = parse_number(env_vars::MAX_ATTEMPTS, &v)?;
        }
        if let Some(v) = get(env_vars::RPC_TIMEOUT_MS) {
            cfg.rpc_timeout_ms = parse_number(env_vars::RPC_TIMEOUT_MS, &v)?;
        }
        cfg.signer_proxy_url = get(env_vars::SIGNER_PROXY_URL);
        cfg.session_store_path = get(env_vars::SESSION_STORE_PATH).map(PathBuf::from);

        tracing::debug!(
            profile = ?cfg.runtime_profile,
            rpc_url = %cfg.rpc_url,
            proxy = cfg.signer_proxy_url.is_some(),
            "adapter config loaded"
        );
        Ok(cfg)
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_millis(self.rpc_timeout_ms)
    }

    pub fn submitter_config(&self) -> SubmitterConfig {
        SubmitterConfig {
            rpc_url: self.rpc_url.clone(),
            network_passphrase: self.network_passphrase.clone(),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_attempts: self.max_attempts,
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_owned(),
    })
}
