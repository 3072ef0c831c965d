use async_trait::async_trait;
use serde::Deserialize;

use soroban_signing_core::{to_stroops, BalancePort, PortError};

use crate::AdapterConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct HorizonBalance {
    pub asset_type: String,
    pub balance: String,
    #[serde(default)]
    pub asset_code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    #[serde(default)]
    balances: Vec<HorizonBalance>,
}

/// Account lookups against a Horizon server.
#[derive(Debug, Clone)]
pub struct HorizonAdapter {
    base_url: String,
    client: reqwest::Client,
}

impl HorizonAdapter {
    pub fn with_config(config: &AdapterConfig) -> Result<Self, PortError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.rpc_timeout());
        let client = builder
            .build()
            .map_err(|e| PortError::Transport(format!("failed to build horizon client: {e}")))?;
        Ok(Self {
            base_url: config.horizon_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    /// All balance lines of an account; empty when the account does not exist.
    pub async fn balances(&self, address: &str) -> Result<Vec<HorizonBalance>, PortError> {
        let url = format!("{}/accounts/{}", self.base_url, address);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("horizon request failed: {e}")))?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(address, "horizon account not found");
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!("horizon status {status}")));
        }
        let account: AccountResponse = response
            .json()
            .await
            .map_err(|e| PortError::Decode(format!("horizon account decode failed: {e}")))?;
        Ok(account.balances)
    }
}

#[async_trait(?Send)]
impl BalancePort for HorizonAdapter {
    async fn native_balance(&self, address: &str) -> Result<Option<i128>, PortError> {
        let balances = self.balances(address).await?;
        balances
            .iter()
            .find(|b| b.asset_type == "native")
            .map(|b| {
                to_stroops(&b.balance)
                    .map_err(|e| PortError::Decode(format!("native balance {}: {e}", b.balance)))
            })
            .transpose()
    }
}
