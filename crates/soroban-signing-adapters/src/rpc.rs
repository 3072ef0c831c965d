use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use soroban_signing_core::{
    LedgerRpcPort, LedgerTxStatus, PortError, SendResponse, SendStatus, SignedTransaction,
    TransactionLookup,
};

use crate::AdapterConfig;

#[derive(Debug, Clone)]
pub struct SorobanRpcAdapter {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendTransactionResult {
    status: String,
    hash: String,
    #[serde(default)]
    error_result_xdr: Option<String>,
}

impl Default for SorobanRpcAdapter {
    fn default() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl SorobanRpcAdapter {
    pub fn with_config(config: &AdapterConfig) -> Result<Self, PortError> {
        let builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(config.rpc_timeout());
        #[cfg(target_arch = "wasm32")]
        let _ = config;
        let client = builder
            .build()
            .map_err(|e| PortError::Transport(format!("failed to build rpc client: {e}")))?;
        Ok(Self { client })
    }

    async fn call(&self, endpoint: &str, method: &str, params: Value) -> Result<Value, PortError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let started = web_time::Instant::now();
        let response = self
            .client
            .post(endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| PortError::Transport(format!("{method} request failed: {e}")))?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Decode(format!("{method} json decode failed: {e}")))?;
        tracing::debug!(
            method,
            http_status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "rpc call completed"
        );

        if let Some(err) = body.get("error") {
            return Err(PortError::Rpc {
                code: err.get("code").and_then(Value::as_i64).unwrap_or_default(),
                message: err
                    .get("message")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned(),
            });
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "{method} returned status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Decode(format!("{method} response missing result")))
    }
}

#[async_trait(?Send)]
impl LedgerRpcPort for SorobanRpcAdapter {
    async fn send_transaction(
        &self,
        endpoint: &str,
        tx: &SignedTransaction,
    ) -> Result<SendResponse, PortError> {
        tracing::info!(
            endpoint,
            network = %tx.network_passphrase,
            envelope_bytes = tx.envelope_bytes.len(),
            "submitting signed transaction"
        );
        let result = self
            .call(
                endpoint,
                "sendTransaction",
                serde_json::json!({ "transaction": tx.envelope_xdr }),
            )
            .await?;
        let sent: SendTransactionResult = serde_json::from_value(result)
            .map_err(|e| PortError::Decode(format!("sendTransaction result: {e}")))?;
        if let Some(xdr) = sent.error_result_xdr.as_deref() {
            tracing::warn!(hash = %sent.hash, status = %sent.status, error_result_xdr = xdr, "node reported submission error");
        }
        Ok(SendResponse {
            status: SendStatus::from_wire(&sent.status),
            hash: sent.hash,
        })
    }

    async fn get_transaction(
        &self,
        endpoint: &str,
        hash: &str,
    ) -> Result<TransactionLookup, PortError> {
        let result = self
            .call(
                endpoint,
                "getTransaction",
                serde_json::json!({ "hash": hash }),
            )
            .await?;
        let status = result
            .get("status")
            .and_then(Value::as_str)
            .ok_or_else(|| PortError::Decode("getTransaction result missing status".to_owned()))?;
        Ok(TransactionLookup {
            status: LedgerTxStatus::from_wire(status),
            raw: result.clone(),
        })
    }
}
