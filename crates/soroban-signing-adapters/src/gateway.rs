use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use soroban_signing_core::{
    PortError, SignOptions, SignedEnvelope, SigningGateway, WalletProviderPort,
};

use crate::AdapterConfig;

/// JSON-RPC error code signer bridges use when the user declines a request.
pub const USER_REJECTED_CODE: i64 = 4001;

pub const FIXTURE_WALLETS: [(&str, &str); 2] = [
    (
        "freighter",
        "GDFREIGHTERDETERMINISTICFIXTUREWALLETAAAAAAAAAAAAAAAAAAA",
    ),
    (
        "xbull",
        "GDXBULLDETERMINISTICFIXTUREWALLETAAAAAAAAAAAAAAAAAAAAAAA",
    ),
];

#[derive(Debug, Clone)]
pub struct WalletGatewayAdapter {
    mode: GatewayMode,
    state: Arc<Mutex<GatewayState>>,
}

#[derive(Debug, Clone)]
enum GatewayMode {
    Disabled(String),
    Deterministic,
    Proxy(ProxyRuntime),
}

#[derive(Debug, Clone)]
struct ProxyRuntime {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Clone)]
struct GatewayState {
    wallets: Vec<(String, String)>,
    selected: Option<String>,
    queued_selection: Option<Option<String>>,
    signing_rejection: Option<String>,
    signatures: u64,
}

impl Default for GatewayState {
    fn default() -> Self {
        Self {
            wallets: FIXTURE_WALLETS
                .iter()
                .map(|(id, address)| ((*id).to_owned(), (*address).to_owned()))
                .collect(),
            selected: None,
            queued_selection: None,
            signing_rejection: None,
            signatures: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectWalletResult {
    wallet_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AddressResult {
    address: String,
}

impl Default for WalletGatewayAdapter {
    fn default() -> Self {
        Self::with_config(&AdapterConfig::default())
    }
}

impl WalletGatewayAdapter {
    pub fn with_config(config: &AdapterConfig) -> Self {
        let mode = if let Some(ref base_url) = config.signer_proxy_url {
            // Signing waits on the user, so only the connect phase is bounded.
            let builder = reqwest::Client::builder();
            #[cfg(not(target_arch = "wasm32"))]
            let builder = builder.connect_timeout(config.rpc_timeout());
            match builder.build() {
                Ok(client) => GatewayMode::Proxy(ProxyRuntime {
                    base_url: base_url.clone(),
                    client,
                }),
                Err(e) if config.strict_runtime_required() => GatewayMode::Disabled(format!(
                    "failed to initialize signer proxy client in production profile: {e}"
                )),
                Err(e) => {
                    tracing::warn!(error = %e, "signer proxy client unavailable, using fixture");
                    GatewayMode::Deterministic
                }
            }
        } else if config.strict_runtime_required() {
            GatewayMode::Disabled(
                "signer proxy URL not configured in production runtime profile".to_owned(),
            )
        } else {
            GatewayMode::Deterministic
        };

        tracing::debug!(mode = mode.label(), "wallet gateway initialized");
        Self {
            mode,
            state: Arc::new(Mutex::new(GatewayState::default())),
        }
    }

    pub fn mode_label(&self) -> &'static str {
        self.mode.label()
    }

    pub fn selected_wallet(&self) -> Option<String> {
        self.lock().ok().and_then(|g| g.selected.clone())
    }

    pub fn signature_count(&self) -> u64 {
        self.lock().map(|g| g.signatures).unwrap_or_default()
    }

    /// Preferred wallet for the next selection flow. The fixture picks it
    /// outright; the proxy receives it as the `walletId` hint of `selectWallet`.
    pub fn preselect_wallet(&self, wallet_id: &str) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.queued_selection = Some(Some(wallet_id.to_owned()));
        Ok(())
    }

    /// Dismiss the next fixture selection prompt.
    pub fn debug_inject_dismissal(&self) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.queued_selection = Some(None);
        Ok(())
    }

    pub fn debug_inject_signing_rejection(&self, reason: Option<&str>) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.signing_rejection = reason.map(str::to_owned);
        Ok(())
    }

    /// Tells the proxy to drop its wallet session. A no-op outside proxy mode.
    pub async fn release(&self) -> Result<(), PortError> {
        if let GatewayMode::Proxy(_) = self.mode {
            self.proxy_call("disconnect", serde_json::json!({})).await?;
        }
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, GatewayState>, PortError> {
        self.state
            .lock()
            .map_err(|e| PortError::Transport(format!("gateway lock poisoned: {e}")))
    }

    fn check_mode(&self) -> Result<(), PortError> {
        if let GatewayMode::Disabled(reason) = &self.mode {
            return Err(PortError::ProviderUnavailable(reason.clone()));
        }
        Ok(())
    }

    fn deterministic_signature(envelope: &[u8], options: &SignOptions) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update(options.network_passphrase.as_bytes());
        hasher.update(options.address.as_bytes());
        hasher.update(envelope);
        let digest = hasher.finalize();
        let mut signed = Vec::with_capacity(envelope.len() + 2 * digest.len());
        signed.extend_from_slice(envelope);
        signed.extend_from_slice(&digest);
        signed.extend_from_slice(&digest);
        signed
    }

    async fn proxy_call(&self, method: &str, params: Value) -> Result<Value, PortError> {
        let proxy = match &self.mode {
            GatewayMode::Proxy(proxy) => proxy,
            GatewayMode::Disabled(reason) => {
                return Err(PortError::ProviderUnavailable(reason.clone()))
            }
            GatewayMode::Deterministic => {
                return Err(PortError::NotImplemented("signer proxy runtime not enabled"))
            }
        };

        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response = proxy
            .client
            .post(&proxy.base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if is_unreachable(&e) {
                    PortError::ProviderUnavailable(format!("signer proxy unreachable: {e}"))
                } else {
                    PortError::Transport(format!("signer proxy request failed: {e}"))
                }
            })?;
        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| PortError::Decode(format!("signer proxy json decode failed: {e}")))?;
        if let Some(err) = body.get("error") {
            let code = err.get("code").and_then(Value::as_i64).unwrap_or_default();
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("signer proxy error")
                .to_owned();
            if code == USER_REJECTED_CODE {
                return Err(PortError::Rejected(message));
            }
            return Err(PortError::Rpc { code, message });
        }
        if !status.is_success() {
            return Err(PortError::Transport(format!(
                "signer proxy status {status}: {body}"
            )));
        }
        body.get("result")
            .cloned()
            .ok_or_else(|| PortError::Decode("signer proxy missing result".to_owned()))
    }
}

impl GatewayMode {
    fn label(&self) -> &'static str {
        match self {
            GatewayMode::Disabled(_) => "disabled",
            GatewayMode::Deterministic => "deterministic",
            GatewayMode::Proxy(_) => "proxy",
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn is_unreachable(e: &reqwest::Error) -> bool {
    e.is_connect()
}

#[cfg(target_arch = "wasm32")]
fn is_unreachable(_e: &reqwest::Error) -> bool {
    false
}

#[async_trait(?Send)]
impl WalletProviderPort for WalletGatewayAdapter {
    fn is_available(&self) -> bool {
        !matches!(self.mode, GatewayMode::Disabled(_))
    }

    async fn select_wallet(&self) -> Result<Option<String>, PortError> {
        self.check_mode()?;
        if let GatewayMode::Proxy(_) = self.mode {
            let preferred = self.lock()?.queued_selection.take().flatten();
            let params = match preferred {
                Some(wallet_id) => serde_json::json!({ "walletId": wallet_id }),
                None => serde_json::json!({}),
            };
            let result = self.proxy_call("selectWallet", params).await?;
            let selected: SelectWalletResult = serde_json::from_value(result)
                .map_err(|e| PortError::Decode(format!("selectWallet result: {e}")))?;
            return Ok(selected.wallet_id);
        }

        let mut g = self.lock()?;
        if let Some(queued) = g.queued_selection.take() {
            return Ok(queued);
        }
        Ok(g.wallets.first().map(|(id, _)| id.clone()))
    }

    fn set_wallet(&self, provider_id: &str) -> Result<(), PortError> {
        self.check_mode()?;
        let mut g = self.lock()?;
        g.selected = Some(provider_id.to_owned());
        Ok(())
    }

    async fn address(&self) -> Result<String, PortError> {
        self.check_mode()?;
        let selected = self
            .lock()?
            .selected
            .clone()
            .ok_or_else(|| PortError::Validation("no wallet selected".to_owned()))?;

        if let GatewayMode::Proxy(_) = self.mode {
            let result = self
                .proxy_call("getAddress", serde_json::json!({ "walletId": selected }))
                .await?;
            let resolved: AddressResult = serde_json::from_value(result)
                .map_err(|e| PortError::Decode(format!("getAddress result: {e}")))?;
            return Ok(resolved.address);
        }

        let g = self.lock()?;
        g.wallets
            .iter()
            .find(|(id, _)| *id == selected)
            .map(|(_, address)| address.clone())
            .ok_or_else(|| PortError::Rejected(format!("wallet {selected} exposes no address")))
    }

    fn disconnect(&self) -> Result<(), PortError> {
        let mut g = self.lock()?;
        g.selected = None;
        Ok(())
    }
}

#[async_trait(?Send)]
impl SigningGateway for WalletGatewayAdapter {
    async fn sign(
        &self,
        envelope: &str,
        options: &SignOptions,
    ) -> Result<SignedEnvelope, PortError> {
        self.check_mode()?;
        if let GatewayMode::Proxy(_) = self.mode {
            let wallet_id = self.lock()?.selected.clone();
            let result = self
                .proxy_call(
                    "signTransaction",
                    serde_json::json!({
                        "xdr": envelope,
                        "address": options.address,
                        "networkPassphrase": options.network_passphrase,
                        "walletId": wallet_id,
                    }),
                )
                .await?;
            let signed: SignedEnvelope = serde_json::from_value(result)
                .map_err(|e| PortError::Decode(format!("signTransaction result: {e}")))?;
            self.lock()?.signatures += 1;
            return Ok(signed);
        }

        let mut g = self.lock()?;
        if let Some(reason) = g.signing_rejection.clone() {
            return Err(PortError::Rejected(reason));
        }
        let bytes = STANDARD
            .decode(envelope.trim())
            .map_err(|e| PortError::Validation(format!("unsigned envelope is not base64: {e}")))?;
        let signed = Self::deterministic_signature(&bytes, options);
        g.signatures += 1;
        Ok(SignedEnvelope {
            signed_tx_xdr: STANDARD.encode(signed),
        })
    }
}
