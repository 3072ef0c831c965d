#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use soroban_signing_core::{
    CancelToken, InFlight, LedgerRpcPort, LedgerTxStatus, PortError, SendResponse, SendStatus,
    SessionStorePort, SignOptions, SignedEnvelope, SignedTransaction, SigningGateway, SleepPort,
    SubmitterConfig, TransactionLookup, WalletIdentity, WalletProviderPort,
};

pub const FREIGHTER: &str = "freighter";
pub const XBULL: &str = "xbull";
pub const FREIGHTER_ADDRESS: &str = "GAFREIGHTERAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";
pub const XBULL_ADDRESS: &str = "GBXBULLBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB";
pub const TX_HASH: &str = "3389e9f0f1a65f19736cacf544c2e825313e8447f569233bb8db39aa607c8889";
// base64 of b"unsigned-envelope" / b"signed-envelope"
pub const UNSIGNED_XDR: &str = "dW5zaWduZWQtZW52ZWxvcGU=";
pub const SIGNED_XDR: &str = "c2lnbmVkLWVudmVsb3Bl";

#[derive(Debug, Default)]
pub struct ProviderScript {
    pub available: bool,
    pub selections: VecDeque<Result<Option<String>, PortError>>,
    pub addresses: HashMap<String, String>,
    pub selected: Option<String>,
    pub disconnects: usize,
    pub stall_selection: bool,
    pub stall_address: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    pub script: Arc<Mutex<ProviderScript>>,
}

impl FakeProvider {
    pub fn with_wallets() -> Self {
        let provider = Self::default();
        {
            let mut g = provider.script.lock().expect("provider lock");
            g.available = true;
            g.addresses
                .insert(FREIGHTER.to_owned(), FREIGHTER_ADDRESS.to_owned());
            g.addresses.insert(XBULL.to_owned(), XBULL_ADDRESS.to_owned());
        }
        provider
    }

    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn queue_selection(&self, selection: Result<Option<&str>, PortError>) {
        self.script
            .lock()
            .expect("provider lock")
            .selections
            .push_back(selection.map(|id| id.map(str::to_owned)));
    }

    /// Selection never resolves, like a wallet modal left open.
    pub fn stall_selection(&self) {
        self.script.lock().expect("provider lock").stall_selection = true;
    }

    /// Address lookups never resolve, like an extension waiting on an unlock prompt.
    pub fn stall_address(&self) {
        self.script.lock().expect("provider lock").stall_address = true;
    }

    pub fn resume(&self) {
        let mut g = self.script.lock().expect("provider lock");
        g.stall_selection = false;
        g.stall_address = false;
    }

    pub fn forget_address(&self, provider_id: &str) {
        self.script
            .lock()
            .expect("provider lock")
            .addresses
            .remove(provider_id);
    }

    pub fn selected(&self) -> Option<String> {
        self.script.lock().expect("provider lock").selected.clone()
    }

    pub fn disconnects(&self) -> usize {
        self.script.lock().expect("provider lock").disconnects
    }
}

#[async_trait(?Send)]
impl WalletProviderPort for FakeProvider {
    fn is_available(&self) -> bool {
        self.script.lock().expect("provider lock").available
    }

    async fn select_wallet(&self) -> Result<Option<String>, PortError> {
        let stalled = self.script.lock().expect("provider lock").stall_selection;
        if stalled {
            std::future::pending::<()>().await;
        }
        self.script
            .lock()
            .expect("provider lock")
            .selections
            .pop_front()
            .unwrap_or(Ok(None))
    }

    fn set_wallet(&self, provider_id: &str) -> Result<(), PortError> {
        self.script.lock().expect("provider lock").selected = Some(provider_id.to_owned());
        Ok(())
    }

    async fn address(&self) -> Result<String, PortError> {
        let stalled = self.script.lock().expect("provider lock").stall_address;
        if stalled {
            std::future::pending::<()>().await;
        }
        let g = self.script.lock().expect("provider lock");
        let selected = g
            .selected
            .as_ref()
            .ok_or_else(|| PortError::Rejected("no wallet selected".to_owned()))?;
        g.addresses
            .get(selected)
            .cloned()
            .ok_or_else(|| PortError::Rejected(format!("wallet {selected} is locked")))
    }

    fn disconnect(&self) -> Result<(), PortError> {
        let mut g = self.script.lock().expect("provider lock");
        g.selected = None;
        g.disconnects += 1;
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub value: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn holding(provider_id: &str) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(provider_id.to_owned()))),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.value.lock().expect("store lock").clone()
    }
}

impl SessionStorePort for MemoryStore {
    fn load(&self) -> Option<String> {
        self.value.lock().ok().and_then(|g| g.clone())
    }

    fn save(&self, provider_id: &str) -> Result<(), PortError> {
        *self.value.lock().expect("store lock") = Some(provider_id.to_owned());
        Ok(())
    }

    fn clear(&self) -> Result<(), PortError> {
        *self.value.lock().expect("store lock") = None;
        Ok(())
    }
}

pub struct FakeGateway {
    pub result: Mutex<Result<SignedEnvelope, PortError>>,
    pub calls: Mutex<Vec<(String, SignOptions)>>,
    pub watched: Mutex<Option<InFlight>>,
    pub observed_in_flight: Mutex<Vec<bool>>,
}

impl FakeGateway {
    pub fn signing() -> Self {
        Self::returning(Ok(SignedEnvelope {
            signed_tx_xdr: SIGNED_XDR.to_owned(),
        }))
    }

    pub fn returning(result: Result<SignedEnvelope, PortError>) -> Self {
        Self {
            result: Mutex::new(result),
            calls: Mutex::new(Vec::new()),
            watched: Mutex::new(None),
            observed_in_flight: Mutex::new(Vec::new()),
        }
    }

    pub fn watch(&self, in_flight: InFlight) {
        *self.watched.lock().expect("watched lock") = Some(in_flight);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock").len()
    }
}

#[async_trait(?Send)]
impl SigningGateway for FakeGateway {
    async fn sign(
        &self,
        envelope: &str,
        options: &SignOptions,
    ) -> Result<SignedEnvelope, PortError> {
        if let Some(watched) = self.watched.lock().expect("watched lock").as_ref() {
            self.observed_in_flight
                .lock()
                .expect("observed lock")
                .push(watched.is_active());
        }
        self.calls
            .lock()
            .expect("calls lock")
            .push((envelope.to_owned(), options.clone()));
        self.result.lock().expect("result lock").clone()
    }
}

pub struct ScriptedRpc {
    pub send: Mutex<Result<SendResponse, PortError>>,
    pub polls: Mutex<VecDeque<Result<TransactionLookup, PortError>>>,
    pub fallback: Result<TransactionLookup, PortError>,
    pub sent: Mutex<Vec<SignedTransaction>>,
    pub poll_calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedRpc {
    pub fn pending() -> Self {
        Self::with_send(Ok(SendResponse {
            status: SendStatus::Pending,
            hash: TX_HASH.to_owned(),
        }))
    }

    pub fn with_send(send: Result<SendResponse, PortError>) -> Self {
        Self {
            send: Mutex::new(send),
            polls: Mutex::new(VecDeque::new()),
            fallback: Err(not_found()),
            sent: Mutex::new(Vec::new()),
            poll_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn then(self, poll: Result<TransactionLookup, PortError>) -> Self {
        self.polls.lock().expect("polls lock").push_back(poll);
        self
    }

    pub fn then_repeat(self, poll: Result<TransactionLookup, PortError>, times: usize) -> Self {
        for _ in 0..times {
            self.polls.lock().expect("polls lock").push_back(poll.clone());
        }
        self
    }

    pub fn poll_count(&self) -> usize {
        self.poll_calls.lock().expect("poll calls lock").len()
    }
}

#[async_trait(?Send)]
impl LedgerRpcPort for ScriptedRpc {
    async fn send_transaction(
        &self,
        _endpoint: &str,
        tx: &SignedTransaction,
    ) -> Result<SendResponse, PortError> {
        self.sent.lock().expect("sent lock").push(tx.clone());
        self.send.lock().expect("send lock").clone()
    }

    async fn get_transaction(
        &self,
        endpoint: &str,
        hash: &str,
    ) -> Result<TransactionLookup, PortError> {
        self.poll_calls
            .lock()
            .expect("poll calls lock")
            .push((endpoint.to_owned(), hash.to_owned()));
        self.polls
            .lock()
            .expect("polls lock")
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Returns immediately, recording every requested interval.
#[derive(Default)]
pub struct RecordingSleeper {
    pub slept: Mutex<Vec<Duration>>,
    pub watched: Mutex<Option<InFlight>>,
    pub observed_in_flight: Mutex<Vec<usize>>,
    pub yield_each: bool,
}

impl RecordingSleeper {
    pub fn yielding() -> Self {
        Self {
            yield_each: true,
            ..Self::default()
        }
    }

    pub fn intervals(&self) -> Vec<Duration> {
        self.slept.lock().expect("slept lock").clone()
    }
}

#[async_trait(?Send)]
impl SleepPort for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().expect("slept lock").push(duration);
        if let Some(watched) = self.watched.lock().expect("watched lock").as_ref() {
            self.observed_in_flight
                .lock()
                .expect("observed lock")
                .push(watched.count());
        }
        if self.yield_each {
            tokio::task::yield_now().await;
        }
    }
}

/// Cancels `token` on the `after`-th sleep and then never wakes.
pub struct CancellingSleeper {
    pub token: CancelToken,
    pub after: usize,
    pub count: Mutex<usize>,
}

#[async_trait(?Send)]
impl SleepPort for CancellingSleeper {
    async fn sleep(&self, _duration: Duration) {
        let reached = {
            let mut count = self.count.lock().expect("count lock");
            *count += 1;
            *count >= self.after
        };
        if reached {
            self.token.cancel();
            std::future::pending::<()>().await;
        }
    }
}

pub fn identity(provider_id: &str, address: &str) -> WalletIdentity {
    WalletIdentity {
        provider_id: provider_id.to_owned(),
        address: address.to_owned(),
    }
}

pub fn connected() -> Option<WalletIdentity> {
    Some(identity(FREIGHTER, FREIGHTER_ADDRESS))
}

pub fn lookup(status: &str) -> Result<TransactionLookup, PortError> {
    Ok(TransactionLookup {
        status: LedgerTxStatus::from_wire(status),
        raw: serde_json::json!({ "status": status, "latestLedger": 1_234 }),
    })
}

pub fn not_found() -> PortError {
    PortError::Rpc {
        code: -32602,
        message: "transaction not found".to_owned(),
    }
}

pub fn test_config() -> SubmitterConfig {
    SubmitterConfig {
        rpc_url: "http://rpc.test".to_owned(),
        ..SubmitterConfig::default()
    }
}
