#![allow(dead_code)]

use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::Value;
use tiny_http::{Response, Server, StatusCode};

use soroban_signing_adapters::AdapterConfig;

pub const TX_HASH: &str = "3389e9f0f1a65f19736cacf544c2e825313e8447f569233bb8db39aa607c8889";
// base64 of b"unsigned-envelope"
pub const UNSIGNED_XDR: &str = "dW5zaWduZWQtZW52ZWxvcGU=";

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub path: String,
    pub body: Value,
}

impl RecordedCall {
    pub fn rpc_method(&self) -> Option<&str> {
        self.body.get("method").and_then(Value::as_str)
    }

    pub fn params(&self) -> &Value {
        &self.body["params"]
    }
}

pub type Calls = Arc<Mutex<Vec<RecordedCall>>>;

/// Serves canned responses on an ephemeral port. The handler sees every request in arrival order.
pub fn spawn_mock_server<F>(handler: F) -> (String, Calls)
where
    F: Fn(&RecordedCall) -> (u16, Value) + Send + 'static,
{
    let server = Server::http("127.0.0.1:0").expect("start server");
    let addr = format!("http://{}", server.server_addr());
    let calls: Calls = Arc::default();
    let recorded = Arc::clone(&calls);

    thread::spawn(move || {
        for _ in 0..64 {
            let mut req = match server.recv() {
                Ok(r) => r,
                Err(_) => break,
            };
            let mut raw = String::new();
            let _ = req.as_reader().read_to_string(&mut raw);
            let call = RecordedCall {
                path: req.url().to_owned(),
                body: serde_json::from_str(&raw).unwrap_or(Value::Null),
            };
            let (code, payload) = handler(&call);
            if let Ok(mut g) = recorded.lock() {
                g.push(call);
            }
            let response =
                Response::from_string(payload.to_string()).with_status_code(StatusCode(code));
            let _ = req.respond(response);
        }
    });

    (addr, calls)
}

pub fn rpc_result(result: Value) -> (u16, Value) {
    (
        200,
        serde_json::json!({ "jsonrpc": "2.0", "id": 1, "result": result }),
    )
}

pub fn rpc_error(code: i64, message: &str) -> (u16, Value) {
    (
        200,
        serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": code, "message": message }
        }),
    )
}

pub fn config_for(base_url: &str) -> AdapterConfig {
    AdapterConfig {
        rpc_url: base_url.to_owned(),
        horizon_url: base_url.to_owned(),
        poll_interval_ms: 0,
        rpc_timeout_ms: 5_000,
        ..AdapterConfig::default()
    }
}
