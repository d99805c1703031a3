pub mod methods;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, TicketError};

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// HTTP client wrapper for an Ethereum JSON-RPC endpoint.
///
/// Used for both the chain node and the hosted wallet; the request id counter
/// is shared between clones.
#[derive(Debug, Clone)]
pub struct JsonRpcClient {
    client: Client,
    base_url: String,
    next_id: Arc<AtomicU64>,
}

impl JsonRpcClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Call `method` with positional `params` and decode the `result` member.
    ///
    /// A JSON `null` result decodes into `T` as-is, so `Option<T>` works for
    /// methods like `eth_getTransactionReceipt`.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        tracing::debug!(method, id, "rpc request");

        let resp = self.client.post(&self.base_url).json(&body).send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TicketError::Http {
                status,
                message: body,
            });
        }

        let envelope: RpcResponse<Value> = resp.json().await?;
        if let Some(err) = envelope.error {
            tracing::debug!(method, id, code = err.code, "rpc error");
            return Err(TicketError::Rpc {
                code: err.code,
                message: err.message,
            });
        }

        let result = envelope.result.unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(TicketError::Json)
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}
