use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde_json::json;

use crate::error::Result;
use crate::rpc::JsonRpcClient;
use crate::types::{RpcTransactionRequest, TransactionReceipt};

impl JsonRpcClient {
    // --- Chain ---

    /// eth_chainId - Chain id of the connected network.
    pub async fn chain_id(&self) -> Result<u64> {
        let id: U64 = self.request("eth_chainId", json!([])).await?;
        Ok(id.to::<u64>())
    }

    /// eth_gasPrice - Current legacy gas price in wei.
    pub async fn gas_price(&self) -> Result<U256> {
        self.request("eth_gasPrice", json!([])).await
    }

    // --- Accounts ---

    /// eth_getBalance - Native balance of `address` at the latest block.
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        self.request("eth_getBalance", json!([address, "latest"]))
            .await
    }

    /// eth_getTransactionCount - Next nonce for `address`, counting pending transactions.
    pub async fn get_transaction_count(&self, address: Address) -> Result<u64> {
        let count: U64 = self
            .request("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        Ok(count.to::<u64>())
    }

    /// eth_requestAccounts - Ask a hosted wallet to expose its accounts.
    pub async fn request_accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_requestAccounts", json!([])).await
    }

    // --- Calls and transactions ---

    /// eth_call - Execute a read-only call against `to` at the latest block.
    pub async fn call(&self, to: Address, data: &Bytes) -> Result<Bytes> {
        self.request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    /// eth_sendTransaction - Hand an unsigned request to a wallet that signs it.
    pub async fn send_transaction(&self, request: &RpcTransactionRequest) -> Result<B256> {
        self.request("eth_sendTransaction", json!([request])).await
    }

    /// eth_sendRawTransaction - Broadcast a locally signed transaction.
    pub async fn send_raw_transaction(&self, raw: &Bytes) -> Result<B256> {
        self.request("eth_sendRawTransaction", json!([raw])).await
    }

    /// eth_getTransactionReceipt - Receipt for `hash`, or `None` while pending.
    pub async fn get_transaction_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.request("eth_getTransactionReceipt", json!([hash]))
            .await
    }
}
