use alloy_primitives::{Address, B256};

use crate::error::{Result, TicketError};
use crate::rpc::JsonRpcClient;
use crate::types::TransactionIntent;

/// Account held by an external wallet that signs `eth_sendTransaction` itself.
#[derive(Debug, Clone)]
pub struct HostedSigner {
    wallet: JsonRpcClient,
    address: Address,
}

impl HostedSigner {
    /// Wrap an already known wallet account.
    pub fn new(wallet: JsonRpcClient, address: Address) -> Self {
        Self { wallet, address }
    }

    /// Ask the wallet for its accounts and take the first one.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::Validation` if the wallet exposes no account,
    /// or the transport error if the wallet is unreachable.
    pub async fn connect(wallet: JsonRpcClient) -> Result<Self> {
        let accounts = wallet.request_accounts().await?;
        let address = accounts
            .first()
            .copied()
            .ok_or_else(|| TicketError::Validation("wallet exposed no accounts".into()))?;
        tracing::info!(%address, wallet = wallet.base_url(), "hosted wallet connected");
        Ok(Self::new(wallet, address))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Hand `intent` to the wallet, which signs and broadcasts it.
    pub async fn send(&self, intent: &TransactionIntent) -> Result<B256> {
        let request = intent.to_rpc_request(self.address);
        self.wallet.send_transaction(&request).await
    }
}
