//! Transaction signing for both identity sources.
//!
//! A hosted wallet signs on its own side and never reveals the key; a local
//! keystore key signs here and the raw transaction is broadcast to the node.
//! Flows only see [`Signer`] and call [`Signer::send`].

pub mod hosted;
pub mod local;
pub mod tx;

pub use hosted::HostedSigner;
pub use local::LocalSigner;
pub use tx::LegacyTransaction;

use alloy_primitives::{Address, B256};
use serde::Serialize;

use crate::contract::ContractClient;
use crate::error::Result;
use crate::types::TransactionIntent;

/// Where a signature comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Hosted,
    LocalKeystore,
}

/// The active identity of a session, able to sign and send an intent.
#[derive(Debug)]
pub enum Signer {
    Hosted(HostedSigner),
    Local(LocalSigner),
}

impl Signer {
    pub fn address(&self) -> Address {
        match self {
            Signer::Hosted(s) => s.address(),
            Signer::Local(s) => s.address(),
        }
    }

    pub fn kind(&self) -> IdentityKind {
        match self {
            Signer::Hosted(_) => IdentityKind::Hosted,
            Signer::Local(_) => IdentityKind::LocalKeystore,
        }
    }

    /// Sign and broadcast `intent`, returning the transaction hash.
    pub async fn send(&self, contract: &ContractClient, intent: &TransactionIntent) -> Result<B256> {
        match self {
            Signer::Hosted(s) => s.send(intent).await,
            Signer::Local(s) => s.send(contract, intent).await,
        }
    }
}
