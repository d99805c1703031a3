use alloy_primitives::{Address, B256, U256, U64};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subset of `eth_getTransactionReceipt` this client reads.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    /// `0x1` on success, `0x0` on revert. Absent on pre-Byzantium chains.
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub to: Option<Address>,
}

impl TransactionReceipt {
    /// A receipt without a status field counts as success.
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |s| s == U64::from(1))
    }
}

/// Result of a submitted ticket transaction, surfaced for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionOutcome {
    pub transaction_hash: B256,
    pub from: Address,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    pub submitted_at: DateTime<Utc>,
    pub message: String,
}

impl TransactionOutcome {
    pub fn from_receipt(
        receipt: &TransactionReceipt,
        from: Address,
        submitted_at: DateTime<Utc>,
        message: String,
    ) -> Self {
        Self {
            transaction_hash: receipt.transaction_hash,
            from,
            block_number: receipt.block_number.map(|n| n.to::<u64>()),
            gas_used: receipt.gas_used,
            submitted_at,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_status() {
        let json = r#"{
            "transactionHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "blockNumber": "0x1b4",
            "gasUsed": "0x5208",
            "status": "0x1",
            "from": "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23",
            "to": "0x1854cab9bdcaac14c95a9a58a41ef5defd607e33",
            "logs": []
        }"#;
        let receipt: TransactionReceipt = serde_json::from_str(json).unwrap();
        assert!(receipt.succeeded());
        assert_eq!(receipt.block_number, Some(U64::from(436)));
        assert_eq!(receipt.gas_used, Some(U256::from(21_000)));

        let reverted = TransactionReceipt {
            status: Some(U64::ZERO),
            ..receipt
        };
        assert!(!reverted.succeeded());
    }

    #[test]
    fn test_outcome_from_receipt() {
        let receipt = TransactionReceipt {
            transaction_hash: B256::repeat_byte(0xab),
            block_number: Some(U64::from(7)),
            gas_used: None,
            status: None,
            from: None,
            to: None,
        };
        let outcome = TransactionOutcome::from_receipt(
            &receipt,
            Address::ZERO,
            Utc::now(),
            "done".into(),
        );
        assert_eq!(outcome.block_number, Some(7));
        assert_eq!(outcome.transaction_hash, B256::repeat_byte(0xab));
        assert!(receipt.succeeded());
    }
}
