use alloy_primitives::{Address, Bytes, U256, U64};
use serde::{Deserialize, Serialize};

/// Which way tickets move in a user flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Return,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Buy => write!(f, "buy"),
            Direction::Return => write!(f, "return"),
        }
    }
}

/// A contract call ready to be signed and sent.
///
/// Built fresh per operation and never mutated afterwards; the signer
/// consumes it by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionIntent {
    to: Address,
    call_data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<U256>,
    gas_limit: u64,
}

impl TransactionIntent {
    pub fn new(to: Address, call_data: impl Into<Bytes>, value: Option<U256>, gas_limit: u64) -> Self {
        Self {
            to,
            call_data: call_data.into(),
            value,
            gas_limit,
        }
    }

    pub fn to(&self) -> Address {
        self.to
    }

    pub fn call_data(&self) -> &Bytes {
        &self.call_data
    }

    /// Attached value in wei; `None` for calls that carry no ether.
    pub fn value(&self) -> Option<U256> {
        self.value
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Wire form for `eth_sendTransaction` with the given sender.
    pub fn to_rpc_request(&self, from: Address) -> RpcTransactionRequest {
        RpcTransactionRequest {
            from,
            to: self.to,
            gas: U64::from(self.gas_limit),
            value: self.value,
            data: self.call_data.clone(),
        }
    }
}

/// `eth_sendTransaction` parameter object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcTransactionRequest {
    pub from: Address,
    pub to: Address,
    pub gas: U64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
    pub data: Bytes,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_request_omits_absent_value() {
        let intent = TransactionIntent::new(Address::ZERO, vec![0xde, 0xad], None, 2_000_000);
        let json = serde_json::to_value(intent.to_rpc_request(Address::ZERO)).unwrap();
        assert!(json.get("value").is_none());
        assert_eq!(json["gas"], "0x1e8480");
        assert_eq!(json["data"], "0xdead");
    }

    #[test]
    fn test_rpc_request_hex_value() {
        let intent = TransactionIntent::new(
            Address::ZERO,
            Vec::new(),
            Some(U256::from(1_000_000_000_000_000_000u64)),
            21_000,
        );
        let json = serde_json::to_value(intent.to_rpc_request(Address::ZERO)).unwrap();
        assert_eq!(json["value"], "0xde0b6b3a7640000");
        assert_eq!(json["gas"], "0x5208");
    }

    #[test]
    fn test_direction_display() {
        assert_eq!(Direction::Buy.to_string(), "buy");
        assert_eq!(Direction::Return.to_string(), "return");
    }
}
