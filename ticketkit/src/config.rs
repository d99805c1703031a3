use std::time::Duration;

use alloy_primitives::Address;
use url::Url;

use crate::error::{Result, TicketError};

/// Default chain node endpoint (a local dev node).
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Default hosted wallet endpoint (Frame's local JSON-RPC port).
pub const DEFAULT_WALLET_URL: &str = "http://127.0.0.1:1248";

/// Gas limit attached to every ticket transaction.
pub const DEFAULT_GAS_LIMIT: u64 = 2_000_000;

/// Configuration for the ticket contract client.
#[derive(Debug, Clone)]
pub struct TicketConfig {
    /// Chain node JSON-RPC URL.
    pub rpc_url: String,
    /// Hosted wallet JSON-RPC URL.
    pub wallet_url: String,
    /// Ticket contract address.
    pub contract_address: Address,
    /// Doorman account, if one is configured for this deployment.
    pub doorman_address: Option<Address>,
    /// Chain id used for local signing; queried from the node when unset.
    pub chain_id: Option<u64>,
    /// Gas limit for every submitted transaction.
    pub gas_limit: u64,
    /// Delay between receipt polls.
    pub receipt_poll_interval: Duration,
    /// Number of receipt polls before giving up on a submitted transaction.
    pub receipt_poll_attempts: u32,
}

impl TicketConfig {
    /// Config with defaults for everything except the contract address.
    pub fn new(contract_address: Address) -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            wallet_url: DEFAULT_WALLET_URL.to_string(),
            contract_address,
            doorman_address: None,
            chain_id: None,
            gas_limit: DEFAULT_GAS_LIMIT,
            receipt_poll_interval: Duration::from_secs(1),
            receipt_poll_attempts: 750,
        }
    }

    /// Build a config from `CONTRACT_ADDRESS`, `DOORMAN_ADDRESS`, `RPC_URL`,
    /// `WALLET_URL`, `CHAIN_ID` and `GAS_LIMIT`.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::Config` if `CONTRACT_ADDRESS` is missing or any
    /// value fails to parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let contract = get("CONTRACT_ADDRESS")
            .ok_or_else(|| TicketError::Config("CONTRACT_ADDRESS is required".into()))?;
        let mut config = Self::new(parse_address("CONTRACT_ADDRESS", &contract)?);

        if let Some(v) = get("DOORMAN_ADDRESS") {
            config.doorman_address = Some(parse_address("DOORMAN_ADDRESS", &v)?);
        }
        if let Some(v) = get("RPC_URL") {
            config.rpc_url = v;
        }
        if let Some(v) = get("WALLET_URL") {
            config.wallet_url = v;
        }
        if let Some(v) = get("CHAIN_ID") {
            config.chain_id = Some(parse_u64("CHAIN_ID", &v)?);
        }
        if let Some(v) = get("GAS_LIMIT") {
            config.gas_limit = parse_u64("GAS_LIMIT", &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that both endpoints are usable HTTP(S) URLs and the gas limit is non-zero.
    pub fn validate(&self) -> Result<()> {
        check_url("rpc_url", &self.rpc_url)?;
        check_url("wallet_url", &self.wallet_url)?;
        if self.gas_limit == 0 {
            return Err(TicketError::Config("gas_limit must be non-zero".into()));
        }
        Ok(())
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address> {
    value
        .trim()
        .parse::<Address>()
        .map_err(|e| TicketError::Config(format!("{key}: invalid address {value:?}: {e}")))
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| TicketError::Config(format!("{key}: invalid number {value:?}: {e}")))
}

fn check_url(key: &str, value: &str) -> Result<()> {
    let url = Url::parse(value)
        .map_err(|e| TicketError::Config(format!("{key}: invalid URL {value:?}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(TicketError::Config(format!(
            "{key}: unsupported scheme {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    const CONTRACT: &str = "0x1854cab9bdcaac14c95a9a58a41ef5defd607e33";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_with_contract_only() {
        let config = TicketConfig::from_lookup(lookup(&[("CONTRACT_ADDRESS", CONTRACT)])).unwrap();
        assert_eq!(config.contract_address, CONTRACT.parse::<Address>().unwrap());
        assert_eq!(config.rpc_url, DEFAULT_RPC_URL);
        assert_eq!(config.wallet_url, DEFAULT_WALLET_URL);
        assert_eq!(config.gas_limit, 2_000_000);
        assert!(config.doorman_address.is_none());
        assert!(config.chain_id.is_none());
    }

    #[test]
    fn test_missing_contract_address() {
        let err = TicketConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, TicketError::Config(_)));
    }

    #[test]
    fn test_blank_contract_address_is_missing() {
        let err = TicketConfig::from_lookup(lookup(&[("CONTRACT_ADDRESS", "  ")])).unwrap_err();
        assert!(err.to_string().contains("CONTRACT_ADDRESS is required"));
    }

    #[test]
    fn test_all_overrides() {
        let config = TicketConfig::from_lookup(lookup(&[
            ("CONTRACT_ADDRESS", CONTRACT),
            ("DOORMAN_ADDRESS", "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"),
            ("RPC_URL", "https://sepolia.example.org"),
            ("WALLET_URL", "http://localhost:9000"),
            ("CHAIN_ID", "11155111"),
            ("GAS_LIMIT", "300000"),
        ]))
        .unwrap();
        assert!(config.doorman_address.is_some());
        assert_eq!(config.rpc_url, "https://sepolia.example.org");
        assert_eq!(config.wallet_url, "http://localhost:9000");
        assert_eq!(config.chain_id, Some(11155111));
        assert_eq!(config.gas_limit, 300_000);
    }

    #[test]
    fn test_invalid_values_rejected() {
        for pairs in [
            vec![("CONTRACT_ADDRESS", "0x1234")],
            vec![("CONTRACT_ADDRESS", CONTRACT), ("CHAIN_ID", "mainnet")],
            vec![("CONTRACT_ADDRESS", CONTRACT), ("RPC_URL", "ws://127.0.0.1:8546")],
            vec![("CONTRACT_ADDRESS", CONTRACT), ("GAS_LIMIT", "0")],
        ] {
            let err = TicketConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, TicketError::Config(_)), "{pairs:?}");
        }
    }
}
