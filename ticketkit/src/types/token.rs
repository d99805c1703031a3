use alloy_primitives::{Address, U256};
use serde::Serialize;

/// Public facts about the ticket token, read from the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDetails {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
    /// Price of one ticket in wei.
    pub ticket_price: U256,
    pub vendor: Address,
    pub owner: Address,
}

/// Native and ticket balances of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub address: Address,
    /// Native balance in wei.
    pub native_balance: U256,
    pub ticket_balance: U256,
}
