//! Typed access to the ticket token contract.
//!
//! Read calls go through `eth_call`; write calls are only encoded here and
//! submitted by a [`Signer`](crate::signer::Signer).

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall};

use crate::config::TicketConfig;
use crate::error::{Result, TicketError};
use crate::rpc::JsonRpcClient;
use crate::types::{TokenDetails, TransactionReceipt};

sol! {
    /// ABI of the deployed ticket token.
    interface ITicketToken {
        function name() external view returns (string name);
        function symbol() external view returns (string symbol);
        function decimals() external view returns (uint8 decimals);
        function totalSupply() external view returns (uint256 supply);
        function balanceOf(address account) external view returns (uint256 balance);
        function allowance(address owner, address spender) external view returns (uint256 remaining);
        function owner() external view returns (address owner);
        function vendor() external view returns (address vendor);
        function ticketPrice() external view returns (uint256 price);

        function buyTicket(uint256 amount) external payable;
        function refundTicket(uint256 amount) external;
        function mint(address to, uint256 amount) external;
        function transfer(address to, uint256 amount) external returns (bool ok);
        function transferFrom(address from, address to, uint256 amount) external returns (bool ok);
        function approve(address spender, uint256 amount) external returns (bool ok);
        function burn(address from, uint256 amount) external;
        function setTicketPrice(uint256 newPrice) external;
        function setVendor(address newVendor) external;
        function setDoorman(address doorman, bool status) external;
        function withdraw() external;
        function withdrawEarnings() external;
    }
}

/// Client bound to one ticket contract on one node.
///
/// Construct once per process and share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ContractClient {
    /// Chain node transport.
    pub rpc: JsonRpcClient,
    /// Hosted wallet transport.
    pub wallet_rpc: JsonRpcClient,
    address: Address,
    doorman: Option<Address>,
    gas_limit: u64,
    chain_id: Option<u64>,
    receipt_poll_interval: Duration,
    receipt_poll_attempts: u32,
}

impl ContractClient {
    /// Create a client from a validated config. No network access happens here.
    pub fn new(config: &TicketConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            rpc: JsonRpcClient::new(&config.rpc_url),
            wallet_rpc: JsonRpcClient::new(&config.wallet_url),
            address: config.contract_address,
            doorman: config.doorman_address,
            gas_limit: config.gas_limit,
            chain_id: config.chain_id,
            receipt_poll_interval: config.receipt_poll_interval,
            receipt_poll_attempts: config.receipt_poll_attempts,
        })
    }

    /// Contract address every call is sent to.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Doorman account named in configuration, if any.
    pub fn doorman(&self) -> Option<Address> {
        self.doorman
    }

    pub fn gas_limit(&self) -> u64 {
        self.gas_limit
    }

    /// Configured chain id, falling back to `eth_chainId`.
    pub async fn chain_id(&self) -> Result<u64> {
        match self.chain_id {
            Some(id) => Ok(id),
            None => self.rpc.chain_id().await,
        }
    }

    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return> {
        let data = Bytes::from(call.abi_encode());
        let output = self.rpc.call(self.address, &data).await?;
        if output.is_empty() {
            return Err(TicketError::Validation(format!(
                "empty response from {} at {}",
                C::SIGNATURE,
                self.address
            )));
        }
        C::abi_decode_returns(&output, true).map_err(TicketError::Abi)
    }

    // --- Reads ---

    /// Price of one ticket in wei.
    pub async fn ticket_price(&self) -> Result<U256> {
        Ok(self.read(ITicketToken::ticketPriceCall {}).await?.price)
    }

    /// Ticket balance of `account`.
    pub async fn balance_of(&self, account: Address) -> Result<U256> {
        Ok(self
            .read(ITicketToken::balanceOfCall { account })
            .await?
            .balance)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        Ok(self
            .read(ITicketToken::allowanceCall { owner, spender })
            .await?
            .remaining)
    }

    pub async fn total_supply(&self) -> Result<U256> {
        Ok(self.read(ITicketToken::totalSupplyCall {}).await?.supply)
    }

    pub async fn decimals(&self) -> Result<u8> {
        Ok(self.read(ITicketToken::decimalsCall {}).await?.decimals)
    }

    pub async fn name(&self) -> Result<String> {
        Ok(self.read(ITicketToken::nameCall {}).await?.name)
    }

    pub async fn symbol(&self) -> Result<String> {
        Ok(self.read(ITicketToken::symbolCall {}).await?.symbol)
    }

    pub async fn owner(&self) -> Result<Address> {
        Ok(self.read(ITicketToken::ownerCall {}).await?.owner)
    }

    /// Account entitled to ticket-sale proceeds.
    pub async fn vendor(&self) -> Result<Address> {
        Ok(self.read(ITicketToken::vendorCall {}).await?.vendor)
    }

    /// Read every public token fact in one go.
    pub async fn details(&self) -> Result<TokenDetails> {
        Ok(TokenDetails {
            name: self.name().await?,
            symbol: self.symbol().await?,
            decimals: self.decimals().await?,
            total_supply: self.total_supply().await?,
            ticket_price: self.ticket_price().await?,
            vendor: self.vendor().await?,
            owner: self.owner().await?,
        })
    }

    /// Native balance of `account` in wei.
    pub async fn native_balance(&self, account: Address) -> Result<U256> {
        self.rpc.get_balance(account).await
    }

    // --- Receipts ---

    /// Poll the node until `hash` has a receipt.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::Validation` if no receipt shows up within the
    /// configured number of attempts.
    pub async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt> {
        for attempt in 0..self.receipt_poll_attempts {
            if let Some(receipt) = self.rpc.get_transaction_receipt(hash).await? {
                tracing::debug!(%hash, attempt, "receipt available");
                return Ok(receipt);
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
        Err(TicketError::Validation(format!(
            "no receipt for {hash} after {} polls",
            self.receipt_poll_attempts
        )))
    }
}

// --- Call data encoders ---

pub fn encode_buy_ticket(amount: U256) -> Bytes {
    ITicketToken::buyTicketCall { amount }.abi_encode().into()
}

pub fn encode_refund_ticket(amount: U256) -> Bytes {
    ITicketToken::refundTicketCall { amount }.abi_encode().into()
}

pub fn encode_burn(from: Address, amount: U256) -> Bytes {
    ITicketToken::burnCall { from, amount }.abi_encode().into()
}

pub fn encode_set_doorman(doorman: Address, status: bool) -> Bytes {
    ITicketToken::setDoormanCall { doorman, status }
        .abi_encode()
        .into()
}

pub fn encode_set_ticket_price(new_price: U256) -> Bytes {
    ITicketToken::setTicketPriceCall {
        newPrice: new_price,
    }
    .abi_encode()
    .into()
}

pub fn encode_set_vendor(new_vendor: Address) -> Bytes {
    ITicketToken::setVendorCall {
        newVendor: new_vendor,
    }
    .abi_encode()
    .into()
}

pub fn encode_withdraw() -> Bytes {
    ITicketToken::withdrawCall {}.abi_encode().into()
}

pub fn encode_withdraw_earnings() -> Bytes {
    ITicketToken::withdrawEarningsCall {}.abi_encode().into()
}

pub fn encode_mint(to: Address, amount: U256) -> Bytes {
    ITicketToken::mintCall { to, amount }.abi_encode().into()
}

pub fn encode_transfer(to: Address, amount: U256) -> Bytes {
    ITicketToken::transferCall { to, amount }.abi_encode().into()
}

pub fn encode_transfer_from(from: Address, to: Address, amount: U256) -> Bytes {
    ITicketToken::transferFromCall { from, to, amount }
        .abi_encode()
        .into()
}

pub fn encode_approve(spender: Address, amount: U256) -> Bytes {
    ITicketToken::approveCall { spender, amount }
        .abi_encode()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_erc20_selectors() {
        assert_eq!(
            hex::encode(ITicketToken::balanceOfCall::SELECTOR),
            "70a08231"
        );
        assert_eq!(
            hex::encode(ITicketToken::transferCall::SELECTOR),
            "a9059cbb"
        );
        assert_eq!(hex::encode(ITicketToken::approveCall::SELECTOR), "095ea7b3");
        assert_eq!(
            hex::encode(ITicketToken::totalSupplyCall::SELECTOR),
            "18160ddd"
        );
    }

    #[test]
    fn test_buy_ticket_encoding() {
        let data = encode_buy_ticket(U256::from(2));
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(&data[..4], ITicketToken::buyTicketCall::SELECTOR.as_slice());
        assert_eq!(data[35], 2);
        assert!(data[4..35].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_refund_differs_from_buy() {
        let buy = encode_buy_ticket(U256::from(1));
        let refund = encode_refund_ticket(U256::from(1));
        assert_ne!(buy[..4], refund[..4]);
        assert_eq!(buy[4..], refund[4..]);
    }

    #[test]
    fn test_set_doorman_encoding() {
        let doorman: Address = "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"
            .parse()
            .unwrap();
        let data = encode_set_doorman(doorman, true);
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(&data[16..36], doorman.as_slice());
        assert_eq!(data[67], 1);
    }

    #[test]
    fn test_decode_price_return() {
        let mut word = [0u8; 32];
        word[31] = 0x0a;
        let decoded = ITicketToken::ticketPriceCall::abi_decode_returns(&word, true).unwrap();
        assert_eq!(decoded.price, U256::from(10));
    }
}
