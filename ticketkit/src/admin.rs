//! Doorman, vendor and token-holder writes.
//!
//! These run through the same signer, guard and state machine as the
//! ticket flows. The contract enforces the roles; a call from the wrong
//! account reverts and surfaces as `TransactionFailed`.

use alloy_primitives::{Address, U256};

use crate::contract::{
    encode_approve, encode_burn, encode_mint, encode_set_doorman, encode_set_ticket_price,
    encode_set_vendor, encode_transfer, encode_transfer_from, encode_withdraw,
    encode_withdraw_earnings,
};
use crate::flow::{FlowError, TicketFlowController};
use crate::signer::Signer;
use crate::types::TransactionOutcome;
use crate::utils::format_ether;

/// Parse a user-supplied account address.
pub fn parse_address(input: &str) -> Result<Address, FlowError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(FlowError::InvalidAddress("Please enter an address.".into()));
    }
    trimmed
        .parse()
        .map_err(|_| FlowError::InvalidAddress(format!("Invalid address: {trimmed}")))
}

fn positive(amount: U256, what: &str) -> Result<(), FlowError> {
    if amount.is_zero() {
        return Err(FlowError::InvalidAmount(format!("{what} must be greater than zero.")));
    }
    Ok(())
}

impl TicketFlowController {
    fn warn_if_not_doorman(&self, signer: &Signer) {
        if let Some(doorman) = self.contract().doorman() {
            if doorman != signer.address() {
                tracing::warn!(
                    %doorman,
                    signer = %signer.address(),
                    "signer is not the configured doorman; the contract may reject this call"
                );
            }
        }
    }

    // --- Doorman ---

    /// Burn `amount` tickets held by `target`.
    pub async fn burn(&self, target: &str, amount: U256) -> Result<TransactionOutcome, FlowError> {
        let message = format!("Burned {amount} ticket(s) from {}.", target.trim());
        self.run_call(
            |signer| {
                let from = parse_address(target)?;
                positive(amount, "Burn amount")?;
                self.warn_if_not_doorman(signer);
                Ok(encode_burn(from, amount))
            },
            None,
            message,
        )
        .await
    }

    /// Grant or revoke the doorman role for `doorman`.
    pub async fn set_doorman(
        &self,
        doorman: &str,
        enabled: bool,
    ) -> Result<TransactionOutcome, FlowError> {
        let verb = if enabled { "enabled" } else { "disabled" };
        let message = format!("Doorman {} {verb}.", doorman.trim());
        self.run_call(
            |_| Ok(encode_set_doorman(parse_address(doorman)?, enabled)),
            None,
            message,
        )
        .await
    }

    // --- Vendor / owner ---

    pub async fn set_ticket_price(&self, new_price: U256) -> Result<TransactionOutcome, FlowError> {
        let message = format!("Ticket price set to {} ETH.", format_ether(new_price));
        self.run_call(
            |_| {
                positive(new_price, "Ticket price")?;
                Ok(encode_set_ticket_price(new_price))
            },
            None,
            message,
        )
        .await
    }

    pub async fn set_vendor(&self, vendor: &str) -> Result<TransactionOutcome, FlowError> {
        let message = format!("Vendor set to {}.", vendor.trim());
        self.run_call(
            |_| Ok(encode_set_vendor(parse_address(vendor)?)),
            None,
            message,
        )
        .await
    }

    /// Move the contract balance to the owner.
    pub async fn withdraw(&self) -> Result<TransactionOutcome, FlowError> {
        self.run_call(|_| Ok(encode_withdraw()), None, "Funds withdrawn.".into())
            .await
    }

    /// Pay accumulated sale proceeds to the vendor.
    pub async fn withdraw_earnings(&self) -> Result<TransactionOutcome, FlowError> {
        self.run_call(
            |_| Ok(encode_withdraw_earnings()),
            None,
            "Earnings withdrawn.".into(),
        )
        .await
    }

    pub async fn mint(&self, to: &str, amount: U256) -> Result<TransactionOutcome, FlowError> {
        let message = format!("Minted {amount} ticket(s) to {}.", to.trim());
        self.run_call(
            |_| {
                let to = parse_address(to)?;
                positive(amount, "Mint amount")?;
                Ok(encode_mint(to, amount))
            },
            None,
            message,
        )
        .await
    }

    // --- Holder ---

    pub async fn transfer(&self, to: &str, amount: U256) -> Result<TransactionOutcome, FlowError> {
        let message = format!("Transferred {amount} ticket(s) to {}.", to.trim());
        self.run_call(
            |_| {
                let to = parse_address(to)?;
                positive(amount, "Transfer amount")?;
                Ok(encode_transfer(to, amount))
            },
            None,
            message,
        )
        .await
    }

    pub async fn transfer_from(
        &self,
        from: &str,
        to: &str,
        amount: U256,
    ) -> Result<TransactionOutcome, FlowError> {
        let message = format!(
            "Transferred {amount} ticket(s) from {} to {}.",
            from.trim(),
            to.trim()
        );
        self.run_call(
            |_| {
                let from = parse_address(from)?;
                let to = parse_address(to)?;
                positive(amount, "Transfer amount")?;
                Ok(encode_transfer_from(from, to, amount))
            },
            None,
            message,
        )
        .await
    }

    /// Allow `spender` to move up to `amount` tickets. Zero revokes.
    pub async fn approve(&self, spender: &str, amount: U256) -> Result<TransactionOutcome, FlowError> {
        let message = format!("Approved {} to spend {amount} ticket(s).", spender.trim());
        self.run_call(
            |_| Ok(encode_approve(parse_address(spender)?, amount)),
            None,
            message,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        let addr = parse_address(" 0x2c7536E3605D9C16a7a3D7b1898e529396a65c23 ").unwrap();
        assert_eq!(
            addr,
            "0x2c7536e3605d9c16a7a3d7b1898e529396a65c23"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_parse_address_rejects() {
        for bad in ["", "   ", "0x1234", "not an address"] {
            assert!(matches!(parse_address(bad), Err(FlowError::InvalidAddress(_))));
        }
    }

    #[test]
    fn test_positive() {
        assert!(positive(U256::from(1), "x").is_ok());
        assert!(matches!(
            positive(U256::ZERO, "Burn amount"),
            Err(FlowError::InvalidAmount(m)) if m == "Burn amount must be greater than zero."
        ));
    }
}
