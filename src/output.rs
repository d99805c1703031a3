use std::io::Write;
use std::path::Path;

use alloy_primitives::Address;
use serde::Serialize;
use serde_json::json;
use ticketkit::{format_ether, BalanceReport, TokenDetails, TransactionOutcome};

use crate::error::CliError;
use crate::shows::Show;

fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<(), CliError> {
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write the result of a submitted transaction.
pub fn write_outcome<W: Write>(
    outcome: &TransactionOutcome,
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    if json_mode {
        return write_json(writer, outcome);
    }
    writeln!(writer, "{}", outcome.message)?;
    writeln!(writer, "transaction\t{}", outcome.transaction_hash)?;
    writeln!(writer, "from\t{}", outcome.from)?;
    if let Some(block) = outcome.block_number {
        writeln!(writer, "block\t{block}")?;
    }
    if let Some(gas) = outcome.gas_used {
        writeln!(writer, "gas_used\t{gas}")?;
    }
    writeln!(writer, "submitted_at\t{}", outcome.submitted_at.to_rfc3339())?;
    writer.flush()?;
    Ok(())
}

pub fn write_balances<W: Write>(
    report: &BalanceReport,
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    if json_mode {
        return write_json(writer, report);
    }
    writeln!(writer, "address\t{}", report.address)?;
    writeln!(writer, "balance\t{} ETH", format_ether(report.native_balance))?;
    writeln!(writer, "tickets\t{}", report.ticket_balance)?;
    writer.flush()?;
    Ok(())
}

pub fn write_details<W: Write>(
    details: &TokenDetails,
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    if json_mode {
        return write_json(writer, details);
    }
    writeln!(writer, "name\t{}", details.name)?;
    writeln!(writer, "symbol\t{}", details.symbol)?;
    writeln!(writer, "decimals\t{}", details.decimals)?;
    writeln!(writer, "total_supply\t{}", details.total_supply)?;
    writeln!(writer, "ticket_price\t{} ETH", format_ether(details.ticket_price))?;
    writeln!(writer, "vendor\t{}", details.vendor)?;
    writeln!(writer, "owner\t{}", details.owner)?;
    writer.flush()?;
    Ok(())
}

pub fn write_shows<W: Write>(shows: &[Show], json_mode: bool, writer: &mut W) -> Result<(), CliError> {
    if json_mode {
        return write_json(writer, shows);
    }
    for (i, show) in shows.iter().enumerate() {
        if i > 0 {
            writeln!(writer)?;
        }
        writeln!(writer, "{}", show.name)?;
        writeln!(writer, "  Date: {}", show.date)?;
        writeln!(writer, "  Time: {}", show.time)?;
        writeln!(writer, "  Location: {}", show.location)?;
        writeln!(writer, "  {}", show.description)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write a wallet's address, and its key and keystore path when given.
pub fn write_wallet<W: Write>(
    address: Address,
    private_key: Option<&str>,
    keystore_path: Option<&Path>,
    json_mode: bool,
    writer: &mut W,
) -> Result<(), CliError> {
    if json_mode {
        return write_json(
            writer,
            &json!({
                "address": address,
                "privateKey": private_key,
                "keystore": keystore_path.map(|p| p.display().to_string()),
            }),
        );
    }
    writeln!(writer, "address\t{address}")?;
    if let Some(key) = private_key {
        writeln!(writer, "private_key\t{key}")?;
    }
    if let Some(path) = keystore_path {
        writeln!(writer, "keystore\t{}", path.display())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::U256;

    fn report() -> BalanceReport {
        BalanceReport {
            address: Address::repeat_byte(0x11),
            native_balance: U256::from(1_500_000_000_000_000_000u64),
            ticket_balance: U256::from(2),
        }
    }

    #[test]
    fn test_balances_text() {
        let mut out = Vec::new();
        write_balances(&report(), false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("balance\t1.5 ETH\n"));
        assert!(text.contains("tickets\t2\n"));
    }

    #[test]
    fn test_balances_json() {
        let mut out = Vec::new();
        write_balances(&report(), true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["ticketBalance"], "0x2");
        assert!(value.get("nativeBalance").is_some());
    }

    #[test]
    fn test_shows_text_lists_every_show() {
        let mut out = Vec::new();
        write_shows(crate::shows::SHOWS, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        for show in crate::shows::SHOWS {
            assert!(text.contains(show.name));
        }
    }

    #[test]
    fn test_wallet_hides_key_unless_given() {
        let mut out = Vec::new();
        write_wallet(Address::ZERO, None, None, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("private_key"));
    }
}
