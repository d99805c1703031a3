use alloy_primitives::U256;

use crate::error::{Result, TicketError};

/// Decimals of the native currency.
pub const ETHER_DECIMALS: usize = 18;

fn wei_per_ether() -> U256 {
    U256::from(10u64).pow(U256::from(ETHER_DECIMALS))
}

/// Format a wei amount as ether, trimming trailing fractional zeros.
///
/// `1_500_000_000_000_000_000` becomes `"1.5"`; whole amounts have no
/// decimal point.
pub fn format_ether(wei: U256) -> String {
    let (whole, frac) = wei.div_rem(wei_per_ether());
    if frac.is_zero() {
        return whole.to_string();
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = ETHER_DECIMALS);
    format!("{whole}.{}", frac.trim_end_matches('0'))
}

/// Parse an ether amount (`"0.05"`, `"2"`) into wei.
///
/// # Errors
///
/// Returns `TicketError::Validation` for anything but plain decimal digits
/// with at most 18 fractional places, or on overflow.
pub fn parse_ether(value: &str) -> Result<U256> {
    let value = value.trim();
    let invalid = || TicketError::Validation(format!("invalid ether amount: {value:?}"));

    let (whole, frac) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    if frac.len() > ETHER_DECIMALS {
        return Err(TicketError::Validation(format!(
            "ether amount {value:?} has more than {ETHER_DECIMALS} decimal places"
        )));
    }

    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| invalid())?
    };
    let frac = if frac.is_empty() {
        U256::ZERO
    } else {
        let padded = format!("{frac:0<width$}", width = ETHER_DECIMALS);
        U256::from_str_radix(&padded, 10).map_err(|_| invalid())?
    };

    whole
        .checked_mul(wei_per_ether())
        .and_then(|w| w.checked_add(frac))
        .ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wei(s: &str) -> U256 {
        U256::from_str_radix(s, 10).unwrap()
    }

    // ---- format_ether ----

    #[test]
    fn test_format_ether_whole() {
        assert_eq!(format_ether(wei("1000000000000000000")), "1");
        assert_eq!(format_ether(U256::ZERO), "0");
        assert_eq!(format_ether(wei("25000000000000000000")), "25");
    }

    #[test]
    fn test_format_ether_fraction() {
        assert_eq!(format_ether(wei("1500000000000000000")), "1.5");
        assert_eq!(format_ether(wei("10000000000000000")), "0.01");
        assert_eq!(format_ether(U256::from(1)), "0.000000000000000001");
    }

    // ---- parse_ether ----

    #[test]
    fn test_parse_ether_basic() {
        assert_eq!(parse_ether("1").unwrap(), wei("1000000000000000000"));
        assert_eq!(parse_ether("0.01").unwrap(), wei("10000000000000000"));
        assert_eq!(parse_ether(".5").unwrap(), wei("500000000000000000"));
        assert_eq!(parse_ether("2.").unwrap(), wei("2000000000000000000"));
        assert_eq!(parse_ether(" 0.000000000000000001 ").unwrap(), U256::from(1));
    }

    #[test]
    fn test_parse_ether_rejects_garbage() {
        for bad in ["", ".", "-1", "1e18", "abc", "1.2.3", "0.0000000000000000001"] {
            assert!(parse_ether(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_format_agree() {
        for s in ["0.05", "3", "12.345"] {
            assert_eq!(format_ether(parse_ether(s).unwrap()), s);
        }
    }
}
