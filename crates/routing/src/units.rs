//! Exact decimal arithmetic on token base units

use autobridge_primitives::{
    constants::bps::DENOMINATOR, route::is_decimal_amount, AutoBridgeError, AutoBridgeResult,
};
use ethers::types::U256;

fn pow10(decimals: u8) -> AutoBridgeResult<U256> {
    U256::from(10u64)
        .checked_pow(decimals.into())
        .ok_or_else(|| AutoBridgeError::invariant(format!("10^{decimals} overflows uint256")))
}

/// Converts a user supplied decimal string to base units
///
/// # Arguments
/// * `amount` - Positive decimal string (digits, optional single '.', no sign or exponent)
/// * `decimals` - Decimals of the token
///
/// # Returns
/// * `AutoBridgeResult<U256>` - Base units, or an input error for malformed, non-positive or
///   over-precise amounts
pub fn parse_units(amount: &str, decimals: u8) -> AutoBridgeResult<U256> {
    let units = parse_amount(amount, decimals)?;
    if units.is_zero() {
        return Err(AutoBridgeError::input(format!("Amount must be positive: {amount}")));
    }
    Ok(units)
}

/// Converts a derived amount (leg input, minimum out, fee) to base units, zero allowed
pub fn parse_amount(amount: &str, decimals: u8) -> AutoBridgeResult<U256> {
    if !is_decimal_amount(amount) {
        return Err(AutoBridgeError::input(format!("Invalid amount: {amount}")));
    }

    let (integer, fraction) = amount.split_once('.').unwrap_or((amount, ""));
    if fraction.len() > usize::from(decimals) {
        return Err(AutoBridgeError::input(format!(
            "Invalid amount: {amount} (more than {decimals} decimal places)"
        )));
    }

    let too_large = || AutoBridgeError::input(format!("Amount too large: {amount}"));
    let integer = U256::from_dec_str(integer).map_err(|_| too_large())?;
    let fraction = if fraction.is_empty() {
        U256::zero()
    } else {
        let padded = format!("{fraction:0<width$}", width = usize::from(decimals));
        U256::from_dec_str(&padded).map_err(|_| too_large())?
    };

    integer
        .checked_mul(pow10(decimals)?)
        .and_then(|units| units.checked_add(fraction))
        .ok_or_else(too_large)
}

/// Formats base units as a decimal string without trailing fractional zeros
pub fn format_units(value: U256, decimals: u8) -> AutoBridgeResult<String> {
    let scale = pow10(decimals)?;
    let (integer, fraction) = value.div_mod(scale);
    if fraction.is_zero() {
        return Ok(integer.to_string());
    }

    let fraction = format!("{:0>width$}", fraction.to_string(), width = usize::from(decimals));
    Ok(format!("{integer}.{}", fraction.trim_end_matches('0')))
}

/// Rescales base units between decimal precisions, truncating when scaling down
pub fn scale_decimals(value: U256, from_decimals: u8, to_decimals: u8) -> AutoBridgeResult<U256> {
    match from_decimals.cmp(&to_decimals) {
        std::cmp::Ordering::Equal => Ok(value),
        std::cmp::Ordering::Less => {
            value.checked_mul(pow10(to_decimals - from_decimals)?).ok_or_else(|| {
                AutoBridgeError::input(format!(
                    "Amount {value} overflows when scaled from {from_decimals} to {to_decimals} decimals"
                ))
            })
        }
        std::cmp::Ordering::Greater => Ok(value / pow10(from_decimals - to_decimals)?),
    }
}

/// `value * (10000 - bps) / 10000`, truncating
pub fn apply_bps(value: U256, bps: u16) -> AutoBridgeResult<U256> {
    let bps = u64::from(bps);
    if bps > DENOMINATOR {
        return Err(AutoBridgeError::invariant(format!("{bps} bps exceeds 100%")));
    }

    value
        .checked_mul(U256::from(DENOMINATOR - bps))
        .map(|scaled| scaled / U256::from(DENOMINATOR))
        .ok_or_else(|| AutoBridgeError::input(format!("Amount {value} is too large")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_format() {
        assert_eq!(parse_units("1.0", 18).unwrap(), U256::exp10(18));
        assert_eq!(parse_units("123.456789", 6).unwrap(), U256::from(123_456_789u64));
        assert_eq!(parse_units("7", 0).unwrap(), U256::from(7));
        assert_eq!(format_units(U256::from(995u64) * U256::exp10(15), 18).unwrap(), "0.995");
        assert_eq!(format_units(U256::exp10(18), 18).unwrap(), "1");
        assert_eq!(format_units(U256::from(5), 6).unwrap(), "0.000005");
        assert_eq!(format_units(U256::from(42), 0).unwrap(), "42");
        assert_eq!(format_units(U256::zero(), 18).unwrap(), "0");
    }

    #[test]
    fn malformed_amounts_never_coerce() {
        for amount in ["abc", "-1", "1.2.3", "1e18", "", " 1"] {
            assert_eq!(
                parse_units(amount, 18),
                Err(AutoBridgeError::input(format!("Invalid amount: {amount}")))
            );
        }
        for amount in ["0", "0.0", "000.000"] {
            assert_eq!(
                parse_units(amount, 18),
                Err(AutoBridgeError::input(format!("Amount must be positive: {amount}")))
            );
        }
        assert_eq!(
            parse_units("0.1234567", 6),
            Err(AutoBridgeError::input("Invalid amount: 0.1234567 (more than 6 decimal places)"))
        );
        assert!(parse_units(&"9".repeat(80), 18).is_err());
    }

    #[test]
    fn derived_amounts_may_be_zero() {
        for amount in ["0", "0.0", "000.000"] {
            assert_eq!(parse_amount(amount, 6).unwrap(), U256::zero());
        }
        assert_eq!(parse_amount("0.000001", 6).unwrap(), U256::one());
        assert_eq!(
            parse_amount("-1", 6),
            Err(AutoBridgeError::input("Invalid amount: -1"))
        );
        assert_eq!(
            parse_amount("0.0000001", 6),
            Err(AutoBridgeError::input("Invalid amount: 0.0000001 (more than 6 decimal places)"))
        );
    }

    #[test]
    fn scale_up_then_down_is_exact() {
        for (amount, d0) in [("1", 0u8), ("0.5", 1), ("123.456789", 6), ("0.000000000000000001", 18)] {
            let units = parse_units(amount, d0).unwrap();
            for d1 in d0..=36 {
                let up = scale_decimals(units, d0, d1).unwrap();
                assert_eq!(scale_decimals(up, d1, d0).unwrap(), units, "{amount} {d0}->{d1}");
            }
        }
        assert_eq!(scale_decimals(U256::from(1_999_999u64), 18, 12).unwrap(), U256::from(1));
    }

    #[test]
    fn apply_bps_never_increases() {
        let amount = U256::from(123_456_789u64);
        assert_eq!(apply_bps(amount, 0).unwrap(), amount);
        assert_eq!(apply_bps(amount, 10_000).unwrap(), U256::zero());
        for bps in [1u16, 10, 50, 999, 5_000, 9_999] {
            assert!(apply_bps(amount, bps).unwrap() <= amount);
        }
        // 123456789 * 9950 / 10000 = 122839505.055
        assert_eq!(apply_bps(amount, 50).unwrap(), U256::from(122_839_505u64));
        assert!(matches!(apply_bps(amount, 10_001), Err(AutoBridgeError::InvariantViolation { .. })));
    }
}
