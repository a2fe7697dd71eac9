//! Input rules for share counts, cash amounts and ticker symbols.
//!
//! Cash and prices share one fixed-point type (`Decimal`) end to end. Deposits
//! are rejected, not rounded, when they carry more fractional digits than the
//! configured cash scale.

use crate::domain::errors::TradingError;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Default number of fractional digits accepted for cash amounts (cents)
pub const DEFAULT_CASH_SCALE: u32 = 2;

/// Trims and upper-cases a ticker. Empty input is rejected.
pub fn normalize_symbol(raw: &str) -> Result<String, TradingError> {
    let symbol = raw.trim();
    if symbol.is_empty() {
        return Err(TradingError::InvalidInput("must provide symbol".to_string()));
    }
    if symbol.chars().any(char::is_whitespace) {
        return Err(TradingError::InvalidInput(format!(
            "symbol '{}' contains whitespace",
            symbol
        )));
    }
    Ok(symbol.to_uppercase())
}

pub fn ensure_positive_shares(shares: i64) -> Result<i64, TradingError> {
    if shares <= 0 {
        return Err(TradingError::InvalidInput(
            "number of shares must be positive".to_string(),
        ));
    }
    Ok(shares)
}

/// Parses a raw form value into a positive whole share count.
pub fn parse_share_count(raw: &str) -> Result<i64, TradingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TradingError::InvalidInput("must provide shares".to_string()));
    }
    let shares = raw.parse::<i64>().map_err(|_| {
        TradingError::InvalidInput("number of shares must be an integer".to_string())
    })?;
    ensure_positive_shares(shares)
}

/// Parses a raw form value into a decimal amount. Sign and scale are checked
/// separately by [`validate_deposit`].
pub fn parse_amount(raw: &str) -> Result<Decimal, TradingError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(TradingError::InvalidInput(
            "must enter deposit amount".to_string(),
        ));
    }
    Decimal::from_str(raw)
        .map_err(|_| TradingError::InvalidInput(format!("invalid deposit amount '{}'", raw)))
}

pub fn validate_deposit(amount: Decimal, cash_scale: u32) -> Result<Decimal, TradingError> {
    if amount <= Decimal::ZERO {
        return Err(TradingError::InvalidInput(
            "deposit amount must be positive".to_string(),
        ));
    }
    let normalized = amount.normalize();
    if normalized.scale() > cash_scale {
        return Err(TradingError::InvalidInput(format!(
            "deposit amount {} has more than {} decimal places",
            amount, cash_scale
        )));
    }
    Ok(normalized)
}

/// `shares * price`, rejecting amounts too large to represent.
pub fn trade_value(shares: i64, price: Decimal) -> Result<Decimal, TradingError> {
    Decimal::from(shares)
        .checked_mul(price)
        .ok_or_else(|| TradingError::InvalidInput("order value is too large".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("  nflx ").unwrap(), "NFLX");
        assert!(normalize_symbol("   ").is_err());
        assert!(normalize_symbol("BR K").is_err());
    }

    #[test]
    fn test_parse_share_count() {
        assert_eq!(parse_share_count("12").unwrap(), 12);
        assert_eq!(parse_share_count(" 3 ").unwrap(), 3);

        for bad in ["", "0", "-2", "1.5", "ten"] {
            let err = parse_share_count(bad).unwrap_err();
            assert_eq!(err.code(), "INVALID_INPUT", "input {:?}", bad);
        }
    }

    #[test]
    fn test_deposit_scale_is_enforced() {
        assert_eq!(validate_deposit(dec!(10.50), 2).unwrap(), dec!(10.5));
        assert_eq!(validate_deposit(dec!(7.000), 2).unwrap(), dec!(7));
        assert!(validate_deposit(dec!(0.001), 2).is_err());
        assert!(validate_deposit(dec!(0), 2).is_err());
        assert!(validate_deposit(dec!(-5), 2).is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("250.25").unwrap(), dec!(250.25));
        assert!(parse_amount("").is_err());
        assert!(parse_amount("12,00").is_err());
    }

    #[test]
    fn test_trade_value() {
        assert_eq!(trade_value(10, dec!(100)).unwrap(), dec!(1000));
        assert!(trade_value(i64::MAX, Decimal::MAX).is_err());
    }
}
