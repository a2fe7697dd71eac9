use crate::domain::ledger::types::UserId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by a ledger store
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LedgerError {
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Insufficient funds: need ${need}, available ${available}")]
    InsufficientFunds { need: Decimal, available: Decimal },

    #[error("Insufficient shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: i64,
        held: i64,
    },

    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Rejection reasons returned by the trading engine.
///
/// Business-rule rejections are safe to show to the caller verbatim.
/// `Storage` and `QuoteUnavailable` are the only retryable kinds, and a retry
/// must restart the whole operation from validation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TradingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("Quote for {symbol} unavailable: {reason}")]
    QuoteUnavailable { symbol: String, reason: String },

    #[error("No position held in {0}")]
    NoPosition(String),

    #[error("Insufficient funds: need ${need}, available ${available}")]
    InsufficientFunds { need: Decimal, available: Decimal },

    #[error("Insufficient shares of {symbol}: requested {requested}, held {held}")]
    InsufficientShares {
        symbol: String,
        requested: i64,
        held: i64,
    },

    #[error("User not found: {0}")]
    UserNotFound(UserId),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    #[error("Storage failure: {0}")]
    Storage(String),
}

impl TradingError {
    /// Stable machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            TradingError::InvalidInput(_) => "INVALID_INPUT",
            TradingError::UnknownSymbol(_) => "UNKNOWN_SYMBOL",
            TradingError::QuoteUnavailable { .. } => "QUOTE_UNAVAILABLE",
            TradingError::NoPosition(_) => "NO_POSITION",
            TradingError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TradingError::InsufficientShares { .. } => "INSUFFICIENT_SHARES",
            TradingError::UserNotFound(_) => "NOT_FOUND",
            TradingError::UsernameTaken(_) => "CONFLICT",
            TradingError::Storage(_) => "STORAGE_ERROR",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TradingError::Storage(_) | TradingError::QuoteUnavailable { .. }
        )
    }
}

impl From<LedgerError> for TradingError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::UserNotFound(id) => TradingError::UserNotFound(id),
            LedgerError::UsernameTaken(name) => TradingError::UsernameTaken(name),
            LedgerError::InsufficientFunds { need, available } => {
                TradingError::InsufficientFunds { need, available }
            }
            LedgerError::InsufficientShares {
                symbol,
                requested,
                held,
            } => TradingError::InsufficientShares {
                symbol,
                requested,
                held,
            },
            LedgerError::InvalidTransaction(reason) => TradingError::InvalidInput(reason),
            LedgerError::Storage(reason) => TradingError::Storage(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_insufficient_funds_formatting() {
        let error = TradingError::InsufficientFunds {
            need: dec!(100),
            available: dec!(50),
        };

        let msg = error.to_string();
        assert!(msg.contains("$100"));
        assert!(msg.contains("$50"));
        assert_eq!(error.code(), "INSUFFICIENT_FUNDS");
        assert!(!error.is_retryable());
    }

    #[test]
    fn test_ledger_errors_keep_their_reason_code() {
        let shares: TradingError = LedgerError::InsufficientShares {
            symbol: "X".to_string(),
            requested: 7,
            held: 6,
        }
        .into();
        assert_eq!(shares.code(), "INSUFFICIENT_SHARES");

        let storage: TradingError = LedgerError::Storage("disk I/O error".to_string()).into();
        assert_eq!(storage.code(), "STORAGE_ERROR");
        assert!(storage.is_retryable());

        let taken: TradingError = LedgerError::UsernameTaken("alice".to_string()).into();
        assert_eq!(taken.code(), "CONFLICT");

        let missing: TradingError = LedgerError::UserNotFound(UserId(9)).into();
        assert_eq!(missing.code(), "NOT_FOUND");
    }
}
