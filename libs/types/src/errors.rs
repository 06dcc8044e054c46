//! Error types for the venue engine
//!
//! Error taxonomy using thiserror

use thiserror::Error;

/// Errors reported by the Core Engine to its callers.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("unsupported asset ID {asset_id}")]
    UnsupportedAsset { asset_id: u32 },

    #[error("unknown market {market}")]
    UnknownMarket { market: String },

    #[error("market {market} is in the wrong state: {reason}")]
    MarketState { market: String, reason: String },

    #[error("account not found: {account_id}")]
    AccountNotFound { account_id: String },

    #[error("match not found: {match_id}")]
    MatchNotFound { match_id: String },

    #[error("asset backend error: {0}")]
    Backend(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("system error: {message}")]
    System { message: String },
}

/// Identifier decoding errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("incorrect length: expected {expected} bytes, got {actual}")]
    BadLength { expected: usize, actual: usize },

    #[error("invalid hex: {0}")]
    BadHex(String),
}

/// Order rendering errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderError {
    #[error("order {order_id} of kind {kind} cannot be booked")]
    NotBookable { order_id: String, kind: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_display() {
        let err = CoreError::UnknownMarket {
            market: "dcr_btc".to_string(),
        };
        assert_eq!(err.to_string(), "unknown market dcr_btc");
    }

    #[test]
    fn test_id_error_display() {
        let err = IdError::BadLength {
            expected: 32,
            actual: 31,
        };
        assert!(err.to_string().contains("32"));
        assert!(err.to_string().contains("31"));
    }
}
