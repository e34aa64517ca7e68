use thiserror::Error;

use crate::models::Side;

/// Failures surfaced by the exchange collaborator. All of them end the trading loop.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("exchange returned {status}: {code}")]
    Api { status: u16, code: String },

    #[error("exchange unreachable after {attempts} attempts: {source}")]
    Unreachable {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed exchange response: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    Request(String),
}

#[derive(Error, Debug)]
pub enum TraderError {
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("no {side} trades available for {market}")]
    DataUnavailable { market: String, side: Side },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("prompt failed: {0}")]
    Prompt(#[from] std::io::Error),
}

impl TraderError {
    /// Whether the trading loop must stop on this error.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TraderError::DataUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_data_unavailable_is_recoverable() {
        let missing = TraderError::DataUnavailable {
            market: "BTC-LTC".to_string(),
            side: Side::Buy,
        };
        assert!(!missing.is_fatal());
        assert_eq!(missing.to_string(), "no BUY trades available for BTC-LTC");

        let remote = TraderError::from(RemoteError::Api {
            status: 400,
            code: "INSUFFICIENT_FUNDS".to_string(),
        });
        assert!(remote.is_fatal());
        assert!(remote.to_string().contains("INSUFFICIENT_FUNDS"));

        assert!(TraderError::Configuration("missing apikey".to_string()).is_fatal());
    }
}
