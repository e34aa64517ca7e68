// Core modules
pub mod api;
pub mod config;
pub mod error;
pub mod execution;
pub mod models;
pub mod pricing;

pub mod test_support;

// Re-export commonly used types
pub use api::{BittrexClient, Credentials, ExchangeApi};
pub use config::TraderConfig;
pub use error::{RemoteError, TraderError};
pub use execution::AutoTrader;
pub use models::*;

// Error handling
pub type Result<T> = std::result::Result<T, TraderError>;
