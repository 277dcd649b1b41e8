//! Aave v3 supply position tracker
//!
//! Reads an account's aToken balance and its supply history from an
//! Ethereum JSON-RPC node, then derives interest and an annualized yield.

pub mod abi;
pub mod assets;
pub mod calculator;
pub mod config;
pub mod display;
pub mod endpoint;
pub mod error;
pub mod rpc_client;
pub mod settings;
pub mod source;

// Re-export commonly used types
pub use abi::Address;
pub use assets::AssetConfig;
pub use calculator::{Clock, FixedClock, PositionReport, PositionView, SystemClock, YieldCalculator};
pub use config::AppConfig;
pub use endpoint::{EndpointConfig, EndpointListener, DEFAULT_PROVIDER_URL};
pub use error::{FailureKind, YieldError, YieldResult};
pub use settings::{FileSettingsStore, MemorySettingsStore, SettingsStore};
pub use source::{LedgerSource, RpcLedgerSource};
