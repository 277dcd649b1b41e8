//! Tracked reserves of the lending pool

use serde::{Deserialize, Serialize};

use crate::abi::Address;

/// Aave v3 Pool on Ethereum mainnet
pub const AAVE_V3_POOL: Address = Address::from_bytes([
    0x87, 0x87, 0x0b, 0xca, 0x3f, 0x3f, 0xd6, 0x33, 0x5c, 0x3f, 0x4c, 0xe8, 0x39, 0x2d, 0x69, 0x35,
    0x0b, 0x4f, 0xa4, 0xe2,
]);

/// Static descriptor of one reserve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetConfig {
    /// Ticker used for display and settings keys
    pub symbol: String,

    /// Underlying ERC-20, the `reserve` topic of pool events
    pub underlying: Address,

    /// Yield-bearing aToken holding the account balance
    pub a_token: Address,

    /// Declared precision of the underlying
    pub decimals: u32,
}

impl AssetConfig {
    /// Mainnet USDC reserve
    pub fn usdc() -> Self {
        Self {
            symbol: "USDC".to_string(),
            underlying: Address::from_bytes([
                0xa0, 0xb8, 0x69, 0x91, 0xc6, 0x21, 0x8b, 0x36, 0xc1, 0xd1, 0x9d, 0x4a, 0x2e, 0x9e,
                0xb0, 0xce, 0x36, 0x06, 0xeb, 0x48,
            ]),
            a_token: Address::from_bytes([
                0x98, 0xc2, 0x3e, 0x9d, 0x8f, 0x34, 0xfe, 0xfb, 0x1b, 0x7b, 0xd6, 0xa9, 0x1b, 0x7f,
                0xf1, 0x22, 0xf4, 0xe1, 0x6f, 0x5c,
            ]),
            decimals: 6,
        }
    }

    /// Mainnet USDT reserve
    pub fn usdt() -> Self {
        Self {
            symbol: "USDT".to_string(),
            underlying: Address::from_bytes([
                0xda, 0xc1, 0x7f, 0x95, 0x8d, 0x2e, 0xe5, 0x23, 0xa2, 0x20, 0x62, 0x06, 0x99, 0x45,
                0x97, 0xc1, 0x3d, 0x83, 0x1e, 0xc7,
            ]),
            a_token: Address::from_bytes([
                0x23, 0x87, 0x89, 0x14, 0xef, 0xe3, 0x8d, 0x27, 0xc4, 0xd6, 0x7a, 0xb8, 0x3e, 0xd1,
                0xb9, 0x3a, 0x74, 0xd4, 0x08, 0x6a,
            ]),
            decimals: 6,
        }
    }

    /// Reserves tracked when the config file lists none
    pub fn defaults() -> Vec<Self> {
        vec![Self::usdc(), Self::usdt()]
    }
}

/// Select assets by symbol, case-insensitive; `all` selects every asset
pub fn select<'a>(assets: &'a [AssetConfig], symbol: &str) -> Vec<&'a AssetConfig> {
    if symbol.eq_ignore_ascii_case("all") {
        return assets.iter().collect();
    }

    assets
        .iter()
        .filter(|asset| asset.symbol.eq_ignore_ascii_case(symbol))
        .collect()
}
