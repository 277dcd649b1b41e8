//! Minimal Ethereum ABI helpers
//!
//! Only what the tracker reads: two view calls on the yield-bearing token,
//! the pool's `Supply`/`Withdraw` logs and JSON-RPC hex quantities. Event
//! topics are the keccak-256 hashes of the event signatures, precomputed.

use std::fmt;
use std::str::FromStr;

use primitive_types::U256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{YieldError, YieldResult};

/// `balanceOf(address)`
pub const BALANCE_OF_SELECTOR: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];

/// `decimals()`
pub const DECIMALS_SELECTOR: [u8; 4] = [0x31, 0x3c, 0xe5, 0x67];

/// `Supply(address,address,address,uint256,uint16)`
pub const SUPPLY_TOPIC: &str =
    "0x2b627736bca15cd5381dcf80b0bf11fd197d01a037c52b927a881a10fb73ba61";

/// `Withdraw(address,address,address,uint256)`
pub const WITHDRAW_TOPIC: &str =
    "0x3115d1449a7b732c986cba18244e897a450f61e1bb8d589cd2e69e6c8924f9f7";

const WORD_BYTES: usize = 32;

/// 20-byte account or contract address
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address([u8; 20]);

impl Address {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Left-padded 32-byte word, as used for indexed topics and call args
    pub fn to_word(&self) -> [u8; WORD_BYTES] {
        let mut word = [0u8; WORD_BYTES];
        word[WORD_BYTES - 20..].copy_from_slice(&self.0);
        word
    }

    /// Topic filter value for an indexed address parameter
    pub fn to_topic(&self) -> String {
        format!("0x{}", hex::encode(self.to_word()))
    }
}

impl FromStr for Address {
    type Err = YieldError;

    /// Parses `0x`-prefixed 40-digit hex; mixed-case checksums are accepted but not verified
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| YieldError::InvalidAddress(s.to_string()))?;

        if digits.len() != 40 {
            return Err(YieldError::InvalidAddress(s.to_string()));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|_| YieldError::InvalidAddress(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Encode calldata for a call taking only address arguments
pub fn encode_call(selector: [u8; 4], args: &[Address]) -> String {
    let mut data = Vec::with_capacity(4 + args.len() * WORD_BYTES);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(&arg.to_word());
    }
    format!("0x{}", hex::encode(data))
}

/// Split `0x`-prefixed ABI data into 32-byte words
pub fn decode_words(data: &str) -> YieldResult<Vec<U256>> {
    let digits = data.strip_prefix("0x").unwrap_or(data);
    let bytes = hex::decode(digits)?;

    if bytes.len() % WORD_BYTES != 0 {
        return Err(YieldError::malformed(format!(
            "ABI data of {} bytes is not word aligned",
            bytes.len()
        )));
    }

    Ok(bytes.chunks(WORD_BYTES).map(U256::from_big_endian).collect())
}

/// Decode the word at `index` of ABI data
pub fn decode_word(data: &str, index: usize) -> YieldResult<U256> {
    decode_words(data)?
        .get(index)
        .copied()
        .ok_or_else(|| YieldError::malformed(format!("ABI data has no word {}", index)))
}

/// Narrow a uint256 to u128
pub fn word_to_u128(word: U256) -> YieldResult<u128> {
    if word.bits() > 128 {
        return Err(YieldError::malformed(format!("value {} exceeds 128 bits", word)));
    }
    Ok(word.low_u128())
}

/// Parse a JSON-RPC QUANTITY (`0x`-prefixed, no leading zeros required)
pub fn parse_quantity(quantity: &str) -> YieldResult<u64> {
    let digits = quantity
        .strip_prefix("0x")
        .ok_or_else(|| YieldError::malformed(format!("quantity '{}' lacks 0x prefix", quantity)))?;

    u64::from_str_radix(digits, 16)
        .map_err(|e| YieldError::malformed(format!("quantity '{}': {}", quantity, e)))
}

/// Format a block number as a JSON-RPC QUANTITY
pub fn format_quantity(value: u64) -> String {
    format!("0x{:x}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    const USDC: &str = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48";

    #[test]
    fn test_address_parsing() {
        let address: Address = USDC.parse().unwrap();
        assert_eq!(address.to_string(), USDC.to_lowercase());

        assert!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48".parse::<Address>().is_err());
        assert!("0x1234".parse::<Address>().is_err());
        assert!("0xZZb86991c6218b36c1d19D4a2e9Eb0cE3606eB48".parse::<Address>().is_err());
    }

    #[test]
    fn test_topic_padding() {
        let address: Address = USDC.parse().unwrap();
        let topic = address.to_topic();

        assert_eq!(topic.len(), 66);
        assert!(topic.starts_with("0x000000000000000000000000a0b86991"));
    }

    #[test]
    fn test_balance_of_calldata() {
        let address: Address = USDC.parse().unwrap();
        let data = encode_call(BALANCE_OF_SELECTOR, &[address]);

        assert_eq!(
            data,
            "0x70a08231000000000000000000000000a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48"
        );
        assert_eq!(encode_call(DECIMALS_SELECTOR, &[]), "0x313ce567");
    }

    #[test]
    fn test_word_decoding() {
        let data = format!("0x{:0>64}{:0>64}", "abc", "f4240");
        let words = decode_words(&data).unwrap();

        assert_eq!(words.len(), 2);
        assert_eq!(word_to_u128(words[1]).unwrap(), 1_000_000);
        assert_eq!(word_to_u128(decode_word(&data, 0).unwrap()).unwrap(), 0xabc);
        assert!(decode_word(&data, 2).is_err());
    }

    #[test]
    fn test_misaligned_data_rejected() {
        assert!(matches!(
            decode_words("0x0102"),
            Err(YieldError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_wide_word_rejected() {
        assert!(word_to_u128(U256::MAX).is_err());
        assert_eq!(word_to_u128(U256::from(u128::MAX)).unwrap(), u128::MAX);
    }

    #[test]
    fn test_quantities() {
        assert_eq!(parse_quantity("0x10d4f").unwrap(), 68943);
        assert_eq!(parse_quantity("0x0").unwrap(), 0);
        assert!(parse_quantity("1234").is_err());
        assert_eq!(format_quantity(68943), "0x10d4f");
    }
}
