//! Ledger data source port and its JSON-RPC adapter

use async_trait::async_trait;
use yield_math::FlowKind;

use crate::abi::{
    decode_word, encode_call, parse_quantity, word_to_u128, Address, BALANCE_OF_SELECTOR,
    DECIMALS_SELECTOR, SUPPLY_TOPIC, WITHDRAW_TOPIC,
};
use crate::config::RpcSettings;
use crate::error::{YieldError, YieldResult};
use crate::rpc_client::{EthRpcClient, LogEntry, LogFilter};

/// Pool flows of one account in one reserve
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowQuery {
    pub pool: Address,
    pub reserve: Address,
    pub account: Address,
    pub kind: FlowKind,
}

/// Flow log before its block timestamp is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFlow {
    pub kind: FlowKind,
    pub amount: u128,
    pub block_number: u64,
    pub transaction_hash: String,
}

/// Read access to the chain, as needed by the calculator
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Raw token balance of `account`
    async fn balance_of(&self, token: &Address, account: &Address) -> YieldResult<u128>;

    /// Token precision reported by the contract
    async fn decimals(&self, token: &Address) -> YieldResult<u32>;

    /// Every flow log matching `query`, in source order
    async fn flows(&self, query: &FlowQuery) -> YieldResult<Vec<RawFlow>>;

    /// Timestamp of block `number`, seconds since epoch
    async fn block_timestamp(&self, number: u64) -> YieldResult<i64>;
}

/// `LedgerSource` backed by an Ethereum JSON-RPC endpoint
pub struct RpcLedgerSource {
    client: EthRpcClient,
}

impl RpcLedgerSource {
    pub fn new(url: &str, settings: &RpcSettings) -> Self {
        Self {
            client: EthRpcClient::new(url, settings),
        }
    }

    pub fn url(&self) -> &str {
        self.client.url()
    }
}

/// Topic filter for a flow query
///
/// `Supply(reserve indexed, user, onBehalfOf indexed, amount, referralCode indexed)`
/// is matched on the beneficiary; `Withdraw(reserve indexed, user indexed,
/// to indexed, amount)` on the withdrawing user.
pub fn flow_topics(query: &FlowQuery) -> Vec<Option<String>> {
    let signature = match query.kind {
        FlowKind::Deposit => SUPPLY_TOPIC,
        FlowKind::Withdrawal => WITHDRAW_TOPIC,
    };

    vec![
        Some(signature.to_string()),
        Some(query.reserve.to_topic()),
        Some(query.account.to_topic()),
    ]
}

/// Decode a flow log into its amount and provenance
pub fn decode_flow(kind: FlowKind, log: &LogEntry) -> YieldResult<RawFlow> {
    // Supply data is (user, amount); Withdraw data is (amount)
    let amount_index = match kind {
        FlowKind::Deposit => 1,
        FlowKind::Withdrawal => 0,
    };
    let amount = word_to_u128(decode_word(&log.data, amount_index)?)?;

    let block_number = log
        .block_number
        .as_deref()
        .ok_or_else(|| YieldError::malformed("log without block number"))
        .and_then(parse_quantity)?;

    Ok(RawFlow {
        kind,
        amount,
        block_number,
        transaction_hash: log.transaction_hash.clone().unwrap_or_default(),
    })
}

#[async_trait]
impl LedgerSource for RpcLedgerSource {
    async fn balance_of(&self, token: &Address, account: &Address) -> YieldResult<u128> {
        let data = encode_call(BALANCE_OF_SELECTOR, &[*account]);
        let result = self.client.eth_call(token, &data).await?;
        word_to_u128(decode_word(&result, 0)?)
    }

    async fn decimals(&self, token: &Address) -> YieldResult<u32> {
        let data = encode_call(DECIMALS_SELECTOR, &[]);
        let result = self.client.eth_call(token, &data).await?;
        let decimals = word_to_u128(decode_word(&result, 0)?)?;

        u32::try_from(decimals)
            .ok()
            .filter(|d| *d <= u8::MAX as u32)
            .ok_or_else(|| YieldError::malformed(format!("decimals() returned {}", decimals)))
    }

    async fn flows(&self, query: &FlowQuery) -> YieldResult<Vec<RawFlow>> {
        let filter = LogFilter::full_history(query.pool, flow_topics(query));
        let logs = self.client.get_logs(&filter).await?;

        logs.iter().map(|log| decode_flow(query.kind, log)).collect()
    }

    async fn block_timestamp(&self, number: u64) -> YieldResult<i64> {
        let header = self.client.get_block_by_number(number).await?;
        let timestamp = parse_quantity(&header.timestamp)?;

        i64::try_from(timestamp)
            .map_err(|_| YieldError::malformed(format!("block timestamp {} out of range", timestamp)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetConfig, AAVE_V3_POOL};

    fn account() -> Address {
        "0x1111111111111111111111111111111111111111".parse().unwrap()
    }

    fn log(data: String, block: Option<&str>) -> LogEntry {
        LogEntry {
            address: AAVE_V3_POOL.to_string(),
            topics: vec![],
            data,
            block_number: block.map(str::to_string),
            transaction_hash: Some("0xabc".to_string()),
            removed: false,
        }
    }

    #[test]
    fn test_supply_topics() {
        let query = FlowQuery {
            pool: AAVE_V3_POOL,
            reserve: AssetConfig::usdc().underlying,
            account: account(),
            kind: FlowKind::Deposit,
        };
        let topics = flow_topics(&query);

        assert_eq!(topics[0].as_deref(), Some(SUPPLY_TOPIC));
        assert_eq!(
            topics[1].as_deref(),
            Some("0x000000000000000000000000a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48")
        );
        assert_eq!(
            topics[2].as_deref(),
            Some("0x0000000000000000000000001111111111111111111111111111111111111111")
        );
    }

    #[test]
    fn test_withdraw_topics() {
        let query = FlowQuery {
            pool: AAVE_V3_POOL,
            reserve: AssetConfig::usdt().underlying,
            account: account(),
            kind: FlowKind::Withdrawal,
        };
        assert_eq!(flow_topics(&query)[0].as_deref(), Some(WITHDRAW_TOPIC));
    }

    #[test]
    fn test_decode_supply_log() {
        let data = format!("0x{:0>64}{:0>64}", "1111111111111111111111111111111111111111", "f4240");
        let flow = decode_flow(FlowKind::Deposit, &log(data, Some("0x10"))).unwrap();

        assert_eq!(flow.amount, 1_000_000);
        assert_eq!(flow.block_number, 16);
        assert_eq!(flow.transaction_hash, "0xabc");
    }

    #[test]
    fn test_decode_withdraw_log() {
        let data = format!("0x{:0>64}", "7a120");
        let flow = decode_flow(FlowKind::Withdrawal, &log(data, Some("0x20"))).unwrap();

        assert_eq!(flow.amount, 500_000);
        assert_eq!(flow.kind, FlowKind::Withdrawal);
    }

    #[test]
    fn test_pending_log_rejected() {
        let data = format!("0x{:0>64}{:0>64}", "0", "1");
        assert!(decode_flow(FlowKind::Deposit, &log(data, None)).is_err());
    }

    #[test]
    fn test_truncated_supply_data_rejected() {
        let data = format!("0x{:0>64}", "1");
        assert!(matches!(
            decode_flow(FlowKind::Deposit, &log(data, Some("0x1"))),
            Err(YieldError::MalformedResponse(_))
        ));
    }
}
