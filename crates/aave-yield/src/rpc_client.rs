//! Lightweight Ethereum JSON-RPC client
//!
//! A minimal client that implements only the methods the tracker needs:
//! `eth_call`, `eth_getLogs` and `eth_getBlockByNumber`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::abi::{format_quantity, parse_quantity, Address};
use crate::config::RpcSettings;
use crate::error::{YieldError, YieldResult};

/// Lightweight RPC client for an Ethereum node
#[derive(Clone)]
pub struct EthRpcClient {
    url: String,
    agent: ureq::Agent,
}

/// RPC response wrapper
#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

/// RPC error structure
#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// `eth_getLogs` filter
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    pub address: Address,
    pub from_block: String,
    pub to_block: String,
    /// Positional topics; `None` matches any value
    pub topics: Vec<Option<String>>,
}

impl LogFilter {
    /// Filter over the whole chain history
    pub fn full_history(address: Address, topics: Vec<Option<String>>) -> Self {
        Self {
            address,
            from_block: format_quantity(0),
            to_block: "latest".to_string(),
            topics,
        }
    }
}

/// Log record returned by `eth_getLogs`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: Option<String>,
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub removed: bool,
}

/// Subset of a block header
#[derive(Debug, Clone, Deserialize)]
pub struct BlockHeader {
    pub number: Option<String>,
    pub timestamp: String,
}

impl EthRpcClient {
    /// Create a new lightweight RPC client
    pub fn new(url: &str, settings: &RpcSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(settings.connect_timeout())
            .timeout_read(settings.read_timeout())
            .build();

        Self {
            url: url.to_string(),
            agent,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Make a JSON-RPC call
    async fn call<T>(&self, method: &str, params: Value) -> YieldResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        let request_body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        debug!("RPC call: {} with params: {}", method, params);

        // Use blocking call since ureq is sync
        let response_body = tokio::task::spawn_blocking({
            let agent = self.agent.clone();
            let url = self.url.clone();
            let body = request_body.to_string();

            move || {
                let response = agent
                    .post(&url)
                    .set("Content-Type", "application/json")
                    .send_string(&body)
                    .map_err(|e| e.to_string())?;

                response.into_string().map_err(|e| e.to_string())
            }
        })
        .await
        .map_err(|e| self.unreachable(e.to_string()))?
        .map_err(|reason| self.unreachable(reason))?;

        parse_response(&response_body)
    }

    fn unreachable(&self, reason: String) -> YieldError {
        YieldError::SourceUnreachable {
            url: self.url.clone(),
            reason,
        }
    }

    /// Execute a read-only contract call at the latest block
    pub async fn eth_call(&self, to: &Address, data: &str) -> YieldResult<String> {
        let params = json!([
            {
                "to": to.to_string(),
                "data": data
            },
            "latest"
        ]);

        self.call("eth_call", params).await
    }

    /// Fetch logs matching `filter`, dropping logs removed by a reorg
    pub async fn get_logs(&self, filter: &LogFilter) -> YieldResult<Vec<LogEntry>> {
        let params = json!([serde_json::to_value(filter)?]);
        let logs: Vec<LogEntry> = self.call("eth_getLogs", params).await?;

        Ok(logs.into_iter().filter(|log| !log.removed).collect())
    }

    /// Fetch a block header without transactions
    pub async fn get_block_by_number(&self, number: u64) -> YieldResult<BlockHeader> {
        let params = json!([format_quantity(number), false]);
        let block: Option<BlockHeader> = self.call("eth_getBlockByNumber", params).await?;

        block.ok_or_else(|| YieldError::malformed(format!("block {} not found", number)))
    }

    /// Current chain head
    pub async fn block_number(&self) -> YieldResult<u64> {
        let quantity: String = self.call("eth_blockNumber", json!([])).await?;
        parse_quantity(&quantity)
    }
}

/// Decode a JSON-RPC response envelope
///
/// A `null` result is passed to `T`, so `Option<T>` callers see `None`.
fn parse_response<T>(body: &str) -> YieldResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    let rpc_response: RpcResponse<Value> = serde_json::from_str(body)?;

    if let Some(error) = rpc_response.error {
        return Err(YieldError::NodeRejected {
            code: error.code,
            message: error.message,
        });
    }

    let result = rpc_response.result.unwrap_or(Value::Null);
    Ok(serde_json::from_value(result)?)
}
