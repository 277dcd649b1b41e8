//! Balance and yield calculator
//!
//! One pass per explicit fetch, awaited strictly in order:
//! balance -> decimals -> flow logs -> block timestamps. Any failing step
//! aborts the pass; nothing is retried.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use serde::Serialize;
use tracing::{error, info, warn};
use yield_math::{compute_position, sort_chronologically, AccountPosition, DepositEvent, FlowKind};

use crate::abi::Address;
use crate::assets::AssetConfig;
use crate::config::YieldPolicy;
use crate::endpoint::EndpointListener;
use crate::error::{FailureKind, YieldError, YieldResult};
use crate::source::{FlowQuery, LedgerSource};

/// Wall clock, seconds since epoch
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Clock pinned to one instant
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

/// Builds a data source for an endpoint URL
pub type SourceFactory = Arc<dyn Fn(&str) -> Arc<dyn LedgerSource> + Send + Sync>;

/// Result of one successful pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionReport {
    pub account: Address,
    pub symbol: String,
    pub position: AccountPosition,
    /// Flows oldest first
    pub deposits: Vec<DepositEvent>,
    pub fetched_at: i64,
}

/// What is currently shown for one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PositionView {
    Empty,
    Ready(PositionReport),
    Failed { kind: FailureKind, message: String },
}

pub struct YieldCalculator {
    pool: Address,
    policy: YieldPolicy,
    factory: SourceFactory,
    source: RwLock<Arc<dyn LedgerSource>>,
    clock: Arc<dyn Clock>,
    views: Mutex<HashMap<String, PositionView>>,
}

impl YieldCalculator {
    pub fn new(
        pool: Address,
        policy: YieldPolicy,
        factory: SourceFactory,
        endpoint_url: &str,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let source = factory(endpoint_url);
        Self {
            pool,
            policy,
            factory,
            source: RwLock::new(source),
            clock,
            views: Mutex::new(HashMap::new()),
        }
    }

    fn current_source(&self) -> Arc<dyn LedgerSource> {
        self.source.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Run one pass for `account` in `asset`
    pub async fn fetch(&self, account: &Address, asset: &AssetConfig) -> YieldResult<PositionReport> {
        // A pass keeps the source it started with, even if the endpoint changes
        let source = self.current_source();

        info!("Fetching {} position of {}", asset.symbol, account);

        let raw_balance = source.balance_of(&asset.a_token, account).await?;
        let decimals = source.decimals(&asset.a_token).await?;
        if decimals != asset.decimals {
            warn!(
                "{} token reports {} decimals, configured {}; using the token's value",
                asset.symbol, decimals, asset.decimals
            );
        }

        let mut flows = self
            .collect_flows(source.as_ref(), account, asset, FlowKind::Deposit)
            .await?;
        if self.policy.include_withdrawals {
            let withdrawals = self
                .collect_flows(source.as_ref(), account, asset, FlowKind::Withdrawal)
                .await?;
            flows.extend(withdrawals);
        }

        if flows.is_empty() && raw_balance == 0 {
            return Err(YieldError::NoData {
                account: account.to_string(),
                symbol: asset.symbol.clone(),
            });
        }

        let now = self.clock.now();
        let position = compute_position(raw_balance, decimals, &flows, now)?;
        sort_chronologically(&mut flows);

        info!(
            "{} balance {} interest {} over {} flows",
            asset.symbol,
            position.current_balance,
            position.interest,
            flows.len()
        );

        Ok(PositionReport {
            account: *account,
            symbol: asset.symbol.clone(),
            position,
            deposits: flows,
            fetched_at: now,
        })
    }

    async fn collect_flows(
        &self,
        source: &dyn LedgerSource,
        account: &Address,
        asset: &AssetConfig,
        kind: FlowKind,
    ) -> YieldResult<Vec<DepositEvent>> {
        let query = FlowQuery {
            pool: self.pool,
            reserve: asset.underlying,
            account: *account,
            kind,
        };
        let raw_flows = source.flows(&query).await?;

        // Several flows can share a block
        let mut timestamps: HashMap<u64, i64> = HashMap::new();
        let mut events = Vec::with_capacity(raw_flows.len());

        for raw in raw_flows {
            let timestamp = match timestamps.get(&raw.block_number) {
                Some(ts) => *ts,
                None => {
                    let ts = source.block_timestamp(raw.block_number).await?;
                    timestamps.insert(raw.block_number, ts);
                    ts
                }
            };

            events.push(DepositEvent {
                kind: raw.kind,
                amount: raw.amount,
                timestamp,
                block_number: raw.block_number,
                transaction_hash: raw.transaction_hash,
            });
        }

        Ok(events)
    }

    /// Run a pass and replace the view of `asset` with its outcome
    ///
    /// On failure the whole view is replaced, so no interest or APY from an
    /// earlier pass is left next to the failure.
    pub async fn refresh(&self, account: &Address, asset: &AssetConfig) -> PositionView {
        let view = match self.fetch(account, asset).await {
            Ok(report) => PositionView::Ready(report),
            Err(e) => {
                error!("Error fetching {} position of {}: {}", asset.symbol, account, e);
                PositionView::Failed {
                    kind: e.kind(),
                    message: e.to_string(),
                }
            }
        };

        self.views
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(asset.symbol.clone(), view.clone());
        view
    }

    /// Last view produced for `symbol`
    pub fn view(&self, symbol: &str) -> PositionView {
        self.views
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(symbol)
            .cloned()
            .unwrap_or(PositionView::Empty)
    }
}

impl EndpointListener for YieldCalculator {
    fn endpoint_changed(&self, url: &str) {
        let source = (self.factory)(url);
        *self.source.write().unwrap_or_else(|e| e.into_inner()) = source;
        info!("Rebuilt data source for {}", url);
    }
}
