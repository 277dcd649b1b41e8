use serde::{Deserialize, Serialize};

/// Direction of a pool flow relative to the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowKind {
    /// Supply into the pool on behalf of the account
    Deposit,
    /// Withdrawal out of the pool by the account
    Withdrawal,
}

/// One timestamped supply or withdrawal of the account
///
/// `amount` is the raw value from the event log, in the asset's smallest
/// unit. It is only converted to a decimal inside the position reduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositEvent {
    pub kind: FlowKind,
    pub amount: u128,
    /// Block timestamp, seconds since epoch
    pub timestamp: i64,
    pub block_number: u64,
    pub transaction_hash: String,
}

impl DepositEvent {
    /// Create a deposit without ledger provenance
    pub fn deposit(amount: u128, timestamp: i64) -> Self {
        Self {
            kind: FlowKind::Deposit,
            amount,
            timestamp,
            block_number: 0,
            transaction_hash: String::new(),
        }
    }

    /// Create a withdrawal without ledger provenance
    pub fn withdrawal(amount: u128, timestamp: i64) -> Self {
        Self {
            kind: FlowKind::Withdrawal,
            ..Self::deposit(amount, timestamp)
        }
    }

    /// Seconds the amount has been in (or out of) the pool at `now`
    ///
    /// Timestamps ahead of `now` count as zero elapsed time.
    pub fn elapsed(&self, now: i64) -> i64 {
        now.saturating_sub(self.timestamp).max(0)
    }

    pub fn is_deposit(&self) -> bool {
        self.kind == FlowKind::Deposit
    }
}

/// Sort flows oldest first, ties broken by block number
pub fn sort_chronologically(flows: &mut [DepositEvent]) {
    flows.sort_by_key(|flow| (flow.timestamp, flow.block_number));
}
