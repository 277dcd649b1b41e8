/// Position reduction: balance + flow history -> interest and APY
///
/// The reduction is the exposure-weighted rate estimate:
///
/// ```text
/// supplied  = Σ deposits − Σ withdrawals
/// interest  = balance − supplied
/// exposure  = Σ ±amount_i × (now − t_i)          [asset units · seconds]
/// apy       = interest × SECONDS_PER_YEAR / exposure
/// ```
///
/// All amounts are converted with the same `decimals` before any
/// arithmetic, so interest and exposure share a unit.
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{to_decimal, DepositEvent, FlowKind, MathError, MathResult, SECONDS_PER_YEAR};

/// Annualized yield estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Apy {
    /// Yield as a fraction per year (0.1 == 10%)
    Annualized(Decimal),
    /// No positive exposure to divide by
    InsufficientData,
}

impl Apy {
    /// Yield in percent, if one could be derived
    pub fn as_percent(&self) -> Option<Decimal> {
        match self {
            Apy::Annualized(rate) => rate.checked_mul(Decimal::ONE_HUNDRED),
            Apy::InsufficientData => None,
        }
    }
}

/// Derived view of one account in one reserve
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPosition {
    pub current_balance: Decimal,
    /// Net amount supplied by the account (deposits minus counted withdrawals)
    pub total_deposited: Decimal,
    pub interest: Decimal,
    pub apy: Apy,
    /// Time-weighted supply, in asset units times seconds
    pub exposure: Decimal,
    /// Precision the raw values were converted with
    pub decimals: u32,
}

impl AccountPosition {
    /// Underlying supply implied by the balance, `balance - interest`
    pub fn underlying_supply(&self) -> Decimal {
        self.current_balance - self.interest
    }
}

/// Sum raw amounts of one flow kind
pub fn total_raw(flows: &[DepositEvent], kind: FlowKind) -> MathResult<u128> {
    flows
        .iter()
        .filter(|flow| flow.kind == kind)
        .try_fold(0u128, |acc, flow| {
            acc.checked_add(flow.amount)
                .ok_or_else(|| MathError::overflow("flow total"))
        })
}

/// Net supplied amount at the given precision
pub fn net_supplied(flows: &[DepositEvent], decimals: u32) -> MathResult<Decimal> {
    let deposited = to_decimal(total_raw(flows, FlowKind::Deposit)?, decimals)?;
    let withdrawn = to_decimal(total_raw(flows, FlowKind::Withdrawal)?, decimals)?;

    deposited
        .checked_sub(withdrawn)
        .ok_or_else(|| MathError::overflow("net supplied"))
}

/// Time-weighted exposure `Σ ±amount_i × (now − t_i)` in units·seconds
pub fn exposure(flows: &[DepositEvent], decimals: u32, now: i64) -> MathResult<Decimal> {
    flows.iter().try_fold(Decimal::ZERO, |acc, flow| {
        let amount = to_decimal(flow.amount, decimals)?;
        let weighted = amount
            .checked_mul(Decimal::from(flow.elapsed(now)))
            .ok_or_else(|| MathError::overflow("exposure term"))?;

        let next = match flow.kind {
            FlowKind::Deposit => acc.checked_add(weighted),
            FlowKind::Withdrawal => acc.checked_sub(weighted),
        };
        next.ok_or_else(|| MathError::overflow("exposure sum"))
    })
}

/// Extrapolate interest earned over `exposure` to one year
///
/// Multiplies before dividing so that whole-year exposures come out exact.
pub fn annualize(interest: Decimal, exposure: Decimal) -> MathResult<Apy> {
    if exposure <= Decimal::ZERO {
        return Ok(Apy::InsufficientData);
    }

    let rate = interest
        .checked_mul(Decimal::from(SECONDS_PER_YEAR))
        .and_then(|scaled| scaled.checked_div(exposure))
        .ok_or_else(|| MathError::overflow("annualize"))?;

    Ok(Apy::Annualized(rate))
}

/// Reduce a raw balance and its flow history into an `AccountPosition`
pub fn compute_position(
    raw_balance: u128,
    decimals: u32,
    flows: &[DepositEvent],
    now: i64,
) -> MathResult<AccountPosition> {
    let current_balance = to_decimal(raw_balance, decimals)?;
    let total_deposited = net_supplied(flows, decimals)?;
    let interest = current_balance
        .checked_sub(total_deposited)
        .ok_or_else(|| MathError::overflow("interest"))?;
    let exposure = exposure(flows, decimals, now)?;
    let apy = annualize(interest, exposure)?;

    Ok(AccountPosition {
        current_balance,
        total_deposited,
        interest,
        apy,
        exposure,
        decimals,
    })
}
