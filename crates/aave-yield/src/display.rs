//! Text and JSON rendering of position views

use std::fmt::Write;

use chrono::DateTime;
use rust_decimal::Decimal;
use yield_math::{Apy, DepositEvent, FlowKind, SECONDS_PER_DAY};

use crate::calculator::{PositionReport, PositionView};
use crate::error::FailureKind;

const DAYS_PER_MONTH: i64 = 30;

/// Human-readable age of a flow at `now`
///
/// Under 30 whole days: `"N days ago"`, otherwise `"M months and D days ago"`
/// with 30-day months.
pub fn humanize_age(now: i64, timestamp: i64) -> String {
    let days = now.saturating_sub(timestamp).max(0) / SECONDS_PER_DAY;

    if days < DAYS_PER_MONTH {
        format!("{} days ago", days)
    } else {
        format!(
            "{} months and {} days ago",
            days / DAYS_PER_MONTH,
            days % DAYS_PER_MONTH
        )
    }
}

fn format_amount(value: Decimal) -> String {
    value.normalize().to_string()
}

/// APY as a percentage, at most two decimals
pub fn format_apy(apy: &Apy) -> String {
    match apy.as_percent() {
        Some(percent) => format!("{}%", percent.round_dp(2).normalize()),
        None => "n/a (insufficient data)".to_string(),
    }
}

fn format_date(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn describe_failure(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::SourceUnreachable => "data source unreachable",
        FailureKind::MalformedResponse => "malformed response from data source",
        FailureKind::NoData => "no supply activity",
        FailureKind::Other => "fetch failed",
    }
}

fn render_flow(out: &mut String, flow: &DepositEvent, decimals: u32, now: i64) {
    let label = match flow.kind {
        FlowKind::Deposit => "supply",
        FlowKind::Withdrawal => "withdraw",
    };
    let amount = yield_math::to_decimal(flow.amount, decimals)
        .map(format_amount)
        .unwrap_or_else(|_| format!("{} (raw)", flow.amount));

    let _ = writeln!(
        out,
        "  {:<8} {:>18}  {}  ({})",
        label,
        amount,
        format_date(flow.timestamp),
        humanize_age(now, flow.timestamp)
    );
}

/// Multi-line text block for a successful pass
pub fn render_report(report: &PositionReport, now: i64) -> String {
    let position = &report.position;
    let mut out = String::new();

    let _ = writeln!(out, "a{} position of {}", report.symbol, report.account);
    let _ = writeln!(out, "  Balance:  {} a{}", format_amount(position.current_balance), report.symbol);
    let _ = writeln!(out, "  Supplied: {} {}", format_amount(position.underlying_supply()), report.symbol);
    let _ = writeln!(out, "  Interest: {} {}", format_amount(position.interest), report.symbol);
    let _ = writeln!(out, "  APY:      {}", format_apy(&position.apy));

    if report.deposits.is_empty() {
        let _ = writeln!(out, "  No supply events");
    } else {
        let _ = writeln!(out, "  Supply history:");
        for flow in &report.deposits {
            render_flow(&mut out, flow, position.decimals, now);
        }
    }

    out
}

/// Text block for whatever is shown for `symbol`
pub fn render_view(symbol: &str, view: &PositionView, now: i64) -> String {
    match view {
        PositionView::Empty => format!("a{}: not fetched\n", symbol),
        PositionView::Ready(report) => render_report(report, now),
        PositionView::Failed { kind, message } => {
            format!("a{}: {} ({})\n", symbol, describe_failure(*kind), message)
        }
    }
}

/// JSON document for a set of views
pub fn render_json(views: &[(String, PositionView)]) -> serde_json::Result<String> {
    let mut document = serde_json::Map::new();
    for (symbol, view) in views {
        document.insert(symbol.clone(), serde_json::to_value(view)?);
    }

    serde_json::to_string_pretty(&document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::Address;
    use yield_math::compute_position;

    const NOW: i64 = 1_700_000_000;

    fn days_ago(days: i64) -> i64 {
        NOW - days * SECONDS_PER_DAY
    }

    #[test]
    fn test_age_below_a_month() {
        assert_eq!(humanize_age(NOW, NOW), "0 days ago");
        assert_eq!(humanize_age(NOW, days_ago(1)), "1 days ago");
        assert_eq!(humanize_age(NOW, days_ago(29)), "29 days ago");
        // 29 days and 23 hours is still 29 whole days
        assert_eq!(humanize_age(NOW, days_ago(30) + 3600), "29 days ago");
    }

    #[test]
    fn test_age_month_boundary() {
        assert_eq!(humanize_age(NOW, days_ago(30)), "1 months and 0 days ago");
        assert_eq!(humanize_age(NOW, days_ago(31)), "1 months and 1 days ago");
        assert_eq!(humanize_age(NOW, days_ago(365)), "12 months and 5 days ago");
    }

    #[test]
    fn test_future_timestamp_is_today() {
        assert_eq!(humanize_age(NOW, NOW + 500), "0 days ago");
    }

    #[test]
    fn test_apy_formatting() {
        assert_eq!(format_apy(&Apy::Annualized(Decimal::new(1, 1))), "10%");
        assert_eq!(format_apy(&Apy::Annualized(Decimal::new(423456, 7))), "4.23%");
        assert_eq!(format_apy(&Apy::InsufficientData), "n/a (insufficient data)");
    }

    #[test]
    fn test_report_rendering() {
        let flows = vec![DepositEvent::deposit(1_000_000, days_ago(365))];
        let report = PositionReport {
            account: Address::default(),
            symbol: "USDC".to_string(),
            position: compute_position(1_100_000, 6, &flows, NOW).unwrap(),
            deposits: flows,
            fetched_at: NOW,
        };

        let text = render_report(&report, NOW);
        assert!(text.contains("Balance:  1.1 aUSDC"));
        assert!(text.contains("Supplied: 1 USDC"));
        assert!(text.contains("Interest: 0.1 USDC"));
        assert!(text.contains("APY:      10%"));
        assert!(text.contains("12 months and 5 days ago"));
    }

    #[test]
    fn test_failed_view_rendering() {
        let view = PositionView::Failed {
            kind: FailureKind::SourceUnreachable,
            message: "connection refused".to_string(),
        };
        let text = render_view("USDT", &view, NOW);

        assert_eq!(text, "aUSDT: data source unreachable (connection refused)\n");
        assert!(!text.contains("Interest"));
    }

    #[test]
    fn test_json_rendering() {
        let views = vec![
            ("USDC".to_string(), PositionView::Empty),
            (
                "USDT".to_string(),
                PositionView::Failed {
                    kind: FailureKind::NoData,
                    message: "none".to_string(),
                },
            ),
        ];
        let json = render_json(&views).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["USDC"]["state"], "empty");
        assert_eq!(value["USDT"]["state"], "failed");
        assert_eq!(value["USDT"]["kind"], "no_data");
    }
}
