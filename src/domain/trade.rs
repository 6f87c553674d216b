//! Trade ledger entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeKind {
    Buy,
    Sell,
    StopLoss,
    Skip,
}

impl TradeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeKind::Buy => "BUY",
            TradeKind::Sell => "SELL",
            TradeKind::StopLoss => "STOP_LOSS",
            TradeKind::Skip => "SKIP",
        }
    }
}

impl std::fmt::Display for TradeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A ledger entry, including the post-trade account snapshot.
///
/// `shares_delta` and `cash_delta` are signed from the account's point of view:
/// a BUY adds shares and removes cash, SELL and STOP_LOSS do the opposite, and a
/// SKIP changes nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub kind: TradeKind,
    pub price: f64,
    pub shares_delta: f64,
    pub cash_delta: f64,
    /// Price drawdown percentage on the trade date.
    pub drawdown: f64,
    pub reason: String,
    pub shares_value: f64,
    pub remaining_cash: f64,
    pub holdings: f64,
    pub total_assets: f64,
}

impl Trade {
    pub fn amount_usd(&self) -> f64 {
        self.cash_delta.abs()
    }

    pub fn is_buy(&self) -> bool {
        self.kind == TradeKind::Buy
    }
}

/// Drawdown recorded by the most recent BUY in the ledger.
pub fn last_buy_drawdown(trades: &[Trade]) -> Option<f64> {
    trades.iter().rev().find(|t| t.is_buy()).map(|t| t.drawdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_trade(kind: TradeKind, drawdown: f64) -> Trade {
        Trade {
            date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
            kind,
            price: 50.0,
            shares_delta: 2.0,
            cash_delta: -100.0,
            drawdown,
            reason: "test".into(),
            shares_value: 100.0,
            remaining_cash: 900.0,
            holdings: 2.0,
            total_assets: 1000.0,
        }
    }

    #[test]
    fn amount_is_absolute_cash_delta() {
        let trade = sample_trade(TradeKind::Buy, 5.0);
        assert!((trade.amount_usd() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn kind_display() {
        assert_eq!(TradeKind::StopLoss.to_string(), "STOP_LOSS");
        assert_eq!(TradeKind::Skip.to_string(), "SKIP");
    }

    #[test]
    fn last_buy_drawdown_skips_other_kinds() {
        let trades = vec![
            sample_trade(TradeKind::Buy, 5.0),
            sample_trade(TradeKind::Buy, 10.0),
            sample_trade(TradeKind::Skip, 15.0),
            sample_trade(TradeKind::StopLoss, 20.0),
        ];
        assert_eq!(last_buy_drawdown(&trades), Some(10.0));
    }

    #[test]
    fn last_buy_drawdown_none_without_buys() {
        let trades = vec![sample_trade(TradeKind::Skip, 5.0)];
        assert_eq!(last_buy_drawdown(&trades), None);
        assert_eq!(last_buy_drawdown(&[]), None);
    }

    #[test]
    fn serializes_kind_as_type_field() {
        let json = serde_json::to_value(sample_trade(TradeKind::StopLoss, 0.0)).unwrap();
        assert_eq!(json["type"], "STOP_LOSS");
        assert_eq!(json["date"], "2024-03-04");
        assert_eq!(json["sharesDelta"], 2.0);
        assert_eq!(json["remainingCash"], 900.0);
    }
}
