//! Summary statistics and chart series derived from a simulation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::backtest::SimulationOutput;
use super::error::LadderError;
use super::portfolio::PortfolioSnapshot;
use super::price_bar::PriceBar;
use super::strategy::StrategyConfig;
use super::trade::{Trade, TradeKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartData {
    pub dates: Vec<NaiveDate>,
    pub portfolio_values: Vec<f64>,
    pub buy_hold_values: Vec<f64>,
    pub tqqq_prices: Vec<f64>,
    pub drawdowns: Vec<f64>,
    pub portfolio_drawdowns: Vec<f64>,
}

impl ChartData {
    /// Portfolio values rebased so the first point is 100.
    pub fn normalized_portfolio(&self) -> Vec<f64> {
        match self.portfolio_values.first() {
            Some(&base) if base != 0.0 => self
                .portfolio_values
                .iter()
                .map(|v| v / base * 100.0)
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// Headline figures are rounded to whole units; series and trades keep full
/// precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultBundle {
    /// Starting capital (reported under this name for the consuming UI).
    pub initial_investment: f64,
    pub final_portfolio_value: f64,
    pub total_return: f64,
    pub number_of_purchases: usize,
    pub total_invested: f64,
    pub remaining_cash: f64,
    pub max_drawdown: f64,
    pub portfolio_max_drawdown: f64,
    pub chart_data: ChartData,
    pub trade_history: Vec<Trade>,
}

/// Largest committed capital (holdings plus cash) at any single BUY.
pub fn peak_invested(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .filter(|t| t.kind == TradeKind::Buy)
        .map(|t| t.shares_value + t.remaining_cash)
        .fold(0.0, f64::max)
}

fn max_of(history: &[PortfolioSnapshot], field: impl Fn(&PortfolioSnapshot) -> f64) -> f64 {
    history.iter().map(field).fold(f64::NEG_INFINITY, f64::max)
}

pub fn summarize(
    output: &SimulationOutput,
    bars: &[PriceBar],
    config: &StrategyConfig,
) -> Result<ResultBundle, LadderError> {
    let (first, last) = match (bars.first(), bars.last()) {
        (Some(first), Some(last)) if !output.history.is_empty() => (first, last),
        _ => return Err(LadderError::EmptyHistory),
    };

    let initial_cash = config.initial_cash;
    let final_value = output.final_cash + output.final_shares * last.close;
    let buy_hold_units = initial_cash / first.close;
    let history = &output.history;

    let chart_data = ChartData {
        dates: history.iter().map(|h| h.date).collect(),
        portfolio_values: history.iter().map(|h| h.portfolio_value).collect(),
        buy_hold_values: history.iter().map(|h| h.price * buy_hold_units).collect(),
        tqqq_prices: history.iter().map(|h| h.price).collect(),
        drawdowns: history.iter().map(|h| h.price_drawdown_pct).collect(),
        portfolio_drawdowns: history.iter().map(|h| h.portfolio_drawdown_pct).collect(),
    };

    Ok(ResultBundle {
        initial_investment: initial_cash,
        final_portfolio_value: final_value.round(),
        total_return: ((final_value - initial_cash) / initial_cash * 100.0).round(),
        number_of_purchases: output.trades.iter().filter(|t| t.is_buy()).count(),
        total_invested: peak_invested(&output.trades).round(),
        remaining_cash: output.final_cash.round(),
        max_drawdown: max_of(history, |h| h.price_drawdown_pct),
        portfolio_max_drawdown: max_of(history, |h| h.portfolio_drawdown_pct),
        chart_data,
        trade_history: output.trades.clone(),
    })
}
