//! Simulation state and per-bar portfolio snapshots.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::price_bar::drawdown_pct;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub date: NaiveDate,
    pub portfolio_value: f64,
    pub price: f64,
    pub price_drawdown_pct: f64,
    pub portfolio_drawdown_pct: f64,
}

/// Mutable account state carried through one backtest run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationState {
    pub cash: f64,
    pub shares: f64,
    /// Current buy-ladder index; reset to 0 after a full sell or stop-loss.
    pub step: u32,
    pub price_running_max: f64,
    pub portfolio_running_max: f64,
}

impl SimulationState {
    pub fn new(initial_cash: f64, reference_price: f64) -> Self {
        SimulationState {
            cash: initial_cash,
            shares: 0.0,
            step: 0,
            price_running_max: reference_price,
            portfolio_running_max: initial_cash,
        }
    }

    pub fn holdings_value(&self, price: f64) -> f64 {
        self.shares * price
    }

    pub fn total_value(&self, price: f64) -> f64 {
        self.cash + self.holdings_value(price)
    }

    /// Raise both running maxima to include this bar.
    pub fn observe(&mut self, price: f64, portfolio_value: f64) {
        self.price_running_max = self.price_running_max.max(price);
        self.portfolio_running_max = self.portfolio_running_max.max(portfolio_value);
    }

    pub fn price_drawdown(&self, price: f64) -> f64 {
        drawdown_pct(self.price_running_max, price)
    }

    pub fn portfolio_drawdown(&self, portfolio_value: f64) -> f64 {
        drawdown_pct(self.portfolio_running_max, portfolio_value)
    }
}
