//! Drawdown-ladder strategy parameters.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::LadderError;

pub const DEFAULT_INITIAL_CASH: f64 = 100_000.0;
pub const DEFAULT_INITIAL_INVESTMENT: f64 = 1_000.0;
pub const DEFAULT_DROP_INTERVAL: f64 = 5.0;
pub const DEFAULT_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_SELL_RECOVERY: f64 = 50.0;
pub const DEFAULT_MAX_STEPS: u32 = 10;
pub const DEFAULT_STOP_LOSS: f64 = 25.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyConfig {
    pub initial_cash: f64,
    pub start_date: NaiveDate,
    pub initial_investment: f64,
    /// Percentage points of price drawdown between successive ladder steps.
    pub drop_interval: f64,
    pub multiplier: f64,
    /// Percentage of the entry drawdown that must be recovered before a full sell.
    pub sell_recovery: f64,
    pub max_steps: u32,
    /// Portfolio drawdown percentage that triggers a partial stop-loss sell.
    pub stop_loss: f64,
}

impl StrategyConfig {
    /// Config with the input-form defaults.
    pub fn with_defaults(start_date: NaiveDate) -> Self {
        StrategyConfig {
            initial_cash: DEFAULT_INITIAL_CASH,
            start_date,
            initial_investment: DEFAULT_INITIAL_INVESTMENT,
            drop_interval: DEFAULT_DROP_INTERVAL,
            multiplier: DEFAULT_MULTIPLIER,
            sell_recovery: DEFAULT_SELL_RECOVERY,
            max_steps: DEFAULT_MAX_STEPS,
            stop_loss: DEFAULT_STOP_LOSS,
        }
    }

    /// Purchase size for a ladder step: `initial_investment * multiplier^step`.
    pub fn purchase_amount(&self, step: u32) -> f64 {
        self.initial_investment * self.multiplier.powi(step as i32)
    }

    /// Drawdown percentage at which `step` becomes eligible to buy.
    pub fn trigger_drawdown(&self, step: u32) -> f64 {
        step as f64 * self.drop_interval
    }

    pub fn validate(&self) -> Result<(), LadderError> {
        if !(self.initial_cash > 0.0) {
            return Err(LadderError::invalid(
                "backtest",
                "initial_cash",
                "initial_cash must be positive",
            ));
        }
        if !(self.initial_investment > 0.0) {
            return Err(LadderError::invalid(
                "strategy",
                "initial_investment",
                "initial_investment must be positive",
            ));
        }
        if !(self.drop_interval > 0.0) {
            return Err(LadderError::invalid(
                "strategy",
                "drop_interval",
                "drop_interval must be positive",
            ));
        }
        if !(self.multiplier >= 1.0) {
            return Err(LadderError::invalid(
                "strategy",
                "multiplier",
                "multiplier must be at least 1",
            ));
        }
        if !(self.sell_recovery > 0.0) {
            return Err(LadderError::invalid(
                "strategy",
                "sell_recovery",
                "sell_recovery must be positive",
            ));
        }
        if self.max_steps < 1 {
            return Err(LadderError::invalid(
                "strategy",
                "max_steps",
                "max_steps must be at least 1",
            ));
        }
        if !(self.stop_loss > 0.0 && self.stop_loss <= 100.0) {
            return Err(LadderError::invalid(
                "strategy",
                "stop_loss",
                "stop_loss must be in (0, 100]",
            ));
        }
        Ok(())
    }
}
