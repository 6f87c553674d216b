#![allow(dead_code)]

use chrono::NaiveDate;
use laddertrader::domain::error::LadderError;
pub use laddertrader::domain::price_bar::PriceBar;
use laddertrader::domain::strategy::StrategyConfig;
use laddertrader::ports::data_port::DataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<PriceBar>) -> Self {
        self.data.insert(symbol.to_string(), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, LadderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(LadderError::DataSource {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.date >= start_date && b.date <= end_date)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, LadderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(LadderError::DataSource {
                reason: reason.clone(),
            });
        }
        match self.data.get(symbol) {
            Some(bars) if !bars.is_empty() => {
                let min = bars.iter().map(|b| b.date).min().unwrap();
                let max = bars.iter().map(|b| b.date).max().unwrap();
                Ok(Some((min, max, bars.len())))
            }
            _ => Ok(None),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn start_date() -> NaiveDate {
    date(2024, 1, 1)
}

/// One bar per consecutive calendar day starting at `start_date()`.
pub fn bars_from_closes(closes: &[f64]) -> Vec<PriceBar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar::new(start_date() + chrono::Duration::days(i as i64), close))
        .collect()
}

pub fn flat_bars(count: usize, close: f64) -> Vec<PriceBar> {
    bars_from_closes(&vec![close; count])
}

pub fn sample_config() -> StrategyConfig {
    StrategyConfig::with_defaults(start_date())
}

/// Small ladder: 100 at step 0 doubling every 10 points, 1000 cash.
pub fn small_config() -> StrategyConfig {
    StrategyConfig {
        initial_cash: 1_000.0,
        initial_investment: 100.0,
        drop_interval: 10.0,
        multiplier: 2.0,
        sell_recovery: 50.0,
        max_steps: 10,
        stop_loss: 25.0,
        ..StrategyConfig::with_defaults(start_date())
    }
}
