//! HTTP request handlers for the web adapter.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::domain::backtest::run_backtest as run_backtest_engine;
use crate::domain::config_validation::parse_date;
use crate::domain::error::LadderError;
use crate::domain::metrics::ResultBundle;
use crate::domain::price_bar::PriceBar;
use crate::domain::price_series::{check_series, load_price_series};
use crate::domain::strategy::{
    DEFAULT_DROP_INTERVAL, DEFAULT_INITIAL_CASH, DEFAULT_INITIAL_INVESTMENT, DEFAULT_MAX_STEPS,
    DEFAULT_MULTIPLIER, DEFAULT_SELL_RECOVERY, DEFAULT_STOP_LOSS, StrategyConfig,
};

use super::{AppState, WebError};

/// Body of `POST /api/backtest`. Missing numeric fields take the form defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestRequest {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub symbol: Option<String>,
    pub initial_cash: Option<f64>,
    pub initial_investment: Option<f64>,
    pub drop_interval: Option<f64>,
    pub multiplier: Option<f64>,
    pub sell_recovery: Option<f64>,
    pub max_steps: Option<u32>,
    pub stop_loss: Option<f64>,
}

impl BacktestRequest {
    pub fn strategy_config(&self) -> Result<StrategyConfig, WebError> {
        let start_date = self.start_date()?;

        // An unset or zero stop-loss or step count falls back to the default.
        let stop_loss = match self.stop_loss {
            Some(v) if v != 0.0 => v,
            _ => DEFAULT_STOP_LOSS,
        };
        let max_steps = match self.max_steps {
            Some(v) if v != 0 => v,
            _ => DEFAULT_MAX_STEPS,
        };

        let config = StrategyConfig {
            initial_cash: self.initial_cash.unwrap_or(DEFAULT_INITIAL_CASH),
            start_date,
            initial_investment: self.initial_investment.unwrap_or(DEFAULT_INITIAL_INVESTMENT),
            drop_interval: self.drop_interval.unwrap_or(DEFAULT_DROP_INTERVAL),
            multiplier: self.multiplier.unwrap_or(DEFAULT_MULTIPLIER),
            sell_recovery: self.sell_recovery.unwrap_or(DEFAULT_SELL_RECOVERY),
            max_steps,
            stop_loss,
        };
        config.validate()?;
        Ok(config)
    }

    fn start_date(&self) -> Result<NaiveDate, WebError> {
        match self.start_date.as_deref().filter(|s| !s.trim().is_empty()) {
            None => Err(WebError::bad_request("Start date is required")),
            Some(s) => Ok(parse_date(Some(s), "backtest", "start_date")?),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDataQuery {
    pub symbol: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn resolve_symbol(state: &AppState, symbol: Option<&str>) -> String {
    symbol
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| state.default_symbol())
}

/// End of the requested range; today when the request leaves it open.
fn resolve_end_date(start: NaiveDate, end: Option<&str>) -> Result<NaiveDate, WebError> {
    let end = match end.filter(|s| !s.trim().is_empty()) {
        Some(s) => parse_date(Some(s), "backtest", "end_date")?,
        None => Local::now().date_naive(),
    };
    if end < start {
        return Err(LadderError::invalid(
            "backtest",
            "end_date",
            "end_date must not be before start_date",
        )
        .into());
    }
    Ok(end)
}

pub async fn run_backtest(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BacktestRequest>,
) -> Result<Json<ResultBundle>, WebError> {
    let config = request.strategy_config()?;
    let end_date = resolve_end_date(config.start_date, request.end_date.as_deref())?;
    let symbol = resolve_symbol(&state, request.symbol.as_deref());

    info!(%symbol, start = %config.start_date, end = %end_date, "backtest request");

    let bars = load_price_series(&*state.data_port, &symbol, config.start_date, end_date)?;
    let bundle = run_backtest_engine(&bars, &config)?;
    Ok(Json(bundle))
}

pub async fn stock_data(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StockDataQuery>,
) -> Result<Json<Vec<PriceBar>>, WebError> {
    let start_date = match query.start_date.as_deref().filter(|s| !s.trim().is_empty()) {
        None => return Err(WebError::bad_request("Start date is required")),
        Some(s) => parse_date(Some(s), "backtest", "start_date")?,
    };
    let end_date = resolve_end_date(start_date, query.end_date.as_deref())?;
    let symbol = resolve_symbol(&state, query.symbol.as_deref());

    let bars = state.data_port.fetch_prices(&symbol, start_date, end_date)?;
    if bars.is_empty() {
        return Err(LadderError::NoData { symbol }.into());
    }
    check_series(&bars)?;
    Ok(Json(bars))
}

pub async fn not_found() -> WebError {
    WebError::not_found("Not found")
}
