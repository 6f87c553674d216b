//! Backtest engine.
//!
//! A single deterministic pass over the price series. The first
//! `warmup_bars` bars only establish the price reference; from then on each
//! bar is folded into a [`Ledger`] that carries the simulation state, the trade
//! ledger and the portfolio history.

use tracing::info;

use super::error::LadderError;
use super::execution::{BarContext, EngineParams, evaluate_buy, evaluate_exit};
use super::metrics::{ResultBundle, summarize};
use super::portfolio::{PortfolioSnapshot, SimulationState};
use super::price_bar::PriceBar;
use super::strategy::StrategyConfig;
use super::trade::Trade;

/// Raw engine output, before aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationOutput {
    pub trades: Vec<Trade>,
    pub history: Vec<PortfolioSnapshot>,
    pub final_cash: f64,
    pub final_shares: f64,
}

#[derive(Debug, Clone)]
struct Ledger {
    state: SimulationState,
    trades: Vec<Trade>,
    history: Vec<PortfolioSnapshot>,
}

impl Ledger {
    fn step(mut self, bar: &PriceBar, config: &StrategyConfig, params: &EngineParams) -> Self {
        let price = bar.close;
        let value = self.state.total_value(price);
        self.state.observe(price, value);

        let ctx = BarContext {
            date: bar.date,
            price,
            portfolio_value: value,
            price_drawdown: self.state.price_drawdown(price),
            portfolio_drawdown: self.state.portfolio_drawdown(value),
        };

        if let Some(trade) = evaluate_buy(&mut self.state, &ctx, config) {
            self.trades.push(trade);
        }
        if let Some(trade) = evaluate_exit(&mut self.state, &ctx, config, params, &self.trades) {
            self.trades.push(trade);
        }

        // Recorded at the pre-trade value.
        self.history.push(PortfolioSnapshot {
            date: bar.date,
            portfolio_value: value,
            price,
            price_drawdown_pct: ctx.price_drawdown,
            portfolio_drawdown_pct: ctx.portfolio_drawdown,
        });
        self
    }

    fn finish(self) -> SimulationOutput {
        SimulationOutput {
            final_cash: self.state.cash,
            final_shares: self.state.shares,
            trades: self.trades,
            history: self.history,
        }
    }
}

pub fn simulate(bars: &[PriceBar], config: &StrategyConfig) -> Result<SimulationOutput, LadderError> {
    simulate_with(bars, config, &EngineParams::default())
}

/// Run the ladder over `bars` with explicit engine constants.
///
/// `bars` must be chronological. A `warmup_bars` of zero is treated as one,
/// since bar 0 is always reserved as the reference bar.
pub fn simulate_with(
    bars: &[PriceBar],
    config: &StrategyConfig,
    params: &EngineParams,
) -> Result<SimulationOutput, LadderError> {
    config.validate()?;

    let warmup = params.effective_warmup();
    if bars.len() < params.min_bars() {
        return Err(LadderError::InsufficientData {
            bars: bars.len(),
            minimum: params.min_bars(),
        });
    }

    info!(
        bars = bars.len(),
        first = %bars[0].date,
        last = %bars[bars.len() - 1].date,
        "running ladder backtest"
    );

    let history: Vec<PortfolioSnapshot> = bars[1..warmup]
        .iter()
        .map(|bar| PortfolioSnapshot {
            date: bar.date,
            portfolio_value: config.initial_cash,
            price: bar.close,
            price_drawdown_pct: 0.0,
            portfolio_drawdown_pct: 0.0,
        })
        .collect();

    let seed = Ledger {
        state: SimulationState::new(config.initial_cash, bars[warmup - 1].close),
        trades: Vec::new(),
        history,
    };

    let output = bars[warmup..]
        .iter()
        .fold(seed, |ledger, bar| ledger.step(bar, config, params))
        .finish();

    info!(
        trades = output.trades.len(),
        final_cash = output.final_cash,
        final_shares = output.final_shares,
        "backtest complete"
    );
    Ok(output)
}

/// Simulate and summarize in one call.
pub fn run_backtest(bars: &[PriceBar], config: &StrategyConfig) -> Result<ResultBundle, LadderError> {
    let output = simulate(bars, config)?;
    summarize(&output, bars, config)
}
