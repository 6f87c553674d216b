//! Ladder buy and exit rules applied to a single bar.
//!
//! Buying walks a geometric ladder: step `n` becomes eligible once the price
//! drawdown reaches `n * drop_interval` and spends
//! `initial_investment * multiplier^n`. Exits are a partial stop-loss on
//! portfolio drawdown or a full sell once the price has recovered enough of the
//! drawdown recorded at the most recent buy.

use chrono::NaiveDate;
use tracing::debug;

use super::portfolio::SimulationState;
use super::strategy::StrategyConfig;
use super::trade::{Trade, TradeKind, last_buy_drawdown};

/// Bars consumed before trading starts; the last of them seeds the price peak.
pub const WARMUP_BARS: usize = 40;

/// Share of holdings liquidated by a stop-loss.
pub const STOP_LOSS_FRACTION: f64 = 0.25;

/// Fixed engine constants. Not part of user configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineParams {
    pub warmup_bars: usize,
    pub stop_loss_fraction: f64,
}

impl Default for EngineParams {
    fn default() -> Self {
        EngineParams {
            warmup_bars: WARMUP_BARS,
            stop_loss_fraction: STOP_LOSS_FRACTION,
        }
    }
}

impl EngineParams {
    /// Warm-up length actually used; bar 0 is always the reference bar.
    pub fn effective_warmup(&self) -> usize {
        self.warmup_bars.max(1)
    }

    pub fn min_bars(&self) -> usize {
        self.effective_warmup() + 1
    }
}

/// Market view of one active bar, measured before any trade on that bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarContext {
    pub date: NaiveDate,
    pub price: f64,
    pub portfolio_value: f64,
    pub price_drawdown: f64,
    pub portfolio_drawdown: f64,
}

fn snapshot_trade(
    state: &SimulationState,
    bar: &BarContext,
    kind: TradeKind,
    shares_delta: f64,
    cash_delta: f64,
    reason: String,
) -> Trade {
    Trade {
        date: bar.date,
        kind,
        price: bar.price,
        shares_delta,
        cash_delta,
        drawdown: bar.price_drawdown,
        reason,
        shares_value: state.holdings_value(bar.price),
        remaining_cash: state.cash,
        holdings: state.shares,
        total_assets: state.total_value(bar.price),
    }
}

/// Evaluate the next ladder step. Returns a BUY when cash covers the step, a
/// SKIP when it does not, and nothing when the step is not triggered.
pub fn evaluate_buy(
    state: &mut SimulationState,
    bar: &BarContext,
    config: &StrategyConfig,
) -> Option<Trade> {
    if state.step >= config.max_steps || bar.price_drawdown < config.trigger_drawdown(state.step) {
        return None;
    }

    let amount = config.purchase_amount(state.step);

    if state.cash < amount {
        debug!(
            date = %bar.date,
            step = state.step,
            needed = amount,
            cash = state.cash,
            "skipping ladder step: insufficient cash"
        );
        return Some(snapshot_trade(
            state,
            bar,
            TradeKind::Skip,
            0.0,
            0.0,
            format!(
                "insufficient cash (need {:.0}, have {:.0})",
                amount, state.cash
            ),
        ));
    }

    let bought = amount / bar.price;
    state.shares += bought;
    state.cash -= amount;
    state.step += 1;

    debug!(
        date = %bar.date,
        step = state.step,
        amount,
        price = bar.price,
        drawdown = bar.price_drawdown,
        "ladder buy"
    );

    Some(snapshot_trade(
        state,
        bar,
        TradeKind::Buy,
        bought,
        -amount,
        format!("drawdown reached {}%", bar.price_drawdown),
    ))
}

/// Recovery of the current drawdown relative to the entry drawdown, in whole
/// percent. `None` when the entry was taken at zero drawdown, which disables
/// the recovery exit for that holding period.
pub fn recovery_pct(entry_drawdown: f64, price_drawdown: f64) -> Option<f64> {
    if entry_drawdown == 0.0 {
        return None;
    }
    Some(((entry_drawdown - price_drawdown) / entry_drawdown * 100.0).round())
}

/// Evaluate the exit rules while holding shares. Stop-loss takes precedence
/// over the recovery sell; at most one of them fires per bar.
pub fn evaluate_exit(
    state: &mut SimulationState,
    bar: &BarContext,
    config: &StrategyConfig,
    params: &EngineParams,
    trades: &[Trade],
) -> Option<Trade> {
    if state.shares <= 0.0 {
        return None;
    }
    let entry_drawdown = last_buy_drawdown(trades)?;

    if bar.portfolio_drawdown >= config.stop_loss {
        return Some(execute_stop_loss(state, bar, params));
    }

    let recovery = recovery_pct(entry_drawdown, bar.price_drawdown)?;
    if recovery >= config.sell_recovery {
        return Some(execute_full_sell(state, bar, recovery));
    }
    None
}

fn execute_stop_loss(state: &mut SimulationState, bar: &BarContext, params: &EngineParams) -> Trade {
    let sold = state.shares * params.stop_loss_fraction;
    let proceeds = sold * bar.price;
    state.cash += proceeds;
    state.shares -= sold;

    state.step = 0;
    state.price_running_max = bar.price;
    state.portfolio_running_max = state.total_value(bar.price);

    debug!(
        date = %bar.date,
        sold,
        proceeds,
        portfolio_drawdown = bar.portfolio_drawdown,
        "stop-loss"
    );

    snapshot_trade(
        state,
        bar,
        TradeKind::StopLoss,
        -sold,
        proceeds,
        format!(
            "portfolio drawdown {}% stop-loss ({:.0}%)",
            bar.portfolio_drawdown,
            params.stop_loss_fraction * 100.0
        ),
    )
}

// The portfolio running max is deliberately left alone here; only the
// stop-loss resets it.
fn execute_full_sell(state: &mut SimulationState, bar: &BarContext, recovery: f64) -> Trade {
    let sold = state.shares;
    let proceeds = sold * bar.price;
    state.cash += proceeds;
    state.shares = 0.0;

    state.step = 0;
    state.price_running_max = bar.price;

    debug!(date = %bar.date, sold, proceeds, recovery, "full sell");

    snapshot_trade(
        state,
        bar,
        TradeKind::Sell,
        -sold,
        proceeds,
        format!("recovered {}% of drawdown", recovery),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> StrategyConfig {
        StrategyConfig {
            initial_cash: 10_000.0,
            initial_investment: 100.0,
            drop_interval: 5.0,
            multiplier: 2.0,
            sell_recovery: 50.0,
            ..StrategyConfig::with_defaults(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        }
    }

    fn bar(price: f64, price_drawdown: f64, portfolio_drawdown: f64) -> BarContext {
        BarContext {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            price,
            portfolio_value: 0.0,
            price_drawdown,
            portfolio_drawdown,
        }
    }

    fn buy_at(drawdown: f64) -> Trade {
        Trade {
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            kind: TradeKind::Buy,
            price: 10.0,
            shares_delta: 10.0,
            cash_delta: -100.0,
            drawdown,
            reason: String::new(),
            shares_value: 100.0,
            remaining_cash: 9_900.0,
            holdings: 10.0,
            total_assets: 10_000.0,
        }
    }

    #[test]
    fn default_params() {
        let p = EngineParams::default();
        assert_eq!(p.warmup_bars, 40);
        assert_eq!(p.min_bars(), 41);
        assert!((p.stop_loss_fraction - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn buy_step_zero_at_any_drawdown() {
        let config = sample_config();
        let mut state = SimulationState::new(10_000.0, 10.0);
        let trade = evaluate_buy(&mut state, &bar(10.0, 0.0, 0.0), &config).unwrap();

        assert_eq!(trade.kind, TradeKind::Buy);
        assert!((trade.amount_usd() - 100.0).abs() < 1e-9);
        assert!((trade.shares_delta - 10.0).abs() < 1e-9);
        assert_eq!(state.step, 1);
        assert!((state.cash - 9_900.0).abs() < 1e-9);
        assert!((trade.remaining_cash - 9_900.0).abs() < 1e-9);
        assert!((trade.total_assets - 10_000.0).abs() < 1e-9);
    }

    #[test]
    fn buy_not_triggered_below_threshold() {
        let config = sample_config();
        let mut state = SimulationState::new(10_000.0, 10.0);
        state.step = 2;
        assert!(evaluate_buy(&mut state, &bar(9.1, 9.0, 0.0), &config).is_none());
        assert_eq!(state.step, 2);
    }

    #[test]
    fn buy_uses_geometric_amount() {
        let config = sample_config();
        let mut state = SimulationState::new(10_000.0, 10.0);
        state.step = 2;
        let trade = evaluate_buy(&mut state, &bar(9.0, 10.0, 0.0), &config).unwrap();
        assert!((trade.amount_usd() - 400.0).abs() < 1e-9);
        assert_eq!(state.step, 3);
    }

    #[test]
    fn buy_capped_at_max_steps() {
        let config = StrategyConfig {
            max_steps: 3,
            ..sample_config()
        };
        let mut state = SimulationState::new(10_000.0, 10.0);
        state.step = 3;
        assert!(evaluate_buy(&mut state, &bar(1.0, 90.0, 0.0), &config).is_none());
    }

    #[test]
    fn skip_when_cash_short() {
        let config = sample_config();
        let mut state = SimulationState::new(10_000.0, 10.0);
        state.cash = 50.0;
        state.shares = 3.0;
        let trade = evaluate_buy(&mut state, &bar(10.0, 0.0, 0.0), &config).unwrap();

        assert_eq!(trade.kind, TradeKind::Skip);
        assert_eq!(trade.amount_usd(), 0.0);
        assert_eq!(trade.shares_delta, 0.0);
        assert!(trade.reason.contains("insufficient cash"));
        assert!(trade.reason.contains("need 100"));
        assert!(trade.reason.contains("have 50"));
        assert!((state.shares - 3.0).abs() < f64::EPSILON);
        assert_eq!(state.step, 0);
    }

    #[test]
    fn recovery_guard_on_zero_entry() {
        assert_eq!(recovery_pct(0.0, 5.0), None);
        assert_eq!(recovery_pct(0.0, 0.0), None);
    }

    #[test]
    fn recovery_rounds() {
        assert_eq!(recovery_pct(10.0, 0.0), Some(100.0));
        assert_eq!(recovery_pct(10.0, 5.0), Some(50.0));
        assert_eq!(recovery_pct(3.0, 2.0), Some(33.0));
        assert_eq!(recovery_pct(10.0, 12.0), Some(-20.0));
    }

    #[test]
    fn no_exit_without_shares() {
        let config = sample_config();
        let mut state = SimulationState::new(10_000.0, 10.0);
        let trades = vec![buy_at(10.0)];
        let exit = evaluate_exit(&mut state, &bar(10.0, 0.0, 50.0), &config, &EngineParams::default(), &trades);
        assert!(exit.is_none());
    }

    #[test]
    fn stop_loss_sells_quarter_and_resets() {
        let config = sample_config();
        let mut state = SimulationState::new(10_000.0, 20.0);
        state.shares = 40.0;
        state.cash = 0.0;
        state.step = 4;
        state.portfolio_running_max = 800.0;

        let trades = vec![buy_at(10.0)];
        let trade = evaluate_exit(&mut state, &bar(15.0, 25.0, 25.0), &config, &EngineParams::default(), &trades).unwrap();

        assert_eq!(trade.kind, TradeKind::StopLoss);
        assert!((trade.shares_delta + 10.0).abs() < 1e-9);
        assert!((trade.cash_delta - 150.0).abs() < 1e-9);
        assert!((state.shares - 30.0).abs() < 1e-9);
        assert!((state.cash - 150.0).abs() < 1e-9);
        assert_eq!(state.step, 0);
        assert!((state.price_running_max - 15.0).abs() < f64::EPSILON);
        assert!((state.portfolio_running_max - 600.0).abs() < 1e-9);
        assert!(trade.reason.contains("25%"));
    }

    #[test]
    fn stop_loss_fires_even_with_zero_entry_drawdown() {
        let config = sample_config();
        let mut state = SimulationState::new(10_000.0, 20.0);
        state.shares = 8.0;
        let trades = vec![buy_at(0.0)];
        let trade = evaluate_exit(&mut state, &bar(10.0, 50.0, 30.0), &config, &EngineParams::default(), &trades).unwrap();
        assert_eq!(trade.kind, TradeKind::StopLoss);
    }

    #[test]
    fn stop_loss_fraction_overridable() {
        let config = sample_config();
        let params = EngineParams {
            stop_loss_fraction: 0.5,
            ..EngineParams::default()
        };
        let mut state = SimulationState::new(10_000.0, 20.0);
        state.shares = 40.0;
        let trades = vec![buy_at(10.0)];
        let trade = evaluate_exit(&mut state, &bar(15.0, 25.0, 30.0), &config, &params, &trades).unwrap();
        assert!((trade.shares_delta + 20.0).abs() < 1e-9);
        assert!(trade.reason.contains("50%"));
    }

    #[test]
    fn full_sell_on_recovery() {
        let config = sample_config();
        let mut state = SimulationState::new(10_000.0, 10.0);
        state.shares = 10.0;
        state.cash = 9_900.0;
        state.step = 1;
        state.portfolio_running_max = 10_050.0;
        let trades = vec![buy_at(10.0)];

        let trade = evaluate_exit(&mut state, &bar(9.5, 5.0, 0.0), &config, &EngineParams::default(), &trades).unwrap();

        assert_eq!(trade.kind, TradeKind::Sell);
        assert_eq!(state.shares, 0.0);
        assert_eq!(trade.holdings, 0.0);
        assert_eq!(trade.shares_value, 0.0);
        assert!((trade.cash_delta - 95.0).abs() < 1e-9);
        assert!((state.cash - 9_995.0).abs() < 1e-9);
        assert_eq!(state.step, 0);
        assert!((state.price_running_max - 9.5).abs() < f64::EPSILON);
        // untouched on a full sell
        assert!((state.portfolio_running_max - 10_050.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_sell_below_recovery_target() {
        let config = sample_config();
        let mut state = SimulationState::new(10_000.0, 10.0);
        state.shares = 10.0;
        let trades = vec![buy_at(10.0)];
        let exit = evaluate_exit(&mut state, &bar(9.4, 6.0, 0.0), &config, &EngineParams::default(), &trades);
        assert!(exit.is_none());
        assert!((state.shares - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_entry_drawdown_disables_sell() {
        let config = sample_config();
        let mut state = SimulationState::new(10_000.0, 10.0);
        state.shares = 10.0;
        let trades = vec![buy_at(0.0)];
        let exit = evaluate_exit(&mut state, &bar(10.0, 0.0, 0.0), &config, &EngineParams::default(), &trades);
        assert!(exit.is_none());
    }

    #[test]
    fn recovery_measured_from_most_recent_buy() {
        let config = sample_config();
        let mut state = SimulationState::new(10_000.0, 10.0);
        state.shares = 10.0;
        // latest entry at 20%: 40% recovered at 12%, 50% at 10%.
        // The earlier 10% entry would read 0% at 10%.
        let trades = vec![buy_at(10.0), buy_at(20.0)];
        assert!(evaluate_exit(&mut state, &bar(8.8, 12.0, 0.0), &config, &EngineParams::default(), &trades).is_none());
        let trade = evaluate_exit(&mut state, &bar(9.0, 10.0, 0.0), &config, &EngineParams::default(), &trades).unwrap();
        assert_eq!(trade.kind, TradeKind::Sell);
    }
}
