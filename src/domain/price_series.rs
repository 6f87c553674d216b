//! Price-series acquisition and integrity checks.

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::error::LadderError;
use crate::domain::execution::WARMUP_BARS;
use crate::domain::price_bar::PriceBar;
use crate::ports::data_port::DataPort;

/// Minimum series length: the warm-up plus one active bar.
pub const MIN_BARS: usize = WARMUP_BARS + 1;

pub const DEFAULT_SYMBOL: &str = "TQQQ";

/// Check that bars are strictly increasing by date with positive closes.
pub fn check_series(bars: &[PriceBar]) -> Result<(), LadderError> {
    if let Some(bar) = bars.iter().find(|b| !(b.close > 0.0)) {
        return Err(LadderError::DataSource {
            reason: format!("non-positive close {} on {}", bar.close, bar.date),
        });
    }
    if let Some(pair) = bars.windows(2).find(|w| w[1].date <= w[0].date) {
        return Err(LadderError::DataSource {
            reason: format!(
                "bars out of order or duplicated at {} -> {}",
                pair[0].date, pair[1].date
            ),
        });
    }
    Ok(())
}

/// Fetch `[start, end]` for `symbol` and make sure it is long enough to backtest.
pub fn load_price_series(
    data_port: &dyn DataPort,
    symbol: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PriceBar>, LadderError> {
    let bars = data_port.fetch_prices(symbol, start, end)?;

    if bars.is_empty() {
        return Err(LadderError::NoData {
            symbol: symbol.to_string(),
        });
    }
    check_series(&bars)?;

    if bars.len() < MIN_BARS {
        warn!(symbol, bars = bars.len(), minimum = MIN_BARS, "price series too short");
        return Err(LadderError::InsufficientData {
            bars: bars.len(),
            minimum: MIN_BARS,
        });
    }
    Ok(bars)
}
