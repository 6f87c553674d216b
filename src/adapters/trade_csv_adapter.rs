//! Trade history CSV export implementing ReportPort.

use serde::Serialize;

use crate::domain::error::LadderError;
use crate::domain::metrics::ResultBundle;
use crate::domain::trade::Trade;
use crate::ports::report_port::ReportPort;

#[derive(Debug, Serialize)]
struct TradeRow<'a> {
    date: String,
    #[serde(rename = "type")]
    kind: &'a str,
    price: f64,
    shares: f64,
    amount_usd: f64,
    drawdown: f64,
    reason: &'a str,
    holdings: f64,
    shares_value: f64,
    remaining_cash: f64,
    total_assets: f64,
}

impl<'a> From<&'a Trade> for TradeRow<'a> {
    fn from(trade: &'a Trade) -> Self {
        TradeRow {
            date: trade.date.format("%Y-%m-%d").to_string(),
            kind: trade.kind.as_str(),
            price: trade.price,
            shares: trade.shares_delta.abs(),
            amount_usd: trade.amount_usd(),
            drawdown: trade.drawdown,
            reason: &trade.reason,
            holdings: trade.holdings,
            shares_value: trade.shares_value,
            remaining_cash: trade.remaining_cash,
            total_assets: trade.total_assets,
        }
    }
}

pub struct TradeCsvAdapter;

impl TradeCsvAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn write_trades<W: std::io::Write>(&self, trades: &[Trade], out: W) -> Result<(), LadderError> {
        let mut wtr = csv::Writer::from_writer(out);
        for trade in trades {
            wtr.serialize(TradeRow::from(trade))
                .map_err(|e| LadderError::Report {
                    reason: format!("CSV write error: {}", e),
                })?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl Default for TradeCsvAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportPort for TradeCsvAdapter {
    fn write(&self, bundle: &ResultBundle, output_path: &str) -> Result<(), LadderError> {
        let file = std::fs::File::create(output_path).map_err(|e| LadderError::Report {
            reason: format!("failed to create {}: {}", output_path, e),
        })?;
        self.write_trades(&bundle.trade_history, file)
    }
}
