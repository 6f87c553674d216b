//! JSON result adapter implementing ReportPort.
//!
//! Writes the full [`ResultBundle`] in the shape consumed by the charting UI.

use std::fs;

use crate::domain::error::LadderError;
use crate::domain::metrics::ResultBundle;
use crate::ports::report_port::ReportPort;

pub struct JsonReportAdapter {
    pretty: bool,
}

impl JsonReportAdapter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn render(&self, bundle: &ResultBundle) -> Result<String, LadderError> {
        let rendered = if self.pretty {
            serde_json::to_string_pretty(bundle)
        } else {
            serde_json::to_string(bundle)
        };
        rendered.map_err(|e| LadderError::Report {
            reason: format!("failed to serialize result: {}", e),
        })
    }
}

impl Default for JsonReportAdapter {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, bundle: &ResultBundle, output_path: &str) -> Result<(), LadderError> {
        let json = self.render(bundle)?;
        fs::write(output_path, json).map_err(|e| LadderError::Report {
            reason: format!("failed to write {}: {}", output_path, e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::ChartData;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn sample_bundle() -> ResultBundle {
        ResultBundle {
            initial_investment: 10_000.0,
            final_portfolio_value: 10_250.0,
            total_return: 3.0,
            number_of_purchases: 2,
            total_invested: 10_000.0,
            remaining_cash: 9_700.0,
            max_drawdown: 12.0,
            portfolio_max_drawdown: 1.0,
            chart_data: ChartData {
                dates: vec![NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()],
                portfolio_values: vec![10_000.0],
                buy_hold_values: vec![10_000.0],
                tqqq_prices: vec![50.0],
                drawdowns: vec![0.0],
                portfolio_drawdowns: vec![0.0],
            },
            trade_history: Vec::new(),
        }
    }

    #[test]
    fn compact_render_is_single_line() {
        let json = JsonReportAdapter::new(false).render(&sample_bundle()).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains(r#""totalReturn":3.0"#));
        assert!(json.contains(r#""dates":["2024-02-01"]"#));
    }

    #[test]
    fn write_round_trips_through_serde() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result.json");
        let path_str = path.to_str().unwrap();

        JsonReportAdapter::default()
            .write(&sample_bundle(), path_str)
            .unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let parsed: ResultBundle = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, sample_bundle());
    }

    #[test]
    fn fractional_values_survive_write_and_read() {
        let mut bundle = sample_bundle();
        let uneven = 900.0 + 100.0 / 9.0 * 7.3;
        bundle.chart_data.portfolio_values = vec![uneven, 0.1 + 0.2, 1.0 / 3.0];
        bundle.chart_data.buy_hold_values = vec![10_000.0 / 7.0, 2.0_f64.sqrt(), 1e-7 / 3.0];
        bundle.chart_data.tqqq_prices = vec![uneven / 13.0];

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("result.json");
        JsonReportAdapter::new(false)
            .write(&bundle, path.to_str().unwrap())
            .unwrap();

        let parsed: ResultBundle = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, bundle);
        assert_eq!(parsed.chart_data.portfolio_values[0].to_bits(), uneven.to_bits());
    }

    #[test]
    fn write_to_missing_directory_is_report_error() {
        let err = JsonReportAdapter::default()
            .write(&sample_bundle(), "/nonexistent/dir/result.json")
            .unwrap_err();
        assert!(matches!(err, LadderError::Report { .. }));
    }
}
