//! CSV file price adapter.
//!
//! Reads `{base_path}/{SYMBOL}.csv`. Columns are located by header name, so a
//! minimal `date,close` file and a full OHLCV download both work.

use crate::domain::error::LadderError;
use crate::domain::price_bar::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

pub struct CsvAdapter {
    base_path: PathBuf,
}

struct Columns {
    date: usize,
    close: usize,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol.to_uppercase()))
    }

    fn locate_columns(headers: &csv::StringRecord) -> Result<Columns, LadderError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };

        let date = find("date").ok_or_else(|| LadderError::DataSource {
            reason: "missing date column".into(),
        })?;
        let close = find("close")
            .or_else(|| find("adj close"))
            .ok_or_else(|| LadderError::DataSource {
                reason: "missing close column".into(),
            })?;
        Ok(Columns { date, close })
    }

    /// Every bar in the file, sorted by date.
    fn read_all(&self, symbol: &str) -> Result<Vec<PriceBar>, LadderError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| LadderError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| LadderError::DataSource {
            reason: format!("CSV header error: {}", e),
        })?;
        let columns = Self::locate_columns(headers)?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| LadderError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(columns.date).ok_or_else(|| LadderError::DataSource {
                reason: "missing date value".into(),
            })?;
            // Accept timestamps such as `2024-01-02T00:00:00` by keeping the date part.
            let date_str = date_str.trim().get(..10).unwrap_or(date_str);
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                LadderError::DataSource {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            let close: f64 = record
                .get(columns.close)
                .ok_or_else(|| LadderError::DataSource {
                    reason: "missing close value".into(),
                })?
                .trim()
                .parse()
                .map_err(|e| LadderError::DataSource {
                    reason: format!("invalid close value on {}: {}", date, e),
                })?;

            if !(close > 0.0) {
                return Err(LadderError::DataSource {
                    reason: format!("non-positive close {} on {}", close, date),
                });
            }

            bars.push(PriceBar { date, close });
        }

        bars.sort_by_key(|b| b.date);
        if let Some(pair) = bars.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(LadderError::DataSource {
                reason: format!("duplicate date {} in {}", pair[0].date, path.display()),
            });
        }
        Ok(bars)
    }
}

impl DataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, LadderError> {
        let bars = self.read_all(symbol)?;
        Ok(bars
            .into_iter()
            .filter(|b| b.date >= start_date && b.date <= end_date)
            .collect())
    }

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, LadderError> {
        if !self.csv_path(symbol).exists() {
            return Ok(None);
        }
        let bars = self.read_all(symbol)?;
        match (bars.first(), bars.last()) {
            (Some(first), Some(last)) => Ok(Some((first.date, last.date, bars.len()))),
            _ => Ok(None),
        }
    }
}
