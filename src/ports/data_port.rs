//! Price-history access port trait.

use crate::domain::error::LadderError;
use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily closes for `symbol` within `[start_date, end_date]`, oldest first.
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<PriceBar>, LadderError>;

    fn get_data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, LadderError>;
}
