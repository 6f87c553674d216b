//! Result export port trait.

use crate::domain::error::LadderError;
use crate::domain::metrics::ResultBundle;

/// Port for writing backtest results.
pub trait ReportPort {
    fn write(&self, bundle: &ResultBundle, output_path: &str) -> Result<(), LadderError>;
}
