//! Domain error types.

/// Top-level error type for laddertrader.
#[derive(Debug, thiserror::Error)]
pub enum LadderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no price data for {symbol}")]
    NoData { symbol: String },

    #[error("price data source error: {reason}")]
    DataSource { reason: String },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("cannot summarize an empty portfolio history")]
    EmptyHistory,

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LadderError {
    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        LadderError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(section: &str, key: &str) -> Self {
        LadderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&LadderError> for std::process::ExitCode {
    fn from(err: &LadderError) -> Self {
        let code: u8 = match err {
            LadderError::Io(_) | LadderError::Report { .. } => 1,
            LadderError::ConfigParse { .. }
            | LadderError::ConfigMissing { .. }
            | LadderError::ConfigInvalid { .. } => 2,
            LadderError::NoData { .. }
            | LadderError::DataSource { .. }
            | LadderError::InsufficientData { .. }
            | LadderError::EmptyHistory => 5,
        };
        std::process::ExitCode::from(code)
    }
}
