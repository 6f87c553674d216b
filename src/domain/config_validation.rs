//! Configuration validation.
//!
//! Validates INI config fields before a backtest runs. Keys that are absent
//! fall back to the strategy defaults, so only present-but-wrong values fail,
//! with the exception of `[backtest] start_date`, which is required.

use crate::domain::error::LadderError;
use crate::domain::strategy::{
    DEFAULT_DROP_INTERVAL, DEFAULT_INITIAL_CASH, DEFAULT_INITIAL_INVESTMENT, DEFAULT_MAX_STEPS,
    DEFAULT_MULTIPLIER, DEFAULT_SELL_RECOVERY, DEFAULT_STOP_LOSS,
};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), LadderError> {
    validate_initial_cash(config)?;
    validate_dates(config)?;
    validate_symbol(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), LadderError> {
    validate_positive(config, "initial_investment", DEFAULT_INITIAL_INVESTMENT)?;
    validate_positive(config, "drop_interval", DEFAULT_DROP_INTERVAL)?;
    validate_multiplier(config)?;
    validate_positive(config, "sell_recovery", DEFAULT_SELL_RECOVERY)?;
    validate_max_steps(config)?;
    validate_stop_loss(config)?;
    Ok(())
}

pub fn parse_date(value: Option<&str>, section: &str, field: &str) -> Result<NaiveDate, LadderError> {
    match value {
        None => Err(LadderError::missing(section, field)),
        Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).map_err(|_| {
            LadderError::invalid(
                section,
                field,
                format!("invalid {} format, expected YYYY-MM-DD", field),
            )
        }),
    }
}

/// Reads a numeric key, failing when the value is present but not a number.
fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, LadderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<f64>().map_err(|_| {
            LadderError::invalid(section, key, format!("{} must be a number, got {:?}", key, raw))
        }),
    }
}

fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, LadderError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
            LadderError::invalid(section, key, format!("{} must be an integer, got {:?}", key, raw))
        }),
    }
}

fn validate_initial_cash(config: &dyn ConfigPort) -> Result<(), LadderError> {
    let value = read_double(config, "backtest", "initial_cash", DEFAULT_INITIAL_CASH)?;
    if !(value > 0.0) {
        return Err(LadderError::invalid(
            "backtest",
            "initial_cash",
            "initial_cash must be positive",
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), LadderError> {
    let start_str = config.get_string("backtest", "start_date");
    let start_date = parse_date(start_str.as_deref(), "backtest", "start_date")?;

    if let Some(end_str) = config.get_string("backtest", "end_date") {
        let end_date = parse_date(Some(&end_str), "backtest", "end_date")?;
        if start_date >= end_date {
            return Err(LadderError::invalid(
                "backtest",
                "start_date",
                "start_date must be before end_date",
            ));
        }
    }
    Ok(())
}

fn validate_symbol(config: &dyn ConfigPort) -> Result<(), LadderError> {
    match config.get_string("data", "symbol") {
        Some(s) if s.trim().is_empty() => Err(LadderError::invalid(
            "data",
            "symbol",
            "symbol must not be empty",
        )),
        _ => Ok(()),
    }
}

fn validate_positive(config: &dyn ConfigPort, key: &str, default: f64) -> Result<(), LadderError> {
    let value = read_double(config, "strategy", key, default)?;
    if !(value > 0.0) {
        return Err(LadderError::invalid(
            "strategy",
            key,
            format!("{} must be positive", key),
        ));
    }
    Ok(())
}

fn validate_multiplier(config: &dyn ConfigPort) -> Result<(), LadderError> {
    let value = read_double(config, "strategy", "multiplier", DEFAULT_MULTIPLIER)?;
    if !(value >= 1.0) {
        return Err(LadderError::invalid(
            "strategy",
            "multiplier",
            "multiplier must be at least 1",
        ));
    }
    Ok(())
}

fn validate_max_steps(config: &dyn ConfigPort) -> Result<(), LadderError> {
    let value = read_int(config, "strategy", "max_steps", DEFAULT_MAX_STEPS as i64)?;
    if value < 1 || value > u32::MAX as i64 {
        return Err(LadderError::invalid(
            "strategy",
            "max_steps",
            "max_steps must be at least 1",
        ));
    }
    Ok(())
}

fn validate_stop_loss(config: &dyn ConfigPort) -> Result<(), LadderError> {
    let value = read_double(config, "strategy", "stop_loss", DEFAULT_STOP_LOSS)?;
    if !(value > 0.0 && value <= 100.0) {
        return Err(LadderError::invalid(
            "strategy",
            "stop_loss",
            "stop_loss must be between 0 and 100",
        ));
    }
    Ok(())
}
