//! Core domain types and logic.

pub mod price_bar;
pub mod strategy;
pub mod trade;
pub mod portfolio;
pub mod execution;
pub mod backtest;
pub mod metrics;
pub mod price_series;
pub mod config_validation;
pub mod error;
