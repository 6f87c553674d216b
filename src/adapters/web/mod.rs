//! Web server adapter.
//!
//! Exposes the backtest engine as a JSON API through axum. Handlers call the
//! synchronous engine directly; nothing is shared between requests except the
//! read-only ports in [`AppState`].

mod error;
mod handlers;

pub use error::WebError;
pub use handlers::*;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::domain::price_series::DEFAULT_SYMBOL;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

pub struct AppState {
    pub data_port: Arc<dyn DataPort + Send + Sync>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
}

impl AppState {
    /// Symbol used when a request does not name one.
    pub fn default_symbol(&self) -> String {
        self.config
            .get_string("data", "symbol")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SYMBOL.to_string())
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/backtest", post(handlers::run_backtest))
        .route("/api/stock-data", get(handlers::stock_data))
        .fallback(handlers::not_found)
        .with_state(Arc::new(state))
}
