//! # PVPC Bot - Spanish electricity prices on Telegram
//!
//! A Telegram bot that reports the hourly PVPC tariff published by Red
//! Eléctrica (ESIOS API) with charts, simple statistics and a daily push to
//! subscribed chats.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration, defaults and validation
//! - `logging`: Structured logging with daily rotated files
//! - `esios`: Upstream client, on-disk document cache and cache-backed fetcher
//! - `analysis`: Daily series aggregation, summaries and cheapest windows
//! - `prices`: Daily series for a date and zone
//! - `persistence`: JSON document helpers
//! - `settings`: Per-chat settings repository
//! - `report`: Spanish message formatting
//! - `chart`: SVG price charts
//! - `bot`: Command parsing, handlers, middleware and Telegram transport
//! - `scheduler`: Daily push to subscribers

pub mod analysis;
pub mod bot;
pub mod chart;
pub mod config;
pub mod error;
pub mod esios;
pub mod logging;
pub mod persistence;
pub mod prices;
pub mod report;
pub mod scheduler;
pub mod settings;

// Re-export commonly used types
pub use config::Config;
pub use error::{PvpcError, Result};

/// Version string including the nightly suffix when built as such
pub const APP_VERSION: &str = env!("APP_VERSION");
