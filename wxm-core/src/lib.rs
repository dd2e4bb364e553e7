//! Core library for the `wxm` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The WeatherXM API client (login, device listing, weather history)
//! - Export of fetched history payloads to dated JSON files
//! - The single-run orchestration behind `wxm export`
//!
//! It is used by `wxm-cli`, but can also be reused by other binaries or services.

pub mod api;
pub mod config;
pub mod export;
pub mod model;
pub mod run;

pub use api::{ApiError, WxmApi, WxmClient};
pub use config::{Config, Credentials};
pub use export::Exporter;
pub use model::{AuthToken, DayHistory, Device, HourlyReading};
pub use run::{RunSummary, lookback_window, run_export};
