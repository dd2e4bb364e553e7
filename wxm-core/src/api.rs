use crate::{
    config::Credentials,
    model::{AuthToken, DayHistory, Device},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt::Debug;
use thiserror::Error;

pub mod client;

pub use client::WxmClient;

/// Errors produced by WeatherXM API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a usable response (DNS, TLS, connection,
    /// body-read failures).
    #[error("{endpoint} request failed to complete")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status. Carries a truncated
    /// body excerpt, which for WeatherXM usually contains the error message.
    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body was not the JSON this client understands.
    #[error("failed to parse {endpoint} response")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The response decoded, but an expected value was missing or empty.
    #[error("{endpoint} response was missing expected data: {detail}")]
    Malformed {
        endpoint: &'static str,
        detail: String,
    },
}

/// The three WeatherXM operations this tool performs.
///
/// `WxmClient` is the real implementation; tests substitute their own to
/// exercise the run orchestration without a network.
#[async_trait]
pub trait WxmApi: Send + Sync + Debug {
    /// Exchange account credentials for a bearer token.
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError>;

    /// List the devices registered to the token's account. An empty list is
    /// a valid outcome, not an error.
    async fn devices(&self, token: &AuthToken) -> Result<Vec<Device>, ApiError>;

    /// Fetch one device's history for the inclusive `[from_date, to_date]`
    /// window.
    async fn device_history(
        &self,
        token: &AuthToken,
        device_id: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<DayHistory>, ApiError>;
}
