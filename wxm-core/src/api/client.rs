use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    config::Credentials,
    model::{AuthToken, DayHistory, Device},
};

use super::{ApiError, WxmApi};

/// reqwest-backed WeatherXM API client.
#[derive(Debug, Clone)]
pub struct WxmClient {
    base_url: String,
    http: Client,
}

impl WxmClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[async_trait]
impl WxmApi for WxmClient {
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ApiError> {
        const ENDPOINT: &str = "login";

        let url = format!("{}/api/v1/auth/login", self.base_url);
        debug!("POST {url}");

        let res = self
            .http
            .post(&url)
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
            })
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint: ENDPOINT, source })?;

        let parsed: LoginResponse = read_json(ENDPOINT, res).await?;

        if parsed.token.is_empty() {
            return Err(ApiError::Malformed {
                endpoint: ENDPOINT,
                detail: "empty token".to_string(),
            });
        }

        Ok(AuthToken::new(parsed.token))
    }

    async fn devices(&self, token: &AuthToken) -> Result<Vec<Device>, ApiError> {
        const ENDPOINT: &str = "devices";

        let url = format!("{}/api/v1/me/devices", self.base_url);
        debug!("GET {url}");

        let res = self
            .http
            .get(&url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint: ENDPOINT, source })?;

        read_json(ENDPOINT, res).await
    }

    async fn device_history(
        &self,
        token: &AuthToken,
        device_id: &str,
        from_date: NaiveDate,
        to_date: NaiveDate,
    ) -> Result<Vec<DayHistory>, ApiError> {
        const ENDPOINT: &str = "history";

        let url = format!("{}/api/v1/me/devices/{device_id}/history", self.base_url);
        debug!("GET {url}?fromDate={from_date}&toDate={to_date}");

        let res = self
            .http
            .get(&url)
            .bearer_auth(token.as_str())
            .query(&[
                ("fromDate", from_date.to_string()),
                ("toDate", to_date.to_string()),
            ])
            .send()
            .await
            .map_err(|source| ApiError::Transport { endpoint: ENDPOINT, source })?;

        read_json(ENDPOINT, res).await
    }
}

/// Common tail of every call: check the status, then decode the body.
async fn read_json<T: DeserializeOwned>(
    endpoint: &'static str,
    res: Response,
) -> Result<T, ApiError> {
    let status = res.status();
    let body = res
        .text()
        .await
        .map_err(|source| ApiError::Transport { endpoint, source })?;

    if !status.is_success() {
        return Err(ApiError::Status { endpoint, status, body: truncate_body(&body) });
    }

    serde_json::from_str(&body).map_err(|source| ApiError::Decode { endpoint, source })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}
