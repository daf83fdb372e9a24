use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::{config::ProviderConfig, error::FetchError};

use super::WeatherProvider;

const CURRENT_PATH: &str = "/v1/current.json";

/// Client for the weatherapi.com `current.json` endpoint.
#[derive(Debug, Clone)]
pub struct WeatherApiProvider {
    config: ProviderConfig,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    pub fn with_client(config: ProviderConfig, http: Client) -> Self {
        Self { config, http }
    }

    pub fn endpoint(&self) -> String {
        format!("{}{CURRENT_PATH}", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    async fn current(&self, query: &str) -> Result<Value, FetchError> {
        let url = self.endpoint();
        debug!(%url, query, "requesting current weather");

        let res = self
            .http
            .get(&url)
            .query(&[("key", self.config.api_key.as_str()), ("q", query)])
            .send()
            .await?;

        let status = res.status();
        let body = res.text().await?;
        debug!(%status, bytes = body.len(), "weatherapi responded");

        if !status.is_success() {
            return Err(upstream_error(status, &body));
        }

        serde_json::from_str(&body).map_err(FetchError::InvalidBody)
    }
}

/// weatherapi.com wraps failures as `{"error": {"code": 1006, "message": "..."}}`.
#[derive(Debug, Deserialize)]
struct WaErrorBody {
    error: WaError,
}

#[derive(Debug, Deserialize)]
struct WaError {
    code: Option<i64>,
    message: String,
}

fn upstream_error(status: StatusCode, body: &str) -> FetchError {
    match serde_json::from_str::<WaErrorBody>(body) {
        Ok(WaErrorBody { error }) => {
            FetchError::Upstream { status, code: error.code, message: error.message }
        }
        Err(_) => FetchError::Upstream { status, code: None, message: truncate_body(body) },
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
