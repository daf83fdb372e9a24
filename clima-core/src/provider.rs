use async_trait::async_trait;
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    Config, WeatherReport,
    error::{FetchError, WeatherError},
    provider::weatherapi::WeatherApiProvider,
};

pub mod weatherapi;

/// Source of current-weather documents for a free-text location query.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Raw JSON body for `query`, not yet checked against any schema.
    async fn current(&self, query: &str) -> Result<Value, FetchError>;

    /// Fetch and decode in one go. Nothing reaches a view without passing
    /// the weather schema first.
    async fn current_report(&self, query: &str) -> Result<WeatherReport, WeatherError> {
        let body = self.current(query).await?;
        Ok(WeatherReport::from_json(&body)?)
    }
}

/// Construct the weatherapi.com provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider_config = config.provider_config()?;
    Ok(Box::new(WeatherApiProvider::new(provider_config)))
}
