use crate::{
    Config, WeatherError, WeatherQuery, WeatherResult,
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod backend;
pub mod openweather;

/// Something that can answer a [`WeatherQuery`] with a single upstream call.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherResult, WeatherError>;
}

/// Construct the upstream provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for the upstream weather provider.\n\
             Hint: run `weather-relay configure` or set WEATHER_API_KEY."
        )
    })?;

    Ok(Arc::new(OpenWeatherProvider::with_base_url(
        api_key.to_owned(),
        config.upstream_url(),
    )))
}
