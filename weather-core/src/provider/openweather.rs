use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use tracing::{debug, warn};

use crate::{WeatherError, WeatherQuery, WeatherResult};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

/// OpenWeatherMap current-weather client. The API key is injected here and
/// nowhere else.
#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_base_url(api_key: String, base_url: &str) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}{CURRENT_WEATHER_PATH}", self.base_url)
    }
}

impl fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherResult, WeatherError> {
        let res = self
            .http
            .get(self.endpoint())
            .query(&query.upstream_params(&self.api_key))
            .send()
            .await
            .map_err(|e| {
                // reqwest errors carry the URL, which contains the key.
                WeatherError::unavailable(format!(
                    "failed to reach OpenWeather: {}",
                    e.without_url()
                ))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::unavailable(format!(
                "failed to read OpenWeather response body: {}",
                e.without_url()
            ))
        })?;

        if !status.is_success() {
            warn!(%query, %status, body = %truncate_body(&body), "OpenWeather request failed");
            return Err(WeatherError::from_status(status));
        }

        debug!(%query, bytes = body.len(), "OpenWeather request succeeded");
        Ok(WeatherResult::from_body(body))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}
