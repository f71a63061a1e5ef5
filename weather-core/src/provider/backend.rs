//! Client-side provider that talks to a running relay server instead of the
//! upstream service directly.

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use crate::{WeatherError, WeatherQuery, WeatherResult};

use super::WeatherProvider;

#[derive(Debug, Clone)]
pub struct BackendProvider {
    base_url: Url,
    http: Client,
}

impl BackendProvider {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| anyhow::anyhow!("Invalid relay server URL '{base_url}': {e}"))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("Relay server URL '{base_url}' cannot be used as a base URL");
        }
        Ok(Self { base_url, http: Client::new() })
    }

    /// `GET /weather/<place>` for names, `GET /weather?lat=&lon=` for coordinates.
    fn url_for(&self, query: &WeatherQuery) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("weather");
            if let WeatherQuery::Place { name } = query {
                segments.push(name);
            }
        }
        if let WeatherQuery::Coordinates { lat, lon } = query {
            url.query_pairs_mut()
                .append_pair("lat", &lat.to_string())
                .append_pair("lon", &lon.to_string());
        }
        url
    }
}

#[async_trait]
impl WeatherProvider for BackendProvider {
    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherResult, WeatherError> {
        let url = self.url_for(query);
        debug!(%url, "requesting weather from relay server");

        let res = self.http.get(url).send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            debug!(%status, body = %body, "relay server returned an error");
            return Err(WeatherError::from_status(status));
        }

        Ok(WeatherResult::from_body(body))
    }
}
