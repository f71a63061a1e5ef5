//! Turning caller input into a single upstream query.

use serde::Deserialize;
use std::fmt;

use crate::error::WeatherError;

/// Raw, optional inputs as they arrive from a query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub place: Option<String>,
    /// Older clients send `city`; only used when `place` is absent.
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub lat: Option<String>,
    #[serde(default)]
    pub lon: Option<String>,
}

/// A validated query: either by place name or by coordinate pair.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    /// Trimmed place name in its original casing.
    Place { name: String },
    Coordinates { lat: f64, lon: f64 },
}

/// Cache key for a place name: trimmed and case-folded.
pub fn normalize_key(place: &str) -> String {
    place.trim().to_lowercase()
}

impl WeatherQuery {
    /// Build a query from optional inputs.
    ///
    /// Coordinates win when both are present. A place with only one of
    /// `lat`/`lon` falls back to the place query.
    pub fn from_params(params: &QueryParams) -> Result<Self, WeatherError> {
        let lat = present(params.lat.as_deref());
        let lon = present(params.lon.as_deref());

        if let (Some(lat), Some(lon)) = (lat, lon) {
            return Self::coordinates(parse_coord("lat", lat)?, parse_coord("lon", lon)?);
        }

        let place = present(params.place.as_deref()).or_else(|| present(params.city.as_deref()));
        match place {
            Some(place) => Self::place(place),
            None => Err(WeatherError::missing_input()),
        }
    }

    pub fn place(name: &str) -> Result<Self, WeatherError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(WeatherError::blank_place());
        }
        Ok(Self::Place { name: trimmed.to_string() })
    }

    pub fn coordinates(lat: f64, lon: f64) -> Result<Self, WeatherError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(WeatherError::InvalidQuery(format!(
                "Latitude must be between -90 and 90, got {lat}."
            )));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(WeatherError::InvalidQuery(format!(
                "Longitude must be between -180 and 180, got {lon}."
            )));
        }
        Ok(Self::Coordinates { lat, lon })
    }

    /// Normalized key for place queries. Coordinate queries are never cached.
    pub fn cache_key(&self) -> Option<String> {
        match self {
            Self::Place { name } => Some(normalize_key(name)),
            Self::Coordinates { .. } => None,
        }
    }

    /// Outbound parameters for the current-weather endpoint.
    pub fn upstream_params(&self, api_key: &str) -> Vec<(&'static str, String)> {
        let mut params = match self {
            Self::Place { name } => vec![("q", name.clone())],
            Self::Coordinates { lat, lon } => vec![("lat", lat.to_string()), ("lon", lon.to_string())],
        };
        params.push(("appid", api_key.to_string()));
        params.push(("units", "metric".to_string()));
        params
    }
}

impl fmt::Display for WeatherQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Place { name } => write!(f, "place '{name}'"),
            Self::Coordinates { lat, lon } => write!(f, "coordinates ({lat}, {lon})"),
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_coord(field: &str, raw: &str) -> Result<f64, WeatherError> {
    raw.parse::<f64>()
        .map_err(|_| WeatherError::InvalidQuery(format!("'{field}' must be a number, got '{raw}'.")))
}
