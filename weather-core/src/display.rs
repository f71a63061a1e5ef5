//! Reading the handful of fields a weather panel shows out of a pass-through
//! payload.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::fmt;

use crate::WeatherResult;

/// The bits of an upstream payload a user actually sees.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherView {
    pub place: String,
    /// Temperature exactly as the payload spells it, e.g. `30` or `-3.5`.
    pub temperature: Option<String>,
    pub condition: Option<String>,
    pub observed_at: Option<DateTime<Utc>>,
}

impl WeatherView {
    /// `fallback_place` is shown when the payload has no `name`.
    pub fn from_result(result: &WeatherResult, fallback_place: &str) -> Self {
        let json = result.json().unwrap_or(Value::Null);

        let place = json
            .get("name")
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or(fallback_place)
            .to_string();

        let temperature = json
            .pointer("/main/temp")
            .filter(|temp| temp.is_number())
            .map(Value::to_string);

        let condition = json
            .pointer("/weather/0/description")
            .and_then(Value::as_str)
            .map(str::to_string);

        let observed_at = json
            .get("dt")
            .and_then(Value::as_i64)
            .and_then(|ts| DateTime::from_timestamp(ts, 0));

        Self { place, temperature, condition, observed_at }
    }

    /// Same panel under the "current location" heading.
    pub fn render_current_location(&self) -> String {
        format!("Current Location Weather in {}\n{}", self.place, self.details())
    }

    fn details(&self) -> String {
        let mut out = format!(
            "Temperature: {} °C\nCondition: {}",
            self.temperature.as_deref().unwrap_or("n/a"),
            self.condition.as_deref().unwrap_or("n/a"),
        );
        if let Some(at) = self.observed_at {
            out.push_str(&format!("\nObserved: {}", at.format("%Y-%m-%d %H:%M UTC")));
        }
        out
    }
}

impl fmt::Display for WeatherView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Weather in {}\n{}", self.place, self.details())
    }
}
