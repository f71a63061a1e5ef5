use reqwest::StatusCode;
use thiserror::Error;

/// Message shown when the client submits a blank place name.
pub const BLANK_PLACE_MESSAGE: &str = "Please enter a city name.";

/// Failures a single weather query can end in.
///
/// Every variant is terminal for the attempt that produced it; nothing here is
/// retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// Caller error, raised before any network activity.
    #[error("{0}")]
    InvalidQuery(String),

    #[error("City not found. Please enter a valid city.")]
    NotFound,

    #[error("Invalid API key. Contact support.")]
    Unauthorized,

    #[error("Too many requests. Please wait and try again.")]
    RateLimited,

    /// Upstream or transport failure. The detail is for logs only.
    #[error("Error fetching weather data.")]
    Unavailable { detail: String },
}

impl WeatherError {
    /// Generic missing-input error used by the HTTP surface.
    pub fn missing_input() -> Self {
        Self::InvalidQuery("You must provide either a city or latitude and longitude.".to_string())
    }

    pub fn blank_place() -> Self {
        Self::InvalidQuery(BLANK_PLACE_MESSAGE.to_string())
    }

    pub fn unavailable(detail: impl Into<String>) -> Self {
        Self::Unavailable { detail: detail.into() }
    }

    /// Classify a non-success upstream status.
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => Self::NotFound,
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => Self::RateLimited,
            other => Self::unavailable(format!("upstream responded with status {other}")),
        }
    }

    /// Status the relay answers with for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Unavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// User-readable message. Never includes transport details.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        Self::unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_known_statuses() {
        assert_eq!(WeatherError::from_status(StatusCode::NOT_FOUND), WeatherError::NotFound);
        assert_eq!(WeatherError::from_status(StatusCode::UNAUTHORIZED), WeatherError::Unauthorized);
        assert_eq!(
            WeatherError::from_status(StatusCode::TOO_MANY_REQUESTS),
            WeatherError::RateLimited
        );
    }

    #[test]
    fn other_statuses_are_unavailable() {
        for status in [StatusCode::BAD_REQUEST, StatusCode::BAD_GATEWAY, StatusCode::FORBIDDEN] {
            let err = WeatherError::from_status(status);
            assert!(matches!(err, WeatherError::Unavailable { .. }), "{status} → {err:?}");
            assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn not_found_message_matches_client_copy() {
        assert_eq!(
            WeatherError::NotFound.user_message(),
            "City not found. Please enter a valid city."
        );
    }

    #[test]
    fn unavailable_hides_detail_from_users() {
        let err = WeatherError::unavailable("connection refused (os error 111)");
        assert_eq!(err.user_message(), "Error fetching weather data.");
    }

    #[test]
    fn invalid_query_maps_to_bad_request() {
        assert_eq!(WeatherError::missing_input().status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(WeatherError::blank_place().user_message(), BLANK_PLACE_MESSAGE);
    }
}
