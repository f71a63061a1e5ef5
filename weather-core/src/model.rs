use serde_json::Value;

/// Upstream payload relayed as-is.
///
/// The body is kept as the exact text the provider sent so it can be handed
/// back to callers byte for byte. Fields are only read on demand by the
/// display layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherResult {
    body: String,
}

impl WeatherResult {
    pub fn from_body(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Raw upstream body.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn into_body(self) -> String {
        self.body
    }

    /// Parse the payload. Returns `None` if the upstream sent something that
    /// is not JSON.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_body_verbatim() {
        let raw = "{\"name\":\"Oslo\",  \"main\":{\"temp\":-3.50}}";
        let result = WeatherResult::from_body(raw);
        assert_eq!(result.body(), raw);
        assert_eq!(result.json().expect("valid json")["name"], "Oslo");
    }

    #[test]
    fn non_json_body_has_no_value() {
        assert!(WeatherResult::from_body("<html>").json().is_none());
    }
}
