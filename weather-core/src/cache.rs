use std::collections::HashMap;

use crate::{WeatherResult, query::normalize_key};

/// Session-scoped cache of successful place lookups.
///
/// Keys go through [`normalize_key`], so `"Paris"` and `" paris "` share an
/// entry. There is no eviction: the cache grows for as long as the session
/// lives, which is an accepted limitation for an interactive client.
#[derive(Debug, Default)]
pub struct WeatherCache {
    entries: HashMap<String, WeatherResult>,
}

impl WeatherCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, place: &str) -> Option<&WeatherResult> {
        self.entries.get(&normalize_key(place))
    }

    /// Store the last successful result for `place`, replacing any older one.
    pub fn insert(&mut self, place: &str, result: WeatherResult) {
        self.entries.insert(normalize_key(place), result);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
