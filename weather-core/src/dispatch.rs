//! Client-side query lifecycle: `Idle → Pending → {Success, Failed}`.
//!
//! All state lives on the task that owns the [`Dispatcher`]. Relay calls run
//! as spawned tasks and report back over a channel; their completions are
//! only applied when [`Dispatcher::next_update`] is awaited, so the cache and
//! the displayed phase are never touched from anywhere else.
//!
//! At most one place query is live. Starting another one cancels the previous
//! request's token, and completions from superseded requests are discarded by
//! generation. The current-location query has its own token and never touches
//! the place cache.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    WeatherError, WeatherQuery, WeatherResult,
    cache::WeatherCache,
    relay::{Relay, RelayOutcome},
};

/// Displayed state of the place query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Pending {
        key: String,
    },
    Success {
        key: String,
        result: WeatherResult,
    },
    /// User-readable message. Any earlier result is gone.
    Failed(String),
}

/// What [`Dispatcher::search`] did with the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Blank input; nothing was sent.
    Rejected,
    /// Served from the cache without entering `Pending`.
    Cached,
    /// A request for the same key is already in flight.
    AlreadyPending,
    /// A new upstream request was started.
    Started,
}

/// Which part of the state changed after a completion was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    Place,
    Location,
}

#[derive(Debug)]
enum Completion {
    Place {
        generation: u64,
        result: Result<WeatherResult, WeatherError>,
    },
    Location {
        generation: u64,
        result: Result<WeatherResult, WeatherError>,
    },
}

#[derive(Debug)]
struct InFlight {
    generation: u64,
    key: String,
    token: CancellationToken,
}

#[derive(Debug)]
pub struct Dispatcher {
    relay: Relay,
    cache: WeatherCache,
    phase: Phase,
    current_location: Option<WeatherResult>,
    place_request: Option<InFlight>,
    location_request: Option<InFlight>,
    generation: u64,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl Dispatcher {
    pub fn new(relay: Relay) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            relay,
            cache: WeatherCache::new(),
            phase: Phase::Idle,
            current_location: None,
            place_request: None,
            location_request: None,
            generation: 0,
            tx,
            rx,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn current_location(&self) -> Option<&WeatherResult> {
        self.current_location.as_ref()
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    /// True while any request (place or location) is outstanding.
    pub fn has_pending(&self) -> bool {
        self.place_request.is_some() || self.location_request.is_some()
    }

    /// Look up weather for a place name typed by the user.
    pub fn search(&mut self, input: &str) -> SearchOutcome {
        let query = match WeatherQuery::place(input) {
            Ok(query) => query,
            Err(err) => {
                self.cancel_place();
                self.phase = Phase::Failed(err.user_message());
                return SearchOutcome::Rejected;
            }
        };
        // Place queries always carry a key.
        let Some(key) = query.cache_key() else {
            return SearchOutcome::Rejected;
        };
        // A new search hides the current-location panel.
        self.current_location = None;

        if let Some(cached) = self.cache.get(&key) {
            let result = cached.clone();
            self.cancel_place();
            debug!(%key, "serving weather from cache");
            self.phase = Phase::Success { key, result };
            return SearchOutcome::Cached;
        }

        if self.place_request.as_ref().is_some_and(|req| req.key == key) {
            return SearchOutcome::AlreadyPending;
        }

        self.cancel_place();
        let generation = self.next_generation();
        let token = CancellationToken::new();
        self.place_request = Some(InFlight {
            generation,
            key: key.clone(),
            token: token.clone(),
        });
        self.phase = Phase::Pending { key };

        self.spawn_request(query, token, move |result| Completion::Place { generation, result });

        SearchOutcome::Started
    }

    /// Fetch weather for the caller's own coordinates. Independent of the
    /// place query and never cached. A newer call replaces an older one.
    pub fn locate(&mut self, lat: f64, lon: f64) -> Result<(), WeatherError> {
        let query = WeatherQuery::coordinates(lat, lon)?;

        if let Some(previous) = self.location_request.take() {
            previous.token.cancel();
        }
        let generation = self.next_generation();
        let token = CancellationToken::new();
        self.location_request = Some(InFlight {
            generation,
            key: query.to_string(),
            token: token.clone(),
        });

        self.spawn_request(query, token, move |result| Completion::Location { generation, result });

        Ok(())
    }

    /// Run one relay call on its own task. A task that dies without
    /// answering is reported as `Unavailable` so the slot is always released.
    fn spawn_request<F>(&self, query: WeatherQuery, token: CancellationToken, complete: F)
    where
        F: FnOnce(Result<WeatherResult, WeatherError>) -> Completion + Send + 'static,
    {
        let relay = self.relay.clone();
        let tx = self.tx.clone();
        let request = {
            let token = token.clone();
            tokio::spawn(async move { relay.forward(&query, &token).await })
        };
        tokio::spawn(async move {
            let outcome = match request.await {
                Ok(outcome) => outcome,
                Err(err) if token.is_cancelled() => {
                    debug!(error = %err, "cancelled request task ended abnormally");
                    RelayOutcome::Cancelled
                }
                Err(err) => RelayOutcome::Completed(Err(WeatherError::unavailable(format!(
                    "request task failed: {err}"
                )))),
            };
            if let RelayOutcome::Completed(result) = outcome {
                let _ = tx.send(complete(result));
            }
        });
    }

    /// Wait for the next completion that changes visible state.
    ///
    /// Returns `None` once nothing is in flight.
    pub async fn next_update(&mut self) -> Option<Update> {
        while self.has_pending() {
            let completion = self.rx.recv().await?;
            if let Some(update) = self.apply(completion) {
                return Some(update);
            }
        }
        None
    }

    /// Drive all outstanding requests to completion.
    pub async fn settle(&mut self) {
        while self.next_update().await.is_some() {}
    }

    /// Cancel everything in flight. No further completions are applied.
    pub fn shutdown(&mut self) {
        self.cancel_place();
        if let Some(request) = self.location_request.take() {
            request.token.cancel();
        }
    }

    fn apply(&mut self, completion: Completion) -> Option<Update> {
        match completion {
            Completion::Place { generation, result } => {
                let request = take_current(&mut self.place_request, generation)?;
                match result {
                    Ok(result) => {
                        self.cache.insert(&request.key, result.clone());
                        self.phase = Phase::Success { key: request.key, result };
                    }
                    Err(err) => {
                        self.phase = Phase::Failed(err.user_message());
                    }
                }
                Some(Update::Place)
            }
            Completion::Location { generation, result } => {
                let request = take_current(&mut self.location_request, generation)?;
                match result {
                    Ok(result) => self.current_location = Some(result),
                    Err(err) => {
                        warn!(query = %request.key, error = ?err, "current location weather unavailable");
                    }
                }
                Some(Update::Location)
            }
        }
    }

    fn cancel_place(&mut self) {
        if let Some(request) = self.place_request.take() {
            debug!(key = %request.key, "cancelling superseded request");
            request.token.cancel();
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Take the in-flight request if `generation` is still the live one.
fn take_current(slot: &mut Option<InFlight>, generation: u64) -> Option<InFlight> {
    let live = slot
        .as_ref()
        .is_some_and(|req| req.generation == generation && !req.token.is_cancelled());
    if !live {
        debug!(generation, "discarding superseded response");
        return None;
    }
    slot.take()
}
