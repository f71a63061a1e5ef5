use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{WeatherError, WeatherQuery, WeatherResult, provider::WeatherProvider};

/// How a relayed request ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayOutcome {
    Completed(Result<WeatherResult, WeatherError>),
    /// Superseded or torn down before the upstream answered. Not an error.
    Cancelled,
}

/// Forwards a normalized query to exactly one upstream call and passes the
/// payload through untouched.
#[derive(Debug, Clone)]
pub struct Relay {
    provider: Arc<dyn WeatherProvider>,
}

impl Relay {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Forward `query` unless `cancel` fires first. Once cancelled, the
    /// in-flight call is dropped and no result is produced.
    pub async fn forward(&self, query: &WeatherQuery, cancel: &CancellationToken) -> RelayOutcome {
        if cancel.is_cancelled() {
            return RelayOutcome::Cancelled;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(%query, "request cancelled before upstream answered");
                RelayOutcome::Cancelled
            }
            result = self.provider.fetch(query) => {
                if cancel.is_cancelled() {
                    return RelayOutcome::Cancelled;
                }
                if let Err(err) = &result {
                    warn!(%query, error = ?err, "weather request failed");
                }
                RelayOutcome::Completed(result)
            }
        }
    }

    /// Forward without cancellation. Used by the stateless server path, where
    /// dropping the handler future is the only way a request goes away.
    pub async fn forward_uncancellable(
        &self,
        query: &WeatherQuery,
    ) -> Result<WeatherResult, WeatherError> {
        let result = self.provider.fetch(query).await;
        if let Err(err) = &result {
            warn!(%query, error = ?err, "weather request failed");
        }
        result
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// In-memory provider that counts calls and can be held until released.
    #[derive(Debug, Default)]
    pub(crate) struct StubProvider {
        pub calls: AtomicUsize,
        responses: Mutex<HashMap<String, Result<WeatherResult, WeatherError>>>,
        gates: Mutex<HashMap<String, Arc<Notify>>>,
        panics: Mutex<HashSet<String>>,
    }

    impl StubProvider {
        pub fn new() -> Self {
            Self::default()
        }

        fn key(query: &WeatherQuery) -> String {
            match query {
                WeatherQuery::Place { name } => name.clone(),
                WeatherQuery::Coordinates { lat, lon } => format!("{lat},{lon}"),
            }
        }

        pub fn respond(&self, key: &str, result: Result<WeatherResult, WeatherError>) {
            self.responses.lock().unwrap().insert(key.to_string(), result);
        }

        /// Hold requests for `key` until the returned handle is notified.
        pub fn hold(&self, key: &str) -> Arc<Notify> {
            let gate = Arc::new(Notify::new());
            self.gates.lock().unwrap().insert(key.to_string(), gate.clone());
            gate
        }

        /// Make requests for `key` panic inside the provider.
        pub fn panic_on(&self, key: &str) {
            self.panics.lock().unwrap().insert(key.to_string());
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for StubProvider {
        async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherResult, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let key = Self::key(query);
            let gate = self.gates.lock().unwrap().get(&key).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            let panics = self.panics.lock().unwrap().contains(&key);
            if panics {
                panic!("provider blew up for {key}");
            }
            self.responses
                .lock()
                .unwrap()
                .get(&key)
                .cloned()
                .unwrap_or_else(|| Err(WeatherError::NotFound))
        }
    }

    #[tokio::test]
    async fn completes_with_provider_result() {
        let stub = Arc::new(StubProvider::new());
        stub.respond("Oslo", Ok(WeatherResult::from_body("{\"name\":\"Oslo\"}")));
        let relay = Relay::new(stub.clone());

        let query = WeatherQuery::place("Oslo").expect("place");
        let outcome = relay.forward(&query, &CancellationToken::new()).await;

        assert_eq!(
            outcome,
            RelayOutcome::Completed(Ok(WeatherResult::from_body("{\"name\":\"Oslo\"}")))
        );
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn pre_cancelled_token_makes_no_call() {
        let stub = Arc::new(StubProvider::new());
        let relay = Relay::new(stub.clone());
        let token = CancellationToken::new();
        token.cancel();

        let query = WeatherQuery::place("Oslo").expect("place");
        assert_eq!(relay.forward(&query, &token).await, RelayOutcome::Cancelled);
        assert_eq!(stub.calls(), 0);
    }

    #[tokio::test]
    async fn cancellation_while_pending_yields_no_result() {
        let stub = Arc::new(StubProvider::new());
        stub.respond("Oslo", Ok(WeatherResult::from_body("{}")));
        let _gate = stub.hold("Oslo");
        let relay = Relay::new(stub.clone());
        let token = CancellationToken::new();

        let task = {
            let relay = relay.clone();
            let token = token.clone();
            tokio::spawn(async move {
                let query = WeatherQuery::place("Oslo").expect("place");
                relay.forward(&query, &token).await
            })
        };

        while stub.calls() == 0 {
            tokio::task::yield_now().await;
        }
        token.cancel();

        assert_eq!(task.await.expect("join"), RelayOutcome::Cancelled);
    }

    #[tokio::test]
    async fn errors_pass_through_classified() {
        let stub = Arc::new(StubProvider::new());
        stub.respond("Nowhere", Err(WeatherError::NotFound));
        let relay = Relay::new(stub);

        let query = WeatherQuery::place("Nowhere").expect("place");
        let err = relay.forward_uncancellable(&query).await.unwrap_err();
        assert_eq!(err, WeatherError::NotFound);
    }
}
