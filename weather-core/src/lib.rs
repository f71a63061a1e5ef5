//! Core library for the weather relay.
//!
//! This crate defines:
//! - Query normalization (place name vs. coordinate pair)
//! - The relay over an upstream weather provider, with status classification
//! - The client-side dispatcher and its session cache
//! - Configuration & credentials handling
//!
//! It is used by the `weather-relay` binary, but can also be reused by other
//! binaries or services.

pub mod cache;
pub mod config;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod model;
pub mod provider;
pub mod query;
pub mod relay;

pub use cache::WeatherCache;
pub use config::Config;
pub use dispatch::{Dispatcher, Phase, SearchOutcome, Update};
pub use display::WeatherView;
pub use error::WeatherError;
pub use model::WeatherResult;
pub use provider::WeatherProvider;
pub use query::{QueryParams, WeatherQuery, normalize_key};
pub use relay::{Relay, RelayOutcome};
