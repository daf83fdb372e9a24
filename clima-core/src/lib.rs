//! Core library for the `clima` weather app.
//!
//! This crate defines:
//! - A declarative JSON schema and the decoder/encoder that applies it
//! - The typed weather report and its weatherapi.com schema
//! - The fetch adapter for the upstream `current.json` endpoint
//! - Routing and view state for the home and result screens
//! - Configuration handling
//!
//! It is used by `clima-cli`, but can also be reused by other front-ends.

pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod route;
pub mod schema;
pub mod view;

pub use codec::{Decoded, decode, encode};
pub use config::{Config, ProviderConfig};
pub use error::{DecodeError, FetchError, RouteError, WeatherError};
pub use model::{Condition, CurrentWeather, Location, Reading, WeatherReport};
pub use provider::{WeatherProvider, provider_from_config, weatherapi::WeatherApiProvider};
pub use route::{Navigation, Route, Router};
pub use schema::{Property, Schema, SchemaSet, weather_schemas};
pub use view::{HomeView, PendingFetch, RequestToken, ResultView, SearchForm};
