//! Weather provider boundary.
//!
//! # Responsibility
//! - Fetch one forecast payload for a coordinate pair.
//! - Classify failures so the view can surface a message.
//!
//! # Invariants
//! - A non-success HTTP status is always `WeatherError::Fetch`.
//! - No retry and no caching at this layer.

use crate::model::weather::WeatherPayload;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod client;
pub mod config;

pub use client::HttpWeatherClient;
pub use config::{icon_url, icons_url_from_env, WeatherConfig, WeatherConfigError};

/// Message shown to the user for a failed fetch.
pub const FETCH_FAILED_MESSAGE: &str = "Weather data could not be fetched";

/// Weather provider failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    /// Provider answered with a non-success status.
    Fetch { status: u16 },
    /// Request never produced a response (DNS, TLS, timeout, ...).
    Transport(String),
    /// Response body is not the expected payload.
    Decode(String),
}

impl Display for WeatherError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetch { .. } => f.write_str(FETCH_FAILED_MESSAGE),
            Self::Transport(message) => write!(f, "weather request failed: {message}"),
            Self::Decode(message) => write!(f, "weather payload could not be decoded: {message}"),
        }
    }
}

impl Error for WeatherError {}

/// Source of forecast payloads.
pub trait WeatherSource {
    fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherPayload, WeatherError>;
}
