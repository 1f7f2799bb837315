//! Weather screen view model.
//!
//! # Invariants
//! - A failed load keeps the previous snapshot and records a message.
//! - A successful load replaces the snapshot and clears the message.

use crate::model::weather::WeatherSnapshot;
use crate::weather::{WeatherError, WeatherSource};
use log::warn;

/// Current conditions and forecasts for one location.
pub struct WeatherViewModel<W: WeatherSource> {
    source: W,
    snapshot: Option<WeatherSnapshot>,
    error: Option<String>,
}

impl<W: WeatherSource> WeatherViewModel<W> {
    pub fn new(source: W) -> Self {
        Self {
            source,
            snapshot: None,
            error: None,
        }
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        self.snapshot.as_ref()
    }

    /// Message of the last failed load, cleared by the next success.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn source(&self) -> &W {
        &self.source
    }

    /// Fetches once for `(latitude, longitude)` and partitions the payload.
    pub fn load(
        &mut self,
        latitude: f64,
        longitude: f64,
    ) -> Result<&WeatherSnapshot, WeatherError> {
        match self.source.fetch(latitude, longitude) {
            Ok(payload) => {
                self.error = None;
                Ok(&*self.snapshot.insert(WeatherSnapshot::from_payload(payload)))
            }
            Err(err) => {
                warn!("event=weather_load module=weather status=error error={err}");
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }
}
