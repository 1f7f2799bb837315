//! Blocking HTTP client for the one-call weather endpoint.

use crate::model::weather::WeatherPayload;
use crate::weather::{WeatherConfig, WeatherError, WeatherSource};
use log::{info, warn};
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// `ureq`-backed weather source.
pub struct HttpWeatherClient {
    config: WeatherConfig,
    agent: ureq::Agent,
}

impl HttpWeatherClient {
    pub fn new(config: WeatherConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self { config, agent }
    }

    pub fn config(&self) -> &WeatherConfig {
        &self.config
    }
}

impl WeatherSource for HttpWeatherClient {
    fn fetch(&self, latitude: f64, longitude: f64) -> Result<WeatherPayload, WeatherError> {
        let started_at = Instant::now();
        let request = self
            .agent
            .get(&self.config.api_url)
            .query("lat", &latitude.to_string())
            .query("lon", &longitude.to_string())
            .query("exclude", "minutely")
            .query("units", &self.config.units)
            .query("appid", &self.config.api_key)
            .query("lang", &self.config.lang);

        let response = match request.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => {
                warn!(
                    "event=weather_fetch module=weather status=error duration_ms={} http_status={status}",
                    started_at.elapsed().as_millis()
                );
                return Err(WeatherError::Fetch { status });
            }
            Err(err) => {
                warn!(
                    "event=weather_fetch module=weather status=error duration_ms={} error_code=transport",
                    started_at.elapsed().as_millis()
                );
                return Err(WeatherError::Transport(err.to_string()));
            }
        };

        let payload = response
            .into_json::<WeatherPayload>()
            .map_err(|err| WeatherError::Decode(err.to_string()))?;
        info!(
            "event=weather_fetch module=weather status=ok duration_ms={} daily={} hourly={}",
            started_at.elapsed().as_millis(),
            payload.daily.len(),
            payload.hourly.len()
        );
        Ok(payload)
    }
}
