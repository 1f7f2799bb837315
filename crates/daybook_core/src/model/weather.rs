//! Weather payload and the snapshot the weather view renders.
//!
//! # Invariants
//! - `daily` drops the first (current-day) entry and keeps the next seven.
//! - `hourly` keeps the first twenty-four entries.
//! - Short payloads are sliced to what is present; slicing never fails.

use serde::{Deserialize, Serialize};

const DAILY_SKIP: usize = 1;
const DAILY_KEEP: usize = 7;
const HOURLY_KEEP: usize = 24;

/// Icon and localized description of one weather condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conditions {
    pub icon: String,
    pub description: String,
}

/// Point reading used for both "now" and hourly entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Unix seconds.
    pub dt: i64,
    /// Degrees Celsius (metric units).
    pub temp: f64,
    pub feels_like: f64,
    #[serde(rename = "weather", default)]
    pub conditions: Vec<Conditions>,
}

/// Day-part temperatures of a daily entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTemperature {
    pub day: f64,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

/// Day-part apparent temperatures of a daily entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayFeelsLike {
    pub day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub dt: i64,
    pub temp: DayTemperature,
    pub feels_like: DayFeelsLike,
    #[serde(rename = "weather", default)]
    pub conditions: Vec<Conditions>,
}

/// Raw one-call response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    pub current: Reading,
    #[serde(default)]
    pub daily: Vec<DailyForecast>,
    #[serde(default)]
    pub hourly: Vec<Reading>,
}

/// Current conditions plus the hourly and multi-day slices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub current: Reading,
    pub hourly: Vec<Reading>,
    pub daily: Vec<DailyForecast>,
}

impl WeatherSnapshot {
    pub fn from_payload(payload: WeatherPayload) -> Self {
        let daily = payload
            .daily
            .into_iter()
            .skip(DAILY_SKIP)
            .take(DAILY_KEEP)
            .collect();
        let hourly = payload.hourly.into_iter().take(HOURLY_KEEP).collect();
        Self {
            current: payload.current,
            hourly,
            daily,
        }
    }
}

impl Reading {
    /// First listed condition, which is the one the UI shows.
    pub fn primary_conditions(&self) -> Option<&Conditions> {
        self.conditions.first()
    }
}

impl DailyForecast {
    pub fn primary_conditions(&self) -> Option<&Conditions> {
        self.conditions.first()
    }
}
