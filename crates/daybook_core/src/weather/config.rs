//! Weather endpoint configuration.
//!
//! Resolved from the environment:
//! - `DAYBOOK_WEATHER_API_URL` (required): one-call endpoint.
//! - `DAYBOOK_WEATHER_API_KEY` (required): `appid` value.
//! - `DAYBOOK_WEATHER_ICONS_URL` (optional): icon asset prefix.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub const ENV_API_URL: &str = "DAYBOOK_WEATHER_API_URL";
pub const ENV_API_KEY: &str = "DAYBOOK_WEATHER_API_KEY";
pub const ENV_ICONS_URL: &str = "DAYBOOK_WEATHER_ICONS_URL";

const DEFAULT_ICONS_URL: &str = "https://openweathermap.org/img/wn/";
const DEFAULT_LANG: &str = "fi";
const DEFAULT_UNITS: &str = "metric";

/// Missing or empty required setting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WeatherConfigError {
    Missing(&'static str),
}

impl Display for WeatherConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing(name) => write!(f, "weather setting `{name}` is not set"),
        }
    }
}

impl Error for WeatherConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherConfig {
    pub api_url: String,
    pub api_key: String,
    pub icons_url: String,
    pub lang: String,
    pub units: String,
}

impl WeatherConfig {
    /// Builds a config with default icon prefix, language and units.
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            icons_url: DEFAULT_ICONS_URL.to_string(),
            lang: DEFAULT_LANG.to_string(),
            units: DEFAULT_UNITS.to_string(),
        }
    }

    pub fn from_env() -> Result<Self, WeatherConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves settings through `lookup`; blank values count as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, WeatherConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_url = read(ENV_API_URL).ok_or(WeatherConfigError::Missing(ENV_API_URL))?;
        let api_key = read(ENV_API_KEY).ok_or(WeatherConfigError::Missing(ENV_API_KEY))?;
        let mut config = Self::new(api_url, api_key);
        config.icons_url = icons_url_from_lookup(lookup);
        Ok(config)
    }

    /// URL of the 2x icon asset for a condition icon code.
    pub fn icon_url(&self, icon: &str) -> String {
        icon_url(&self.icons_url, icon)
    }
}

/// Icon prefix from `DAYBOOK_WEATHER_ICONS_URL`, or the public default.
///
/// Icons do not need the API key, so this resolves without a full config.
pub fn icons_url_from_env() -> String {
    icons_url_from_lookup(|name| std::env::var(name).ok())
}

fn icons_url_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> String {
    lookup(ENV_ICONS_URL)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_ICONS_URL.to_string())
}

pub fn icon_url(icons_url: &str, icon: &str) -> String {
    format!("{icons_url}{icon}@2x.png")
}

#[cfg(test)]
mod tests {
    use super::{WeatherConfig, WeatherConfigError, ENV_API_KEY, ENV_API_URL, ENV_ICONS_URL};

    #[test]
    fn lookup_requires_url_and_key() {
        let err = WeatherConfig::from_lookup(|name| {
            (name == ENV_API_URL).then(|| "https://example.test/onecall".to_string())
        })
        .expect_err("key missing");
        assert_eq!(err, WeatherConfigError::Missing(ENV_API_KEY));
    }

    #[test]
    fn lookup_applies_defaults_and_icon_override() {
        let config = WeatherConfig::from_lookup(|name| match name {
            ENV_API_URL => Some("https://example.test/onecall".to_string()),
            ENV_API_KEY => Some(" secret ".to_string()),
            ENV_ICONS_URL => Some("https://icons.test/".to_string()),
            _ => None,
        })
        .expect("complete config");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.lang, "fi");
        assert_eq!(config.units, "metric");
        assert_eq!(config.icon_url("10d"), "https://icons.test/10d@2x.png");
    }

    #[test]
    fn icons_fall_back_to_public_prefix() {
        let config = WeatherConfig::new("https://example.test/onecall", "secret");
        assert_eq!(
            config.icon_url("01n"),
            "https://openweathermap.org/img/wn/01n@2x.png"
        );
    }
}
