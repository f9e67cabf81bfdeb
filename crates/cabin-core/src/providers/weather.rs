//! Open-Meteo current-conditions lookup.

use async_trait::async_trait;
use serde::Deserialize;

use super::{ProviderError, WeatherProvider};
use crate::config;

/// Current weather at the dashboard's fixed coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherReport {
    /// Temperature in degrees Celsius.
    pub temperature_c: f64,
    /// WMO weather interpretation code.
    pub code: i32,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature: f64,
    weathercode: i32,
}

/// Map a WMO weather code to a description and display glyph.
pub fn weather_code_to_info(code: i32) -> (&'static str, &'static str) {
    match code {
        0 => ("Clear sky", "☀️"),
        1..=3 => ("Mainly clear", "🌤️"),
        45 | 48 => ("Fog", "🌫️"),
        51 | 53 | 55 => ("Drizzle", "🌦️"),
        61 | 63 | 65 | 80..=82 => ("Rain", "🌧️"),
        71 | 73 | 75 => ("Snowfall", "❄️"),
        95 => ("Thunderstorm", "⛈️"),
        _ => ("Unknown", "❓"),
    }
}

/// Weather provider backed by Open-Meteo.
pub struct OpenMeteoWeather {
    client: reqwest::Client,
    base_url: String,
}

impl OpenMeteoWeather {
    /// Create a provider against the default public endpoint.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, config::OPEN_METEO_URL)
    }

    /// Create a provider against a specific endpoint.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoWeather {
    async fn current(&self) -> Result<WeatherReport, ProviderError> {
        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current_weather=true",
            self.base_url,
            config::WEATHER_LAT,
            config::WEATHER_LNG
        );

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::Status(response.status().as_u16()));
        }

        let body: ForecastResponse = response.json().await?;
        Ok(WeatherReport {
            temperature_c: body.current_weather.temperature,
            code: body.current_weather.weathercode,
        })
    }
}
