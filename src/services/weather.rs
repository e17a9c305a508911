// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Current weather from OpenWeatherMap with outdoor training advice.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(10);
const CONDITIONS: [&str; 5] = ["Clear", "Partly Cloudy", "Cloudy", "Light Rain", "Rainy"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherSource {
    /// Live OpenWeatherMap data
    Live,
    /// Randomised stand-in (no key, or the request failed)
    Simulated,
    /// Fixed stand-in after an error status
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conditions {
    pub temperature: i32,
    pub humidity: u32,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub location: String,
    #[serde(flatten)]
    pub conditions: Conditions,
    pub source: WeatherSource,
    pub recommendation: &'static str,
    pub suggested_workout: &'static str,
    /// "High" or "Moderate"
    pub hydration: &'static str,
    pub water_ml: u32,
}

/// Outdoor advice for the given conditions.
pub fn advise(location: &str, conditions: Conditions, source: WeatherSource) -> WeatherReport {
    let rain = conditions.condition.contains("Rain");
    let temp = conditions.temperature;
    let (recommendation, suggested_workout) = if temp < 28 && !rain {
        ("Perfect for outdoor running!", "2.4km NAPFA practice run")
    } else if temp < 32 && !rain {
        ("Good for outdoor, stay hydrated", "Morning or evening run (avoid midday)")
    } else if rain {
        ("Indoor workout recommended", "Indoor circuit: push-ups, sit-ups, burpees")
    } else {
        ("Too hot! Indoor training", "Air-con gym or home workout")
    };
    let high = temp > 30 || conditions.humidity > 80;

    WeatherReport {
        location: location.to_string(),
        conditions,
        source,
        recommendation,
        suggested_workout,
        hydration: if high { "High" } else { "Moderate" },
        water_ml: if high { 500 } else { 300 },
    }
}

fn simulated() -> Conditions {
    let mut rng = rand::thread_rng();
    Conditions {
        temperature: rng.gen_range(25..=35),
        humidity: rng.gen_range(60..=90),
        condition: CONDITIONS.choose(&mut rng).copied().unwrap_or("Clear").to_string(),
    }
}

fn fixed_fallback() -> Conditions {
    Conditions {
        temperature: 30,
        humidity: 75,
        condition: "Clear".to_string(),
    }
}

#[derive(Deserialize)]
struct OwmResponse {
    main: OwmMain,
    weather: Vec<OwmWeather>,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
    humidity: u32,
}

#[derive(Deserialize)]
struct OwmWeather {
    main: String,
}

/// OpenWeatherMap client.
#[derive(Clone)]
pub struct WeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn report(&self, location: &str) -> WeatherReport {
        let (conditions, source) = self.conditions(location).await;
        advise(location, conditions, source)
    }

    async fn conditions(&self, location: &str) -> (Conditions, WeatherSource) {
        let Some(api_key) = self.api_key.as_deref() else {
            return (simulated(), WeatherSource::Simulated);
        };

        let response = self
            .http
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[("q", location), ("appid", api_key), ("units", "metric")])
            .timeout(TIMEOUT)
            .send()
            .await;

        let response = match response {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, location, "Weather request failed");
                return (simulated(), WeatherSource::Simulated);
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = response.status().as_u16(), location, "Weather API error");
            return (fixed_fallback(), WeatherSource::Fallback);
        }

        match response.json::<OwmResponse>().await {
            Ok(data) => (
                Conditions {
                    temperature: data.main.temp.round() as i32,
                    humidity: data.main.humidity,
                    condition: data
                        .weather
                        .into_iter()
                        .next()
                        .map_or_else(|| "Clear".to_string(), |w| w.main),
                },
                WeatherSource::Live,
            ),
            Err(e) => {
                tracing::warn!(error = %e, location, "Unreadable weather response");
                (simulated(), WeatherSource::Simulated)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(temperature: i32, humidity: u32, condition: &str) -> WeatherReport {
        advise(
            "Singapore",
            Conditions {
                temperature,
                humidity,
                condition: condition.to_string(),
            },
            WeatherSource::Live,
        )
    }

    #[test]
    fn test_advice_bands() {
        assert_eq!(at(27, 60, "Clear").recommendation, "Perfect for outdoor running!");
        assert_eq!(at(31, 60, "Clouds").suggested_workout, "Morning or evening run (avoid midday)");
        assert_eq!(at(26, 60, "Light Rain").recommendation, "Indoor workout recommended");
        assert_eq!(at(34, 60, "Clear").recommendation, "Too hot! Indoor training");
    }

    #[test]
    fn test_hydration() {
        assert_eq!(at(30, 80, "Clear").hydration, "Moderate");
        let humid = at(30, 85, "Clear");
        assert_eq!((humid.hydration, humid.water_ml), ("High", 500));
    }

    #[tokio::test]
    async fn test_simulated_without_key() {
        let report = WeatherClient::new("http://127.0.0.1:9", None).report("Singapore").await;
        assert_eq!(report.source, WeatherSource::Simulated);
        assert!((25..=35).contains(&report.conditions.temperature));
        assert!((60..=90).contains(&report.conditions.humidity));
        assert!(CONDITIONS.contains(&report.conditions.condition.as_str()));
    }
}
