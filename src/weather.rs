use std::time::Duration;

use anyhow::Result;
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};

const DEFAULT_WEATHER: &str = "晴";
const DEFAULT_TEMP: &str = "20℃~30℃";

/// Date and weather stamped into the report header.
#[derive(Debug, Clone, Serialize)]
pub struct WeatherInfo {
    pub date: String,
    pub weather: String,
    pub temp: String,
}

#[derive(Debug, Deserialize)]
struct WeatherApiResponse {
    weather: String,
    temp: String,
}

/// Looks up today's weather from an optional HTTP endpoint returning
/// `{"weather": …, "temp": …}`. Lookup failures fall back to fixed values;
/// the date is always local.
pub struct WeatherClient {
    http: reqwest::Client,
    api_url: Option<String>,
}

impl WeatherClient {
    pub fn new(api_url: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(WeatherClient { http, api_url })
    }

    pub async fn today(&self) -> WeatherInfo {
        let now = Local::now();
        let date = format!("{}年{}月{}日", now.year(), now.month(), now.day());

        if let Some(url) = &self.api_url {
            match self.fetch(url).await {
                Ok(resp) => {
                    return WeatherInfo {
                        date,
                        weather: resp.weather,
                        temp: resp.temp,
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "weather lookup failed, using defaults");
                }
            }
        }

        WeatherInfo {
            date,
            weather: DEFAULT_WEATHER.to_string(),
            temp: DEFAULT_TEMP.to_string(),
        }
    }

    async fn fetch(&self, url: &str) -> reqwest::Result<WeatherApiResponse> {
        self.http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}
