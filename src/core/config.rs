use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Runtime configuration, loaded from environment variables with sensible
/// defaults so the service starts without any setup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub templates_dir: PathBuf,
    pub max_payload_bytes: usize,
    pub rate_limit_per_minute: u32,
    pub rate_limit_burst: u32,
    pub weather_api_url: Option<String>,
    pub indent_keywords: Vec<String>,
    pub indent_twips: u32,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            host: "0.0.0.0".to_string(),
            port: 8000,
            templates_dir: PathBuf::from("templates"),
            max_payload_bytes: 20_971_520, // 20MB, base64 documents included
            rate_limit_per_minute: 100,
            rate_limit_burst: 20,
            weather_api_url: None,
            indent_keywords: default_indent_keywords(),
            indent_twips: 480, // 24pt first-line indent
        }
    }
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self> {
        let config = ServiceConfig {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8000".to_string())
                .parse()?,
            templates_dir: PathBuf::from(
                env::var("TEMPLATES_DIR").unwrap_or_else(|_| "templates".to_string()),
            ),
            max_payload_bytes: env::var("MAX_PAYLOAD_BYTES")
                .unwrap_or_else(|_| "20971520".to_string())
                .parse()?,
            rate_limit_per_minute: env::var("RATE_LIMIT_PER_MINUTE")
                .unwrap_or_else(|_| "100".to_string())
                .parse()?,
            rate_limit_burst: env::var("RATE_LIMIT_BURST")
                .unwrap_or_else(|_| "20".to_string())
                .parse()?,
            weather_api_url: env::var("WEATHER_API_URL").ok().filter(|s| !s.is_empty()),
            indent_keywords: env::var("INDENT_KEYWORDS")
                .ok()
                .map(|s| {
                    s.split(',')
                        .map(|k| k.trim().to_string())
                        .filter(|k| !k.is_empty())
                        .collect()
                })
                .unwrap_or_else(default_indent_keywords),
            indent_twips: env::var("INDENT_TWIPS")
                .unwrap_or_else(|_| "480".to_string())
                .parse()?,
        };

        Ok(config)
    }
}

fn default_indent_keywords() -> Vec<String> {
    ["人员投入", "设备投入", "累计工程量", "人员：", "设备："]
        .iter()
        .map(|k| k.to_string())
        .collect()
}
