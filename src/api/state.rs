use std::num::NonZeroU32;
use std::sync::Arc;

use anyhow::Context;
use governor::{clock::DefaultClock, state::keyed::DashMapStateStore, Quota, RateLimiter};

use crate::core::config::ServiceConfig;
use crate::templates::{RenderEngine, TemplateStore};
use crate::weather::WeatherClient;

pub type KeyedRateLimiter = Arc<RateLimiter<String, DashMapStateStore<String>, DefaultClock>>;

#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<TemplateStore>,
    pub engine: Arc<RenderEngine>,
    pub weather: Arc<WeatherClient>,
    pub rate_limiter: KeyedRateLimiter,
    pub config: Arc<ServiceConfig>,
}

impl ApiState {
    pub async fn new(config: ServiceConfig) -> anyhow::Result<Self> {
        let store = Arc::new(TemplateStore::new(config.templates_dir.clone()).await?);
        let engine = Arc::new(RenderEngine::new());
        let weather = Arc::new(WeatherClient::new(config.weather_api_url.clone())?);

        let per_minute = NonZeroU32::new(config.rate_limit_per_minute)
            .context("RATE_LIMIT_PER_MINUTE must be nonzero")?;
        let burst = NonZeroU32::new(config.rate_limit_burst)
            .context("RATE_LIMIT_BURST must be nonzero")?;
        let quota = Quota::per_minute(per_minute).allow_burst(burst);
        let rate_limiter = Arc::new(RateLimiter::dashmap_with_clock(
            quota,
            &DefaultClock::default(),
        ));

        Ok(ApiState {
            store,
            engine,
            weather,
            rate_limiter,
            config: Arc::new(config),
        })
    }
}
