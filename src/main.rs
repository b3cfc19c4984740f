use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use anyhow::Result;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use word_service::{configure_routes, json_config, ApiState, ServiceConfig};

#[actix_web::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting Word Template Service");

    // Process metrics for /metrics
    prometheus::default_registry().register(Box::new(
        prometheus::process_collector::ProcessCollector::for_self(),
    ))?;

    // Load configuration
    let config = ServiceConfig::from_env()?;
    let host = config.host.clone();
    let port = config.port;
    let payload_limit = config.max_payload_bytes;

    // Initialize application state
    let state = web::Data::new(ApiState::new(config).await?);

    tracing::info!("Starting server on {}:{}", host, port);

    // Start HTTP server
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(json_config(payload_limit))
            .wrap(TracingLogger::default())
            .wrap(middleware::NormalizePath::trim())
            .wrap(Cors::permissive())
            .configure(configure_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
