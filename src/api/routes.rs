use actix_web::{web, HttpResponse};

use super::document_handlers;
use super::handlers;
use super::state::ApiState;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg
        // Health checks
        .route("/health", web::get().to(health_check))
        .route("/ready", web::get().to(readiness_check))
        .route("/metrics", web::get().to(metrics_endpoint))
        .route("/docs", web::get().to(api_docs))
        // Templates
        .route("/templates", web::get().to(list_templates))
        // Document generation
        .route(
            "/generate-from-template",
            web::post().to(handlers::generate_from_template),
        )
        // Document editing
        .route(
            "/fill-template",
            web::post().to(document_handlers::fill_template),
        )
        .route(
            "/update-date-weather",
            web::post().to(document_handlers::update_date_weather),
        )
        .route(
            "/update-personnel-stats",
            web::post().to(document_handlers::update_personnel_stats),
        )
        .route(
            "/update-appendix-tables",
            web::post().to(document_handlers::update_appendix_tables),
        );
}

async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok"
    }))
}

async fn readiness_check(state: web::Data<ApiState>) -> HttpResponse {
    let templates_ok = state.config.templates_dir.is_dir();

    if templates_ok {
        HttpResponse::Ok().json(serde_json::json!({
            "status": "ready",
            "checks": {
                "templates": "ok"
            }
        }))
    } else {
        HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "not_ready",
            "checks": {
                "templates": "failed"
            }
        }))
    }
}

async fn metrics_endpoint() -> HttpResponse {
    use prometheus::{Encoder, TextEncoder};

    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];

    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");

    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(buffer)
}

async fn list_templates(state: web::Data<ApiState>) -> HttpResponse {
    let templates = state.store.list().await;

    HttpResponse::Ok().json(serde_json::json!({
        "templates": templates
    }))
}

async fn api_docs() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "service": "word-service",
        "endpoints": [
            {"method": "POST", "path": "/generate-from-template",
             "description": "Merge a substitution mapping into a named template, returns the binary document"},
            {"method": "POST", "path": "/fill-template",
             "description": "Fill a table cell of an uploaded document and apply smart indentation"},
            {"method": "POST", "path": "/update-date-weather",
             "description": "Stamp today's date and weather into the header table"},
            {"method": "POST", "path": "/update-personnel-stats",
             "description": "Append a personnel statistics paragraph"},
            {"method": "POST", "path": "/update-appendix-tables",
             "description": "Update quantity rows in the appendix tables"},
            {"method": "GET", "path": "/templates", "description": "List available templates"},
            {"method": "GET", "path": "/health", "description": "Liveness probe"},
            {"method": "GET", "path": "/ready", "description": "Readiness probe"},
            {"method": "GET", "path": "/metrics", "description": "Prometheus metrics"}
        ]
    }))
}
