use actix_web::{error::JsonPayloadError, web, HttpRequest, HttpResponse};

pub mod document_handlers;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::configure_routes;
pub use state::ApiState;

/// JSON extractor configuration shared by the server and the tests: payload
/// limit plus a 400 envelope carrying the field-level deserialization error.
pub fn json_config(limit: usize) -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(limit)
        .error_handler(json_error_handler)
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let detail = err.to_string();
    let response = HttpResponse::BadRequest().json(serde_json::json!({
        "error": detail,
        "status": 400
    }));
    actix_web::error::InternalError::from_response(err, response).into()
}
