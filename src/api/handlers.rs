use actix_web::{http::StatusCode, web, HttpRequest, HttpResponse};
use once_cell::sync::Lazy;
use prometheus::IntCounter;
use uuid::Uuid;

use super::error::{ApiError, ApiResult};
use super::state::ApiState;
use crate::docx::{DocxPackage, DOCX_CONTENT_TYPE};
use crate::models::GenerateRequest;

pub static DOCUMENTS_GENERATED: Lazy<IntCounter> = Lazy::new(|| {
    prometheus::register_int_counter!(
        "documents_generated_total",
        "Documents generated from templates"
    )
    .expect("register documents counter")
});

/// Merge the substitution mapping into the named template and stream the
/// resulting document back.
pub async fn generate_from_template(
    req: HttpRequest,
    body: web::Json<GenerateRequest>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    check_rate_limit(&req, &state)?;

    let request = body.into_inner();
    validate_template_id(&request.template)?;

    let start = std::time::Instant::now();

    let template_bytes = state.store.get(&request.template).await?;
    let mut package = DocxPackage::open(&template_bytes)?;
    let source = package.document_xml()?;

    let rendered = state.engine.render(&source, &request.data).map_err(|e| {
        tracing::error!(template = %request.template, error = %e, "template rendering failed");
        ApiError::internal_server_error("Failed to render template")
    })?;

    package.set_document_xml(rendered);
    let bytes = package.save()?;

    let document_id = Uuid::new_v4();
    DOCUMENTS_GENERATED.inc();
    tracing::info!(
        template = %request.template,
        %document_id,
        size_bytes = bytes.len(),
        processing_time_ms = start.elapsed().as_millis() as u64,
        "document generated"
    );

    let filename = request
        .output_filename
        .unwrap_or_else(|| format!("{}.docx", request.template));
    let filename = if filename.ends_with(".docx") {
        filename
    } else {
        format!("{}.docx", filename)
    };

    Ok(HttpResponse::Ok()
        .content_type(DOCX_CONTENT_TYPE)
        .insert_header((
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename),
        ))
        .insert_header(("X-Document-Id", document_id.to_string()))
        .body(bytes))
}

pub fn check_rate_limit(req: &HttpRequest, state: &ApiState) -> ApiResult<()> {
    let key = req
        .peer_addr()
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if state.rate_limiter.check_key(&key).is_err() {
        return Err(ApiError::new(
            "Rate limit exceeded",
            StatusCode::TOO_MANY_REQUESTS,
        ));
    }

    Ok(())
}

fn validate_template_id(template: &str) -> ApiResult<()> {
    if template.is_empty() {
        return Err(ApiError::unprocessable_entity(
            "template must not be empty",
        ));
    }
    if template.contains("..")
        || !template
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(ApiError::unprocessable_entity(format!(
            "invalid template identifier: {:?}",
            template
        )));
    }
    Ok(())
}
