use actix_web::{web, HttpRequest, HttpResponse};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::json;

use super::error::{ApiError, ApiResult};
use super::handlers::check_rate_limit;
use super::state::ApiState;
use crate::core::error::DocumentError;
use crate::docx::table::update_quantity_row;
use crate::docx::{DocumentXml, DocxPackage, RunStyle};
use crate::models::{
    FillTemplateRequest, UpdateAppendixRequest, UpdateDateWeatherRequest, UpdatePersonnelRequest,
};

/// Fills one table cell of an uploaded document with the supplied content,
/// then applies smart first-line indentation across the document.
pub async fn fill_template(
    req: HttpRequest,
    body: web::Json<FillTemplateRequest>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    check_rate_limit(&req, &state)?;

    let mut package = decode_document(&body.template_base64)?;
    let mut doc = parse_document(&package)?;

    let cell = doc
        .tables()
        .get(body.table_index)
        .map(|&table| doc.table_rows(table))
        .and_then(|rows| rows.get(body.row_index).copied())
        .map(|row| doc.row_cells(row))
        .and_then(|cells| cells.get(body.col_index).copied())
        .ok_or_else(|| {
            ApiError::unprocessable_entity("table, row or column index out of range")
        })?;

    doc.replace_cell_content(cell, &body.content, &RunStyle::default());
    doc.apply_smart_indent(&state.config.indent_keywords, state.config.indent_twips);

    package.set_document_xml(doc.to_xml()?);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "document_base64": encode_document(&package)?
    })))
}

/// Stamps today's date into the first cell and the weather into the last
/// cell of the first table's header row.
pub async fn update_date_weather(
    req: HttpRequest,
    body: web::Json<UpdateDateWeatherRequest>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    check_rate_limit(&req, &state)?;

    let mut package = decode_document(&body.document_base64)?;
    let mut doc = parse_document(&package)?;
    let info = state.weather.today().await;

    if let Some(&table) = doc.tables().first() {
        if let Some(&header) = doc.table_rows(table).first() {
            let cells = doc.row_cells(header);
            let style = RunStyle::table_cell();
            let weather_line = format!("天气：{}                气温：{}", info.weather, info.temp);

            match cells.as_slice() {
                [] => {}
                [only] => doc.replace_cell_content(*only, &weather_line, &style),
                [first, .., last] => {
                    // Last cell first; its span would shift otherwise.
                    doc.replace_cell_content(*last, &weather_line, &style);
                    doc.replace_cell_content(*first, &info.date, &style);
                }
            }
        }
    }

    package.set_document_xml(doc.to_xml()?);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "document_base64": encode_document(&package)?,
        "weather_info": info
    })))
}

/// Appends the personnel statistics block as a paragraph at the end of the
/// document body.
pub async fn update_personnel_stats(
    req: HttpRequest,
    body: web::Json<UpdatePersonnelRequest>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    check_rate_limit(&req, &state)?;

    let mut package = decode_document(&body.document_base64)?;
    let mut doc = parse_document(&package)?;

    doc.append_paragraph(&format!("\n【自动统计】\n{}", body.personnel_text));

    package.set_document_xml(doc.to_xml()?);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "document_base64": encode_document(&package)?
    })))
}

/// Writes daily and cumulative quantities into the named rows of the
/// appendix tables. Items referencing missing tables or rows are skipped.
pub async fn update_appendix_tables(
    req: HttpRequest,
    body: web::Json<UpdateAppendixRequest>,
    state: web::Data<ApiState>,
) -> ApiResult<HttpResponse> {
    check_rate_limit(&req, &state)?;

    let mut package = decode_document(&body.document_base64)?;
    let mut doc = parse_document(&package)?;

    let mut updated = 0usize;
    for item in &body.data {
        if update_quantity_row(
            &mut doc,
            item.table_index,
            &item.row_name,
            &item.today_qty,
            &item.total_qty,
        ) {
            updated += 1;
        } else {
            tracing::warn!(
                table_index = item.table_index,
                row_name = %item.row_name,
                "appendix row not found, skipping"
            );
        }
    }

    package.set_document_xml(doc.to_xml()?);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "document_base64": encode_document(&package)?,
        "updated": updated
    })))
}

fn decode_document(encoded: &str) -> ApiResult<DocxPackage> {
    let bytes = BASE64.decode(encoded).map_err(DocumentError::from)?;
    DocxPackage::open(&bytes).map_err(|e| ApiError::bad_request(format!("Invalid document: {}", e)))
}

fn parse_document(package: &DocxPackage) -> ApiResult<DocumentXml> {
    let xml = package
        .document_xml()
        .map_err(|e| ApiError::bad_request(format!("Invalid document: {}", e)))?;
    DocumentXml::parse(&xml).map_err(|e| ApiError::bad_request(format!("Invalid document: {}", e)))
}

fn encode_document(package: &DocxPackage) -> ApiResult<String> {
    Ok(BASE64.encode(package.save()?))
}
