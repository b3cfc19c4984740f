use actix_web::{test, web, App};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde_json::{json, Value};
use word_service::{
    configure_routes, json_config, ApiState, DocumentXml, DocxPackage, ServiceConfig,
    DOCX_CONTENT_TYPE,
};

const INVOICE_BODY: &str = concat!(
    "<w:p><w:r><w:t>Invoice for {{ name }}, total {{ amount }}</w:t></w:r></w:p>",
    "<w:tbl><w:tr>",
    "<w:tc><w:tcPr/><w:p><w:r><w:t>date</w:t></w:r></w:p></w:tc>",
    "<w:tc><w:tcPr/><w:p><w:r><w:t>weather</w:t></w:r></w:p></w:tc>",
    "</w:tr></w:tbl>",
);

async fn spawn_app_with(
    mut config: ServiceConfig,
    templates: &[(&str, &str)],
) -> (
    tempfile::TempDir,
    impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
) {
    let dir = tempfile::tempdir().unwrap();
    for (id, body) in templates {
        let bytes = DocxPackage::minimal(body).save().unwrap();
        std::fs::write(dir.path().join(format!("{}.docx", id)), bytes).unwrap();
    }

    config.templates_dir = dir.path().to_path_buf();
    let state = ApiState::new(config).await.unwrap();

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .app_data(json_config(1_048_576))
            .configure(configure_routes),
    )
    .await;

    (dir, app)
}

async fn spawn_app(
    templates: &[(&str, &str)],
) -> (
    tempfile::TempDir,
    impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
    >,
) {
    spawn_app_with(ServiceConfig::default(), templates).await
}

#[actix_web::test]
async fn health_reports_ok() {
    let (_dir, app) = spawn_app(&[]).await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn generate_returns_binary_document() {
    let (_dir, app) = spawn_app(&[("invoice", INVOICE_BODY)]).await;

    let req = test::TestRequest::post()
        .uri("/generate-from-template")
        .set_json(json!({"template": "invoice", "data": {"name": "Alice", "amount": 100}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("Content-Type").unwrap(),
        DOCX_CONTENT_TYPE
    );
    let disposition = resp
        .headers()
        .get("Content-Disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.contains("invoice.docx"));

    let body = test::read_body(resp).await;
    assert!(!body.is_empty());

    let package = DocxPackage::open(&body).unwrap();
    let xml = package.document_xml().unwrap();
    assert!(xml.contains("Invoice for Alice, total 100"));
}

#[actix_web::test]
async fn generate_is_deterministic() {
    let (_dir, app) = spawn_app(&[("invoice", INVOICE_BODY)]).await;
    let payload = json!({"template": "invoice", "data": {"name": "Alice", "amount": 100}});

    let first = test::call_and_read_body(
        &app,
        test::TestRequest::post()
            .uri("/generate-from-template")
            .set_json(&payload)
            .to_request(),
    )
    .await;
    let second = test::call_and_read_body(
        &app,
        test::TestRequest::post()
            .uri("/generate-from-template")
            .set_json(&payload)
            .to_request(),
    )
    .await;

    assert_eq!(first, second);
}

#[actix_web::test]
async fn missing_template_field_is_bad_request() {
    let (_dir, app) = spawn_app(&[("invoice", INVOICE_BODY)]).await;

    let req = test::TestRequest::post()
        .uri("/generate-from-template")
        .set_json(json!({"data": {}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"].as_str().unwrap().contains("template"));
}

#[actix_web::test]
async fn empty_template_id_is_unprocessable() {
    let (_dir, app) = spawn_app(&[]).await;

    let req = test::TestRequest::post()
        .uri("/generate-from-template")
        .set_json(json!({"template": "", "data": {}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
}

#[actix_web::test]
async fn unknown_template_is_not_found() {
    let (_dir, app) = spawn_app(&[("invoice", INVOICE_BODY)]).await;

    let req = test::TestRequest::post()
        .uri("/generate-from-template")
        .set_json(json!({"template": "nonexistent", "data": {}}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
}

#[actix_web::test]
async fn templates_endpoint_lists_identifiers() {
    let (_dir, app) = spawn_app(&[("invoice", INVOICE_BODY), ("report", "<w:p/>")]).await;

    let req = test::TestRequest::get().uri("/templates").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let templates = body["templates"].as_array().unwrap();
    assert!(templates.contains(&json!("invoice")));
    assert!(templates.contains(&json!("report")));
}

#[actix_web::test]
async fn fill_template_writes_cell_and_indents() {
    let (_dir, app) = spawn_app(&[]).await;

    let mut body = String::from("<w:tbl>");
    for _ in 0..5 {
        body.push_str("<w:tr><w:tc><w:tcPr/><w:p/></w:tc><w:tc><w:tcPr/><w:p/></w:tc><w:tc><w:tcPr/><w:p/></w:tc></w:tr>");
    }
    body.push_str("</w:tbl>");
    let template = BASE64.encode(DocxPackage::minimal(&body).save().unwrap());

    let req = test::TestRequest::post()
        .uri("/fill-template")
        .set_json(json!({
            "template_base64": template,
            "content": "人员投入：共计30人\n设备投入：挖机2台"
        }))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["success"], true);

    let bytes = BASE64.decode(resp["document_base64"].as_str().unwrap()).unwrap();
    let package = DocxPackage::open(&bytes).unwrap();
    let doc = DocumentXml::parse(&package.document_xml().unwrap()).unwrap();

    let table = doc.tables()[0];
    let cell = doc.row_cells(doc.table_rows(table)[4])[2];
    let text = doc.text_within(cell);
    assert!(text.contains("人员投入：共计30人"));
    // keyword lines picked up the first-line indent
    assert!(package.document_xml().unwrap().contains("w:firstLine=\"480\""));
}

#[actix_web::test]
async fn fill_template_rejects_out_of_range_indices() {
    let (_dir, app) = spawn_app(&[]).await;
    let template = BASE64.encode(
        DocxPackage::minimal("<w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl>")
            .save()
            .unwrap(),
    );

    let req = test::TestRequest::post()
        .uri("/fill-template")
        .set_json(json!({
            "template_base64": template,
            "content": "x",
            "table_index": 3
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
}

#[actix_web::test]
async fn fill_template_rejects_invalid_base64() {
    let (_dir, app) = spawn_app(&[]).await;

    let req = test::TestRequest::post()
        .uri("/fill-template")
        .set_json(json!({"template_base64": "@@not base64@@", "content": "x"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_web::test]
async fn update_date_weather_stamps_header_row() {
    let (_dir, app) = spawn_app(&[]).await;
    let document = BASE64.encode(DocxPackage::minimal(INVOICE_BODY).save().unwrap());

    let req = test::TestRequest::post()
        .uri("/update-date-weather")
        .set_json(json!({"document_base64": document}))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["success"], true);
    assert!(resp["weather_info"]["date"].as_str().unwrap().contains('年'));

    let bytes = BASE64.decode(resp["document_base64"].as_str().unwrap()).unwrap();
    let package = DocxPackage::open(&bytes).unwrap();
    let doc = DocumentXml::parse(&package.document_xml().unwrap()).unwrap();
    let table = doc.tables()[0];
    let cells = doc.row_cells(doc.table_rows(table)[0]);
    assert!(doc.text_within(cells[0]).contains('年'));
    assert!(doc.text_within(cells[1]).contains("天气："));
}

#[actix_web::test]
async fn update_personnel_stats_appends_block() {
    let (_dir, app) = spawn_app(&[]).await;
    let document = BASE64.encode(
        DocxPackage::minimal("<w:p><w:r><w:t>report</w:t></w:r></w:p>")
            .save()
            .unwrap(),
    );

    let req = test::TestRequest::post()
        .uri("/update-personnel-stats")
        .set_json(json!({"document_base64": document, "personnel_text": "共计30人"}))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["success"], true);

    let bytes = BASE64.decode(resp["document_base64"].as_str().unwrap()).unwrap();
    let xml = DocxPackage::open(&bytes).unwrap().document_xml().unwrap();
    assert!(xml.contains("【自动统计】"));
    assert!(xml.contains("共计30人"));
    assert!(xml.find("【自动统计】").unwrap() < xml.find("<w:sectPr/>").unwrap());
}

#[actix_web::test]
async fn update_appendix_tables_counts_updates() {
    let (_dir, app) = spawn_app(&[]).await;

    let mut body = String::from("<w:tbl>");
    for row in [
        ["序号", "项目", "单位", "今日", "累计", "备注"],
        ["1", "土方开挖", "m³", "-", "-", ""],
    ] {
        body.push_str("<w:tr>");
        for text in row {
            body.push_str(&format!(
                "<w:tc><w:tcPr/><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc>",
                text
            ));
        }
        body.push_str("</w:tr>");
    }
    body.push_str("</w:tbl>");
    let document = BASE64.encode(DocxPackage::minimal(&body).save().unwrap());

    let req = test::TestRequest::post()
        .uri("/update-appendix-tables")
        .set_json(json!({
            "document_base64": document,
            "data": [
                {"table_index": 0, "row_name": "土方", "today_qty": "80m³", "total_qty": "200m³"},
                {"table_index": 7, "row_name": "缺失", "today_qty": "1", "total_qty": "1"}
            ]
        }))
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resp["success"], true);
    assert_eq!(resp["updated"], 1);

    let bytes = BASE64.decode(resp["document_base64"].as_str().unwrap()).unwrap();
    let xml = DocxPackage::open(&bytes).unwrap().document_xml().unwrap();
    assert!(xml.contains("80m³"));
    assert!(xml.contains("200m³"));
}

#[actix_web::test]
async fn rate_limited_requests_get_429() {
    let config = ServiceConfig {
        rate_limit_per_minute: 1,
        rate_limit_burst: 1,
        ..ServiceConfig::default()
    };
    let (_dir, app) = spawn_app_with(config, &[("invoice", INVOICE_BODY)]).await;
    let payload = json!({"template": "invoice", "data": {}});

    let first = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/generate-from-template")
            .set_json(&payload)
            .to_request(),
    )
    .await;
    assert_eq!(first.status(), 200);

    let second = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/generate-from-template")
            .set_json(&payload)
            .to_request(),
    )
    .await;
    assert_eq!(second.status(), 429);

    let body: Value = test::read_body_json(second).await;
    assert!(body["error"].as_str().unwrap().contains("Rate limit"));
}

#[actix_web::test]
async fn metrics_expose_documents_counter() {
    let (_dir, app) = spawn_app(&[("invoice", INVOICE_BODY)]).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/generate-from-template")
            .set_json(json!({"template": "invoice", "data": {}}))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), 200);

    let req = test::TestRequest::get().uri("/metrics").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    assert!(resp
        .headers()
        .get("Content-Type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/plain"));

    let body = test::read_body(resp).await;
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("documents_generated_total"));
}

#[actix_web::test]
async fn ready_endpoint_checks_template_directory() {
    let (_dir, app) = spawn_app(&[]).await;

    let req = test::TestRequest::get().uri("/ready").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
}

#[actix_web::test]
async fn docs_endpoint_describes_routes() {
    let (_dir, app) = spawn_app(&[]).await;

    let req = test::TestRequest::get().uri("/docs").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["endpoints"].as_array().unwrap().len() >= 5);
}
