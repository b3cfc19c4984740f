use serde::{Deserialize, Serialize};

/// Body of `POST /generate-from-template`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// Template identifier, resolved against the template directory.
    pub template: String,
    /// Substitution mapping merged into the template placeholders.
    #[serde(default = "default_data")]
    pub data: serde_json::Value,
    /// Overrides the download filename; `.docx` is appended when absent.
    #[serde(default)]
    pub output_filename: Option<String>,
}

fn default_data() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

/// Body of `POST /fill-template`: fill one table cell of an uploaded
/// document, then apply smart indentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillTemplateRequest {
    pub template_base64: String,
    pub content: String,
    #[serde(default)]
    pub table_index: usize,
    #[serde(default = "default_row_index")]
    pub row_index: usize,
    #[serde(default = "default_col_index")]
    pub col_index: usize,
}

fn default_row_index() -> usize {
    4
}

fn default_col_index() -> usize {
    2
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDateWeatherRequest {
    pub document_base64: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePersonnelRequest {
    pub document_base64: String,
    pub personnel_text: String,
}

/// One appendix update: the row whose name column contains `row_name` gets
/// its daily and cumulative quantity cells rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppendixTableData {
    pub table_index: usize,
    pub row_name: String,
    pub today_qty: String,
    pub total_qty: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAppendixRequest {
    pub document_base64: String,
    pub data: Vec<AppendixTableData>,
}
