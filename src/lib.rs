pub mod api;
pub mod core;
pub mod docx;
pub mod models;
pub mod templates;
pub mod weather;

// Re-export commonly used types
pub use crate::core::config::ServiceConfig;
pub use crate::core::error::{DocumentError, DocumentResult};

pub use api::{configure_routes, json_config, ApiState};
pub use docx::{DocumentXml, DocxPackage, DOCX_CONTENT_TYPE};
pub use models::GenerateRequest;
pub use templates::{RenderEngine, TemplateStore};
