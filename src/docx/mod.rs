pub mod document;
pub mod package;
pub mod table;

pub use document::{DocumentXml, RunStyle, Span};
pub use package::DocxPackage;

pub const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
