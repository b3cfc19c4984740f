use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid document package: {0}")]
    Package(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("template rendering failed: {0}")]
    Rendering(#[from] minijinja::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl From<zip::result::ZipError> for DocumentError {
    fn from(err: zip::result::ZipError) -> Self {
        DocumentError::Package(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for DocumentError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        DocumentError::Package(err.to_string())
    }
}

pub type DocumentResult<T> = Result<T, DocumentError>;
