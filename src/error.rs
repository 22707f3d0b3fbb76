use thiserror::Error;

#[derive(Debug, Error)]
pub enum CiteReportError {
    #[error("Invalid style configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid bibliography entry: {0}")]
    InvalidEntry(String),

    /// The external compiler ran but left no usable output. Never escapes `BibTex::run`.
    #[error("Bibliography compilation failed: {0}")]
    CompileFailure(String),

    /// Scratch workspace could not be set up or written (e.g. storage exhausted).
    #[error("Render environment unusable: {0}")]
    Environment(#[source] std::io::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CiteReportError>;
