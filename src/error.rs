use std::io;
use thiserror::Error;

/// Error types for the application.
///
/// The domain errors form a closed set: a malformed row or URL is
/// `Validation`, a transport failure during metadata fetch or download is
/// `Transfer`, a zero-byte remote file is `EmptyFile`, and a missing folder
/// or spreadsheet is `NotFound`. The remaining variants cover ambient
/// concerns (filesystem, HTTP plumbing, credentials).
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("transfer error: {0}")]
    Transfer(#[source] reqwest::Error),

    #[error("empty file: {0}")]
    EmptyFile(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("API error: {status} from {endpoint}")]
    Api {
        status: reqwest::StatusCode,
        endpoint: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;
