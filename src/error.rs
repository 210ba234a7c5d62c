// src/error.rs
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageServerError {
    #[error("HTTP request failed: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("URL parsing failed: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON processing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("JSON deserialization failed: {0}")]
    JsonDeserializationFailed(String),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// The service answered with an error payload. `body` holds the complete response.
    #[error("Image service error (code {code}): {message}")]
    ServiceError {
        code: i64,
        message: String,
        details: Vec<String>,
        body: Value,
    },

    #[error("Pixel value count ({values}) does not match catalog item count ({items})")]
    LengthMismatch { values: usize, items: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ImageServerError {
    /// Creates an `ImageServerError` from an HTTP status code and a JSON response body.
    ///
    /// ArcGIS services report failures as `{"error": {"code", "message", "details"}}`,
    /// frequently with an HTTP 200 status, so the payload code wins over the HTTP status.
    pub(crate) fn from_response(status_code: u16, response_body: Value) -> Self {
        let error = response_body.get("error");

        let code = error
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_i64())
            .unwrap_or(status_code as i64);
        let message = error
            .and_then(|e| e.get("message"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP error {}", status_code));
        let details = error
            .and_then(|e| e.get("details"))
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|d| d.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        ImageServerError::ServiceError {
            code,
            message,
            details,
            body: response_body,
        }
    }

    /// Returns the raw error body for service errors.
    pub fn error_body(&self) -> Option<&Value> {
        match self {
            ImageServerError::ServiceError { body, .. } => Some(body),
            _ => None,
        }
    }
}
