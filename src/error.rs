use thiserror::Error;

/// Every way a single fetch-and-normalize run can stop.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Credential or configuration problem; no request was issued.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("HTTP transport failed: {0}")]
    Transport(String),

    /// Remote answered with something other than 200.
    #[error("request failed with HTTP status {status}")]
    Status { status: u16, body: String },

    /// 200 response whose body is not JSON (or not an array of arrays).
    #[error("could not parse response body as JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        body: String,
    },

    /// Valid JSON with the wrong table layout.
    #[error("unexpected response layout: {0}")]
    Shape(String),
}

impl PipelineError {
    /// Raw response body carried by fetch/parse failures, for debug echo.
    pub fn raw_body(&self) -> Option<&str> {
        match self {
            PipelineError::Status { body, .. } | PipelineError::Parse { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn is_config(&self) -> bool {
        matches!(self, PipelineError::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
