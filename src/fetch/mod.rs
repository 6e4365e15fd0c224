// src/fetch/mod.rs

use crate::error::{PipelineError, Result};
use reqwest::blocking::Client;
use tracing::{debug, instrument};
use url::Url;

pub mod query;

pub use query::{Credential, Query};

/// Status and body exactly as the remote returned them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// One GET, no retries. Non-200 statuses come back as data; only transport
/// faults are errors.
pub trait Fetcher {
    fn get(&self, url: &Url) -> Result<RawResponse>;
}

/// Blocking reqwest client with transport defaults.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("acsincome/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PipelineError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all)]
    fn get(&self, url: &Url) -> Result<RawResponse> {
        // reqwest errors embed the URL, and the URL embeds the key.
        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| PipelineError::Transport(e.without_url().to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .map_err(|e| PipelineError::Transport(e.without_url().to_string()))?;
        debug!(status, bytes = body.len(), "response received");
        Ok(RawResponse { status, body })
    }
}
