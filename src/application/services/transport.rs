use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use reqwest::Url;

use crate::application::error::UploadError;

pub type BodyStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + Sync>>;

pub struct TransportRequest {
    pub url: Url,
    pub content_type: String,
    pub content_length: u64,
    pub authorization: Option<String>,
    pub body: BodyStream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    /// Leading part of the response body, kept for diagnostics on failures.
    pub body_snippet: String,
}

/// Sends one POST carrying a streamed body and reports the response status.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, UploadError>;
}
