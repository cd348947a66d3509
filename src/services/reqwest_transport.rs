use async_trait::async_trait;
use reqwest::{
    header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE},
    Body, Client,
};
use tracing::debug;

use crate::{
    application::{
        error::UploadError,
        services::{Transport, TransportRequest, TransportResponse},
    },
    services::error::TransportError,
};

const BODY_SNIPPET_CHARS: usize = 512;

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn post(&self, request: TransportRequest) -> Result<TransportResponse, UploadError> {
        debug!(
            "POST {} ({} bytes, {})",
            request.url, request.content_length, request.content_type
        );

        let mut builder = self
            .client
            .post(request.url)
            .header(CONTENT_TYPE, request.content_type)
            .header(CONTENT_LENGTH, request.content_length)
            .body(Body::wrap_stream(request.body));

        if let Some(authorization) = request.authorization {
            builder = builder.header(AUTHORIZATION, authorization);
        }

        let response = builder.send().await.map_err(TransportError::from)?;
        let status = response.status();

        let body_snippet = if status.is_success() {
            String::new()
        } else {
            let text = response.text().await.unwrap_or_default();
            text.chars().take(BODY_SNIPPET_CHARS).collect()
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            body_snippet,
        })
    }
}
