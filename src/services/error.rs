use thiserror::Error;

use crate::application::error::{CancelReason, UploadError};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(String),

    #[error("Request body failed: {0}")]
    Body(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<TransportError> for UploadError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::Timeout => UploadError::Cancelled(CancelReason::TimedOut),
            TransportError::Client(msg) => UploadError::InvalidInput(msg),
            other => UploadError::NetworkError(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(error: reqwest::Error) -> Self {
        let detail = error_chain(&error);
        if error.is_timeout() {
            TransportError::Timeout
        } else if error.is_connect() {
            TransportError::Connect(detail)
        } else if error.is_body() {
            TransportError::Body(detail)
        } else if error.is_builder() {
            TransportError::Client(detail)
        } else {
            TransportError::Network(detail)
        }
    }
}

// reqwest keeps the useful part (DNS, TLS, io) in the source chain.
fn error_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::ErrorKind;

    #[test]
    fn test_timeout_maps_to_cancelled() {
        let error: UploadError = TransportError::Timeout.into();
        assert_eq!(error, UploadError::Cancelled(CancelReason::TimedOut));
    }

    #[test]
    fn test_connection_failures_map_to_network_error() {
        let error: UploadError = TransportError::Connect("refused".to_string()).into();
        assert_eq!(error.kind(), ErrorKind::NetworkError);
        assert_eq!(error.detail(), "Connection failed: refused");

        let error: UploadError = TransportError::Body("file shrank".to_string()).into();
        assert_eq!(error.kind(), ErrorKind::NetworkError);
    }

    #[derive(Debug, Error)]
    #[error("error sending request")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_sources() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(error_chain(&Outer(io)), "error sending request: refused");
    }
}
