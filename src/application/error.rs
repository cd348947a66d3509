use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidInput,
    Unreadable,
    NetworkError,
    ServerError,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::Unreadable => "unreadable",
            ErrorKind::NetworkError => "network_error",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-file failure raised while turning a reference into a readable source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unreadable file {reference}: {reason}")]
    Unreadable { reference: String, reason: String },
}

impl ResolveError {
    pub fn unreadable(reference: impl Into<String>, reason: impl fmt::Display) -> Self {
        ResolveError::Unreadable {
            reference: reference.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Unreadable
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Requested,
    TimedOut,
    /// The worker was torn down before it could report.
    Aborted,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Requested => f.write_str("cancelled by caller"),
            CancelReason::TimedOut => f.write_str("timed out"),
            CancelReason::Aborted => f.write_str("upload task stopped before completing"),
        }
    }
}

/// Terminal failure of one upload call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Server responded with status {status}")]
    ServerError { status: u16, body: String },

    #[error("Upload cancelled: {0}")]
    Cancelled(CancelReason),
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::InvalidInput(_) => ErrorKind::InvalidInput,
            UploadError::NetworkError(_) => ErrorKind::NetworkError,
            UploadError::ServerError { .. } => ErrorKind::ServerError,
            UploadError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// Short diagnostic; the bare status code for server errors.
    pub fn detail(&self) -> String {
        match self {
            UploadError::InvalidInput(msg) | UploadError::NetworkError(msg) => msg.clone(),
            UploadError::ServerError { status, .. } => status.to_string(),
            UploadError::Cancelled(reason) => reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_detail_is_status_code() {
        let error = UploadError::ServerError {
            status: 500,
            body: "boom".to_string(),
        };
        assert_eq!(error.kind(), ErrorKind::ServerError);
        assert_eq!(error.detail(), "500");
    }

    #[test]
    fn test_cancel_reasons_share_kind() {
        for reason in [
            CancelReason::Requested,
            CancelReason::TimedOut,
            CancelReason::Aborted,
        ] {
            assert_eq!(UploadError::Cancelled(reason).kind(), ErrorKind::Cancelled);
        }
    }

    #[test]
    fn test_resolve_error_message() {
        let error = ResolveError::unreadable("/tmp/missing.pdf", "No such file or directory");
        assert_eq!(error.kind(), ErrorKind::Unreadable);
        assert_eq!(
            error.to_string(),
            "Unreadable file /tmp/missing.pdf: No such file or directory"
        );
    }
}
