use crate::{
    application::error::{ErrorKind, ResolveError, UploadError},
    domain::models::{
        file::{FileReference, ResolvedFile},
        progress::UploadProgress,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success { status: u16 },
    Failure(UploadError),
}

impl UploadOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }

    pub fn error(&self) -> Option<&UploadError> {
        match self {
            UploadOutcome::Success { .. } => None,
            UploadOutcome::Failure(error) => Some(error),
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error().map(UploadError::kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    Progress(UploadProgress),
    Completed(UploadOutcome),
}

/// A reference that was left out of the batch because it could not be read.
#[derive(Debug, Clone)]
pub struct DroppedFile {
    pub reference: FileReference,
    pub error: ResolveError,
}

/// Result of resolving a selection: readable files in input order plus the
/// ones that were dropped.
#[derive(Debug, Default)]
pub struct ResolvedSet {
    pub files: Vec<ResolvedFile>,
    pub dropped: Vec<DroppedFile>,
}
