use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    application::{
        dto::upload_dto::DroppedFile, error::UploadError, services::ReferenceResolver,
    },
    domain::models::file::{FileReference, UploadBatch},
    services::{BatchUploadManager, UploadTask},
};

/// One committed selection: the running upload plus the files that had to be
/// left out.
#[derive(Debug)]
pub struct UploadSession {
    pub task: UploadTask,
    pub dropped: Vec<DroppedFile>,
}

impl UploadSession {
    pub fn has_partial_failure(&self) -> bool {
        !self.dropped.is_empty()
    }
}

/// Entry point for the UI layer: takes the picked or dropped references and
/// turns them into one upload call.
pub struct UploadController {
    resolver: Arc<dyn ReferenceResolver>,
    manager: Arc<BatchUploadManager>,
}

impl UploadController {
    pub fn new(resolver: Arc<dyn ReferenceResolver>, manager: Arc<BatchUploadManager>) -> Self {
        Self { resolver, manager }
    }

    pub async fn upload_files(&self, references: Vec<FileReference>) -> UploadSession {
        info!("Committing {} selected file(s)", references.len());

        let resolved = self.resolver.resolve_all(&references).await;
        for dropped in &resolved.dropped {
            warn!("Dropping file from batch: {}", dropped.error);
        }

        let task = if resolved.files.is_empty() && !resolved.dropped.is_empty() {
            self.manager.rejected(UploadError::InvalidInput(format!(
                "none of the {} selected file(s) could be read",
                resolved.dropped.len()
            )))
        } else {
            self.manager
                .upload_to_configured(UploadBatch::new(resolved.files))
        };

        UploadSession {
            task,
            dropped: resolved.dropped,
        }
    }
}
