use async_trait::async_trait;

use crate::{
    application::{
        dto::upload_dto::{DroppedFile, ResolvedSet},
        error::ResolveError,
    },
    domain::models::file::{FileReference, ResolvedFile},
};

#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    async fn resolve(&self, reference: &FileReference) -> Result<ResolvedFile, ResolveError>;

    /// Resolves every reference in order. Failures are collected, not fatal.
    async fn resolve_all(&self, references: &[FileReference]) -> ResolvedSet {
        let mut set = ResolvedSet::default();
        for reference in references {
            match self.resolve(reference).await {
                Ok(file) => set.files.push(file),
                Err(error) => set.dropped.push(DroppedFile {
                    reference: reference.clone(),
                    error,
                }),
            }
        }
        set
    }
}
