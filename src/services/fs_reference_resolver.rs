use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::{
    application::{error::ResolveError, services::ReferenceResolver},
    domain::models::{
        file::{ByteSource, FileReference, ResolvedFile},
        mime::mime_type_for,
    },
};

/// Resolves references against the local filesystem. Stateless; a single
/// instance can be shared by any number of concurrent uploads.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReferenceResolver;

impl FsReferenceResolver {
    pub fn new() -> Self {
        Self
    }

    async fn resolve_path(&self, path: &Path) -> Result<ResolvedFile, ResolveError> {
        let label = path.display().to_string();

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| ResolveError::unreadable(label.clone(), "path has no file name"))?;

        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| ResolveError::unreadable(label.clone(), e))?;

        let metadata = file
            .metadata()
            .await
            .map_err(|e| ResolveError::unreadable(label.clone(), e))?;

        if !metadata.is_file() {
            return Err(ResolveError::unreadable(label, "not a regular file"));
        }

        debug!("Resolved {} ({} bytes)", label, metadata.len());

        Ok(ResolvedFile::new(
            name.clone(),
            mime_type_for(&name).to_string(),
            metadata.len(),
            ByteSource::File(file),
        ))
    }
}

#[async_trait]
impl ReferenceResolver for FsReferenceResolver {
    async fn resolve(&self, reference: &FileReference) -> Result<ResolvedFile, ResolveError> {
        match reference {
            FileReference::Path(path) => self.resolve_path(path).await,
            FileReference::InMemory { name, content } => {
                if name.is_empty() {
                    return Err(ResolveError::unreadable("<unnamed>", "file has no name"));
                }
                Ok(ResolvedFile::new(
                    name.clone(),
                    mime_type_for(name).to_string(),
                    content.len() as u64,
                    ByteSource::Memory(content.clone()),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn test_resolves_local_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Quarterly Report.PDF");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(b"%PDF-1.4 test")
            .unwrap();

        let resolved = FsReferenceResolver::new()
            .resolve(&FileReference::from_path(&path))
            .await
            .unwrap();

        assert_eq!(resolved.name, "Quarterly Report.PDF");
        assert_eq!(resolved.mime_type, "application/pdf");
        assert_eq!(resolved.size_bytes, 13);
        assert!(matches!(resolved.source, ByteSource::File(_)));
    }

    #[tokio::test]
    async fn test_missing_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.txt");

        let error = FsReferenceResolver::new()
            .resolve(&FileReference::from_path(&path))
            .await
            .unwrap_err();

        let ResolveError::Unreadable { reference, .. } = error;
        assert_eq!(reference, path.display().to_string());
    }

    #[tokio::test]
    async fn test_directory_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let result = FsReferenceResolver::new()
            .resolve(&FileReference::from_path(dir.path()))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_in_memory_reference() {
        let resolved = FsReferenceResolver::new()
            .resolve(&FileReference::in_memory("notes.TXT", &b"hello"[..]))
            .await
            .unwrap();
        assert_eq!(resolved.mime_type, "text/plain");
        assert_eq!(resolved.size_bytes, 5);

        let unnamed = FsReferenceResolver::new()
            .resolve(&FileReference::in_memory("", &b"x"[..]))
            .await;
        assert!(unnamed.is_err());
    }

    #[tokio::test]
    async fn test_resolve_all_keeps_order_and_collects_failures() {
        let dir = TempDir::new().unwrap();
        let readable = dir.path().join("b.txt");
        std::fs::write(&readable, b"bbb").unwrap();
        let missing = dir.path().join("missing.pdf");

        let references = vec![
            FileReference::in_memory("a.zip", &b"PK"[..]),
            FileReference::from_path(&missing),
            FileReference::from_path(&readable),
        ];
        let set = FsReferenceResolver::new().resolve_all(&references).await;

        let names: Vec<&str> = set.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a.zip", "b.txt"]);
        assert_eq!(set.dropped.len(), 1);
        assert_eq!(set.dropped[0].reference, FileReference::from_path(&missing));
    }
}
