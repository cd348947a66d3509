use std::path::PathBuf;

use bytes::Bytes;

/// Opaque handle to a local document handed over by the picker or a drop target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileReference {
    Path(PathBuf),
    InMemory { name: String, content: Bytes },
}

impl FileReference {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn in_memory(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self::InMemory {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Human readable label used in logs and partial-failure notices.
    pub fn label(&self) -> String {
        match self {
            Self::Path(path) => path.display().to_string(),
            Self::InMemory { name, .. } => name.clone(),
        }
    }
}

#[derive(Debug)]
pub enum ByteSource {
    File(tokio::fs::File),
    Memory(Bytes),
}

#[derive(Debug)]
pub struct ResolvedFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub source: ByteSource,
}

impl ResolvedFile {
    pub fn new(name: String, mime_type: String, size_bytes: u64, source: ByteSource) -> Self {
        Self {
            name,
            mime_type,
            size_bytes,
            source,
        }
    }
}

/// Ordered set of files sent together in one request.
#[derive(Debug, Default)]
pub struct UploadBatch {
    files: Vec<ResolvedFile>,
}

impl UploadBatch {
    pub fn new(files: Vec<ResolvedFile>) -> Self {
        Self { files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn files(&self) -> &[ResolvedFile] {
        &self.files
    }

    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size_bytes).sum()
    }

    pub fn into_files(self) -> Vec<ResolvedFile> {
        self.files
    }
}

impl From<Vec<ResolvedFile>> for UploadBatch {
    fn from(files: Vec<ResolvedFile>) -> Self {
        Self::new(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory(name: &str, content: &'static [u8]) -> ResolvedFile {
        ResolvedFile::new(
            name.to_string(),
            "text/plain".to_string(),
            content.len() as u64,
            ByteSource::Memory(Bytes::from_static(content)),
        )
    }

    #[test]
    fn test_total_size_sums_declared_sizes() {
        let batch = UploadBatch::from(vec![memory("a.txt", b"abc"), memory("b.txt", b"hello")]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.total_size(), 8);
        assert_eq!(UploadBatch::default().total_size(), 0);
    }

    #[test]
    fn test_label_names_the_reference() {
        assert_eq!(FileReference::in_memory("notes.txt", "x").label(), "notes.txt");
        assert_eq!(FileReference::from_path("/tmp/a.pdf").label(), "/tmp/a.pdf");
    }
}
