mod error;
mod fs_reference_resolver;
pub mod multipart;
mod reqwest_transport;
mod upload_events;
mod upload_manager;

pub use error::TransportError;
pub use fs_reference_resolver::FsReferenceResolver;
pub use reqwest_transport::ReqwestTransport;
pub use upload_events::{CancelHandle, UploadEvents};
pub use upload_manager::{parse_endpoint, BatchUploadManager, UploadTask};

use std::sync::Arc;

use crate::domain::config::uploader::UploaderConfig;

/// Builds a manager that talks HTTP(S) through reqwest.
pub fn create_upload_manager(config: UploaderConfig) -> Result<BatchUploadManager, TransportError> {
    let transport = ReqwestTransport::new()?;
    Ok(BatchUploadManager::new(Arc::new(transport), config))
}
