//! Sends a user's selection of local documents to a remote endpoint as one
//! `multipart/form-data` request, with byte-level progress and a single
//! terminal outcome per batch.

pub mod adapters;
pub mod application;
pub mod domain;
pub mod services;

pub use adapters::controllers::upload_controller::{UploadController, UploadSession};
pub use application::{
    dto::upload_dto::{UploadEvent, UploadOutcome},
    error::{CancelReason, ErrorKind, ResolveError, UploadError},
};
pub use domain::{
    config::uploader::UploaderConfig,
    models::{
        file::{FileReference, ResolvedFile, UploadBatch},
        progress::UploadProgress,
    },
};
pub use services::{
    create_upload_manager, BatchUploadManager, CancelHandle, FsReferenceResolver, UploadEvents,
    UploadTask,
};
