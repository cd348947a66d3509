use std::{
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    task::{Context, Poll},
    time::Duration,
};

use bytes::Bytes;
use futures::Stream;
use reqwest::{header::HeaderValue, Url};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::{
    application::{
        dto::upload_dto::UploadOutcome,
        error::{CancelReason, UploadError},
        services::{BodyStream, Transport, TransportRequest},
    },
    domain::{
        config::uploader::UploaderConfig,
        models::{
            file::{ByteSource, UploadBatch},
            progress::UploadProgress,
        },
    },
    services::{
        multipart::MultipartBody,
        upload_events::{CancelHandle, CompletionGuard, Reporter, UploadEvents},
    },
};

/// Handle pair returned by every upload call.
#[derive(Debug)]
pub struct UploadTask {
    pub cancel: CancelHandle,
    pub events: UploadEvents,
}

/// Sends batches of files as single multipart requests. Each call is
/// independent: one request, one attempt, one outcome.
pub struct BatchUploadManager {
    transport: Arc<dyn Transport>,
    config: UploaderConfig,
}

impl BatchUploadManager {
    pub fn new(transport: Arc<dyn Transport>, config: UploaderConfig) -> Self {
        Self { transport, config }
    }

    /// Starts uploading `batch` to `endpoint` and returns immediately.
    ///
    /// Invalid input (empty batch, unnamed file, size mismatch, malformed
    /// endpoint or credential) completes the returned task right away without
    /// touching the network.
    pub fn upload(&self, batch: UploadBatch, endpoint: &str) -> UploadTask {
        let (task, reporter, cancel_rx) = new_task();

        let url = match validate(&batch, endpoint, self.config.authorization.as_deref()) {
            Ok(url) => url,
            Err(e) => {
                warn!("Rejected upload: {}", e);
                reporter.complete(UploadOutcome::Failure(e));
                return task;
            }
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                let e = UploadError::InvalidInput("no async runtime available".to_string());
                error!("Rejected upload: {}", e);
                reporter.complete(UploadOutcome::Failure(e));
                return task;
            }
        };

        runtime.spawn(run_upload(
            self.transport.clone(),
            url,
            batch,
            self.config.authorization.clone(),
            self.config.timeout,
            reporter,
            cancel_rx,
        ));

        task
    }

    /// Uploads to the endpoint this manager was configured with.
    pub fn upload_to_configured(&self, batch: UploadBatch) -> UploadTask {
        self.upload(batch, &self.config.endpoint)
    }

    /// A task that has already failed with `error`.
    pub(crate) fn rejected(&self, error: UploadError) -> UploadTask {
        let (task, reporter, _) = new_task();
        warn!("Rejected upload: {}", error);
        reporter.complete(UploadOutcome::Failure(error));
        task
    }
}

fn new_task() -> (UploadTask, Arc<Reporter>, watch::Receiver<bool>) {
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let reporter = Arc::new(Reporter::new(events_tx));
    let (cancel_tx, cancel_rx) = watch::channel(false);
    let task = UploadTask {
        cancel: CancelHandle::new(reporter.clone(), cancel_tx),
        events: UploadEvents::new(events_rx, reporter.clone()),
    };
    (task, reporter, cancel_rx)
}

fn validate(
    batch: &UploadBatch,
    endpoint: &str,
    authorization: Option<&str>,
) -> Result<Url, UploadError> {
    if batch.is_empty() {
        return Err(UploadError::InvalidInput("batch is empty".to_string()));
    }
    for file in batch.files() {
        if file.name.is_empty() {
            return Err(UploadError::InvalidInput(
                "batch contains a file without a name".to_string(),
            ));
        }
        if let ByteSource::Memory(bytes) = &file.source {
            if bytes.len() as u64 != file.size_bytes {
                return Err(UploadError::InvalidInput(format!(
                    "{} declares {} bytes but holds {}",
                    file.name,
                    file.size_bytes,
                    bytes.len()
                )));
            }
        }
    }
    if let Some(credential) = authorization {
        HeaderValue::from_str(credential).map_err(|_| {
            UploadError::InvalidInput("credential is not a valid header value".to_string())
        })?;
    }
    parse_endpoint(endpoint)
}

pub fn parse_endpoint(endpoint: &str) -> Result<Url, UploadError> {
    let url = Url::parse(endpoint)
        .map_err(|e| UploadError::InvalidInput(format!("invalid endpoint {:?}: {}", endpoint, e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(UploadError::InvalidInput(format!(
            "unsupported endpoint scheme: {}",
            url.scheme()
        )));
    }
    if url.host().is_none() {
        return Err(UploadError::InvalidInput(format!(
            "endpoint has no host: {}",
            endpoint
        )));
    }
    Ok(url)
}

async fn run_upload(
    transport: Arc<dyn Transport>,
    url: Url,
    batch: UploadBatch,
    authorization: Option<String>,
    timeout: Duration,
    reporter: Arc<Reporter>,
    mut cancel_rx: watch::Receiver<bool>,
) {
    let _guard = CompletionGuard(reporter.clone());

    let file_count = batch.len();
    let payload_bytes = batch.total_size();
    let body = MultipartBody::encode(batch.into_files());
    let total = body.content_length();
    let drained = Arc::new(AtomicBool::new(false));

    info!(
        "Uploading {} file(s) ({} payload bytes, {} on the wire) to {}",
        file_count, payload_bytes, total, url
    );

    let request = TransportRequest {
        url,
        content_type: body.content_type(),
        content_length: total,
        authorization,
        body: Box::pin(ProgressStream::new(
            body.into_stream(),
            reporter.clone(),
            total,
            drained.clone(),
        )),
    };

    reporter.progress(UploadProgress::START);

    let outcome = tokio::select! {
        biased;
        _ = cancel_requested(&mut cancel_rx) => {
            UploadOutcome::Failure(UploadError::Cancelled(CancelReason::Requested))
        }
        result = tokio::time::timeout(timeout, transport.post(request)) => match result {
            Err(_) => {
                warn!("Upload timed out after {:?}", timeout);
                UploadOutcome::Failure(UploadError::Cancelled(CancelReason::TimedOut))
            }
            Ok(Err(e)) => {
                error!("Upload failed: {}", e);
                UploadOutcome::Failure(e)
            }
            Ok(Ok(response)) => {
                if drained.load(Ordering::Acquire) {
                    reporter.progress(UploadProgress::COMPLETE);
                }
                if (200..300).contains(&response.status) {
                    info!("Upload of {} file(s) accepted with status {}", file_count, response.status);
                    UploadOutcome::Success { status: response.status }
                } else {
                    warn!("Upload rejected with status {}: {}", response.status, response.body_snippet);
                    UploadOutcome::Failure(UploadError::ServerError {
                        status: response.status,
                        body: response.body_snippet,
                    })
                }
            }
        },
    };

    reporter.complete(outcome);
}

// Resolves once cancel() was called. Dropping every handle is not a cancellation.
async fn cancel_requested(cancel_rx: &mut watch::Receiver<bool>) {
    let closed = cancel_rx.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        futures::future::pending::<()>().await;
    }
}

/// Counts a chunk as sent once the transport asks for the next one.
struct ProgressStream {
    inner: BodyStream,
    reporter: Arc<Reporter>,
    total: u64,
    sent: u64,
    pending: u64,
    drained: Arc<AtomicBool>,
}

impl ProgressStream {
    fn new(
        inner: BodyStream,
        reporter: Arc<Reporter>,
        total: u64,
        drained: Arc<AtomicBool>,
    ) -> Self {
        Self {
            inner,
            reporter,
            total,
            sent: 0,
            pending: 0,
            drained,
        }
    }
}

impl Stream for ProgressStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        if this.pending > 0 {
            this.sent += this.pending;
            this.pending = 0;
            this.reporter
                .progress(UploadProgress::in_flight(this.sent, this.total));
        }

        match this.inner.as_mut().poll_next(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.pending = chunk.len() as u64;
                // Length-delimited transports stop polling once the last byte is out.
                if this.sent + this.pending >= this.total {
                    this.drained.store(true, Ordering::Release);
                }
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(None) => {
                this.drained.store(true, Ordering::Release);
                Poll::Ready(None)
            }
            other => other,
        }
    }
}
