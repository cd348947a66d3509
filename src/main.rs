use std::{process::ExitCode, sync::Arc, time::Duration};

use batch_uploader::{
    adapters::dto::upload_report::UploadReport, create_upload_manager, FileReference,
    FsReferenceResolver, UploadController, UploaderConfig,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: batch-uploader <FILE>...";

fn load_config() -> Result<UploaderConfig, String> {
    let endpoint = std::env::var("UPLOAD_ENDPOINT")
        .map_err(|_| "UPLOAD_ENDPOINT environment variable must be set".to_string())?;

    let mut config = UploaderConfig::new(endpoint);

    if let Ok(authorization) = std::env::var("UPLOAD_AUTHORIZATION") {
        config = config.with_authorization(authorization);
    }

    if let Ok(timeout) = std::env::var("UPLOAD_TIMEOUT_SECS") {
        let secs = timeout
            .parse::<u64>()
            .map_err(|_| format!("UPLOAD_TIMEOUT_SECS must be a whole number, got {:?}", timeout))?;
        config = config.with_timeout(Duration::from_secs(secs));
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let references: Vec<FileReference> = std::env::args_os()
        .skip(1)
        .map(FileReference::from_path)
        .collect();
    if references.is_empty() {
        eprintln!("{}", USAGE);
        return ExitCode::from(2);
    }

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(2);
        }
    };
    info!("Uploading to {:?}", config);

    let manager = match create_upload_manager(config) {
        Ok(manager) => manager,
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let controller = UploadController::new(Arc::new(FsReferenceResolver::new()), Arc::new(manager));
    let selected = references.len();
    let session = controller.upload_files(references).await;
    let files_in_batch = selected - session.dropped.len();

    // Ctrl-C aborts the transfer; the outcome still arrives through the events.
    let cancel = session.task.cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    });

    let mut last_percent = None;
    let report = session
        .task
        .events
        .dispatch(
            |progress| {
                let percent = progress.percent().floor() as u32;
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    info!("Upload progress: {}%", percent);
                }
            },
            |outcome| UploadReport::new(&outcome, files_in_batch, &session.dropped),
        )
        .await;

    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to render upload report: {}", e),
    }

    if report.error_kind.is_none() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
