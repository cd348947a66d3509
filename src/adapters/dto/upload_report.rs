use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::{
    dto::upload_dto::{DroppedFile, UploadOutcome},
    error::UploadError,
};

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Failure,
}

#[derive(Debug, Serialize)]
pub struct DroppedFileReport {
    pub file: String,
    pub reason: String,
}

/// Summary of one committed selection, printed by the CLI.
#[derive(Debug, Serialize)]
pub struct UploadReport {
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub files_uploaded: usize,
    pub dropped: Vec<DroppedFileReport>,
    pub finished_at: DateTime<Utc>,
}

impl UploadReport {
    pub fn new(outcome: &UploadOutcome, files_in_batch: usize, dropped: &[DroppedFile]) -> Self {
        let dropped = dropped
            .iter()
            .map(|d| DroppedFileReport {
                file: d.reference.label(),
                reason: d.error.to_string(),
            })
            .collect();

        match outcome {
            UploadOutcome::Success { status } => Self {
                status: ReportStatus::Success,
                http_status: Some(*status),
                error_kind: None,
                detail: None,
                files_uploaded: files_in_batch,
                dropped,
                finished_at: Utc::now(),
            },
            UploadOutcome::Failure(error) => Self {
                status: ReportStatus::Failure,
                http_status: match error {
                    UploadError::ServerError { status, .. } => Some(*status),
                    _ => None,
                },
                error_kind: Some(error.kind().to_string()),
                detail: Some(error.detail()),
                files_uploaded: 0,
                dropped,
                finished_at: Utc::now(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        application::error::ResolveError,
        domain::models::file::FileReference,
    };

    #[test]
    fn test_success_report_json() {
        let dropped = vec![DroppedFile {
            reference: FileReference::from_path("/tmp/locked.pdf"),
            error: ResolveError::unreadable("/tmp/locked.pdf", "Permission denied"),
        }];
        let report = UploadReport::new(&UploadOutcome::Success { status: 201 }, 2, &dropped);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "success");
        assert_eq!(json["http_status"], 201);
        assert_eq!(json["files_uploaded"], 2);
        assert_eq!(json["dropped"][0]["file"], "/tmp/locked.pdf");
        assert!(json.get("error_kind").is_none());
    }

    #[test]
    fn test_server_failure_report_json() {
        let outcome = UploadOutcome::Failure(UploadError::ServerError {
            status: 500,
            body: "oops".to_string(),
        });
        let json = serde_json::to_value(UploadReport::new(&outcome, 3, &[])).unwrap();

        assert_eq!(json["status"], "failure");
        assert_eq!(json["http_status"], 500);
        assert_eq!(json["error_kind"], "server_error");
        assert_eq!(json["detail"], "500");
        assert_eq!(json["files_uploaded"], 0);
    }
}
