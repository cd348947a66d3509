pub mod upload_report;
