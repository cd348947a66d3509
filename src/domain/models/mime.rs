use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

const DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Maps a file name to its MIME type by extension only. Case-insensitive,
/// no content sniffing.
pub fn mime_type_for(name: &str) -> &'static str {
    let extension = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("txt") | Some("text") => "text/plain",
        Some("rtf") => "application/rtf",
        Some("doc") | Some("docx") => DOCX,
        Some("zip") => "application/zip",
        _ => OCTET_STREAM,
    }
}
