use std::collections::VecDeque;
use std::io;

use bytes::Bytes;
use tokio::io::AsyncReadExt;
use uuid::Uuid;

use crate::{
    application::services::BodyStream,
    domain::models::{
        file::{ByteSource, ResolvedFile},
        mime::OCTET_STREAM,
    },
};

/// Form field every file part is sent under. Changing it breaks the server contract.
pub const FILES_FIELD: &str = "files[]";

const CHUNK_SIZE: usize = 64 * 1024;

pub fn generate_boundary() -> String {
    format!("BatchUploadBoundary{}", Uuid::new_v4().simple())
}

enum Segment {
    Bytes(Bytes),
    File { file: tokio::fs::File, remaining: u64 },
}

impl Segment {
    fn is_exhausted(&self) -> bool {
        match self {
            Segment::Bytes(bytes) => bytes.is_empty(),
            Segment::File { remaining, .. } => *remaining == 0,
        }
    }

    async fn next_chunk(&mut self) -> io::Result<Bytes> {
        match self {
            Segment::Bytes(bytes) => {
                let len = bytes.len().min(CHUNK_SIZE);
                Ok(bytes.split_to(len))
            }
            Segment::File { file, remaining } => {
                let want = (*remaining).min(CHUNK_SIZE as u64) as usize;
                let mut buf = vec![0u8; want];
                let read = file.read(&mut buf).await?;
                if read == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "file ended before its recorded size",
                    ));
                }
                buf.truncate(read);
                *remaining -= read as u64;
                Ok(Bytes::from(buf))
            }
        }
    }
}

/// A `multipart/form-data` body with one `files[]` part per file, streamed
/// lazily from the underlying sources.
pub struct MultipartBody {
    boundary: String,
    content_length: u64,
    segments: Vec<Segment>,
}

impl MultipartBody {
    pub fn encode(files: Vec<ResolvedFile>) -> Self {
        Self::with_boundary(generate_boundary(), files)
    }

    pub fn with_boundary(boundary: String, files: Vec<ResolvedFile>) -> Self {
        let mut segments = Vec::with_capacity(files.len() * 3 + 1);
        let mut content_length = 0u64;

        for file in files {
            let header = part_header(&boundary, &file.name, &file.mime_type);
            content_length += header.len() as u64;
            segments.push(Segment::Bytes(Bytes::from(header)));

            // A buffer is sent whole, so its own length is what goes on the wire.
            match file.source {
                ByteSource::Memory(bytes) => {
                    content_length += bytes.len() as u64;
                    segments.push(Segment::Bytes(bytes));
                }
                ByteSource::File(handle) => {
                    content_length += file.size_bytes;
                    segments.push(Segment::File {
                        file: handle,
                        remaining: file.size_bytes,
                    });
                }
            }

            content_length += 2;
            segments.push(Segment::Bytes(Bytes::from_static(b"\r\n")));
        }

        let closing = format!("--{}--\r\n", boundary);
        content_length += closing.len() as u64;
        segments.push(Segment::Bytes(Bytes::from(closing)));

        Self {
            boundary,
            content_length,
            segments,
        }
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    pub fn into_stream(self) -> BodyStream {
        let segments: VecDeque<Segment> = self.segments.into();
        Box::pin(futures::stream::try_unfold(segments, next_body_chunk))
    }
}

async fn next_body_chunk(
    mut segments: VecDeque<Segment>,
) -> io::Result<Option<(Bytes, VecDeque<Segment>)>> {
    while let Some(segment) = segments.front_mut() {
        if segment.is_exhausted() {
            segments.pop_front();
            continue;
        }
        let chunk = segment.next_chunk().await?;
        return Ok(Some((chunk, segments)));
    }
    Ok(None)
}

fn part_header(boundary: &str, name: &str, mime_type: &str) -> String {
    let mime_type = if mime_type.is_empty() {
        OCTET_STREAM
    } else {
        mime_type
    };
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
        boundary,
        FILES_FIELD,
        quote_filename(name),
        mime_type
    )
}

fn quote_filename(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '"' => quoted.push_str("%22"),
            '\r' => quoted.push_str("%0D"),
            '\n' => quoted.push_str("%0A"),
            _ => quoted.push(c),
        }
    }
    quoted
}
