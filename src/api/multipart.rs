//! Streaming `multipart/form-data` body with a `prefix` field and one file part.

use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use super::error::ApiError;

pub(crate) struct MultipartUpload {
    pub content_type: String,
    pub content_length: u64,
    pub body: Box<dyn Read + Send>,
}

impl MultipartUpload {
    pub(crate) fn new(prefix: &str, path: &Path) -> Result<Self, ApiError> {
        let file = File::open(path).map_err(|source| ApiError::Io {
            context: format!("Failed to open {}", path.display()),
            source,
        })?;
        let file_len = file
            .metadata()
            .map_err(|source| ApiError::Io {
                context: format!("Failed to stat {}", path.display()),
                source,
            })?
            .len();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "dataset.csv".to_string());
        let boundary = format!("polymatch-{}", uuid::Uuid::new_v4().simple());
        let head = part_head(&boundary, prefix, &file_name);
        let tail = format!("\r\n--{boundary}--\r\n").into_bytes();
        let content_length = head.len() as u64 + file_len + tail.len() as u64;
        let body = Cursor::new(head).chain(file).chain(Cursor::new(tail));
        Ok(Self {
            content_type: format!("multipart/form-data; boundary={boundary}"),
            content_length,
            body: Box::new(body),
        })
    }
}

fn part_head(boundary: &str, prefix: &str, file_name: &str) -> Vec<u8> {
    let file_name = file_name.replace('"', "%22");
    format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"prefix\"\r\n\r\n\
         {prefix}\r\n\
         --{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes()
}
