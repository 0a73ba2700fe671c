//! Shared HTTP agent, bounded body reads, and upload progress tracking.

use std::io::{self, Read};
use std::sync::OnceLock;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const WRITE_TIMEOUT: Duration = Duration::from_secs(60);

/// Return the process-wide agent so connections are pooled across calls.
pub(crate) fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .build()
    })
}

/// Read a response body into memory, failing once it exceeds `max_bytes`.
pub(crate) fn read_response_bytes(
    response: ureq::Response,
    max_bytes: usize,
) -> Result<Vec<u8>, io::Error> {
    if let Some(length) = declared_length(&response) {
        if length > max_bytes as u64 {
            return Err(too_large(format!("declared {length} bytes")));
        }
    }
    let mut bytes = Vec::new();
    response
        .into_reader()
        .take(max_bytes as u64 + 1)
        .read_to_end(&mut bytes)?;
    if bytes.len() > max_bytes {
        return Err(too_large(format!("more than {max_bytes} bytes")));
    }
    Ok(bytes)
}

fn declared_length(response: &ureq::Response) -> Option<u64> {
    response.header("Content-Length")?.trim().parse().ok()
}

fn too_large(detail: String) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("Response body too large: {detail}"),
    )
}

/// Wraps a request body and reports whole-percent progress as bytes are sent.
///
/// The callback fires only when the percentage changes, so a 100 MB upload
/// produces at most 101 notifications.
pub(crate) struct ProgressReader<R, F> {
    inner: R,
    total: u64,
    sent: u64,
    last_percent: Option<u8>,
    on_progress: F,
}

impl<R: Read, F: FnMut(u8)> ProgressReader<R, F> {
    pub(crate) fn new(inner: R, total: u64, on_progress: F) -> Self {
        Self {
            inner,
            total,
            sent: 0,
            last_percent: None,
            on_progress,
        }
    }

    fn report(&mut self) {
        let percent = if self.total == 0 {
            100
        } else {
            ((self.sent.min(self.total) * 100) / self.total) as u8
        };
        if self.last_percent != Some(percent) {
            self.last_percent = Some(percent);
            (self.on_progress)(percent);
        }
    }
}

impl<R: Read, F: FnMut(u8)> Read for ProgressReader<R, F> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let read = self.inner.read(buf)?;
        self.sent += read as u64;
        self.report();
        Ok(read)
    }
}
