use serde::Deserialize;

/// Fallback shown when a failure carries no usable message.
pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Failure of a single request against the matching service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Connection, DNS, TLS or timeout failure before a status arrived.
    #[error("Network error: {0}")]
    Transport(String),
    /// The server answered with a non-success status.
    #[error("HTTP {code}: {message}")]
    Status { code: u16, message: String },
    /// The body did not match the expected contract.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// Local file access failed while preparing a request.
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Whether the same request could succeed if simply sent again later.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { code, .. } => *code >= 500,
            Self::InvalidResponse(_) | Self::Io { .. } | Self::InvalidUrl(_) => false,
        }
    }

    /// Message suitable for the status bar.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status { message, .. } if message.trim().is_empty() => FALLBACK_MESSAGE.into(),
            Self::Status { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    pub(crate) fn from_ureq(err: ureq::Error, max_bytes: usize) -> Self {
        match err {
            ureq::Error::Status(code, response) => {
                let body = crate::http_client::read_response_bytes(response, max_bytes)
                    .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
                    .unwrap_or_default();
                Self::Status {
                    code,
                    message: status_message(code, &body),
                }
            }
            ureq::Error::Transport(transport) => Self::Transport(transport.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct DetailBody {
    detail: Detail,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Detail {
    Text(String),
    Items(Vec<DetailItem>),
    Other(serde_json::Value),
}

#[derive(Deserialize)]
struct DetailItem {
    msg: Option<String>,
}

/// Prefer the server's `detail` field, then the raw body, then a fixed fallback.
pub(crate) fn status_message(code: u16, body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(parsed) = serde_json::from_str::<DetailBody>(trimmed) {
        let text = match parsed.detail {
            Detail::Text(text) => text,
            Detail::Items(items) => items
                .into_iter()
                .filter_map(|item| item.msg)
                .collect::<Vec<_>>()
                .join("; "),
            Detail::Other(value) => value.to_string(),
        };
        if !text.trim().is_empty() {
            return text;
        }
    }
    if !trimmed.is_empty() {
        return trimmed.chars().take(300).collect();
    }
    format!("{FALLBACK_MESSAGE} (HTTP {code})")
}
