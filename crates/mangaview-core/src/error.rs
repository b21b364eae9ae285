// ── Core error types ──
//
// Errors surfaced by the viewer and the reader driver. Consumers never see
// raw reqwest or serde failures; the `From<mangaview_api::Error>` impl folds
// them into `Fetch`, `ConnectionFailed` or `Config`.

use thiserror::Error;

use crate::model::ChapterKind;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Fetch errors ─────────────────────────────────────────────────
    #[error("Fetch failed: {message}")]
    Fetch {
        message: String,
        /// HTTP status code, when the backend answered at all.
        status: Option<u16>,
    },

    #[error("Cannot reach reader backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    // ── Navigation errors ────────────────────────────────────────────
    #[error("Invalid selection {group}[{position}]: {reason}")]
    InvalidSelection {
        group: ChapterKind,
        position: usize,
        reason: String,
    },

    // ── Stream errors ────────────────────────────────────────────────
    #[error("Page stream failed: {message}")]
    Stream { message: String },

    #[error("No page event received within {timeout_ms}ms")]
    StreamTimeout { timeout_ms: u64 },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Wrap a feed-level failure (open, transport or decoding).
    pub fn stream(err: impl std::fmt::Display) -> Self {
        CoreError::Stream {
            message: err.to_string(),
        }
    }

    /// `true` for a 404 answer from the backend.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::Fetch {
                status: Some(404),
                ..
            }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<mangaview_api::Error> for CoreError {
    fn from(err: mangaview_api::Error) -> Self {
        match err {
            mangaview_api::Error::Transport(ref e) if e.is_connect() => {
                CoreError::ConnectionFailed {
                    url: e
                        .url()
                        .map(|u| u.to_string())
                        .unwrap_or_else(|| "<unknown>".into()),
                    reason: e.to_string(),
                }
            }
            mangaview_api::Error::Transport(e) => CoreError::Fetch {
                status: e.status().map(|s| s.as_u16()),
                message: e.to_string(),
            },
            mangaview_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            mangaview_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            mangaview_api::Error::Http { status, message } => CoreError::Fetch {
                message: format!("HTTP {status}: {message}"),
                status: Some(status),
            },
            mangaview_api::Error::Deserialization { message, body: _ } => CoreError::Fetch {
                message: format!("malformed response: {message}"),
                status: None,
            },
            mangaview_api::Error::MalformedEvent { message, data: _ } => CoreError::Stream {
                message: format!("malformed page event: {message}"),
            },
        }
    }
}
