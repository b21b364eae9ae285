// ── Runtime reader configuration ──
//
// Describes how to reach the backend and how to drive the viewer. Never
// touches disk: the CLI resolves a profile and hands a `ReaderConfig` in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use crate::assets::AssetRewriter;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs on a home server).
    DangerAcceptInvalid,
}

/// Configuration for one reader session against one series.
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Application root, e.g. `http://192.168.1.10:8000/ac/`.
    pub server: Url,
    /// Series whose chapters are listed and read.
    pub manga_id: i64,
    pub tls: TlsVerification,
    /// Per-request timeout for REST calls.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Longest wait for the next page event before the session fails.
    pub stream_timeout: Duration,
    pub assets: AssetRewriter,
    /// Value of the backend session cookie, sent on every request.
    pub session_cookie: Option<SecretString>,
    /// Record each opened chapter in the reading history.
    pub record_history: bool,
}

impl ReaderConfig {
    pub fn new(server: Url, manga_id: i64) -> Self {
        Self {
            server,
            manga_id,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            stream_timeout: Duration::from_secs(60),
            assets: AssetRewriter::default(),
            session_cookie: None,
            record_history: true,
        }
    }

    pub(crate) fn transport(&self) -> mangaview_api::TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => mangaview_api::TlsMode::System,
            TlsVerification::CustomCa(path) => mangaview_api::TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => mangaview_api::TlsMode::DangerAcceptInvalid,
        };
        mangaview_api::TransportConfig {
            tls,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            session_cookie: self.session_cookie.clone(),
        }
    }
}
