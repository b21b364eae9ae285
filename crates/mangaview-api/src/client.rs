// Reader backend HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, query construction and
// status/JSON handling. Endpoint groups (chapters, pages, library, history)
// are implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the reader backend.
///
/// `base_url` is the application root (e.g. `http://host/ac/`); endpoint
/// paths such as `api/chapters` are joined onto it.
pub struct ReaderClient {
    http: reqwest::Client,
    stream_http: reqwest::Client,
    base_url: Url,
}

impl ReaderClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            stream_http: transport.build_stream_client()?,
            base_url: normalize_base(base_url),
        })
    }

    /// Create a client around a pre-built `reqwest::Client`, used for both
    /// REST calls and the page feed.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            stream_http: http.clone(),
            http,
            base_url: normalize_base(base_url),
        }
    }

    /// The application root all endpoint paths are joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Build `{base}{path}?{query}`.
    pub(crate) fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, Error> {
        let mut url = self.base_url.join(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        parse_json(resp).await
    }

    /// Send a form-encoded PUT and decode the JSON body.
    pub(crate) async fn put_form<T: DeserializeOwned>(
        &self,
        url: Url,
        form: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("PUT {}", url);
        let resp = self.http.put(url).form(form).send().await?;
        parse_json(resp).await
    }

    /// Send a form-encoded POST and decode the JSON body.
    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        url: Url,
        form: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).form(form).send().await?;
        parse_json(resp).await
    }

    /// Send a form-encoded DELETE and decode the JSON body.
    pub(crate) async fn delete_form<T: DeserializeOwned>(
        &self,
        url: Url,
        form: &(impl Serialize + Sync),
    ) -> Result<T, Error> {
        debug!("DELETE {}", url);
        let resp = self.http.delete(url).form(form).send().await?;
        parse_json(resp).await
    }

    /// Open a streaming GET on the feed client, returning the response once
    /// the status line has been checked.
    pub(crate) async fn open_stream(&self, url: Url) -> Result<reqwest::Response, Error> {
        debug!("GET (stream) {}", url);
        let resp = self
            .stream_http
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await?;
        check_status(resp).await
    }
}

/// A base URL without a trailing slash would have its last segment replaced
/// by `Url::join`; force one so `http://host/ac` behaves like `http://host/ac/`.
fn normalize_base(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Http {
        status: status.as_u16(),
        message: preview(&body).to_owned(),
    })
}

async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let resp = check_status(resp).await?;
    let body = resp.text().await?;

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: format!("{e} (body preview: {:?})", preview(&body)),
        body,
    })
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(200) {
        Some((end, _)) => &body[..end],
        None => body,
    }
}
