// Taskboard HTTP client
//
// Wraps `reqwest::Client` with base-URL resolution, bearer credential
// injection, payload placement per HTTP method, and upload progress. Typed
// endpoint methods live in `endpoints/` as inherent impls on `ApiClient`.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use reqwest::multipart::{Form, Part};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::{Display, EnumString};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::payload::{FileUpload, FormEntry, Payload};
use crate::token::TokenStore;
use crate::transport::TransportConfig;

/// Upload bodies are streamed in chunks of this size so progress can be reported.
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

// ── HttpMethod ───────────────────────────────────────────────────────

/// The verbs a form can be submitted with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Whether the payload travels in the body (`true`) or the query string.
    pub fn sends_body(self) -> bool {
        match self {
            Self::Get | Self::Delete => false,
            Self::Post | Self::Put | Self::Patch => true,
        }
    }

    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Post => reqwest::Method::POST,
            Self::Put => reqwest::Method::PUT,
            Self::Patch => reqwest::Method::PATCH,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

// ── Request / response ───────────────────────────────────────────────

/// Upload progress callback, invoked with a whole percentage (0-100).
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// A fully described request, ready for [`ApiClient::send`].
pub struct RequestSpec {
    pub method: HttpMethod,
    pub path: String,
    pub payload: Payload,
    pub on_progress: Option<ProgressFn>,
}

impl RequestSpec {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            payload: Payload::Empty,
            on_progress: None,
        }
    }

    pub fn payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    pub fn on_progress(mut self, f: ProgressFn) -> Self {
        self.on_progress = Some(f);
        self
    }
}

impl fmt::Debug for RequestSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSpec")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("payload", &self.payload)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; `None` when the body was empty.
    pub body: Option<Value>,
}

impl ApiResponse {
    /// Deserialize the whole body.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let body = self.body.clone().unwrap_or(Value::Null);
        serde_json::from_value(body.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.to_string(),
        })
    }

    /// Deserialize the `data` member of a `{ data: ... }` envelope.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let data = self
            .body
            .as_ref()
            .and_then(|b| b.get("data"))
            .cloned()
            .unwrap_or(Value::Null);
        serde_json::from_value(data.clone()).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: data.to_string(),
        })
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the Taskboard REST API.
///
/// Cheap to clone: the underlying `reqwest::Client` and token store are
/// shared. Every request reads the token store and, when a token is
/// present, attaches it as a bearer credential.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn TokenStore>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Build a client from a transport config.
    pub fn new(
        base_url: &str,
        transport: &TransportConfig,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http, tokens)
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn from_reqwest(
        base_url: &str,
        http: reqwest::Client,
        tokens: Arc<dyn TokenStore>,
    ) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    /// Ensure the base URL ends with `/` so relative joins keep its path.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The credential store this client reads from.
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Resolve an API path (`"/projects?page=2"`) against the base URL.
    pub fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Send a request and classify the response.
    ///
    /// 2xx yields an [`ApiResponse`]; anything else yields
    /// [`Error::Status`] carrying the parsed failure body.
    pub async fn send(&self, spec: RequestSpec) -> Result<ApiResponse, Error> {
        let url = self.url(&spec.path)?;
        debug!(method = %spec.method, %url, "sending request");

        let mut req = self.http.request(spec.method.as_reqwest(), url);

        if let Some(token) = self.tokens.load()? {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| Error::TokenStore(format!("invalid token header value: {e}")))?;
            value.set_sensitive(true);
            req = req.header(AUTHORIZATION, value);
        }

        req = match spec.payload {
            Payload::Empty => req,
            Payload::Query(pairs) => req.query(&pairs),
            Payload::Json(value) => match spec.on_progress {
                Some(progress) => {
                    let bytes = serde_json::to_vec(&value)
                        .map_err(|e| Error::Payload(e.to_string()))?;
                    let len = bytes.len();
                    let tracker = Arc::new(ProgressTracker::new(len as u64, progress));
                    req.header(CONTENT_TYPE, "application/json")
                        .header(CONTENT_LENGTH, len)
                        .body(progress_body(Bytes::from(bytes), tracker))
                }
                None => req.json(&value),
            },
            Payload::Multipart(entries) => {
                req.multipart(build_multipart(entries, spec.on_progress).await?)
            }
        };

        let resp = req.send().await?;
        let status = resp.status();
        let body = read_body(resp).await?;

        if status.is_success() {
            Ok(ApiResponse {
                status: status.as_u16(),
                body,
            })
        } else {
            debug!(status = status.as_u16(), "request failed");
            Err(Error::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    /// Send and deserialize the `data` envelope of the response.
    pub(crate) async fn send_data<T: DeserializeOwned>(
        &self,
        spec: RequestSpec,
    ) -> Result<T, Error> {
        self.send(spec).await?.data()
    }

    /// Send and deserialize the whole response body.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        spec: RequestSpec,
    ) -> Result<T, Error> {
        self.send(spec).await?.json()
    }
}

/// Read a response body: JSON when it parses, a JSON string otherwise.
async fn read_body(resp: reqwest::Response) -> Result<Option<Value>, Error> {
    let bytes = resp.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&bytes).unwrap_or_else(|_| {
        Value::String(String::from_utf8_lossy(&bytes).into_owned())
    })))
}

// ── Multipart ────────────────────────────────────────────────────────

async fn build_multipart(
    entries: Vec<FormEntry>,
    on_progress: Option<ProgressFn>,
) -> Result<Form, Error> {
    let mut files: Vec<(String, FileUpload, Vec<u8>)> = Vec::new();
    let mut form = Form::new();

    for entry in entries {
        match entry {
            FormEntry::Text { key, value } => form = form.text(key, value),
            FormEntry::File { key, upload } => {
                let path = upload.path();
                let data = tokio::fs::read(&path).await.map_err(|source| Error::Upload {
                    path: path.display().to_string(),
                    source,
                })?;
                files.push((key, upload, data));
            }
        }
    }

    let total: u64 = files.iter().map(|(_, _, data)| data.len() as u64).sum();
    let tracker = on_progress.map(|f| Arc::new(ProgressTracker::new(total, f)));

    for (key, upload, data) in files {
        let part = match &tracker {
            Some(tracker) => {
                let len = data.len() as u64;
                Part::stream_with_length(progress_body(Bytes::from(data), Arc::clone(tracker)), len)
            }
            None => Part::bytes(data),
        };
        let part = part
            .file_name(upload.name.clone())
            .mime_str(&upload.mime)
            .map_err(|e| Error::Payload(format!("invalid MIME type {:?}: {e}", upload.mime)))?;
        form = form.part(key, part);
    }

    Ok(form)
}

// ── Upload progress ──────────────────────────────────────────────────

/// Counts bytes handed to the transport and reports whole percentages.
struct ProgressTracker {
    total: u64,
    sent: AtomicU64,
    last_reported: AtomicU8,
    callback: ProgressFn,
}

impl ProgressTracker {
    fn new(total: u64, callback: ProgressFn) -> Self {
        Self {
            total,
            sent: AtomicU64::new(0),
            last_reported: AtomicU8::new(u8::MAX),
            callback,
        }
    }

    fn advance(&self, n: usize) {
        if self.total == 0 {
            return;
        }
        let sent = self.sent.fetch_add(n as u64, Ordering::Relaxed) + n as u64;
        let percent = percent_of(sent, self.total);
        if self.last_reported.swap(percent, Ordering::Relaxed) != percent {
            (self.callback)(percent);
        }
    }
}

/// Rounded percentage, clamped to 100.
fn percent_of(sent: u64, total: u64) -> u8 {
    let pct = (sent.min(total) * 100 + total / 2) / total;
    u8::try_from(pct).unwrap_or(100)
}

fn progress_body(bytes: Bytes, tracker: Arc<ProgressTracker>) -> reqwest::Body {
    let chunks: Vec<Bytes> = bytes
        .chunks(UPLOAD_CHUNK_SIZE)
        .map(|chunk| bytes.slice_ref(chunk))
        .collect();
    let stream = futures_util::stream::iter(chunks.into_iter().map(move |chunk| {
        tracker.advance(chunk.len());
        Ok::<_, std::io::Error>(chunk)
    }));
    reqwest::Body::wrap_stream(stream)
}
