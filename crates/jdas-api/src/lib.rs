// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod envelope;

pub use envelope::{
    EnvelopeShape, classify_envelope, normalize_blocks, normalize_list, normalize_rows,
};

use jdas_app::{Record, SummaryPayload};
use reqwest::blocking::Client as HttpClient;
use reqwest::header::ACCEPT;
use serde_json::Value;
use std::time::{Duration, Instant};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);
pub const SUMMARY_TIMEOUT: Duration = Duration::from_secs(25);
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(15);
pub const BODY_EXCERPT_CHARS: usize = 600;
pub const DEFAULT_ORIGIN: &str = "http://127.0.0.1:8000";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
    #[error("build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("cannot reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} {status_text} from {url}: {body_excerpt}")]
    Status {
        url: String,
        status: u16,
        status_text: String,
        body_excerpt: String,
    },
    #[error("decode JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
}

impl HttpMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestOptions {
    pub method: HttpMethod,
    pub body: Option<Value>,
    /// Overrides the client's default timeout for this call.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            body: Some(body),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuery {
    pub top: Option<u32>,
    pub orderby: Option<String>,
    pub extra: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyFeed {
    Bankruptcies,
    Layoffs,
    Tariffs,
}

impl LegacyFeed {
    pub const ALL: [Self; 3] = [Self::Bankruptcies, Self::Layoffs, Self::Tariffs];

    pub const fn path(self) -> &'static str {
        match self {
            Self::Bankruptcies => "/api/bankruptcies",
            Self::Layoffs => "/api/layoff-announcement",
            Self::Tariffs => "/api/tariff-by-country",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bankruptcies => "bankruptcies",
            Self::Layoffs => "layoffs",
            Self::Tariffs => "tariffs",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|feed| feed.name() == value || feed.path().ends_with(&format!("/{value}")))
    }
}

/// The page's own scheme and host, used when nothing overrides the API
/// location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub scheme: String,
    pub host: String,
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            scheme: "http".to_owned(),
            host: "127.0.0.1:8000".to_owned(),
        }
    }
}

impl Origin {
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.host)
    }
}

/// Picks the API base URL: explicit override first, then configured value,
/// then the same-origin fallback. Blank candidates are skipped.
pub fn resolve_base_url(
    explicit: Option<&str>,
    configured: Option<&str>,
    origin: &Origin,
) -> Result<String, ApiError> {
    let candidate = [explicit, configured]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty());
    match candidate {
        Some(raw) => validate_base_url(raw),
        None => validate_base_url(&origin.url()),
    }
}

pub fn validate_base_url(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = |reason: String| ApiError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason,
    };

    let parsed = Url::parse(trimmed).map_err(|error| invalid(error.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "scheme {:?} is not http or https",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host".to_owned()));
    }
    Ok(trimmed.to_owned())
}

/// Builds `?k=v&...`, skipping absent and empty values. Keys and values are
/// percent-encoded.
pub fn build_query(params: &[(&str, Option<String>)]) -> String {
    let pairs: Vec<String> = params
        .iter()
        .filter_map(|(key, value)| {
            let value = value.as_deref()?;
            if key.is_empty() || value.is_empty() {
                return None;
            }
            Some(format!("{}={}", encode_component(key), encode_component(value)))
        })
        .collect();

    if pairs.is_empty() {
        String::new()
    } else {
        format!("?{}", pairs.join("&"))
    }
}

fn encode_component(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

fn encode_segment(raw: &str) -> String {
    encode_component(raw).replace('+', "%20")
}

/// First `max_chars` characters of `body`, with an ellipsis when cut.
pub fn body_excerpt(body: &str, max_chars: usize) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_owned(),
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    summary_timeout: Duration,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = validate_base_url(base_url)?;
        if timeout.is_zero() {
            return Err(ApiError::InvalidBaseUrl {
                url: base_url,
                reason: "timeout must be positive".to_owned(),
            });
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            base_url,
            timeout,
            summary_timeout: SUMMARY_TIMEOUT,
            http,
        })
    }

    /// The summary endpoint aggregates several tables and gets its own,
    /// longer timeout.
    pub fn with_summary_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.summary_timeout = timeout;
        }
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Sends one request and parses a 2xx body as JSON. Non-JSON success
    /// bodies are a decode error.
    pub fn request_json(&self, path: &str, options: &RequestOptions) -> Result<Value, ApiError> {
        let url = self.url_for(path);
        let timeout = options.timeout.unwrap_or(self.timeout);

        let mut request = match options.method {
            HttpMethod::Get => self.http.get(&url),
            HttpMethod::Post => self.http.post(&url),
        }
        .header(ACCEPT, "application/json")
        .timeout(timeout);
        if let Some(body) = &options.body {
            request = request.json(body);
        }

        let started = Instant::now();
        let response = request
            .send()
            .map_err(|error| transport_error(&url, timeout, error))?;
        let status = response.status();
        tracing::debug!(
            method = options.method.as_str(),
            url = %url,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "api response"
        );

        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::Status {
                url,
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_owned(),
                body_excerpt: body_excerpt(&body, BODY_EXCERPT_CHARS),
            });
        }

        let body = response
            .text()
            .map_err(|error| transport_error(&url, timeout, error))?;
        serde_json::from_str(&body).map_err(|source| ApiError::Decode { url, source })
    }

    pub fn get_json(
        &self,
        path: &str,
        query: &[(&str, Option<String>)],
        timeout: Option<Duration>,
    ) -> Result<Value, ApiError> {
        let path = format!("{path}{}", build_query(query));
        let options = RequestOptions {
            timeout,
            ..RequestOptions::get()
        };
        self.request_json(&path, &options)
    }

    pub fn post_json(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request_json(path, &RequestOptions::post(body))
    }

    pub fn health(&self) -> Result<Value, ApiError> {
        self.get_with_legacy_fallback("/api/health", "/health", Some(HEALTH_TIMEOUT))
    }

    pub fn metadata(&self) -> Result<Value, ApiError> {
        self.get_with_legacy_fallback("/api/v1/metadata", "/api/metadata", None)
    }

    pub fn raw_tables(&self) -> Result<Vec<String>, ApiError> {
        let value = self.get_json("/api/v1/raw/tables", &[], None)?;
        Ok(normalize_list(value)
            .into_iter()
            .filter_map(|entry| match entry {
                Value::String(name) => Some(name),
                Value::Object(object) => ["key", "name", "table"]
                    .iter()
                    .find_map(|field| object.get(*field).and_then(Value::as_str))
                    .map(str::to_owned),
                _ => None,
            })
            .collect())
    }

    pub fn raw_rows(&self, table: &str, query: &RawQuery) -> Result<Vec<Record>, ApiError> {
        let path = format!("/api/v1/raw/{}", encode_segment(table.trim()));
        let value = self.get_json(
            &path,
            &[
                ("top", query.top.map(|top| top.to_string())),
                ("orderby", query.orderby.clone()),
                ("extra", query.extra.clone()),
            ],
            None,
        )?;
        Ok(normalize_rows(value))
    }

    pub fn industry_summary(
        &self,
        top: Option<u32>,
        orderby: Option<&str>,
    ) -> Result<SummaryPayload, ApiError> {
        let value = self.get_json(
            "/api/v1/summary/industry-updates",
            &[
                ("top", top.map(|top| top.to_string())),
                ("orderby", orderby.map(str::to_owned)),
            ],
            Some(self.summary_timeout),
        )?;
        let blocks = normalize_blocks(value);
        let payload = SummaryPayload::from_blocks(&blocks);
        tracing::info!(
            blocks = blocks.len(),
            records = payload.record_count(),
            "industry summary loaded"
        );
        Ok(payload)
    }

    pub fn legacy_feed(
        &self,
        feed: LegacyFeed,
        top: Option<u32>,
        bust_cache: bool,
    ) -> Result<Vec<Record>, ApiError> {
        let value = self.get_json(
            feed.path(),
            &[
                ("top", top.map(|top| top.to_string())),
                ("nocache", bust_cache.then(|| "1".to_owned())),
            ],
            None,
        )?;
        Ok(normalize_rows(value))
    }

    /// Tries the current path and retries the legacy one when the server
    /// answers with an HTTP error. Transport failures are not retried.
    fn get_with_legacy_fallback(
        &self,
        current: &str,
        legacy: &str,
        timeout: Option<Duration>,
    ) -> Result<Value, ApiError> {
        match self.get_json(current, &[], timeout) {
            Err(error @ ApiError::Status { .. }) => {
                tracing::debug!(%error, legacy, "retrying legacy endpoint");
                self.get_json(legacy, &[], timeout)
            }
            result => result,
        }
    }
}

fn transport_error(url: &str, timeout: Duration, error: reqwest::Error) -> ApiError {
    if error.is_timeout() {
        ApiError::Timeout {
            url: url.to_owned(),
            timeout,
        }
    } else {
        ApiError::Transport {
            url: url.to_owned(),
            source: error,
        }
    }
}
