// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use jdas_app::{Block, Industry, Record, SummaryPayload, TableDef};
use serde_json::{Map, Value, json};
use std::io::Read;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::{Date, Month, OffsetDateTime, Time};
use tiny_http::{Header, Response, Server};

pub const DEMO_SEED: u64 = 2026;
const REFERENCE_YEAR: i32 = 2026;

const HEADLINE_SUBJECTS: [&str; 16] = [
    "Inventory",
    "Mortgage rates",
    "Dealer margins",
    "EV demand",
    "Model adoption",
    "Data pipelines",
    "Forecast accuracy",
    "Commercial leasing",
    "Freight costs",
    "Consumer sentiment",
    "Chip supply",
    "Agent workflows",
    "Regional pricing",
    "Credit spreads",
    "Fleet renewals",
    "Warehouse automation",
];

const HEADLINE_VERBS: [&str; 12] = [
    "rebounds",
    "cools",
    "tightens",
    "accelerates",
    "stalls",
    "shifts",
    "stabilizes",
    "climbs",
    "softens",
    "diverges",
    "recovers",
    "widens",
];

const QUALIFIERS: [&str; 8] = [
    "in the Midwest",
    "for first-time buyers",
    "across the Sun Belt",
    "ahead of Q3",
    "among mid-size firms",
    "after the rate cut",
    "in coastal metros",
    "for fleet buyers",
];

const BODY_WORDS: [&str; 30] = [
    "demand",
    "supply",
    "pricing",
    "inventory",
    "margin",
    "forecast",
    "quarter",
    "growth",
    "decline",
    "signal",
    "volume",
    "buyers",
    "sellers",
    "adoption",
    "pipeline",
    "capacity",
    "regional",
    "momentum",
    "outlook",
    "pressure",
    "spending",
    "rates",
    "costs",
    "trend",
    "analysts",
    "expect",
    "continued",
    "moderate",
    "strong",
    "uneven",
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for industry update records. The same seed always
/// produces the same records.
#[derive(Debug, Clone)]
pub struct UpdatesFaker {
    rng: DeterministicRng,
}

impl UpdatesFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn headline(&mut self) -> String {
        format!(
            "{} {} {}",
            self.pick(&HEADLINE_SUBJECTS),
            self.pick(&HEADLINE_VERBS),
            self.pick(&QUALIFIERS),
        )
    }

    /// A summary card record belonging to `table`.
    pub fn record(&mut self, table: &TableDef) -> Record {
        let created = self.date_in_year(REFERENCE_YEAR);
        Record::new()
            .with("table", table.key)
            .with("title", self.headline())
            .with("body", self.sentence(10, 24))
            .with("tag", table.tag)
            .with("createdOn", rfc3339(created))
    }

    /// A row shaped like `GET /api/v1/raw/{table}` output.
    pub fn raw_row(&mut self, table: &TableDef) -> Record {
        let created = self.date_in_year(REFERENCE_YEAR);
        let id = format!("{:016x}", self.rng.next_u64());
        Record::new()
            .with(table.title_column, self.headline())
            .with(table.body_column, self.sentence(10, 24))
            .with(&format!("{}id", table.key), id)
            .with("createdon", rfc3339(created))
    }

    /// `per_table` records for every table of every industry.
    pub fn summary(&mut self, per_table: usize) -> SummaryPayload {
        let mut payload = SummaryPayload::new();
        for industry in Industry::ALL {
            let items = industry
                .tables()
                .iter()
                .flat_map(|table| {
                    (0..per_table)
                        .map(|_| self.record(table))
                        .collect::<Vec<_>>()
                })
                .collect();
            payload.insert(industry.key(), Block::ok(items));
        }
        payload
    }

    /// The same content as [`Self::summary`], as the backend's JSON envelope.
    pub fn summary_json(&mut self, per_table: usize) -> Value {
        let blocks = Industry::ALL
            .into_iter()
            .map(|industry| {
                let items: Vec<Record> = industry
                    .tables()
                    .iter()
                    .flat_map(|table| {
                        (0..per_table)
                            .map(|_| self.record(table))
                            .collect::<Vec<_>>()
                    })
                    .collect();
                (industry.key(), block_json(industry, &items))
            })
            .collect::<Vec<_>>();
        summary_json(&blocks)
    }

    pub fn date_in_year(&mut self, year: i32) -> OffsetDateTime {
        let start = midnight_utc(year, Month::January, 1);
        let end = midnight_utc(year, Month::December, 31);
        let span = (end.unix_timestamp() - start.unix_timestamp()).max(0) as u64;
        let offset = self.rng.next_u64() % (span + 1);
        start + time::Duration::seconds(offset as i64)
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn sentence(&mut self, min_words: usize, max_words: usize) -> String {
        let count = min_words + self.rng.int_n(max_words.saturating_sub(min_words) + 1);
        let parts: Vec<&str> = (0..count).map(|_| self.pick(&BODY_WORDS)).collect();
        let mut sentence = parts.join(" ");
        if let Some(first) = sentence.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        sentence.push('.');
        sentence
    }
}

pub fn demo_summary() -> SummaryPayload {
    UpdatesFaker::new(DEMO_SEED).summary(2)
}

pub fn card(table_key: &str, title: &str) -> Record {
    Record::new().with("table", table_key).with("title", title)
}

pub fn block_json(industry: Industry, items: &[Record]) -> Value {
    json!({
        "ok": true,
        "label": industry.label(),
        "accent": industry.accent(),
        "items": items,
    })
}

pub fn failed_block_json(industry: Industry) -> Value {
    json!({
        "ok": false,
        "label": industry.label(),
        "accent": industry.accent(),
        "items": [],
    })
}

/// `{"ok": true, "blocks": {...}}` from `(key, block)` pairs.
pub fn summary_json(blocks: &[(&str, Value)]) -> Value {
    let blocks: Map<String, Value> = blocks
        .iter()
        .map(|(key, block)| ((*key).to_owned(), block.clone()))
        .collect();
    json!({"ok": true, "blocks": blocks})
}

pub fn temp_config_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("config.toml");
    Ok((dir, path))
}

pub fn fixture_datetime() -> &'static str {
    "2026-01-05T10:30:00Z"
}

fn midnight_utc(year: i32, month: Month, day: u8) -> OffsetDateTime {
    let date = Date::from_calendar_date(year, month, day).unwrap_or(Date::MIN);
    date.with_time(Time::MIDNIGHT).assume_utc()
}

fn rfc3339(value: OffsetDateTime) -> String {
    value.format(&Rfc3339).unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn path(&self) -> &str {
        self.url.split_once('?').map_or(&self.url, |(path, _)| path)
    }

    pub fn query(&self) -> &str {
        self.url.split_once('?').map_or("", |(_, query)| query)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(field, _)| field.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub content_type: String,
    pub body: String,
    pub delay: Option<Duration>,
}

impl MockResponse {
    pub fn json(value: &Value) -> Self {
        Self {
            status: 200,
            content_type: "application/json".to_owned(),
            body: value.to_string(),
            delay: None,
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8".to_owned(),
            body: body.into(),
            delay: None,
        }
    }

    pub fn not_found() -> Self {
        Self::text(404, "Not Found")
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

type Responder = Box<dyn Fn(&RecordedRequest) -> MockResponse + Send + 'static>;

/// A local HTTP server that answers through a responder closure and records
/// every request. Requests are served one at a time.
pub struct MockApi {
    base_url: String,
    server: Arc<Server>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: Option<JoinHandle<()>>,
}

impl MockApi {
    pub fn start(
        responder: impl Fn(&RecordedRequest) -> MockResponse + Send + 'static,
    ) -> Result<Self> {
        let server = Server::http("127.0.0.1:0")
            .map_err(|error| anyhow!("start mock server: {error}"))?;
        let base_url = format!("http://{}", server.server_addr());
        let server = Arc::new(server);
        let requests = Arc::new(Mutex::new(Vec::new()));

        let responder: Responder = Box::new(responder);
        let handle = {
            let server = Arc::clone(&server);
            let requests = Arc::clone(&requests);
            thread::spawn(move || serve(&server, &requests, &responder))
        };

        Ok(Self {
            base_url,
            server,
            requests,
            handle: Some(handle),
        })
    }

    /// Answers every request with the same JSON document.
    pub fn serve_json(value: Value) -> Result<Self> {
        Self::start(move |_| MockResponse::json(&value))
    }

    /// Answers by exact path match, 404 otherwise.
    pub fn routes(routes: Vec<(&'static str, MockResponse)>) -> Result<Self> {
        Self::start(move |request| {
            routes
                .iter()
                .find(|(path, _)| *path == request.path())
                .map(|(_, response)| response.clone())
                .unwrap_or_else(MockResponse::not_found)
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

impl Drop for MockApi {
    fn drop(&mut self) {
        self.server.unblock();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve(server: &Server, requests: &Mutex<Vec<RecordedRequest>>, responder: &Responder) {
    while let Ok(mut request) = server.recv() {
        let mut body = String::new();
        let _ = request.as_reader().read_to_string(&mut body);
        let recorded = RecordedRequest {
            method: request.method().to_string(),
            url: request.url().to_owned(),
            headers: request
                .headers()
                .iter()
                .map(|header| (header.field.to_string(), header.value.to_string()))
                .collect(),
            body,
        };

        let reply = responder(&recorded);
        if let Ok(mut requests) = requests.lock() {
            requests.push(recorded);
        }
        if let Some(delay) = reply.delay {
            thread::sleep(delay);
        }

        let mut response = Response::from_string(reply.body).with_status_code(reply.status);
        if let Ok(header) = Header::from_bytes("Content-Type", reply.content_type.as_bytes()) {
            response = response.with_header(header);
        }
        // The client may have given up already.
        let _ = request.respond(response);
    }
}
