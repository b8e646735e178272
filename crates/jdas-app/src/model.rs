// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Industry {
    RealEstate,
    Automotive,
    AnalyticsOps,
    Ai,
    Market,
}

impl Industry {
    pub const ALL: [Self; 5] = [
        Self::RealEstate,
        Self::Automotive,
        Self::AnalyticsOps,
        Self::Ai,
        Self::Market,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::RealEstate => "real_estate",
            Self::Automotive => "automotive",
            Self::AnalyticsOps => "analytics_ops",
            Self::Ai => "ai",
            Self::Market => "market",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::RealEstate => "Real Estate",
            Self::Automotive => "Automotive",
            Self::AnalyticsOps => "Analytics & Ops",
            Self::Ai => "AI Developments",
            Self::Market => "Market Insight",
        }
    }

    pub const fn accent(self) -> &'static str {
        match self {
            Self::RealEstate => "#2563eb",
            Self::Automotive => "#475569",
            Self::AnalyticsOps => "#7c3aed",
            Self::Ai => "#db2777",
            Self::Market => "#059669",
        }
    }

    /// Tables that feed this industry, in display order. The first entry is
    /// the default subtab.
    pub const fn tables(self) -> &'static [TableDef] {
        match self {
            Self::RealEstate => &REAL_ESTATE_TABLES,
            Self::Automotive => &AUTOMOTIVE_TABLES,
            Self::AnalyticsOps => &ANALYTICS_OPS_TABLES,
            Self::Ai => &AI_TABLES,
            Self::Market => &MARKET_TABLES,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|industry| industry.key() == normalized)
    }

    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|industry| *industry == self)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDef {
    /// Logical table name, also the value of a card's `table` field.
    pub key: &'static str,
    pub short_key: &'static str,
    pub label: &'static str,
    pub tag: &'static str,
    pub title_column: &'static str,
    pub body_column: &'static str,
}

const REAL_ESTATE_TABLES: [TableDef; 2] = [
    TableDef {
        key: "jdas_housingmarketinsight",
        short_key: "housingmarketinsight",
        label: "Housing Market Insight",
        tag: "Housing",
        title_column: "jdas_insighttheme",
        body_column: "jdas_currentinsight",
    },
    TableDef {
        key: "jdas_marketoutlook",
        short_key: "marketoutlook",
        label: "Market Outlook",
        tag: "Outlook",
        title_column: "jdas_category",
        body_column: "jdas_keydrivers",
    },
];

const AUTOMOTIVE_TABLES: [TableDef; 1] = [TableDef {
    key: "jdas_vehiclesalesforecast",
    short_key: "vehiclesalesforecast",
    label: "Vehicle Sales Forecast",
    tag: "Sales",
    title_column: "jdas_salesmetric",
    body_column: "jdas_strategicinsight",
}];

const ANALYTICS_OPS_TABLES: [TableDef; 1] = [TableDef {
    key: "jdas_analyticsparadigm",
    short_key: "analyticsparadigm",
    label: "Analytics Paradigm",
    tag: "Ops",
    title_column: "jdas_analyticsfocus",
    body_column: "jdas_significance",
}];

const AI_TABLES: [TableDef; 1] = [TableDef {
    key: "jdas_aiindustryinsight",
    short_key: "aiindustryinsight",
    label: "AI Industry Insight",
    tag: "AI",
    title_column: "jdas_insightcategory",
    body_column: "jdas_assistantperspective",
}];

const MARKET_TABLES: [TableDef; 3] = [
    TableDef {
        key: "jdas_marketinsight",
        short_key: "marketinsight",
        label: "Market Insight",
        tag: "Market",
        title_column: "jdas_marketcategory",
        body_column: "jdas_markettrends",
    },
    TableDef {
        key: "jdas_markettrendinsight",
        short_key: "markettrendinsight",
        label: "Market Trend Insight",
        tag: "Trends",
        title_column: "jdas_keysignal",
        body_column: "jdas_trendfor2026",
    },
    TableDef {
        key: "jdas_marketanalysis",
        short_key: "marketanalysis",
        label: "Market Analysis",
        tag: "Analysis",
        title_column: "jdas_theme",
        body_column: "jdas_industryreality2026",
    },
];

impl TableDef {
    pub fn all() -> impl Iterator<Item = &'static TableDef> {
        Industry::ALL
            .into_iter()
            .flat_map(|industry| industry.tables().iter())
    }

    /// Looks a table up by logical or short key, ignoring case.
    pub fn find(key: &str) -> Option<&'static TableDef> {
        let key = key.trim();
        Self::all().find(|table| {
            table.key.eq_ignore_ascii_case(key) || table.short_key.eq_ignore_ascii_case(key)
        })
    }

    pub fn industry(&self) -> Industry {
        Industry::ALL
            .into_iter()
            .find(|industry| industry.tables().iter().any(|table| table.key == self.key))
            .unwrap_or(Industry::RealEstate)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Title,
    Subtitle,
    Body,
    Details,
    Tag,
    Date,
}

impl Attribute {
    /// Candidate field names, consulted in order.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Title => &["title", "name", "headline", "jdas_name", "label"],
            Self::Subtitle => &["subtitle", "subheading", "category", "source", "region"],
            Self::Body => &[
                "body",
                "summary",
                "description",
                "content",
                "text",
                "jdas_description",
            ],
            Self::Details => &["details", "detail", "notes", "insight", "jdas_details"],
            Self::Tag => &["tag", "type", "kind", "label_tag"],
            Self::Date => &[
                "date",
                "createdOn",
                "createdon",
                "created_at",
                "publishedOn",
                "updated_at",
            ],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only JSON objects become records.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert(&mut self, field: &str, value: impl Into<Value>) {
        self.0.insert(field.to_owned(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Scalar value of `field` as display text. Null, empty strings, arrays
    /// and objects yield `None`.
    pub fn text(&self, field: &str) -> Option<String> {
        let text = match self.0.get(field)? {
            Value::String(value) => value.trim().to_owned(),
            Value::Number(value) => value.to_string(),
            Value::Bool(value) => value.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
        };
        if text.is_empty() { None } else { Some(text) }
    }

    pub fn first_text(&self, aliases: &[&str]) -> String {
        aliases
            .iter()
            .find_map(|field| self.text(field))
            .unwrap_or_default()
    }

    pub fn attribute(&self, attribute: Attribute) -> String {
        self.first_text(attribute.aliases())
    }

    pub fn table(&self) -> String {
        self.text("table").unwrap_or_default()
    }
}

/// Turns a raw row from `GET /api/v1/raw/{table}` into a card record using
/// the table's title and body columns.
pub fn normalize_raw_row(row: &Record, table: &TableDef) -> Record {
    let title = row
        .text(table.title_column)
        .or_else(|| row.text("jdas_name"))
        .unwrap_or_else(|| "Untitled Update".to_owned());
    let body = row
        .text(table.body_column)
        .or_else(|| row.text("jdas_description"))
        .unwrap_or_default();

    let mut card = Record::new()
        .with("table", table.key)
        .with("title", title)
        .with("body", body)
        .with("tag", table.tag);
    if let Some(id) = row.get(&format!("{}id", table.key)) {
        card.insert("id", id.clone());
    }
    if let Some(created) = row.get("createdon") {
        card.insert("createdOn", created.clone());
    }
    card
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub ok: bool,
    pub items: Vec<Record>,
    pub label: Option<String>,
    pub accent: Option<String>,
}

impl Block {
    pub fn ok(items: Vec<Record>) -> Self {
        Self {
            ok: true,
            items,
            label: None,
            accent: None,
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    /// Reads one block of the summary mapping. A missing `ok` counts as
    /// success when `items` is present; non-object items are dropped.
    pub fn from_value(value: &Value) -> Self {
        let Some(object) = value.as_object() else {
            return Self::failed();
        };

        let items = object.get("items").and_then(Value::as_array);
        let ok = object
            .get("ok")
            .and_then(Value::as_bool)
            .unwrap_or(items.is_some());
        let items = items
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| Record::from_value(item.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            ok,
            items,
            label: object
                .get("label")
                .and_then(Value::as_str)
                .map(str::to_owned),
            accent: object
                .get("accent")
                .and_then(Value::as_str)
                .map(str::to_owned),
        }
    }

    pub fn records(&self) -> &[Record] {
        if self.ok { &self.items } else { &[] }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SummaryPayload {
    blocks: BTreeMap<String, Block>,
}

impl SummaryPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: &Map<String, Value>) -> Self {
        let mut payload = Self::new();
        for (key, value) in blocks {
            payload.insert(key, Block::from_value(value));
        }
        payload
    }

    pub fn with_block(mut self, key: &str, block: Block) -> Self {
        self.insert(key, block);
        self
    }

    pub fn insert(&mut self, key: &str, block: Block) {
        self.blocks.insert(key.trim().to_ascii_lowercase(), block);
    }

    pub fn block(&self, industry: Industry) -> Option<&Block> {
        self.blocks.get(industry.key())
    }

    pub fn records(&self, industry: Industry) -> &[Record] {
        self.block(industry).map(Block::records).unwrap_or(&[])
    }

    pub fn record_count(&self) -> usize {
        Industry::ALL
            .into_iter()
            .map(|industry| self.records(industry).len())
            .sum()
    }

    /// Block keys that do not name a known industry.
    pub fn unknown_keys(&self) -> impl Iterator<Item = &str> {
        self.blocks
            .keys()
            .map(String::as_str)
            .filter(|key| Industry::parse(key).is_none())
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubtabGrouping {
    /// Subtabs are the industry's declared tables; records match on `table`.
    #[default]
    Table,
    /// Subtabs are the distinct record titles; records match on title.
    Label,
}

impl SubtabGrouping {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Label => "label",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "table" => Some(Self::Table),
            "label" => Some(Self::Label),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubtabKey(String);

impl SubtabKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact match, ignoring case.
    pub fn matches(&self, value: &str) -> bool {
        self.0.to_lowercase() == value.to_lowercase()
    }
}

impl From<&str> for SubtabKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
