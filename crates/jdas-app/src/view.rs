// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Pure projection from dashboard state to what a pane shows. Renderers
//! consume [`PaneView`] and never look at records directly.

use crate::{Attribute, DashboardState, Industry, LoadPhase, Record, SubtabGrouping, SubtabKey};
use crate::{SummaryPayload, TableDef};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

pub const EMPTY_PLACEHOLDER: &str = "No records found.";
pub const ERROR_PLACEHOLDER: &str = "Error loading data.";
pub const LOADING_PLACEHOLDER: &str = "Loading…";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtab {
    pub key: SubtabKey,
    pub label: String,
}

/// Every subtab an industry could select. Table grouping always yields the
/// declared tables; label grouping yields distinct titles in first-seen
/// order.
pub fn known_subtabs(
    industry: Industry,
    records: &[Record],
    grouping: SubtabGrouping,
) -> Vec<Subtab> {
    match grouping {
        SubtabGrouping::Table => industry
            .tables()
            .iter()
            .map(|table| Subtab {
                key: SubtabKey::new(table.key),
                label: table.label.to_owned(),
            })
            .collect(),
        SubtabGrouping::Label => {
            let mut subtabs: Vec<Subtab> = Vec::new();
            for record in records {
                let title = record.attribute(Attribute::Title);
                if title.is_empty() || subtabs.iter().any(|subtab| subtab.key.matches(&title)) {
                    continue;
                }
                subtabs.push(Subtab {
                    key: SubtabKey::new(title.clone()),
                    label: title,
                });
            }
            subtabs
        }
    }
}

/// Subtabs shown in the subtab bar. An industry without records shows none.
pub fn visible_subtabs(
    industry: Industry,
    records: &[Record],
    grouping: SubtabGrouping,
) -> Vec<Subtab> {
    if records.is_empty() {
        return Vec::new();
    }
    known_subtabs(industry, records, grouping)
}

pub fn default_subtab(
    industry: Industry,
    records: &[Record],
    grouping: SubtabGrouping,
) -> Option<SubtabKey> {
    known_subtabs(industry, records, grouping)
        .into_iter()
        .next()
        .map(|subtab| subtab.key)
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOutcome<'a> {
    pub records: Vec<&'a Record>,
    /// True when the filter matched nothing and all records are shown.
    pub fell_back: bool,
}

pub fn filter_records<'a>(
    records: &'a [Record],
    subtab: Option<&SubtabKey>,
    grouping: SubtabGrouping,
) -> FilterOutcome<'a> {
    let Some(subtab) = subtab else {
        return FilterOutcome {
            records: records.iter().collect(),
            fell_back: false,
        };
    };

    let matched: Vec<&Record> = records
        .iter()
        .filter(|record| match grouping {
            SubtabGrouping::Table => subtab.matches(&record.table()),
            SubtabGrouping::Label => subtab.matches(&record.attribute(Attribute::Title)),
        })
        .collect();

    if matched.is_empty() && !records.is_empty() {
        return FilterOutcome {
            records: records.iter().collect(),
            fell_back: true,
        };
    }

    FilterOutcome {
        records: matched,
        fell_back: false,
    }
}

/// Records bucketed per industry, in catalog order.
pub fn partition(payload: &SummaryPayload) -> Vec<(Industry, &[Record])> {
    Industry::ALL
        .into_iter()
        .map(|industry| (industry, payload.records(industry)))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Card {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub details: String,
    pub tag: String,
    pub date: String,
}

impl Card {
    pub fn from_record(record: &Record) -> Self {
        let tag = match record.attribute(Attribute::Tag) {
            tag if !tag.is_empty() => tag,
            _ => TableDef::find(&record.table())
                .map(|table| table.tag.to_owned())
                .unwrap_or_default(),
        };

        Self {
            title: record.attribute(Attribute::Title),
            subtitle: record.attribute(Attribute::Subtitle),
            body: record.attribute(Attribute::Body),
            details: record.attribute(Attribute::Details),
            tag,
            date: format_card_date(&record.attribute(Attribute::Date)),
        }
    }
}

/// Formats RFC 3339 timestamps and plain ISO dates as `Jan 5, 2026`.
/// Anything else is returned unchanged.
pub fn format_card_date(raw: &str) -> String {
    let display = format_description!("[month repr:short] [day padding:none], [year]");
    let date = OffsetDateTime::parse(raw, &Rfc3339)
        .map(|datetime| datetime.date())
        .or_else(|_| Date::parse(raw, format_description!("[year]-[month]-[day]")));
    match date {
        Ok(date) => date.format(display).unwrap_or_else(|_| raw.to_owned()),
        Err(_) => raw.to_owned(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaneContent {
    Loading,
    Error,
    Empty,
    Cards(Vec<Card>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneView {
    pub industry: Industry,
    pub visible: bool,
    pub subtabs: Vec<Subtab>,
    pub active_subtab: Option<SubtabKey>,
    pub content: PaneContent,
    pub fell_back: bool,
}

impl PaneView {
    pub fn cards(&self) -> &[Card] {
        match &self.content {
            PaneContent::Cards(cards) => cards,
            _ => &[],
        }
    }
}

pub fn project_pane(state: &DashboardState, industry: Industry) -> PaneView {
    let visible = state.active_industry == industry;
    let active_subtab = state.active_subtab(industry).cloned();

    let loaded = match (state.phase, state.summary.as_ref()) {
        (LoadPhase::Loaded, Some(summary)) => summary,
        (LoadPhase::Error, _) => {
            return PaneView {
                industry,
                visible,
                subtabs: Vec::new(),
                active_subtab,
                content: PaneContent::Error,
                fell_back: false,
            };
        }
        _ => {
            return PaneView {
                industry,
                visible,
                subtabs: Vec::new(),
                active_subtab,
                content: PaneContent::Loading,
                fell_back: false,
            };
        }
    };

    let records = loaded.records(industry);
    let subtabs = visible_subtabs(industry, records, state.grouping);
    let outcome = filter_records(records, active_subtab.as_ref(), state.grouping);
    let content = if outcome.records.is_empty() {
        PaneContent::Empty
    } else {
        PaneContent::Cards(
            outcome
                .records
                .iter()
                .map(|record| Card::from_record(record))
                .collect(),
        )
    };

    PaneView {
        industry,
        visible,
        subtabs,
        active_subtab,
        content,
        fell_back: outcome.fell_back,
    }
}

pub fn project_all(state: &DashboardState) -> Vec<PaneView> {
    Industry::ALL
        .into_iter()
        .map(|industry| project_pane(state, industry))
        .collect()
}
