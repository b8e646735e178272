// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::view::{default_subtab, known_subtabs};
use crate::{Industry, Record, SubtabGrouping, SubtabKey, SummaryPayload};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Uninitialized,
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Pending,
    Ok,
    Error,
}

impl StatusLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusIndicator {
    pub level: StatusLevel,
    pub message: String,
}

impl Default for StatusIndicator {
    fn default() -> Self {
        Self {
            level: StatusLevel::Pending,
            message: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardState {
    pub phase: LoadPhase,
    pub active_industry: Industry,
    pub active_subtabs: BTreeMap<Industry, SubtabKey>,
    pub summary: Option<SummaryPayload>,
    pub status: StatusIndicator,
    pub grouping: SubtabGrouping,
    pub last_error: Option<String>,
    load_token: u64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new(SubtabGrouping::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardCommand {
    Reload,
    LoadSucceeded { token: u64, payload: SummaryPayload },
    LoadFailed { token: u64, message: String },
    SelectIndustry(Industry),
    NextIndustry,
    PrevIndustry,
    SelectSubtab(SubtabKey),
    NextSubtab,
    PrevSubtab,
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    PhaseChanged(LoadPhase),
    LoadRequested { token: u64 },
    StaleLoadIgnored { token: u64 },
    IndustryChanged(Industry),
    SubtabChanged { industry: Industry, subtab: SubtabKey },
    PaneInvalidated(Industry),
    AllPanesInvalidated,
    StatusUpdated { level: StatusLevel, message: String },
    StatusCleared,
}

impl DashboardState {
    pub fn new(grouping: SubtabGrouping) -> Self {
        let active_industry = Industry::ALL[0];
        let mut active_subtabs = BTreeMap::new();
        if let Some(subtab) = default_subtab(active_industry, &[], grouping) {
            active_subtabs.insert(active_industry, subtab);
        }

        Self {
            phase: LoadPhase::Uninitialized,
            active_industry,
            active_subtabs,
            summary: None,
            status: StatusIndicator::default(),
            grouping,
            last_error: None,
            load_token: 0,
        }
    }

    /// Token of the most recently requested load.
    pub fn load_token(&self) -> u64 {
        self.load_token
    }

    pub fn active_subtab(&self, industry: Industry) -> Option<&SubtabKey> {
        self.active_subtabs.get(&industry)
    }

    pub fn records(&self, industry: Industry) -> &[Record] {
        records_in(self.summary.as_ref(), industry)
    }

    pub fn dispatch(&mut self, command: DashboardCommand) -> Vec<DashboardEvent> {
        match command {
            DashboardCommand::Reload => self.begin_load(),
            DashboardCommand::LoadSucceeded { token, payload } => {
                self.finish_load(token, payload)
            }
            DashboardCommand::LoadFailed { token, message } => self.fail_load(token, message),
            DashboardCommand::SelectIndustry(industry) => self.select_industry(industry),
            DashboardCommand::NextIndustry => self.rotate_industry(1),
            DashboardCommand::PrevIndustry => self.rotate_industry(-1),
            DashboardCommand::SelectSubtab(subtab) => self.select_subtab(&subtab),
            DashboardCommand::NextSubtab => self.rotate_subtab(1),
            DashboardCommand::PrevSubtab => self.rotate_subtab(-1),
            DashboardCommand::ClearStatus => {
                self.status.message.clear();
                vec![DashboardEvent::StatusCleared]
            }
        }
    }

    fn begin_load(&mut self) -> Vec<DashboardEvent> {
        self.load_token = self.load_token.saturating_add(1);
        self.phase = LoadPhase::Loading;
        tracing::debug!(token = self.load_token, "summary load requested");
        vec![
            DashboardEvent::PhaseChanged(self.phase),
            DashboardEvent::LoadRequested {
                token: self.load_token,
            },
            self.set_status(StatusLevel::Pending, "Loading industry updates"),
            DashboardEvent::AllPanesInvalidated,
        ]
    }

    fn finish_load(&mut self, token: u64, payload: SummaryPayload) -> Vec<DashboardEvent> {
        if token != self.load_token {
            tracing::debug!(token, latest = self.load_token, "ignoring stale summary");
            return vec![DashboardEvent::StaleLoadIgnored { token }];
        }

        for key in payload.unknown_keys() {
            tracing::debug!(block = key, "summary block has no matching industry");
        }

        let total = payload.record_count();
        self.summary = Some(payload);
        self.phase = LoadPhase::Loaded;
        self.last_error = None;
        self.reconcile_subtabs();

        let message = match total {
            1 => "Loaded 1 update".to_owned(),
            count => format!("Loaded {count} updates"),
        };
        vec![
            DashboardEvent::PhaseChanged(self.phase),
            self.set_status(StatusLevel::Ok, &message),
            DashboardEvent::AllPanesInvalidated,
        ]
    }

    fn fail_load(&mut self, token: u64, message: String) -> Vec<DashboardEvent> {
        if token != self.load_token {
            tracing::debug!(token, latest = self.load_token, "ignoring stale failure");
            return vec![DashboardEvent::StaleLoadIgnored { token }];
        }

        self.summary = None;
        self.phase = LoadPhase::Error;
        self.last_error = Some(message);
        vec![
            DashboardEvent::PhaseChanged(self.phase),
            self.set_status(StatusLevel::Error, "Error loading data"),
            DashboardEvent::AllPanesInvalidated,
        ]
    }

    /// Drops remembered subtabs that the new payload no longer knows and
    /// defaults the active industry's subtab.
    fn reconcile_subtabs(&mut self) {
        let grouping = self.grouping;
        let summary = self.summary.as_ref();

        self.active_subtabs.retain(|industry, subtab| {
            known_subtabs(*industry, records_in(summary, *industry), grouping)
                .iter()
                .any(|known| known.key.matches(subtab.as_str()))
        });

        let active = self.active_industry;
        if !self.active_subtabs.contains_key(&active)
            && let Some(subtab) = default_subtab(active, records_in(summary, active), grouping)
        {
            self.active_subtabs.insert(active, subtab);
        }
    }

    fn select_industry(&mut self, industry: Industry) -> Vec<DashboardEvent> {
        let mut events = Vec::new();
        if self.active_industry != industry {
            self.active_industry = industry;
            events.push(DashboardEvent::IndustryChanged(industry));
        }

        if !self.active_subtabs.contains_key(&industry)
            && let Some(subtab) = default_subtab(industry, self.records(industry), self.grouping)
        {
            self.active_subtabs.insert(industry, subtab.clone());
            events.push(DashboardEvent::SubtabChanged { industry, subtab });
        }

        events.push(DashboardEvent::PaneInvalidated(industry));
        events
    }

    fn rotate_industry(&mut self, delta: isize) -> Vec<DashboardEvent> {
        let len = Industry::ALL.len() as isize;
        let next = (self.active_industry.index() as isize + delta).rem_euclid(len) as usize;
        self.select_industry(Industry::ALL[next])
    }

    fn select_subtab(&mut self, requested: &SubtabKey) -> Vec<DashboardEvent> {
        let industry = self.active_industry;
        let known = known_subtabs(industry, self.records(industry), self.grouping);
        let Some(found) = known
            .into_iter()
            .find(|subtab| subtab.key.matches(requested.as_str()))
        else {
            tracing::debug!(
                industry = industry.key(),
                subtab = requested.as_str(),
                "ignoring unknown subtab"
            );
            return Vec::new();
        };

        self.active_subtabs.insert(industry, found.key.clone());
        vec![
            DashboardEvent::SubtabChanged {
                industry,
                subtab: found.key,
            },
            DashboardEvent::PaneInvalidated(industry),
        ]
    }

    fn rotate_subtab(&mut self, delta: isize) -> Vec<DashboardEvent> {
        let industry = self.active_industry;
        let known = known_subtabs(industry, self.records(industry), self.grouping);
        if known.is_empty() {
            return Vec::new();
        }

        let current = self
            .active_subtab(industry)
            .and_then(|active| {
                known
                    .iter()
                    .position(|subtab| subtab.key.matches(active.as_str()))
            })
            .unwrap_or(0) as isize;
        let len = known.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        let key = known[next].key.clone();
        self.select_subtab(&key)
    }

    fn set_status(&mut self, level: StatusLevel, message: &str) -> DashboardEvent {
        self.status = StatusIndicator {
            level,
            message: message.to_owned(),
        };
        DashboardEvent::StatusUpdated {
            level,
            message: message.to_owned(),
        }
    }
}

fn records_in(summary: Option<&SummaryPayload>, industry: Industry) -> &[Record] {
    summary
        .map(|summary| summary.records(industry))
        .unwrap_or(&[])
}
