// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use jdas_api::{DEFAULT_TIMEOUT, Origin, SUMMARY_TIMEOUT, resolve_base_url};
use jdas_app::{Industry, SubtabGrouping};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const APP_NAME: &str = "jdas";
pub const BASE_URL_ENV: &str = "JDAS_API_BASE_URL";
const CONFIG_PATH_ENV: &str = "JDAS_CONFIG_PATH";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_TOP: u32 = 10;
const DEFAULT_ORDERBY: &str = "createdon desc";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: Api::default(),
            ui: Ui::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Api {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
    pub summary_timeout: Option<String>,
    pub top: Option<u32>,
    pub orderby: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub grouping: Option<String>,
    pub default_industry: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub filter: Option<String>,
    pub file: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set {CONFIG_PATH_ENV} to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [api], [ui], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.api.base_url {
            jdas_api::validate_base_url(base_url)
                .with_context(|| format!("api.base_url in {}", path.display()))?;
        }

        for (field, value) in [
            ("api.timeout", &self.api.timeout),
            ("api.summary_timeout", &self.api.summary_timeout),
        ] {
            if let Some(raw) = value {
                let parsed = parse_duration(raw)
                    .with_context(|| format!("{field} in {}", path.display()))?;
                if parsed.is_zero() {
                    bail!("{field} in {} must be positive, got {raw}", path.display());
                }
            }
        }

        if self.api.top == Some(0) {
            bail!("api.top in {} must be positive, got 0", path.display());
        }

        if let Some(grouping) = &self.ui.grouping
            && SubtabGrouping::parse(grouping).is_none()
        {
            bail!(
                "ui.grouping in {} must be \"table\" or \"label\", got {grouping:?}",
                path.display()
            );
        }

        if let Some(industry) = &self.ui.default_industry
            && Industry::parse(industry).is_none()
        {
            let known = Industry::ALL
                .iter()
                .map(|industry| industry.key())
                .collect::<Vec<_>>()
                .join(", ");
            bail!(
                "ui.default_industry in {} must be one of {known}, got {industry:?}",
                path.display()
            );
        }

        if let Some(filter) = &self.log.filter {
            crate::logging::parse_filter(filter)
                .with_context(|| format!("log.filter in {}", path.display()))?;
        }

        Ok(())
    }

    /// CLI flag, then `JDAS_API_BASE_URL`, then `[api].base_url`, then the
    /// local default origin.
    pub fn base_url(&self, cli_override: Option<&str>) -> Result<String> {
        let env_override = env::var(BASE_URL_ENV).ok();
        let explicit = cli_override.or(env_override.as_deref());
        resolve_base_url(explicit, self.api.base_url.as_deref(), &Origin::default())
            .context("resolve API base URL; pass --base-url or set [api].base_url")
    }

    pub fn api_timeout(&self) -> Result<Duration> {
        match &self.api.timeout {
            Some(raw) => parse_duration(raw),
            None => Ok(DEFAULT_TIMEOUT),
        }
    }

    pub fn summary_timeout(&self) -> Result<Duration> {
        match &self.api.summary_timeout {
            Some(raw) => parse_duration(raw),
            None => Ok(SUMMARY_TIMEOUT),
        }
    }

    pub fn top(&self) -> u32 {
        self.api.top.unwrap_or(DEFAULT_TOP)
    }

    pub fn orderby(&self) -> &str {
        self.api.orderby.as_deref().unwrap_or(DEFAULT_ORDERBY)
    }

    pub fn grouping(&self) -> SubtabGrouping {
        self.ui
            .grouping
            .as_deref()
            .and_then(SubtabGrouping::parse)
            .unwrap_or_default()
    }

    pub fn default_industry(&self) -> Industry {
        self.ui
            .default_industry
            .as_deref()
            .and_then(Industry::parse)
            .unwrap_or(Industry::ALL[0])
    }

    pub fn log_filter(&self) -> &str {
        self.log.filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }

    pub fn log_file(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let cache_root = dirs::cache_dir()
            .ok_or_else(|| anyhow!("cannot resolve cache directory; set [log].file"))?;
        Ok(cache_root.join(APP_NAME).join("jdas.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# jdas config\n# Place this file at: {}\n\nversion = 1\n\n[api]\n# Optional. Defaults to the local backend at {}\n# base_url = \"https://dashboard.example.com\"\ntimeout = \"{}s\"\nsummary_timeout = \"{}s\"\ntop = {}\norderby = \"{}\"\n\n[ui]\n# \"table\" groups cards by source table, \"label\" by card title\ngrouping = \"table\"\ndefault_industry = \"{}\"\n\n[log]\n# Overridden by JDAS_LOG or RUST_LOG\nfilter = \"{}\"\n# file = \"/absolute/path/to/jdas.log\"\n",
            path.display(),
            Origin::default().url(),
            DEFAULT_TIMEOUT.as_secs(),
            SUMMARY_TIMEOUT.as_secs(),
            DEFAULT_TOP,
            DEFAULT_ORDERBY,
            Industry::ALL[0].key(),
            DEFAULT_LOG_FILTER,
        )
    }
}

pub fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim();
    let invalid = || format!("invalid duration {raw:?}");
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value.parse().with_context(invalid)?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value.parse().with_context(invalid)?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value.parse().with_context(invalid)?;
        let secs = mins
            .checked_mul(60)
            .ok_or_else(|| anyhow!("duration {raw:?} is too large"))?;
        return Ok(Duration::from_secs(secs));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 20s)")
}
