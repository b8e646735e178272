// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const FILTER_ENV_VARS: [&str; 2] = ["JDAS_LOG", "RUST_LOG"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// One-shot commands keep stdout clean for their output.
    Stderr,
    /// The terminal dashboard owns the screen, so logs go to a file.
    File(PathBuf),
}

pub fn parse_filter(directive: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directive).with_context(|| format!("invalid log filter {directive:?}"))
}

/// The first non-empty of `JDAS_LOG`, `RUST_LOG`, then `configured`.
pub fn filter_directive(configured: &str) -> String {
    choose_directive(
        FILTER_ENV_VARS.iter().map(|name| env::var(name).ok()),
        configured,
    )
}

fn choose_directive(
    candidates: impl IntoIterator<Item = Option<String>>,
    configured: &str,
) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(|value| value.trim().to_owned())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| configured.to_owned())
}

pub fn init(directive: &str, target: &LogTarget) -> Result<()> {
    let filter = parse_filter(directive)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("create log directory {}", parent.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
    };
    installed.map_err(|error| anyhow!("install log subscriber: {error}"))
}
