// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use jdas_api::Client;
use jdas_app::{DashboardCommand, DashboardState, SummaryPayload};
use jdas_testkit::{DEMO_SEED, UpdatesFaker};
use jdas_tui::{DashboardRuntime, InternalEvent};
use std::sync::mpsc::Sender;
use std::thread;

/// Loads the industry summary from the backend on a worker thread.
#[derive(Debug, Clone)]
pub struct ApiRuntime {
    client: Client,
    top: Option<u32>,
    orderby: Option<String>,
}

impl ApiRuntime {
    pub fn new(client: Client, top: Option<u32>, orderby: Option<String>) -> Self {
        Self {
            client,
            top,
            orderby,
        }
    }
}

fn fetch_summary(
    client: &Client,
    top: Option<u32>,
    orderby: Option<&str>,
) -> Result<SummaryPayload> {
    client
        .industry_summary(top, orderby)
        .with_context(|| format!("load industry summary from {}", client.base_url()))
}

impl DashboardRuntime for ApiRuntime {
    fn load_summary(&mut self) -> Result<SummaryPayload> {
        fetch_summary(&self.client, self.top, self.orderby.as_deref())
    }

    fn spawn_summary_load(&mut self, token: u64, tx: Sender<InternalEvent>) -> Result<()> {
        let client = self.client.clone();
        let top = self.top;
        let orderby = self.orderby.clone();
        thread::Builder::new()
            .name("summary-load".to_owned())
            .spawn(move || {
                let event = match fetch_summary(&client, top, orderby.as_deref()) {
                    Ok(payload) => InternalEvent::SummaryLoaded { token, payload },
                    Err(error) => InternalEvent::SummaryFailed {
                        token,
                        error: format!("{error:#}"),
                    },
                };
                // The UI may have exited before the load finished.
                let _ = tx.send(event);
            })
            .context("spawn summary loader")?;
        Ok(())
    }
}

/// Serves seeded fake updates. Each reload advances the seed so the
/// dashboard visibly changes.
#[derive(Debug, Clone)]
pub struct DemoRuntime {
    seed: u64,
    per_table: usize,
}

impl Default for DemoRuntime {
    fn default() -> Self {
        Self {
            seed: DEMO_SEED,
            per_table: 2,
        }
    }
}

impl DashboardRuntime for DemoRuntime {
    fn load_summary(&mut self) -> Result<SummaryPayload> {
        let payload = UpdatesFaker::new(self.seed).summary(self.per_table);
        self.seed = self.seed.wrapping_add(1);
        Ok(payload)
    }
}

/// Runs one load to completion on the calling thread.
pub fn load_blocking<R: DashboardRuntime>(state: &mut DashboardState, runtime: &mut R) {
    state.dispatch(DashboardCommand::Reload);
    let token = state.load_token();
    match runtime.load_summary() {
        Ok(payload) => {
            state.dispatch(DashboardCommand::LoadSucceeded { token, payload });
        }
        Err(error) => {
            let message = format!("{error:#}");
            tracing::error!(token, error = %message, "summary load failed");
            state.dispatch(DashboardCommand::LoadFailed { token, message });
        }
    }
}
