// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result, anyhow, bail};
use config::Config;
use jdas_api::{Client, LegacyFeed, RawQuery};
use jdas_app::{DashboardCommand, DashboardState, Record, SubtabGrouping, TableDef};
use jdas_tui::DashboardRuntime;
use logging::LogTarget;
use runtime::{ApiRuntime, DemoRuntime, load_blocking};
use serde::Serialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `jdas --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;

    let target = if options.is_one_shot() {
        LogTarget::Stderr
    } else {
        LogTarget::File(config.log_file()?)
    };
    logging::init(&logging::filter_directive(config.log_filter()), &target)?;

    let mut state = DashboardState::new(options.grouping.unwrap_or_else(|| config.grouping()));
    state.dispatch(DashboardCommand::SelectIndustry(config.default_industry()));

    if options.demo {
        if options.needs_backend() {
            bail!("--demo cannot be combined with --health, --metadata, --tables, --raw, or --legacy");
        }
        tracing::info!("starting in demo mode");
        let mut runtime = DemoRuntime::default();
        return launch(&options, &mut state, &mut runtime);
    }

    let base_url = config.base_url(options.base_url.as_deref())?;
    let client = Client::new(&base_url, config.api_timeout()?)
        .with_context(|| {
            format!(
                "invalid [api] config in {}; fix base_url/timeout values",
                options.config_path.display()
            )
        })?
        .with_summary_timeout(config.summary_timeout()?);
    tracing::info!(base_url = %base_url, "api client ready");

    if options.check_only {
        return Ok(());
    }

    let top = Some(config.top());
    let orderby = Some(config.orderby().to_owned());

    if options.health {
        return print_json(&client.health()?);
    }
    if options.metadata {
        return print_json(&client.metadata()?);
    }
    if options.tables {
        return print_json(&client.raw_tables()?);
    }
    if let Some(table) = &options.raw_table {
        let rows = client.raw_rows(
            table,
            &RawQuery {
                top,
                orderby,
                extra: None,
            },
        )?;
        return print_json(&card_rows(table, rows));
    }
    if let Some(feed) = options.legacy {
        return print_json(&client.legacy_feed(feed, top, true)?);
    }

    let mut runtime = ApiRuntime::new(client, top, orderby);
    launch(&options, &mut state, &mut runtime)
}

fn launch<R: DashboardRuntime>(
    options: &CliOptions,
    state: &mut DashboardState,
    runtime: &mut R,
) -> Result<()> {
    if options.check_only {
        return Ok(());
    }

    match &options.html_path {
        Some(path) => {
            load_blocking(state, runtime);
            write_html(path, &jdas_tui::render_page(state))
        }
        None => jdas_tui::run_app(state, runtime),
    }
}

/// Rows of a known table become card records; unknown tables print as-is.
fn card_rows(table: &str, rows: Vec<Record>) -> Vec<Record> {
    match TableDef::find(table) {
        Some(definition) => rows
            .iter()
            .map(|row| jdas_app::normalize_raw_row(row, definition))
            .collect(),
        None => rows,
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("encode JSON output")?;
    println!("{rendered}");
    Ok(())
}

fn write_html(path: &Path, html: &str) -> Result<()> {
    if path == Path::new("-") {
        print!("{html}");
        return Ok(());
    }
    fs::write(path, html).with_context(|| format!("write HTML page {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote HTML page");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    base_url: Option<String>,
    demo: bool,
    grouping: Option<SubtabGrouping>,
    html_path: Option<PathBuf>,
    health: bool,
    metadata: bool,
    tables: bool,
    raw_table: Option<String>,
    legacy: Option<LegacyFeed>,
    print_config_path: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

impl CliOptions {
    fn needs_backend(&self) -> bool {
        self.health
            || self.metadata
            || self.tables
            || self.raw_table.is_some()
            || self.legacy.is_some()
    }

    /// Anything that does not take over the terminal.
    fn is_one_shot(&self) -> bool {
        self.needs_backend() || self.html_path.is_some() || self.check_only
    }
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        base_url: None,
        demo: false,
        grouping: None,
        html_path: None,
        health: false,
        metadata: false,
        tables: false,
        raw_table: None,
        legacy: None,
        print_config_path: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        let mut value_for = |flag: &str, what: &str| -> Result<String> {
            iter.next()
                .map(|value| value.as_ref().to_owned())
                .ok_or_else(|| anyhow!("{flag} requires {what}"))
        };

        match arg.as_ref() {
            "--config" => {
                options.config_path = PathBuf::from(value_for("--config", "a file path")?);
            }
            "--base-url" => {
                options.base_url = Some(value_for("--base-url", "a URL")?);
            }
            "--grouping" => {
                let raw = value_for("--grouping", "table or label")?;
                options.grouping = Some(SubtabGrouping::parse(&raw).ok_or_else(|| {
                    anyhow!("unknown grouping {raw:?}; use table or label")
                })?);
            }
            "--html" => {
                options.html_path = Some(PathBuf::from(value_for("--html", "an output path")?));
            }
            "--raw" => {
                options.raw_table = Some(value_for("--raw", "a table name")?);
            }
            "--legacy" => {
                let raw = value_for("--legacy", "bankruptcies, layoffs, or tariffs")?;
                options.legacy = Some(LegacyFeed::parse(&raw).ok_or_else(|| {
                    anyhow!("unknown legacy feed {raw:?}; use bankruptcies, layoffs, or tariffs")
                })?);
            }
            "--demo" => {
                options.demo = true;
            }
            "--health" => {
                options.health = true;
            }
            "--metadata" => {
                options.metadata = true;
            }
            "--tables" => {
                options.tables = true;
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("jdas: industry updates dashboard");
    println!("  --config <path>          Use a specific config path");
    println!("  --base-url <url>         API base URL (overrides JDAS_API_BASE_URL and [api].base_url)");
    println!("  --demo                   Launch with seeded demo data, no backend");
    println!("  --grouping table|label   Group subtabs by source table or by card title");
    println!("  --html <path>            Load once and write a static HTML page (- for stdout)");
    println!("  --health                 Print the backend health response");
    println!("  --metadata               Print the backend metadata response");
    println!("  --tables                 List raw tables");
    println!("  --raw <table>            Print rows of one raw table");
    println!("  --legacy <feed>          Print a legacy feed: bankruptcies, layoffs, tariffs");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --check                  Validate config and API settings, then exit");
    println!("  --help                   Show this help");
}
