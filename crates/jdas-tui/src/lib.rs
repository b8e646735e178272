// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod html;

pub use html::{escape_html, render_page};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use jdas_app::{
    DashboardCommand, DashboardEvent, DashboardState, EMPTY_PLACEHOLDER, ERROR_PLACEHOLDER,
    Industry, LOADING_PLACEHOLDER, PaneContent, PaneView, StatusLevel, SummaryPayload,
    project_pane,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

const TITLE: &str = "industry updates";

/// Where the dashboard gets its data. `spawn_summary_load` must eventually
/// send exactly one `SummaryLoaded` or `SummaryFailed` carrying `token`.
pub trait DashboardRuntime {
    fn load_summary(&mut self) -> Result<SummaryPayload>;

    fn spawn_summary_load(&mut self, token: u64, tx: Sender<InternalEvent>) -> Result<()> {
        let event = match self.load_summary() {
            Ok(payload) => InternalEvent::SummaryLoaded { token, payload },
            Err(error) => InternalEvent::SummaryFailed {
                token,
                error: format!("{error:#}"),
            },
        };
        tx.send(event)
            .map_err(|_| anyhow::anyhow!("summary event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    SummaryLoaded { token: u64, payload: SummaryPayload },
    SummaryFailed { token: u64, error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ViewData {
    help_visible: bool,
}

/// Runs `restore` when dropped, so terminal setup is undone on every exit
/// path including a failed setup step.
struct TerminalGuard<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> Drop for TerminalGuard<F> {
    fn drop(&mut self) {
        (self.restore)();
    }
}

fn restore_terminal() {
    if let Err(error) = disable_raw_mode() {
        tracing::warn!(%error, "disable raw mode");
    }
    if let Err(error) = execute!(io::stdout(), terminal::LeaveAlternateScreen) {
        tracing::warn!(%error, "leave alternate screen");
    }
}

pub fn run_app<R: DashboardRuntime>(state: &mut DashboardState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let _guard = TerminalGuard {
        restore: restore_terminal,
    };
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    request_reload(state, runtime, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    result
}

fn process_internal_events(state: &mut DashboardState, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::SummaryLoaded { token, payload } => {
                state.dispatch(DashboardCommand::LoadSucceeded { token, payload });
            }
            InternalEvent::SummaryFailed { token, error } => {
                tracing::error!(token, %error, "summary load failed");
                state.dispatch(DashboardCommand::LoadFailed {
                    token,
                    message: error,
                });
            }
        }
    }
}

fn request_reload<R: DashboardRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    internal_tx: &Sender<InternalEvent>,
) {
    let token = state
        .dispatch(DashboardCommand::Reload)
        .into_iter()
        .find_map(|event| match event {
            DashboardEvent::LoadRequested { token } => Some(token),
            _ => None,
        })
        .unwrap_or_else(|| state.load_token());

    if let Err(error) = runtime.spawn_summary_load(token, internal_tx.clone()) {
        state.dispatch(DashboardCommand::LoadFailed {
            token,
            message: format!("{error:#}"),
        });
    }
}

/// Applies one key press. Returns true when the app should exit.
fn handle_key_event<R: DashboardRuntime>(
    state: &mut DashboardState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
            view_data.help_visible = false;
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Char('r') => request_reload(state, runtime, internal_tx),
        code => {
            if let Some(command) = command_for_key(code) {
                state.dispatch(command);
            }
        }
    }
    false
}

fn command_for_key(code: KeyCode) -> Option<DashboardCommand> {
    match code {
        KeyCode::Tab | KeyCode::Right | KeyCode::Char('l') => Some(DashboardCommand::NextIndustry),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Char('h') => {
            Some(DashboardCommand::PrevIndustry)
        }
        KeyCode::Char(']') => Some(DashboardCommand::NextSubtab),
        KeyCode::Char('[') => Some(DashboardCommand::PrevSubtab),
        KeyCode::Char('c') => Some(DashboardCommand::ClearStatus),
        KeyCode::Char(digit @ '1'..='9') => {
            let index = digit.to_digit(10)? as usize;
            Industry::ALL
                .get(index.checked_sub(1)?)
                .copied()
                .map(DashboardCommand::SelectIndustry)
        }
        _ => None,
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &DashboardState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let pane = project_pane(state, state.active_industry);
    let accent = accent_color(state.active_industry);

    let tabs = Tabs::new(tab_titles())
        .block(Block::default().title(TITLE).borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(Style::default().fg(accent).add_modifier(Modifier::BOLD))
        .select(state.active_industry.index());
    frame.render_widget(tabs, layout[0]);

    let subtabs = Paragraph::new(subtab_bar_text(&pane))
        .style(Style::default().fg(accent))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(subtabs, layout[1]);

    let body = Paragraph::new(pane_text(&pane))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(state.active_industry.label())
                .border_style(Style::default().fg(accent)),
        );
    frame.render_widget(body, layout[2]);

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(status_color(state.status.level)))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if view_data.help_visible {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_text())
            .block(Block::default().title("keys").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn tab_titles() -> Vec<String> {
    Industry::ALL
        .iter()
        .enumerate()
        .map(|(index, industry)| format!("{} {}", index + 1, industry.label()))
        .collect()
}

fn subtab_bar_text(pane: &PaneView) -> String {
    pane.subtabs
        .iter()
        .map(|subtab| {
            let active = pane
                .active_subtab
                .as_ref()
                .is_some_and(|key| key.matches(subtab.key.as_str()));
            if active {
                format!("[{}]", subtab.label)
            } else {
                subtab.label.clone()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn pane_text(pane: &PaneView) -> String {
    let cards = match &pane.content {
        PaneContent::Loading => return LOADING_PLACEHOLDER.to_owned(),
        PaneContent::Error => return ERROR_PLACEHOLDER.to_owned(),
        PaneContent::Empty => return EMPTY_PLACEHOLDER.to_owned(),
        PaneContent::Cards(cards) => cards,
    };

    let mut blocks = Vec::with_capacity(cards.len());
    for card in cards {
        let mut lines = vec![card.title.clone()];
        let meta = [card.tag.as_str(), card.date.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" · ");
        for line in [
            meta.as_str(),
            card.subtitle.as_str(),
            card.body.as_str(),
            card.details.as_str(),
        ] {
            if !line.is_empty() {
                lines.push(format!("  {line}"));
            }
        }
        blocks.push(lines.join("\n"));
    }
    blocks.join("\n\n")
}

fn status_text(state: &DashboardState) -> String {
    let hints = "tab/→ next | shift+tab/← prev | [ ] subtab | 1-5 | r reload | ? keys | q quit";
    if state.status.message.is_empty() {
        return hints.to_owned();
    }
    format!(
        "{} | {} | {hints}",
        state.status.level.as_str(),
        state.status.message
    )
}

fn help_text() -> String {
    [
        "tab, →, l      next industry",
        "shift+tab, ←, h  previous industry",
        "1-5            jump to industry",
        "] / [          next / previous subtab",
        "r              reload",
        "c              clear status message",
        "q, esc         quit",
    ]
    .join("\n")
}

fn status_color(level: StatusLevel) -> Color {
    match level {
        StatusLevel::Pending => Color::Yellow,
        StatusLevel::Ok => Color::Green,
        StatusLevel::Error => Color::Red,
    }
}

/// `#rrggbb` accent as a terminal color.
fn accent_color(industry: Industry) -> Color {
    let hex = industry.accent().trim_start_matches('#');
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|digits| u8::from_str_radix(digits, 16).ok())
    };
    match (channel(0..2), channel(2..4), channel(4..6)) {
        (Some(r), Some(g), Some(b)) if hex.len() == 6 => Color::Rgb(r, g, b),
        _ => Color::Cyan,
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        DashboardRuntime, InternalEvent, TerminalGuard, ViewData, accent_color, handle_key_event,
        pane_text, process_internal_events, status_text, subtab_bar_text, tab_titles,
    };
    use anyhow::anyhow;
    use std::cell::Cell;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use jdas_app::{
        Block, DashboardCommand, DashboardState, ERROR_PLACEHOLDER, Industry, LoadPhase,
        StatusLevel, SubtabKey, SummaryPayload, project_pane,
    };
    use jdas_testkit::card;
    use ratatui::style::Color;
    use std::collections::VecDeque;
    use std::sync::mpsc;

    #[derive(Debug, Default)]
    struct TestRuntime {
        results: VecDeque<Result<SummaryPayload, String>>,
        load_count: usize,
    }

    impl TestRuntime {
        fn with(results: Vec<Result<SummaryPayload, String>>) -> Self {
            Self {
                results: results.into(),
                load_count: 0,
            }
        }
    }

    impl DashboardRuntime for TestRuntime {
        fn load_summary(&mut self) -> anyhow::Result<SummaryPayload> {
            self.load_count += 1;
            match self.results.pop_front() {
                Some(Ok(payload)) => Ok(payload),
                Some(Err(message)) => Err(anyhow!(message)),
                None => Ok(SummaryPayload::new()),
            }
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn real_estate_summary() -> SummaryPayload {
        SummaryPayload::new().with_block(
            "real_estate",
            Block::ok(vec![
                card("jdas_housingmarketinsight", "Inventory rebounds"),
                card("jdas_marketoutlook", "Rates cool"),
            ]),
        )
    }

    fn run_keys(
        state: &mut DashboardState,
        runtime: &mut TestRuntime,
        keys: &[KeyCode],
    ) -> bool {
        let (tx, rx) = mpsc::channel();
        let mut view_data = ViewData::default();
        let mut quit = false;
        for code in keys {
            quit = handle_key_event(state, runtime, &mut view_data, &tx, key(*code));
            process_internal_events(state, &rx);
            if quit {
                break;
            }
        }
        quit
    }

    #[test]
    fn reload_key_loads_summary_through_runtime() {
        let mut state = DashboardState::default();
        let mut runtime = TestRuntime::with(vec![Ok(real_estate_summary())]);

        assert!(!run_keys(&mut state, &mut runtime, &[KeyCode::Char('r')]));
        assert_eq!(runtime.load_count, 1);
        assert_eq!(state.phase, LoadPhase::Loaded);
        assert_eq!(state.status.level, StatusLevel::Ok);
        assert_eq!(state.status.message, "Loaded 2 updates");
    }

    #[test]
    fn failed_load_shows_error_in_every_pane() {
        let mut state = DashboardState::default();
        let mut runtime = TestRuntime::with(vec![Err("HTTP 500".to_owned())]);

        run_keys(&mut state, &mut runtime, &[KeyCode::Char('r')]);
        assert_eq!(state.phase, LoadPhase::Error);
        assert_eq!(state.last_error.as_deref(), Some("HTTP 500"));
        assert!(status_text(&state).contains("Error loading data"));
        for industry in Industry::ALL {
            assert_eq!(pane_text(&project_pane(&state, industry)), ERROR_PLACEHOLDER);
        }
    }

    #[test]
    fn clear_key_drops_status_message_but_keeps_level() {
        let mut state = DashboardState::default();
        let mut runtime = TestRuntime::with(vec![Err("HTTP 500".to_owned())]);

        run_keys(&mut state, &mut runtime, &[KeyCode::Char('r')]);
        assert!(!state.status.message.is_empty());

        assert!(!run_keys(&mut state, &mut runtime, &[KeyCode::Char('c')]));
        assert!(state.status.message.is_empty());
        assert_eq!(state.status.level, StatusLevel::Error);
        assert_eq!(state.phase, LoadPhase::Error);
    }

    #[test]
    fn terminal_guard_restores_when_setup_fails_midway() {
        let restored = Cell::new(0);
        let setup = || -> anyhow::Result<()> {
            let _guard = TerminalGuard {
                restore: || restored.set(restored.get() + 1),
            };
            Err(anyhow!("enter alternate screen failed"))
        };

        assert!(setup().is_err());
        assert_eq!(restored.get(), 1);
    }

    #[test]
    fn stale_summary_events_are_ignored() {
        let mut state = DashboardState::default();
        state.dispatch(DashboardCommand::Reload);
        let stale = state.load_token();
        state.dispatch(DashboardCommand::Reload);

        let (tx, rx) = mpsc::channel();
        tx.send(InternalEvent::SummaryLoaded {
            token: stale,
            payload: real_estate_summary(),
        })
        .expect("send");
        process_internal_events(&mut state, &rx);
        assert_eq!(state.phase, LoadPhase::Loading);
        assert!(state.summary.is_none());
    }

    #[test]
    fn tab_keys_rotate_industries_with_wraparound() {
        let mut state = DashboardState::default();
        let mut runtime = TestRuntime::default();

        run_keys(&mut state, &mut runtime, &[KeyCode::BackTab]);
        assert_eq!(state.active_industry, Industry::Market);
        run_keys(&mut state, &mut runtime, &[KeyCode::Tab, KeyCode::Right]);
        assert_eq!(state.active_industry, Industry::Automotive);
        run_keys(&mut state, &mut runtime, &[KeyCode::Left]);
        assert_eq!(state.active_industry, Industry::RealEstate);
    }

    #[test]
    fn digit_keys_jump_to_industry() {
        let mut state = DashboardState::default();
        let mut runtime = TestRuntime::default();

        run_keys(&mut state, &mut runtime, &[KeyCode::Char('4')]);
        assert_eq!(state.active_industry, Industry::Ai);
        run_keys(&mut state, &mut runtime, &[KeyCode::Char('9')]);
        assert_eq!(state.active_industry, Industry::Ai);
    }

    #[test]
    fn bracket_keys_cycle_subtabs() {
        let mut state = DashboardState::default();
        let mut runtime = TestRuntime::with(vec![Ok(real_estate_summary())]);
        run_keys(&mut state, &mut runtime, &[KeyCode::Char('r')]);

        let pane = project_pane(&state, Industry::RealEstate);
        assert_eq!(
            subtab_bar_text(&pane),
            "[Housing Market Insight]  Market Outlook"
        );
        assert!(pane_text(&pane).starts_with("Inventory rebounds"));

        run_keys(&mut state, &mut runtime, &[KeyCode::Char(']')]);
        assert_eq!(
            state.active_subtab(Industry::RealEstate),
            Some(&SubtabKey::from("jdas_marketoutlook"))
        );
        let pane = project_pane(&state, Industry::RealEstate);
        assert!(pane_text(&pane).starts_with("Rates cool"));

        run_keys(&mut state, &mut runtime, &[KeyCode::Char('[')]);
        assert_eq!(
            state.active_subtab(Industry::RealEstate),
            Some(&SubtabKey::from("jdas_housingmarketinsight"))
        );
    }

    #[test]
    fn industry_without_records_has_empty_subtab_bar() {
        let mut state = DashboardState::default();
        let mut runtime = TestRuntime::with(vec![Ok(real_estate_summary())]);
        run_keys(&mut state, &mut runtime, &[KeyCode::Char('r'), KeyCode::Char('5')]);

        let pane = project_pane(&state, Industry::Market);
        assert_eq!(subtab_bar_text(&pane), "");
        assert_eq!(pane_text(&pane), "No records found.");
    }

    #[test]
    fn quit_keys_exit_and_help_swallows_them() {
        let mut state = DashboardState::default();
        let mut runtime = TestRuntime::default();

        assert!(run_keys(&mut state, &mut runtime, &[KeyCode::Char('q')]));
        assert!(run_keys(&mut state, &mut runtime, &[KeyCode::Esc]));
        assert!(!run_keys(
            &mut state,
            &mut runtime,
            &[KeyCode::Char('?'), KeyCode::Char('q')]
        ));
    }

    #[test]
    fn tab_titles_are_numbered_in_catalog_order() {
        let titles = tab_titles();
        assert_eq!(titles.len(), Industry::ALL.len());
        assert_eq!(titles[0], "1 Real Estate");
        assert_eq!(titles[4], "5 Market Insight");
    }

    #[test]
    fn accents_parse_as_rgb() {
        assert_eq!(accent_color(Industry::RealEstate), Color::Rgb(0x25, 0x63, 0xeb));
        for industry in Industry::ALL {
            assert!(matches!(accent_color(industry), Color::Rgb(..)));
        }
    }
}
