use anyhow::Result;
use crossterm::{
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use std::io;
use tokio::sync::{mpsc, oneshot};
use tokio::time::Duration;

use super::driver::SessionDriver;
use super::http::HistoryClient;
use crate::core::{Config, HistoryView, SessionState, ValidationReport};
use crate::utils::log_capture::{LogEntry, LogLevel};

const MAX_LOG_ENTRIES: usize = 50;
const SPINNER: [&str; 8] = ["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Home,
    History,
}

/// Interactive validation screen: a Home tab that runs sessions and a
/// History tab that browses stored reports
pub struct ValidationTui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    tab: Tab,
    input: String,
    driver: SessionDriver,
    history_client: HistoryClient,
    history: HistoryView,
    history_rx: Option<oneshot::Receiver<Vec<ValidationReport>>>,
    system_logs: Vec<LogEntry>,
    report_scroll: u16,
    spinner_frame: usize,
}

impl ValidationTui {
    pub fn new(config: &Config) -> Result<Self> {
        let history_client = HistoryClient::from_config(config)?;

        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;

        Ok(ValidationTui {
            terminal,
            tab: Tab::Home,
            input: String::new(),
            driver: SessionDriver::new(config),
            history_client,
            history: HistoryView::new(),
            history_rx: None,
            system_logs: Vec::new(),
            report_scroll: 0,
            spinner_frame: 0,
        })
    }

    pub async fn run(&mut self, mut log_rx: mpsc::UnboundedReceiver<LogEntry>) -> Result<()> {
        let result = self.event_loop(&mut log_rx).await;
        self.driver.shutdown().await;
        self.cleanup();
        result
    }

    fn cleanup(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }

    async fn event_loop(&mut self, log_rx: &mut mpsc::UnboundedReceiver<LogEntry>) -> Result<()> {
        let mut event_stream = EventStream::new();
        let mut spinner_interval = tokio::time::interval(Duration::from_millis(120));

        self.draw()?;

        loop {
            tokio::select! {
                biased;

                maybe_event = event_stream.next() => {
                    match maybe_event {
                        Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                            if self.handle_key(key) {
                                tracing::info!("User requested quit");
                                return Ok(());
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::warn!("Event stream error: {:?}", e);
                        }
                        None => {
                            tracing::info!("Event stream terminated");
                            return Ok(());
                        }
                    }
                    self.draw()?;
                }

                Some(message) = self.driver.recv() => {
                    if self.driver.apply(message) {
                        if self.driver.controller().report().is_some() {
                            self.report_scroll = 0;
                        }
                        self.draw()?;
                    }
                }

                reports = wait_history(&mut self.history_rx) => {
                    self.history_rx = None;
                    self.history.load(reports);
                    self.draw()?;
                }

                Some(entry) = log_rx.recv() => {
                    self.system_logs.push(entry);
                    if self.system_logs.len() > MAX_LOG_ENTRIES {
                        self.system_logs.drain(0..(self.system_logs.len() - MAX_LOG_ENTRIES));
                    }
                    self.draw()?;
                }

                _ = spinner_interval.tick() => {
                    let history_pending = self.tab == Tab::History && self.history.is_loading();
                    if self.driver.controller().is_busy() || history_pending {
                        self.spinner_frame = (self.spinner_frame + 1) % SPINNER.len();
                        self.draw()?;
                    }
                }
            }
        }
    }

    /// Returns true when the user asked to quit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true;
        }

        if key.code == KeyCode::Tab || key.code == KeyCode::BackTab {
            let next = match self.tab {
                Tab::Home => Tab::History,
                Tab::History => Tab::Home,
            };
            self.switch_tab(next);
            return false;
        }

        match self.tab {
            Tab::Home => self.handle_home_key(key),
            Tab::History => {
                self.handle_history_key(key);
                false
            }
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> bool {
        let busy = self.driver.controller().is_busy();
        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Enter if !busy => {
                if self.driver.submit(&self.input) {
                    self.report_scroll = 0;
                }
            }
            KeyCode::Char(c) if !busy => self.input.push(c),
            KeyCode::Backspace if !busy => {
                self.input.pop();
            }
            KeyCode::Up => self.report_scroll = self.report_scroll.saturating_sub(1),
            KeyCode::Down => self.report_scroll = self.report_scroll.saturating_add(1),
            KeyCode::PageUp => self.report_scroll = self.report_scroll.saturating_sub(10),
            KeyCode::PageDown => self.report_scroll = self.report_scroll.saturating_add(10),
            _ => {}
        }
        false
    }

    fn handle_history_key(&mut self, key: KeyEvent) {
        if self.history.selected_report().is_some() {
            match key.code {
                KeyCode::Esc | KeyCode::Backspace | KeyCode::Left => {
                    self.history.back();
                    self.report_scroll = 0;
                }
                KeyCode::Up => self.report_scroll = self.report_scroll.saturating_sub(1),
                KeyCode::Down => self.report_scroll = self.report_scroll.saturating_add(1),
                KeyCode::PageUp => self.report_scroll = self.report_scroll.saturating_sub(10),
                KeyCode::PageDown => self.report_scroll = self.report_scroll.saturating_add(10),
                _ => {}
            }
            return;
        }

        match key.code {
            KeyCode::Esc => self.switch_tab(Tab::Home),
            KeyCode::Up | KeyCode::Char('k') => self.history.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.history.move_cursor(1),
            KeyCode::Enter | KeyCode::Right => {
                if self.history.select_cursor().is_some() {
                    self.report_scroll = 0;
                }
            }
            _ => {}
        }
    }

    fn switch_tab(&mut self, tab: Tab) {
        if self.tab == tab {
            return;
        }
        self.tab = tab;
        self.report_scroll = 0;
        if tab == Tab::History {
            self.start_history_fetch();
        }
    }

    /// Each visit to the History tab reads the list afresh
    fn start_history_fetch(&mut self) {
        self.history = HistoryView::new();
        let (tx, rx) = oneshot::channel();
        let client = self.history_client.clone();
        tokio::spawn(async move {
            let _ = tx.send(client.list().await);
        });
        self.history_rx = Some(rx);
    }

    fn draw(&mut self) -> Result<()> {
        let view = View {
            tab: self.tab,
            input: &self.input,
            state: self.driver.state(),
            history: &self.history,
            logs: &self.system_logs,
            report_scroll: self.report_scroll,
            spinner: SPINNER[self.spinner_frame],
        };

        self.terminal.draw(|f| view.render(f))?;
        Ok(())
    }
}

async fn wait_history(rx: &mut Option<oneshot::Receiver<Vec<ValidationReport>>>) -> Vec<ValidationReport> {
    match rx {
        Some(rx) => rx.await.unwrap_or_default(),
        None => std::future::pending().await,
    }
}

/// Borrowed snapshot of everything the screen shows
struct View<'a> {
    tab: Tab,
    input: &'a str,
    state: &'a SessionState,
    history: &'a HistoryView,
    logs: &'a [LogEntry],
    report_scroll: u16,
    spinner: &'static str,
}

impl View<'_> {
    fn render(&self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tabs
                Constraint::Min(8),    // Main content
                Constraint::Length(5), // Logs
                Constraint::Length(1), // Key help
            ])
            .split(f.area());

        let tabs = Tabs::new(vec![" Home ", " History "])
            .select(match self.tab {
                Tab::Home => 0,
                Tab::History => 1,
            })
            .style(Style::default().fg(Color::Gray))
            .highlight_style(
                Style::default()
                    .fg(Color::White)
                    .bg(Color::Blue)
                    .add_modifier(Modifier::BOLD),
            )
            .block(
                Block::default()
                    .title(" Commander Deck Check ")
                    .title_alignment(Alignment::Center)
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Blue)),
            );
        f.render_widget(tabs, chunks[0]);

        match self.tab {
            Tab::Home => self.render_home(f, chunks[1]),
            Tab::History => self.render_history(f, chunks[1]),
        }

        draw_logs(f, chunks[2], self.logs);

        let help = match self.tab {
            Tab::Home => "Enter: Check | Tab: History | ↑/↓: Scroll | Esc/Ctrl+C: Quit",
            Tab::History => "↑/↓: Move | Enter: Open | Esc: Back | Tab: Home | Ctrl+C: Quit",
        };
        let footer = Paragraph::new(help)
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        f.render_widget(footer, chunks[3]);
    }

    fn render_home(&self, f: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Input
                Constraint::Length(2), // Status
                Constraint::Min(3),    // Report
            ])
            .split(area);

        let busy = matches!(
            self.state,
            SessionState::Connecting { .. } | SessionState::Active { .. }
        );
        let input_style = if busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };
        let input_text = if self.input.is_empty() && !busy {
            Span::styled(
                "Enter Moxfield Deck URL or ID",
                Style::default().fg(Color::DarkGray),
            )
        } else {
            Span::styled(format!("{}{}", self.input, if busy { "" } else { "▏" }), input_style)
        };
        let input = Paragraph::new(Line::from(input_text)).block(
            Block::default()
                .title(" 🔍 Deck ")
                .borders(Borders::ALL)
                .border_style(input_style),
        );
        f.render_widget(input, chunks[0]);

        match self.state {
            SessionState::Idle => {}
            SessionState::Connecting { deck, .. } => {
                let line = Line::from(vec![
                    Span::styled(format!("{} ", self.spinner), Style::default().fg(Color::Cyan)),
                    Span::raw(format!("Connecting to validation server for {}...", deck)),
                ]);
                f.render_widget(Paragraph::new(line), chunks[1]);
            }
            SessionState::Active {
                status, progress, ..
            } => match progress {
                Some((done, total)) => {
                    let gauge = Gauge::default()
                        .gauge_style(Style::default().fg(Color::Cyan))
                        .ratio(*done as f64 / *total as f64)
                        .label(format!("{} {} ({}/{})", self.spinner, status, done, total));
                    f.render_widget(gauge, chunks[1]);
                }
                None => {
                    let line = Line::from(vec![
                        Span::styled(format!("{} ", self.spinner), Style::default().fg(Color::Cyan)),
                        Span::raw(status.as_str()),
                    ]);
                    f.render_widget(Paragraph::new(line), chunks[1]);
                }
            },
            SessionState::Settled(_) => {}
            SessionState::Failed(message) => {
                let line = Line::from(Span::styled(
                    format!("⚠ {}", message),
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ));
                f.render_widget(Paragraph::new(line).alignment(Alignment::Center), chunks[1]);
            }
        }

        if let SessionState::Settled(report) = self.state {
            draw_report(f, chunks[2], report, self.report_scroll);
        }
    }

    fn render_history(&self, f: &mut Frame, area: Rect) {
        if let Some(report) = self.history.selected_report() {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(1), Constraint::Min(3)])
                .split(area);
            let back = Paragraph::new("← Back to History (Esc)")
                .style(Style::default().fg(Color::Blue));
            f.render_widget(back, chunks[0]);
            draw_report(f, chunks[1], report, self.report_scroll);
            return;
        }

        let block = Block::default()
            .title(" 🕑 Recent Analyses ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green));

        if self.history.is_loading() {
            let loading = Paragraph::new(format!("{} Loading history...", self.spinner)).block(block);
            f.render_widget(loading, area);
            return;
        }

        let entries = self.history.entries();
        if entries.is_empty() {
            let empty = Paragraph::new("No history found.")
                .style(Style::default().fg(Color::Gray))
                .block(block);
            f.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = entries
            .iter()
            .map(|entry| {
                let (mark, color) = verdict_mark(entry.is_valid());
                ListItem::new(Line::from(vec![
                    Span::styled(format!("{} ", mark), Style::default().fg(color)),
                    Span::styled(
                        entry.name().to_string(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(
                        format!("  by {}", entry.author()),
                        Style::default().fg(Color::Gray),
                    ),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("› ");
        let mut state = ListState::default().with_selected(Some(self.history.cursor()));
        f.render_stateful_widget(list, area, &mut state);
    }
}

fn verdict_mark(is_valid: bool) -> (&'static str, Color) {
    if is_valid {
        ("✔", Color::Green)
    } else {
        ("✘", Color::Red)
    }
}

/// Report card shared by live results and history detail
fn draw_report(f: &mut Frame, area: Rect, report: &ValidationReport, scroll: u16) {
    let (mark, color) = verdict_mark(report.is_valid);
    let block = Block::default()
        .title(Line::from(vec![
            Span::styled(format!(" {} ", mark), Style::default().fg(color)),
            Span::styled(
                format!("{} ", report.name),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("by {} ", report.author), Style::default().fg(Color::Gray)),
        ]))
        .title(
            Line::from(Span::styled(
                format!(" {} ", report.verdict()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ))
            .right_aligned(),
        )
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color));

    let paragraph = Paragraph::new(report_lines(report))
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0));
    f.render_widget(paragraph, area);
}

fn report_lines(report: &ValidationReport) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let sections = report.sections();

    if sections.iter().all(|s| s.informational) {
        lines.push(Line::from(Span::styled(
            "No violations found.",
            Style::default().fg(Color::Green),
        )));
    }

    for section in sections {
        let title_color = if section.informational {
            Color::Cyan
        } else {
            Color::Yellow
        };
        let icon = if section.informational { "ℹ" } else { "⚠" };
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{} {} ({})", icon, section.title, section.entries.len()),
            Style::default().fg(title_color).add_modifier(Modifier::BOLD),
        )));
        for entry in section.entries {
            let mut spans = vec![Span::raw("  • "), Span::raw(entry.subject.as_str())];
            if let Some(category) = &entry.category {
                spans.push(Span::styled(
                    format!(" - {}", category),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            lines.push(Line::from(spans));
        }
    }

    if let Some(cards) = &report.deck_list {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Deck List ({} cards)", report.card_count().unwrap_or(0)),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for card in cards {
            lines.push(Line::from(vec![
                Span::raw(format!("  {:>2}x ", card.quantity)),
                Span::raw(card.card.as_str()),
            ]));
        }
    }

    lines
}

fn draw_logs(f: &mut Frame, area: Rect, logs: &[LogEntry]) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = logs
        .iter()
        .rev()
        .take(visible)
        .rev()
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Error => Color::Red,
                LogLevel::Warn => Color::Yellow,
                LogLevel::Info => Color::Gray,
                LogLevel::Debug | LogLevel::Trace => Color::DarkGray,
            };
            Line::from(vec![
                Span::styled(
                    format!("{} {:<5} ", entry.timestamp.format("%H:%M:%S"), entry.level.as_str()),
                    Style::default().fg(color),
                ),
                Span::raw(entry.message.as_str()),
            ])
        })
        .collect();

    let logs = Paragraph::new(lines).block(
        Block::default()
            .title(" Log ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(logs, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_clean_report_says_no_violations() {
        let report: ValidationReport =
            serde_json::from_value(json!({"is_valid": true, "name": "n", "author": "a"})).unwrap();
        assert_eq!(text(&report_lines(&report)), vec!["No violations found."]);
    }

    #[test]
    fn test_report_lines_list_entries_and_deck() {
        let report: ValidationReport = serde_json::from_value(json!({
            "is_valid": false,
            "name": "n",
            "author": "a",
            "gamechangers": ["Rhystic Study"],
            "deck_list": [{"card": "Sol Ring", "quantity": 1}]
        }))
        .unwrap();

        let rendered = text(&report_lines(&report));
        assert!(rendered.contains(&"⚠ Game Changers (1)".to_string()));
        assert!(rendered.contains(&"  • Rhystic Study - Game Changer".to_string()));
        assert!(rendered.contains(&"Deck List (1 cards)".to_string()));
        assert!(rendered.contains(&"   1x Sol Ring".to_string()));
    }
}
