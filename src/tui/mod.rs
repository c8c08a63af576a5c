mod export;
mod form;
mod help;
mod state;

use crate::api::{HttpServerApi, ServerApi};
use crate::cli::Cli;
use crate::model::{Phase, ServerStatus};
use crate::orchestrator::{self, DashboardStore, DashboardView, UiCommand};
use crate::report::ReportFormat;
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Tabs},
    Terminal,
};
use state::UiState;
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc::{self, UnboundedSender};

const TABS: [&str; 2] = ["Dashboard", "Help"];
// Rows lost to borders, header and info line around the server table
const TABLE_CHROME: u16 = 3 + 3 + 3 + 3;

pub async fn run(args: Cli) -> Result<()> {
    let config = crate::cli::build_config(&args);
    let api: Arc<dyn ServerApi> = Arc::new(HttpServerApi::new(&config)?);
    let (store, view) = DashboardStore::new();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, view, cmd_tx));

    let res = orchestrator::run_controller(api, store, cmd_rx, true).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    mut view: DashboardView,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let mut state = UiState {
        base_url: crate::cli::build_config(&args).base_url,
        report_dir: args
            .report_dir
            .clone()
            .unwrap_or_else(crate::report::default_report_dir),
        export_format: args.export_format,
        pending_filter: Some(args.filter).filter(|f| *f != crate::model::StatusFilter::All),
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        if let Some(filter) = state.sync(&mut view) {
            let _ = cmd_tx.send(UiCommand::Filter(filter));
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                let visible_rows = terminal
                    .size()
                    .map(|s| s.height.saturating_sub(TABLE_CHROME) as usize)
                    .unwrap_or(10);
                if handle_key(&mut state, k, &cmd_tx, visible_rows) == KeyOutcome::Quit {
                    break Ok(());
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

#[derive(Debug, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

fn handle_key(
    state: &mut UiState,
    k: KeyEvent,
    cmd_tx: &UnboundedSender<UiCommand>,
    visible_rows: usize,
) -> KeyOutcome {
    if let (KeyModifiers::CONTROL, KeyCode::Char('c')) = (k.modifiers, k.code) {
        let _ = cmd_tx.send(UiCommand::Quit);
        return KeyOutcome::Quit;
    }
    if state.form_open {
        handle_form_key(state, k, cmd_tx);
        return KeyOutcome::Continue;
    }

    match k.code {
        KeyCode::Char('q') => {
            let _ = cmd_tx.send(UiCommand::Quit);
            return KeyOutcome::Quit;
        }
        KeyCode::Tab => state.tab = (state.tab + 1) % TABS.len(),
        KeyCode::Char('?') => state.tab = 1,
        KeyCode::Up | KeyCode::Char('k') => state.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => state.select_next(visible_rows),
        KeyCode::Char('r') => {
            let _ = cmd_tx.send(UiCommand::Reload);
        }
        KeyCode::Char('f') => {
            let _ = cmd_tx.send(UiCommand::Filter(state.selected_status.next()));
        }
        KeyCode::Char('p') => match state.selected_server() {
            Some(s) if state.pinging.is_none() => {
                let _ = cmd_tx.send(UiCommand::Ping(s.ip_address.clone()));
            }
            Some(_) => state.set_info("A ping is already in progress"),
            None => state.set_info("No server selected"),
        },
        KeyCode::Char('d') => match state.selected_server() {
            Some(s) => {
                let _ = cmd_tx.send(UiCommand::Delete(s.clone()));
            }
            None => state.set_info("No server selected"),
        },
        KeyCode::Char('n') => {
            state.form_open = true;
            state.tab = 0;
        }
        KeyCode::Char('x') => export::export_and_show_path(state, ReportFormat::Xls),
        KeyCode::Char('c') => export::export_and_show_path(state, ReportFormat::Csv),
        KeyCode::Char('e') => export::export_and_show_path(state, state.export_format),
        KeyCode::Char('y') => match state.last_exported_path.clone() {
            Some(path) => match export::copy_to_clipboard(&path) {
                Ok(()) => state.set_info(format!("Copied to clipboard: {path}")),
                Err(e) => state.set_error(format!("Clipboard failed: {e:#}")),
            },
            None => state.set_info("Nothing exported yet (press 'x' or 'c')"),
        },
        _ => {}
    }
    KeyOutcome::Continue
}

fn handle_form_key(state: &mut UiState, k: KeyEvent, cmd_tx: &UnboundedSender<UiCommand>) {
    match k.code {
        KeyCode::Esc => state.form_open = false,
        KeyCode::Tab | KeyCode::Down => state.form.next_field(),
        KeyCode::BackTab | KeyCode::Up => state.form.prev_field(),
        KeyCode::Left | KeyCode::Right => state.form.toggle_status(),
        KeyCode::Backspace => state.form.backspace(),
        KeyCode::Enter => {
            if state.loading {
                return;
            }
            match state.form.to_record() {
                Ok(record) => {
                    let _ = cmd_tx.send(UiCommand::Save(record));
                }
                Err(msg) => state.set_error(msg),
            }
        }
        KeyCode::Char(c) => state.form.input(c),
        _ => {}
    }
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(TABS.iter().map(|t| Line::from(*t)).collect::<Vec<_>>())
        .select(state.tab)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("server-status-cli"),
        )
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_dashboard(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f, &state.base_url),
    }

    if state.form_open {
        form::draw_form(area, f, &state.form, state.loading);
    }
}

fn status_color(status: ServerStatus) -> Color {
    match status {
        ServerStatus::Up => Color::Green,
        ServerStatus::Down => Color::Red,
    }
}

fn draw_dashboard(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),
                Constraint::Min(3),
                Constraint::Length(3),
            ]
            .as_ref(),
        )
        .split(area);

    let (phase_text, phase_color) = match state.view.phase {
        Phase::Loading => ("loading", Color::Yellow),
        Phase::Loaded => ("loaded", Color::Green),
        Phase::Error => ("error", Color::Red),
    };
    let header = Paragraph::new(Line::from(vec![
        Span::raw("Filter: "),
        Span::styled(
            state.selected_status.label(),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!("   Servers: {}", state.rows().len())),
        Span::raw("   State: "),
        Span::styled(phase_text, Style::default().fg(phase_color)),
        Span::raw(if state.loading { " (saving…)" } else { "" }),
        Span::raw("   API: "),
        Span::styled(state.base_url.as_str(), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(header, chunks[0]);

    match state.view.phase {
        Phase::Loading => {
            let p = Paragraph::new("Loading servers…")
                .block(Block::default().borders(Borders::ALL).title("Servers"));
            f.render_widget(p, chunks[1]);
        }
        Phase::Error => {
            let msg = state.view.error.as_deref().unwrap_or("Unknown error");
            let p = Paragraph::new(vec![
                Line::from(Span::styled(msg, Style::default().fg(Color::Red))),
                Line::from(""),
                Line::from("Press 'r' to retry."),
            ])
            .block(Block::default().borders(Borders::ALL).title("Servers"));
            f.render_widget(p, chunks[1]);
        }
        Phase::Loaded => draw_server_table(chunks[1], f, state),
    }

    let info_style = if state.info_is_error {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::Gray)
    };
    let info = Paragraph::new(Span::styled(state.info.as_str(), info_style))
        .block(Block::default().borders(Borders::ALL).title("Info"));
    f.render_widget(info, chunks[2]);
}

fn draw_server_table(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows_visible = area.height.saturating_sub(3) as usize;
    let rows = state
        .rows()
        .iter()
        .enumerate()
        .skip(state.scroll_offset)
        .take(rows_visible.max(1))
        .map(|(i, s)| {
            let pinging = state.pinging.as_deref() == Some(s.ip_address.as_str());
            let status_cell = if pinging {
                Cell::from("pinging…").style(Style::default().fg(Color::Yellow))
            } else {
                Cell::from(s.status.label()).style(Style::default().fg(status_color(s.status)))
            };
            let row = Row::new(vec![
                Cell::from(s.ip_address.clone()),
                Cell::from(s.name.clone()),
                Cell::from(s.memory.clone()),
                Cell::from(s.server_type.clone()),
                status_cell,
            ]);
            if i == state.selected {
                row.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                row
            }
        })
        .collect::<Vec<_>>();

    let title = match state.rows().len() {
        0 => "Servers (none)".to_string(),
        n => format!("Servers ({}/{n})", state.selected + 1),
    };
    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Percentage(30),
            Constraint::Length(10),
            Constraint::Length(14),
            Constraint::Length(12),
        ],
    )
    .header(
        Row::new(vec!["IP Address", "Name", "Memory", "Type", "Status"])
            .style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, area);
}
