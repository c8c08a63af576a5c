use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const KEYS: &[(&str, &str)] = &[
    ("q / Ctrl-C", "Quit"),
    ("↑/↓ or j/k", "Select server"),
    ("p", "Ping selected server"),
    ("f", "Cycle status filter (ALL / UP / DOWN)"),
    ("n", "Add a server"),
    ("d", "Delete selected server"),
    ("r", "Reload server list"),
    ("x", "Export report (XLS)"),
    ("c", "Export report (CSV)"),
    ("e", "Export report (--export-format)"),
    ("y", "Copy exported path to clipboard"),
    ("tab", "Switch tabs"),
    ("?", "Show this help"),
];

fn key_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{key:<12}"), Style::default().fg(Color::Magenta)),
        Span::raw(desc),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame, base_url: &str) {
    let mut lines = vec![Line::from("Keybinds:")];
    lines.extend(KEYS.iter().map(|(k, d)| key_line(k, d)));
    lines.extend([
        Line::from(""),
        Line::from("Add server dialog:"),
        key_line("tab / ↓", "Next field"),
        key_line("shift-tab / ↑", "Previous field"),
        key_line("space", "Toggle status (on the status field)"),
        key_line("enter", "Save"),
        key_line("esc", "Cancel"),
        Line::from(""),
        Line::from(vec![
            Span::raw("API: "),
            Span::styled(base_url.to_string(), Style::default().fg(Color::Cyan)),
        ]),
    ]);

    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(p, area);
}
