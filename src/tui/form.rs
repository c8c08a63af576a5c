//! New-server dialog.

use crate::model::{ServerRecord, ServerStatus};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub const FIELD_LABELS: [&str; 5] = ["IP address", "Name", "Memory", "Type", "Image URL"];
const STATUS_FIELD: usize = FIELD_LABELS.len();

pub struct ServerForm {
    pub fields: [String; 5],
    pub status: ServerStatus,
    pub focus: usize,
}

impl Default for ServerForm {
    fn default() -> Self {
        Self {
            fields: Default::default(),
            status: ServerStatus::Down,
            focus: 0,
        }
    }
}

impl ServerForm {
    pub fn reset(&mut self, status: ServerStatus) {
        *self = Self {
            status,
            ..Default::default()
        };
    }

    pub fn next_field(&mut self) {
        self.focus = (self.focus + 1) % (STATUS_FIELD + 1);
    }

    pub fn prev_field(&mut self) {
        self.focus = (self.focus + STATUS_FIELD) % (STATUS_FIELD + 1);
    }

    pub fn input(&mut self, c: char) {
        if self.focus == STATUS_FIELD {
            if c == ' ' {
                self.status = self.status.toggled();
            }
            return;
        }
        self.fields[self.focus].push(c);
    }

    pub fn backspace(&mut self) {
        if self.focus < STATUS_FIELD {
            self.fields[self.focus].pop();
        }
    }

    pub fn toggle_status(&mut self) {
        if self.focus == STATUS_FIELD {
            self.status = self.status.toggled();
        }
    }

    /// Build the record to save. IP address, name, memory and type are required.
    pub fn to_record(&self) -> Result<ServerRecord, String> {
        let [ip, name, memory, server_type, image_url] =
            self.fields.clone().map(|f| f.trim().to_string());
        for (label, value) in FIELD_LABELS.iter().zip([&ip, &name, &memory, &server_type]) {
            if value.is_empty() {
                return Err(format!("{label} is required"));
            }
        }
        Ok(ServerRecord {
            id: None,
            ip_address: ip,
            name,
            memory,
            server_type,
            image_url,
            status: self.status,
        })
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    Rect {
        x: area.x + (area.width - w) / 2,
        y: area.y + (area.height - h) / 2,
        width: w,
        height: h,
    }
}

pub fn draw_form(area: Rect, f: &mut Frame, form: &ServerForm, saving: bool) {
    let popup = centered(area, 60, (STATUS_FIELD as u16) + 6);
    f.render_widget(Clear, popup);

    let mut lines: Vec<Line> = FIELD_LABELS
        .iter()
        .zip(form.fields.iter())
        .enumerate()
        .map(|(i, (label, value))| {
            let focused = i == form.focus;
            let style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Line::from(vec![
                Span::styled(format!("{label:>11}: "), style),
                Span::raw(value.clone()),
                Span::raw(if focused { "▏" } else { "" }),
            ])
        })
        .collect();

    let status_style = if form.focus == STATUS_FIELD {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let status_color = match form.status {
        ServerStatus::Up => Color::Green,
        ServerStatus::Down => Color::Red,
    };
    lines.push(Line::from(vec![
        Span::styled(format!("{:>11}: ", "Status"), status_style),
        Span::styled(form.status.label(), Style::default().fg(status_color)),
        Span::raw("  (space to toggle)"),
    ]));
    lines.push(Line::from(""));
    lines.push(Line::from(if saving {
        Span::styled("Saving…", Style::default().fg(Color::Yellow))
    } else {
        Span::styled(
            "enter save · tab next field · esc cancel",
            Style::default().fg(Color::DarkGray),
        )
    }));

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title("Add Server")
            .border_style(Style::default().fg(Color::Magenta)),
    );
    f.render_widget(p, popup);
}
