use std::collections::VecDeque;
use std::time::Instant;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table};

use crate::events::ServerEvent;
use crate::server::ServerStatus;

const MAX_LOG_LINES: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn color(&self) -> Color {
        match self {
            LogLevel::Info => Color::White,
            LogLevel::Warn => Color::Yellow,
            LogLevel::Error => Color::Red,
        }
    }
}

pub struct TuiState {
    started: Instant,
    logs: VecDeque<(LogLevel, String)>,
    /// Lines scrolled up from the newest entry.
    scroll: usize,
}

impl TuiState {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
            logs: VecDeque::with_capacity(MAX_LOG_LINES),
            scroll: 0,
        }
    }

    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        if self.logs.len() >= MAX_LOG_LINES {
            self.logs.pop_front();
        }
        self.logs.push_back((level, message.into()));
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn push_event(&mut self, event: &ServerEvent) {
        let level = if event.is_error() {
            LogLevel::Error
        } else if event.is_warning() {
            LogLevel::Warn
        } else {
            LogLevel::Info
        };
        self.log(level, event.describe());
    }

    pub fn scroll_up(&mut self) {
        self.scroll = (self.scroll + 5).min(self.logs.len().saturating_sub(1));
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_sub(5);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = 0;
    }

    fn visible_logs(&self, height: usize) -> impl Iterator<Item = &(LogLevel, String)> {
        let end = self.logs.len().saturating_sub(self.scroll);
        let start = end.saturating_sub(height);
        self.logs.range(start..end)
    }
}

pub fn render(frame: &mut Frame, state: &TuiState, status: &ServerStatus) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(12),
            Constraint::Length(3),
        ])
        .split(frame.area());

    render_header(frame, chunks[0], state, status);
    render_clients(frame, chunks[1], status);
    render_entities(frame, chunks[2], status);
    render_log(frame, chunks[3], state);
    render_help(frame, chunks[4]);
}

fn render_header(frame: &mut Frame, area: Rect, state: &TuiState, status: &ServerStatus) {
    let title = format!(
        " Frogpile Server - Uptime: {} ",
        format_duration(state.started.elapsed().as_secs())
    );

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let net = &status.network;
    let text = format!(
        "Tick: {}  |  Entities: {}  |  Camera: ({:.0}, {:.0})  |  Sent: {} ({})  |  Recv: {} ({})  |  Malformed: {}  |  Dropped batches: {}  |  Dropped events: {}",
        status.tick,
        status.entities.len(),
        status.camera_focus[0],
        status.camera_focus[1],
        net.packets_sent,
        format_bytes(net.bytes_sent),
        net.packets_received,
        format_bytes(net.bytes_received),
        net.malformed_packets,
        net.dropped_batches,
        status.dropped_events,
    );

    let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(paragraph, area);
}

fn render_clients(frame: &mut Frame, area: Rect, status: &ServerStatus) {
    let ratio = if status.max_clients == 0 {
        0.0
    } else {
        status.client_count as f64 / status.max_clients as f64
    };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Clients "))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(ratio.min(1.0))
        .label(format!("{}/{}", status.client_count, status.max_clients));

    frame.render_widget(gauge, area);
}

fn render_entities(frame: &mut Frame, area: Rect, status: &ServerStatus) {
    let header = Row::new(["Id", "Color", "State", "Position", "Partner"])
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));

    let rows = status.entities.iter().map(|entity| {
        Row::new([
            Cell::from(entity.id.to_string()),
            Cell::from(entity.color.clone()),
            Cell::from(entity.state),
            Cell::from(format!(
                "({:.0}, {:.0})",
                entity.position[0], entity.position[1]
            )),
            Cell::from(entity.partner.map_or_else(|| "-".to_string(), |id| id.to_string())),
        ])
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .title(" Entities ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );

    frame.render_widget(table, area);
}

fn render_log(frame: &mut Frame, area: Rect, state: &TuiState) {
    let height = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = state
        .visible_logs(height)
        .map(|(level, message)| {
            Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(level.color()),
            ))
        })
        .collect();

    let title = if state.scroll > 0 {
        format!(" Log (+{}) ", state.scroll)
    } else {
        " Log ".to_string()
    };

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(" Controls ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let text = Paragraph::new("q/Esc quit  |  PgUp/PgDn scroll log  |  End latest")
        .block(block)
        .style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        );

    frame.render_widget(text, area);
}

fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;
    format!("{:02}:{:02}:{:02}", hours, mins, secs)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_bounded() {
        let mut state = TuiState::new();
        for i in 0..MAX_LOG_LINES + 10 {
            state.log_info(format!("line {}", i));
        }

        assert_eq!(state.logs.len(), MAX_LOG_LINES);
        assert_eq!(state.logs.front().unwrap().1, "line 10");
    }

    #[test]
    fn scrolling_shifts_the_window() {
        let mut state = TuiState::new();
        for i in 0..20 {
            state.log_info(format!("line {}", i));
        }

        let newest: Vec<_> = state.visible_logs(3).map(|(_, m)| m.clone()).collect();
        assert_eq!(newest, ["line 17", "line 18", "line 19"]);

        state.scroll_up();
        let older: Vec<_> = state.visible_logs(3).map(|(_, m)| m.clone()).collect();
        assert_eq!(older, ["line 12", "line 13", "line 14"]);
    }

    #[test]
    fn formats() {
        assert_eq!(format_duration(3725), "01:02:05");
        assert_eq!(format_bytes(2048), "2.0KB");
    }
}
