use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame,
};

use super::app::App;
use crate::models::{Priority, Status};
use crate::suggest::humanize;

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Table
            Constraint::Length(4), // Why
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|r| {
            let t = &r.task;
            let time_left = match t.deadline {
                None => "-".to_string(),
                Some(d) if d <= app.now => format!("{} overdue", humanize(app.now - d)),
                Some(d) => humanize(d - app.now),
            };
            let style = match (t.status, t.priority) {
                (Status::Completed, _) => Style::default().fg(Color::DarkGray),
                (_, Priority::Critical) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                (_, Priority::High) => Style::default().fg(Color::Red),
                (_, Priority::Medium) => Style::default().fg(Color::Yellow),
                (_, Priority::Low) => Style::default().fg(Color::Blue),
            };

            Row::new(vec![
                Cell::from(t.title.clone()),
                Cell::from(t.deadline_label()),
                Cell::from(time_left),
                Cell::from(t.priority.to_string()),
                Cell::from(format!("{} {}", t.mood.icon(), t.mood)),
                Cell::from(t.status.to_string()),
                Cell::from(r.score.map(|s| format!("{:.1}", s)).unwrap_or_else(|| "-".into())),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(17),
        Constraint::Length(12),
        Constraint::Length(9),
        Constraint::Length(14),
        Constraint::Length(12),
        Constraint::Length(6),
    ];

    let title = format!("Smart Todo - feeling {} {}", app.mood, app.mood.icon());
    let table = Table::new(rows, widths)
        .header(
            Row::new(vec!["Title", "Deadline", "Time Left", "Priority", "Mood", "Status", "Score"])
                .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .bottom_margin(1),
        )
        .block(Block::default().borders(Borders::ALL).title(title))
        .row_highlight_style(Style::default().add_modifier(Modifier::BOLD).bg(Color::DarkGray))
        .highlight_symbol(">> ");

    f.render_stateful_widget(table, chunks[0], &mut app.state);

    let why = app
        .selected()
        .map(|r| r.rationale.clone())
        .unwrap_or_else(|| "No open tasks. Add one with `todo add`.".to_string());
    let why = Paragraph::new(why)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Why"));
    f.render_widget(why, chunks[1]);

    let help_text = match &app.message {
        Some(m) => format!("{}  |  q: Quit", m),
        None => "q: Quit | j/k: Move | m: Mood | s: Advance status | Space: Done | c: Toggle Done".to_string(),
    };
    let help = Paragraph::new(help_text)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[2]);
}
