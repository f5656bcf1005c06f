use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, BorderType, Borders, Row, Table, TableState};

use crate::app::App;
use crate::format::{format_bytes, truncate_unicode};

const NAME_WIDTH: usize = 32;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(
                " Processes ({}) - sorted by {} ",
                app.processes.len(),
                app.sort.label()
            ),
            Style::default().fg(Color::White),
        ));

    let header = Row::new(["PID", "Name", "CPU%", "Mem%", "Memory", "Status"])
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .bottom_margin(1);

    let rows: Vec<Row> = app
        .processes
        .iter()
        .map(|p| {
            Row::new([
                p.pid.to_string(),
                truncate_unicode(&p.name, NAME_WIDTH),
                format!("{:.1}", p.cpu_percent),
                format!("{:.1}", p.memory_percent),
                format_bytes(p.memory_bytes),
                p.status.clone(),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Min(NAME_WIDTH as u16),
            Constraint::Length(7),
            Constraint::Length(7),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("> ");

    let mut state = TableState::default();
    if !app.processes.is_empty() {
        state.select(Some(app.selected_process.min(app.processes.len() - 1)));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
