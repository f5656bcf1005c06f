use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Paragraph, Tabs};

use crate::app::{App, Tab};
use crate::format::format_bytes;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let identity = &app.identity;
    let mut spans = vec![
        Span::styled(
            " sysdeck ",
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(&identity.host_name, Style::default().fg(Color::White)),
        Span::styled("  |  ", Style::default().fg(Color::DarkGray)),
        Span::styled(&identity.os, Style::default().fg(Color::Gray)),
        Span::styled("  |  ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            core_summary(identity.logical_cpus, identity.physical_cores),
            Style::default().fg(Color::Gray),
        ),
    ];
    if let Some(snapshot) = &app.snapshot {
        spans.push(Span::styled("  |  ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            format!("RAM {}", format_bytes(snapshot.memory.total_bytes)),
            Style::default().fg(Color::Gray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), chunks[0]);

    let titles: Vec<Line> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| Line::from(format!(" {} {} ", i + 1, tab.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .divider(Span::styled("|", Style::default().fg(Color::DarkGray)));
    frame.render_widget(tabs, chunks[1]);
}

fn core_summary(logical: usize, physical: Option<usize>) -> String {
    match physical {
        Some(physical) if physical != logical => {
            format!("{logical} CPUs ({physical} cores)")
        }
        _ => format!("{logical} CPUs"),
    }
}
