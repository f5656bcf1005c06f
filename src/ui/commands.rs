use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap,
};

use crate::app::App;

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(28), Constraint::Min(20)])
        .split(area);

    render_command_list(frame, chunks[0], app);
    render_output(frame, chunks[1], app);
}

fn render_command_list(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = app
        .command_names
        .iter()
        .map(|name| {
            let running = app.command_pending.as_deref() == Some(name.as_str());
            let style = if running {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            let suffix = if running { " *" } else { "" };
            ListItem::new(Line::from(Span::styled(
                format!(" {name}{suffix}"),
                style,
            )))
        })
        .collect();

    let list = List::new(items)
        .block(bordered(" Commands "))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.command_names.is_empty() {
        state.select(Some(
            app.selected_command.min(app.command_names.len() - 1),
        ));
    }
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_output(frame: &mut Frame, area: Rect, app: &App) {
    let (title, text, color) = match (&app.command_pending, &app.command_output) {
        (Some(name), _) => (
            format!(" {name} "),
            "running...".to_string(),
            Color::Yellow,
        ),
        (None, Some(result)) => {
            let color = if result.success {
                Color::Green
            } else {
                Color::Red
            };
            (format!(" {} ", result.command), result.output.clone(), color)
        }
        (None, None) => (
            " Output ".to_string(),
            "Select a command and press Enter to run it.".to_string(),
            Color::DarkGray,
        ),
    };

    let lines: Vec<Line> = text
        .lines()
        .map(|line| Line::from(Span::styled(line.to_string(), Style::default().fg(color))))
        .collect();
    let paragraph = Paragraph::new(lines)
        .block(bordered(&title))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn bordered(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title.to_string(),
            Style::default().fg(Color::White),
        ))
}
