use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{App, Tab};

pub fn render(frame: &mut Frame, area: Rect, app: &App) {
    let bg_style = Style::default().bg(Color::Black);

    // A transient status message takes priority over the hints.
    if let Some((msg, _)) = &app.status_message {
        let color = if msg.contains("failed") || msg.contains("denied") || msg.contains("not found")
        {
            Color::Red
        } else {
            Color::Green
        };
        let line = Line::from(Span::styled(
            format!(" {msg}"),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line).style(bg_style), area);
        return;
    }

    let mut spans = Vec::new();
    spans.extend(pill_spans("q", "Quit"));
    spans.extend(pill_spans("Tab", "Next"));
    match app.tab {
        Tab::Processes => {
            spans.extend(pill_spans("k", "Kill"));
            spans.extend(pill_spans("r", "Refresh"));
            spans.extend(pill_spans("s", format!("Sort: {}", app.sort.label())));
        }
        Tab::Commands => {
            spans.extend(pill_spans("Enter", "Run"));
        }
        _ => {}
    }
    spans.extend(pill_spans(
        "+/-",
        format!("Every {}s", app.service.sample_interval()),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)).style(bg_style), area);
}

fn pill_spans(key: &str, desc: impl Into<String>) -> Vec<Span<'static>> {
    vec![
        Span::styled(
            format!(" {key} "),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} ", desc.into()),
            Style::default().fg(Color::Gray),
        ),
    ]
}
