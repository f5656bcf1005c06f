use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Gauge, Paragraph, Sparkline};

use crate::app::App;
use crate::format::{format_bytes, format_rate};

pub fn render_cpu(frame: &mut Frame, area: Rect, app: &App) {
    let Some(snapshot) = &app.snapshot else {
        render_waiting(frame, area, "CPU");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(3), Constraint::Length(6)])
        .split(area);

    let label = if snapshot.cpu.frequency_mhz > 0 {
        format!(
            "{:.1}% @ {} MHz",
            snapshot.cpu.overall_percent, snapshot.cpu.frequency_mhz
        )
    } else {
        format!("{:.1}%", snapshot.cpu.overall_percent)
    };
    let gauge = Gauge::default()
        .block(titled_block("CPU"))
        .gauge_style(Style::default().fg(percent_color(snapshot.cpu.overall_percent)))
        .ratio(gauge_ratio(snapshot.cpu.overall_percent))
        .label(label);
    frame.render_widget(gauge, chunks[0]);

    let lines: Vec<Line> = snapshot
        .cpu
        .per_core_percent
        .iter()
        .enumerate()
        .map(|(i, pct)| {
            Line::from(vec![
                Span::styled(format!(" core {i:>2}  "), Style::default().fg(Color::Gray)),
                bar_span(*pct, 30),
                Span::styled(
                    format!(" {pct:>5.1}%"),
                    Style::default().fg(percent_color(*pct)),
                ),
            ])
        })
        .collect();
    frame.render_widget(
        Paragraph::new(lines).block(titled_block("Per core")),
        chunks[1],
    );

    render_sparkline(frame, chunks[2], "Usage history (%)", &snapshot.cpu.history);
}

pub fn render_memory(frame: &mut Frame, area: Rect, app: &App) {
    let Some(snapshot) = &app.snapshot else {
        render_waiting(frame, area, "Memory");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(6), Constraint::Min(6)])
        .split(area);

    let memory = &snapshot.memory;
    let gauge = Gauge::default()
        .block(titled_block("Memory"))
        .gauge_style(Style::default().fg(percent_color(memory.percent)))
        .ratio(gauge_ratio(memory.percent))
        .label(format!(
            "{} / {} ({:.1}%)",
            format_bytes(memory.used_bytes),
            format_bytes(memory.total_bytes),
            memory.percent
        ));
    frame.render_widget(gauge, chunks[0]);

    let (app_used, cached, available) = memory.breakdown();
    let lines = vec![
        stat_line("In use", format_bytes(app_used)),
        stat_line("Cached", format_bytes(cached)),
        stat_line("Available", format_bytes(available)),
        stat_line("Free", format_bytes(memory.free_bytes)),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(titled_block("Breakdown")),
        chunks[1],
    );

    render_sparkline(frame, chunks[2], "Usage history (%)", &memory.history);
}

pub fn render_disk(frame: &mut Frame, area: Rect, app: &App) {
    let Some(snapshot) = &app.snapshot else {
        render_waiting(frame, area, "Disk");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(4), Constraint::Length(6)])
        .split(area);

    let disk = &snapshot.disk;
    let lines = vec![
        stat_line("Read", format_rate(disk.read_bytes_per_sec)),
        stat_line("Write", format_rate(disk.write_bytes_per_sec)),
    ];
    frame.render_widget(Paragraph::new(lines).block(titled_block("I/O")), chunks[0]);

    let rows: Vec<Line> = if disk.partitions.is_empty() {
        vec![Line::from(Span::styled(
            " no mounted filesystems reported",
            Style::default().fg(Color::DarkGray),
        ))]
    } else {
        disk.partitions
            .iter()
            .map(|p| {
                Line::from(vec![
                    Span::styled(
                        format!(" {:<18}", p.mount_point),
                        Style::default().fg(Color::White),
                    ),
                    bar_span(p.percent, 20),
                    Span::styled(
                        format!(
                            " {:>5.1}%  {} / {}  ({})",
                            p.percent,
                            format_bytes(p.used_bytes),
                            format_bytes(p.total_bytes),
                            p.file_system
                        ),
                        Style::default().fg(Color::Gray),
                    ),
                ])
            })
            .collect()
    };
    frame.render_widget(
        Paragraph::new(rows).block(titled_block("Filesystems")),
        chunks[1],
    );

    render_sparkline(frame, chunks[2], "Throughput history", &disk.history);
}

pub fn render_network(frame: &mut Frame, area: Rect, app: &App) {
    let Some(snapshot) = &app.snapshot else {
        render_waiting(frame, area, "Network");
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(4), Constraint::Length(6)])
        .split(area);

    let network = &snapshot.network;
    let lines = vec![
        stat_line("Sent", format_rate(network.sent_bytes_per_sec)),
        stat_line("Received", format_rate(network.recv_bytes_per_sec)),
    ];
    frame.render_widget(
        Paragraph::new(lines).block(titled_block("Traffic")),
        chunks[0],
    );

    let mut rows: Vec<Line> = Vec::new();
    for interface in &network.interfaces {
        rows.push(Line::from(Span::styled(
            format!(" {}", interface.name),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )));
        for addr in &interface.addresses {
            rows.push(Line::from(vec![
                Span::styled(
                    format!("   {:<5}", addr.kind.label()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(addr.address.clone(), Style::default().fg(Color::Gray)),
            ]));
        }
    }
    if rows.is_empty() {
        rows.push(Line::from(Span::styled(
            " no interfaces reported",
            Style::default().fg(Color::DarkGray),
        )));
    }
    frame.render_widget(
        Paragraph::new(rows).block(titled_block("Interfaces")),
        chunks[1],
    );

    render_sparkline(frame, chunks[2], "Throughput history", &network.history);
}

fn render_waiting(frame: &mut Frame, area: Rect, title: &str) {
    let text = Paragraph::new(Line::from(Span::styled(
        " waiting for the first sample...",
        Style::default().fg(Color::DarkGray),
    )))
    .block(titled_block(title));
    frame.render_widget(text, area);
}

fn render_sparkline(frame: &mut Frame, area: Rect, title: &str, history: &[f64]) {
    let data: Vec<u64> = history.iter().map(|v| v.max(0.0).round() as u64).collect();
    let sparkline = Sparkline::default()
        .block(titled_block(title))
        .style(Style::default().fg(Color::Cyan))
        .data(data);
    frame.render_widget(sparkline, area);
}

fn titled_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Color::White),
        ))
}

fn stat_line(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!(" {label:<10}"), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn bar_span(percent: f32, width: usize) -> Span<'static> {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f32).round() as usize;
    let mut bar = String::with_capacity(width);
    for i in 0..width {
        bar.push(if i < filled { '█' } else { '░' });
    }
    Span::styled(bar, Style::default().fg(percent_color(percent)))
}

fn percent_color(percent: f32) -> Color {
    if percent >= 90.0 {
        Color::Red
    } else if percent >= 70.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

fn gauge_ratio(percent: f32) -> f64 {
    (f64::from(percent) / 100.0).clamp(0.0, 1.0)
}
