pub mod commands;
pub mod header;
pub mod metrics;
pub mod processes;
pub mod statusbar;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::{App, Tab};

pub fn draw(frame: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    header::render(frame, chunks[0], app);

    match app.tab {
        Tab::Cpu => metrics::render_cpu(frame, chunks[1], app),
        Tab::Memory => metrics::render_memory(frame, chunks[1], app),
        Tab::Disk => metrics::render_disk(frame, chunks[1], app),
        Tab::Network => metrics::render_network(frame, chunks[1], app),
        Tab::Processes => processes::render(frame, chunks[1], app),
        Tab::Commands => commands::render(frame, chunks[1], app),
    }

    statusbar::render(frame, chunks[2], app);
}
