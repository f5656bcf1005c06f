use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use crossterm::event::KeyEventKind;

use sysdeck::app::App;
use sysdeck::config::{self, load_config, load_config_from_path};
use sysdeck::event::{Event, EventHandler};
use sysdeck::monitor::service::{MAX_INTERVAL_SECS, MonitorOptions, MonitorService};
use sysdeck::ui;

#[derive(Parser)]
#[command(name = "sysdeck", about = "Terminal dashboard for host resources")]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Sampling interval in seconds
    #[arg(long)]
    interval: Option<f64>,

    /// Number of samples kept per metric history
    #[arg(long)]
    history_length: Option<usize>,

    /// Maximum rows in the process listing
    #[arg(long)]
    process_limit: Option<usize>,

    /// Append structured logs to this file (the terminal stays clean)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }
    let config = load_config_for_cli(&cli);

    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let result = run(&mut terminal, config).await;

    ratatui::restore();

    result
}

async fn run(terminal: &mut ratatui::DefaultTerminal, config: config::Config) -> Result<()> {
    // A config file can carry anything; clamp into the supported range
    // instead of letting a bad value abort startup.
    let interval_secs = if config.general.sample_interval_secs.is_finite() {
        config.general.sample_interval_secs.clamp(0.1, MAX_INTERVAL_SECS)
    } else {
        1.0
    };
    let options = MonitorOptions {
        interval: Duration::from_secs_f64(interval_secs),
        history_length: config.general.history_length,
        process_limit: config.general.process_limit,
    };
    let mut service = MonitorService::with_system(options);
    service.start()?;

    let mut app = App::new(&config, service);
    let mut events = EventHandler::new(Duration::from_millis(config.general.poll_rate_ms));

    terminal.draw(|frame| ui::draw(frame, &mut app))?;

    while app.running {
        if let Some(event) = events.next().await {
            match event {
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Press {
                        let action = app.map_key(key);
                        app.dispatch(action);
                    }
                }
                Event::Poll => app.on_poll(),
                Event::Resize => {}
            }
            terminal.draw(|frame| ui::draw(frame, &mut app))?;
        }
    }

    app.shutdown();
    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> config::Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(interval) = cli.interval {
        config.general.sample_interval_secs = interval;
    }
    if let Some(length) = cli.history_length {
        config.general.history_length = length;
    }
    if let Some(limit) = cli.process_limit {
        config.general.process_limit = limit;
    }

    config
}

fn init_logging(path: &Path) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing_subscriber::fmt()
        .with_writer(move || file.try_clone().expect("log file handle clones"))
        .with_ansi(false)
        .init();
    Ok(())
}
