use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableFocusChange, DisableMouseCapture, EnableFocusChange, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use ladbot_dashboard::api::{ApiClient, HttpTransport};
use ladbot_dashboard::app::{export_view, App};
use ladbot_dashboard::config::{DashboardConfig, Overrides, ThemeChoice};
use ladbot_dashboard::data::RetryCounter;
use ladbot_dashboard::manager::DataManager;
use ladbot_dashboard::events;
use ladbot_dashboard::ui::{self, Theme};

#[derive(Parser, Debug)]
#[command(name = "ladbot-dashboard")]
#[command(about = "Terminal admin dashboard for a Ladbot Discord bot")]
struct Args {
    /// Base URL of the bot's web API
    #[arg(short, long)]
    url: Option<String>,

    /// Path to a config file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Session cookie sent with every request (e.g. "session=abc123")
    #[arg(long)]
    cookie: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Stats refresh interval in seconds
    #[arg(long)]
    stats_interval: Option<u64>,

    /// Analytics refresh interval in seconds
    #[arg(long)]
    analytics_interval: Option<u64>,

    /// Health check interval in seconds
    #[arg(long)]
    health_interval: Option<u64>,

    /// Consecutive failures before the connection is reported unhealthy
    #[arg(long)]
    max_retries: Option<u32>,

    /// Color theme
    #[arg(long, value_enum)]
    theme: Option<ThemeChoice>,

    /// Write logs to this file (filtered by RUST_LOG)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Fetch everything once, export to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.url.clone(),
            session_cookie: self.cookie.clone(),
            timeout_secs: self.timeout,
            stats_interval_secs: self.stats_interval,
            analytics_interval_secs: self.analytics_interval,
            health_interval_secs: self.health_interval,
            max_retries: self.max_retries,
            theme: self.theme,
            log_file: self.log_file.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = DashboardConfig::load(args.config.as_deref())?.apply(args.overrides());
    config.validate()?;

    init_logging(config.log_file.as_deref())?;

    let runtime = tokio::runtime::Runtime::new()?;
    let _guard = runtime.enter();

    let transport = HttpTransport::new(&config.base_url, config.session_cookie.as_deref())?;
    let client = ApiClient::new(Arc::new(transport), config.timeout(), RetryCounter::new());
    let manager = Arc::new(DataManager::new(client, config.polling()));

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return export_once(&runtime, &manager, export_path);
    }

    run_tui(&runtime, manager, &config)
}

/// Send logs to `path`. Without a file, logging stays off so the TUI is not
/// overwritten.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::sync::Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!("Starting ladbot-dashboard...");
    Ok(())
}

/// Fetch every resource once and write the report.
fn export_once(
    runtime: &tokio::runtime::Runtime,
    manager: &Arc<DataManager>,
    export_path: &Path,
) -> Result<()> {
    let report = runtime.block_on(manager.update_all());
    for (resource, err) in report.failures() {
        eprintln!("{} update failed: {}", resource.label(), err);
    }

    export_view(&manager.view(), export_path)?;
    println!("Exported dashboard state to: {}", export_path.display());
    Ok(())
}

/// Run the TUI until the user quits
fn run_tui(
    runtime: &tokio::runtime::Runtime,
    manager: Arc<DataManager>,
    config: &DashboardConfig,
) -> Result<()> {
    // Detect the background before the alternate screen hides it
    let theme = Theme::from_choice(config.theme);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableFocusChange
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableFocusChange
        );
        original_hook(panic);
    }));

    let mut app = App::new(
        manager.clone(),
        runtime.handle().clone(),
        theme,
        config.toast_duration(),
        Instant::now(),
    );
    manager.start();

    let result = run_app(&mut terminal, &mut app);

    app.shutdown();
    tracing::info!("dashboard closed");

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        let now = Instant::now();
        app.process_events(now);

        terminal.draw(|frame| {
            let area = frame.area();

            // Check for minimum terminal size
            if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
                let msg = format!(
                    "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
                    area.width, area.height, MIN_WIDTH, MIN_HEIGHT
                );
                let paragraph = ratatui::widgets::Paragraph::new(msg)
                    .alignment(ratatui::layout::Alignment::Center)
                    .style(ratatui::style::Style::default().fg(ratatui::style::Color::Yellow));
                let top = (area.height / 2).saturating_sub(2);
                let centered = ratatui::layout::Rect::new(0, top, area.width, 5).intersection(area);
                frame.render_widget(paragraph, centered);
                return;
            }

            ui::draw(frame, app, now);
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            events::handle_event(app, event, Instant::now());
        }
    }

    Ok(())
}
