use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout},
    Terminal,
};
use tracing::info;

use imgproxy_doctor::app::{self, App, View};
use imgproxy_doctor::logging::{init_logging, LogTarget};
use imgproxy_doctor::ui::{self, Theme};
use imgproxy_doctor::{events, DataSource, FileSource, MetricsFeed, Sampler, Settings};

#[derive(Parser, Debug)]
#[command(name = "imgproxy-doctor")]
#[command(about = "Diagnostic TUI for an image proxy's metrics and moderation reports")]
struct Args {
    /// Proxy endpoint (e.g., "http://localhost:8081")
    #[arg(short = 'u', long, conflicts_with = "file")]
    endpoint: Option<String>,

    /// Read a saved metrics scrape instead of polling a proxy
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Saved report listing (only used with --file)
    #[arg(long, requires = "file")]
    reports: Option<PathBuf>,

    /// Poll interval in milliseconds
    #[arg(short, long)]
    interval: Option<u64>,

    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Export current state to JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,
}

impl Args {
    /// Command-line flags take precedence over every other source.
    fn apply(&self, settings: &mut Settings) {
        if let Some(ref endpoint) = self.endpoint {
            settings.endpoint = endpoint.clone();
        }
        if let Some(interval) = self.interval {
            settings.poll_interval_ms = interval;
        }
        if let Some(ref log_file) = self.log_file {
            settings.log_file = Some(log_file.clone());
        }
    }

    fn source(&self, settings: &Settings) -> Result<Arc<dyn DataSource>> {
        let Some(ref path) = self.file else {
            return Ok(Arc::new(settings.http_source()?));
        };

        let mut source = FileSource::new(path);
        if let Some(ref reports) = self.reports {
            source = source.with_reports(reports);
        }
        Ok(Arc::new(source))
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref()).context("Failed to load settings")?;
    args.apply(&mut settings);
    settings.validate()?;

    // The TUI owns the terminal, so only export mode may log to stderr
    let log_target = match (&args.export, &settings.log_file) {
        (Some(_), _) => LogTarget::Stderr,
        (None, Some(path)) => LogTarget::File(path.clone()),
        (None, None) => LogTarget::Disabled,
    };
    init_logging(&settings.log_filter, &log_target);

    let source = args.source(&settings)?;
    let rt = tokio::runtime::Runtime::new()?;

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return rt.block_on(export_to_file(source, &settings, export_path));
    }

    let guard = rt.enter();
    let (handle, feed) = Sampler::spawn(source, settings.sampler_config());
    drop(guard);

    let result = run_tui(feed, &settings);

    // Signal shutdown
    handle.shutdown();
    rt.block_on(handle.join());

    result
}

/// Run the TUI on the given feed
fn run_tui(feed: MetricsFeed, settings: &Settings) -> Result<()> {
    // Detect the theme before raw mode, the query reads from the terminal
    let theme = Theme::auto_detect();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(panic);
    }));

    let mut app = App::new(feed, settings.gateway.clone(), theme);
    app.reload_data();

    // Run the main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    // Minimum terminal size for usable display
    const MIN_WIDTH: u16 = 60;
    const MIN_HEIGHT: u16 = 12;

    while app.running {
        // Draw UI
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
                let centered = ratatui::layout::Rect::new(0, top, area.width, 5.min(area.height));
                frame.render_widget(paragraph, centered);
                return;
            }

            let chunks = Layout::vertical([
                Constraint::Length(1), // Header bar
                Constraint::Length(1), // Tabs
                Constraint::Min(8),    // Content
                Constraint::Length(1), // Status bar
            ])
            .split(area);

            ui::common::render_header(frame, app, chunks[0]);
            ui::common::render_tabs(frame, app, chunks[1]);

            // Render current view
            match app.current_view {
                View::Metrics => ui::metrics::render(frame, app, chunks[2]),
                View::Reports => ui::reports::render_reports(frame, app, chunks[2]),
                View::Moderation => ui::reports::render_moderation(frame, app, chunks[2]),
                View::Info => ui::info::render(frame, app, chunks[2]),
            }

            ui::common::render_status_bar(frame, app, chunks[3]);

            // Render help overlay if active
            if app.show_help {
                ui::common::render_help(frame, app, area);
            }
        })?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Mouse(mouse) => events::handle_mouse_event(app, mouse),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // The feed is non-blocking, so take new data on every frame
        app.reload_data();
    }

    Ok(())
}

/// Run one poll and the mount fetches, then write the state as JSON
async fn export_to_file(
    source: Arc<dyn DataSource>,
    settings: &Settings,
    export_path: &Path,
) -> Result<()> {
    let (handle, mut feed) = Sampler::spawn(source, settings.sampler_config());

    let metrics = feed
        .next_metrics()
        .await
        .context("Sampler stopped before the first poll")?;
    let reports = feed.settled_reports().await.unwrap_or_default();
    let documents = feed.settled_documents().await.unwrap_or_default();
    let info = feed.settled_info().await.unwrap_or_default();

    handle.shutdown();
    handle.join().await;

    let export = app::export_snapshot(
        feed.description(),
        &metrics,
        &reports,
        &documents,
        &info,
        app::now_ms(),
    );
    app::write_export(&export, export_path)?;

    info!("Exported proxy state to {}", export_path.display());
    println!("Exported proxy state to: {}", export_path.display());
    Ok(())
}
