//! rivalscope - Competitor Intelligence Monitor
//!
//! Terminal UI over a competitor-intelligence backend: watchlist, signals
//! and alerts, tear-sheets, weekly reports, and a crawl-activity dashboard.

mod app;
mod fetch;
mod ui;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use rivalscope_core::{ApiClient, Config, Namespace, ResultCache, Store};

use crate::app::App;
use crate::fetch::Fetcher;

#[derive(Parser)]
#[command(name = "rivalscope", version, about = "Competitor intelligence monitor")]
struct Cli {
    /// Path to a config file (defaults to ~/.config/rivalscope/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Probe the backend and report whether it is reachable
    Health,
    /// Drop every cached result (signals and runs)
    ClearCache,
}

fn main() -> Result<()> {
    Config::ensure_xdg_env();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path).context("failed to load configuration")?,
        None => Config::load().context("failed to load configuration")?,
    };

    match cli.command {
        Some(Command::Health) => run_health(&config),
        Some(Command::ClearCache) => run_clear_cache(&config),
        None => run_tui(config),
    }
}

/// One-shot backend liveness probe. Exits nonzero when the backend is down.
fn run_health(config: &Config) -> Result<()> {
    let api = ApiClient::new(&config.api).context("failed to create API client")?;
    let fetcher = Fetcher::new().context("failed to start fetch runtime")?;
    let healthy = fetcher.block_on(api.health_check()).unwrap_or(false);

    if healthy {
        println!("backend reachable at {}", api.base_url());
        Ok(())
    } else {
        println!("backend unreachable at {}", api.base_url());
        std::process::exit(1);
    }
}

fn run_clear_cache(config: &Config) -> Result<()> {
    let store = Store::open(&Config::store_path()).context("failed to open cache store")?;
    store.migrate().context("failed to run cache migrations")?;
    let cache = ResultCache::new(Arc::new(store), &config.cache);

    let signals = cache.invalidate_all(Namespace::Signals);
    let runs = cache.invalidate_all(Namespace::Runs);
    println!("cleared {} signal entries, {} run entries", signals, runs);
    Ok(())
}

fn run_tui(config: Config) -> Result<()> {
    // Logging goes to a file; stdout belongs to the TUI
    let _log_guard =
        rivalscope_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("rivalscope TUI starting up");

    let store_path = Config::store_path();
    tracing::info!(path = %store_path.display(), "Opening cache store");
    let store = Store::open(&store_path).context("failed to open cache store")?;
    store.migrate().context("failed to run cache migrations")?;

    let cache = ResultCache::new(Arc::new(store), &config.cache);
    let api = ApiClient::new(&config.api).context("failed to create API client")?;
    let fetcher = Fetcher::new().context("failed to start fetch runtime")?;

    let mut app = App::new(api, cache, fetcher);
    app.start();

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal")?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;

    tracing::info!("rivalscope TUI shutting down");

    result
}

/// Run the main application loop.
fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        // Apply finished background fetches before drawing
        app.drain_fetches();
        app.tick();

        terminal.draw(|frame| ui::render(frame, app))?;

        // Handle events
        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                app.handle_key(key);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
