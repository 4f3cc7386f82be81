mod app;
mod cache;
mod config;
mod error;
mod events;
mod handoff;
mod session;
mod spotify;
mod ui;
mod wizard;
#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{io, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::{
    app::{route::Route, App},
    cache::{KeyValueStore, MemoryStore, RedisStore},
    config::Config,
    spotify::RspotifyApi,
};

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION")
)]
struct Cli {
    /// Location to open, e.g. `/top-artists#last-6-months`
    #[arg(long, value_name = "LOCATION")]
    open: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let start_route = match cli.open.as_deref() {
        Some(location) => Route::parse(location)?,
        None => Route::default(),
    };

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load()?;

    // ── Logging setup ────────────────────────────────────────────────────────
    // Logs go to a file so they don't corrupt the TUI
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("melodot=info"));
    let log_file = std::fs::File::create(&config.log_file)
        .with_context(|| format!("cannot create log file {}", config.log_file))?;
    fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();

    // ── Key/value store: Redis when reachable, memory otherwise ──────────────
    let store: Arc<dyn KeyValueStore> = match RedisStore::new(&config.redis_url) {
        Ok(redis) if redis.ping().await => {
            info!("Redis connected at {}", config.redis_url);
            Arc::new(redis)
        }
        Ok(_) => {
            warn!("Redis not reachable, cache and token last for this run only");
            Arc::new(MemoryStore::new())
        }
        Err(e) => {
            warn!("Redis unavailable ({e}), cache and token last for this run only");
            Arc::new(MemoryStore::new())
        }
    };

    // ── Terminal setup ────────────────────────────────────────────────────────
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // ── Panic hook to restore terminal on crash ──────────────────────────────
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        disable_raw_mode().ok();
        execute!(io::stdout(), LeaveAlternateScreen).ok();
        original_hook(panic_info);
    }));

    // ── Run the app ──────────────────────────────────────────────────────────
    let log_path = config.log_file.clone();
    let result = {
        let mut app = App::new(config, store, Arc::new(RspotifyApi::new()));
        app.state.route = start_route;
        app.run(&mut terminal).await
    };

    // ── Restore terminal ─────────────────────────────────────────────────────
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        error!("App error: {e:?}");
        eprintln!("\n\x1b[31mmelodot crashed:\x1b[0m {e}");
        eprintln!("Check {log_path} for details");
    }

    Ok(())
}
