//! statusboard - status display for an e-ink style dashboard
//!
//! Keeps a clock, the local weather and upcoming transit departures up to
//! date and draws them in the terminal.

use std::io;
use std::panic;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{error, info};
use ratatui::{backend::CrosstermBackend, Terminal};

use statusboard::cli::{Cli, StartupConfig};
use statusboard::data::{Endpoints, HttpFetch};
use statusboard::document::Document;
use statusboard::logging::{self, LogTarget};
use statusboard::refresh::Dashboard;
use statusboard::ui;

/// How often headless mode checks the page for changes
const HEADLESS_PRINT_INTERVAL: Duration = Duration::from_secs(1);

/// Sets up a panic hook that restores the terminal before printing the panic message.
/// This ensures the terminal is usable even if the application panics.
fn setup_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Attempt to restore the terminal
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        // Call the original panic hook
        original_hook(panic_info);
    }));
}

/// Installs the logger for the chosen mode. Terminal mode without a usable
/// log file runs without logs rather than writing over the screen.
fn setup_logging(config: &StartupConfig) {
    let target = if config.headless {
        Some(LogTarget::Stderr)
    } else {
        config
            .log_file
            .clone()
            .or_else(logging::default_log_path)
            .map(LogTarget::File)
    };

    if let Some(target) = target {
        if let Err(e) = logging::init(target) {
            eprintln!("Logging disabled: {}", e);
        }
    }
}

/// Prints the page to stdout whenever it changes, until Ctrl-C
async fn run_headless(document: &Document) -> Result<(), Box<dyn std::error::Error>> {
    let mut last = String::new();
    let mut ticker = tokio::time::interval(HEADLESS_PRINT_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let text = ui::page_text(document);
                if text != last {
                    println!("{}\n", text);
                    last = text;
                }
            }
            result = tokio::signal::ctrl_c() => {
                result?;
                info!("Interrupted, shutting down");
                return Ok(());
            }
        }
    }
}

/// Draws the page until the user quits
fn run_terminal(document: &Document) -> Result<(), Box<dyn std::error::Error>> {
    setup_panic_hook();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main event loop
    loop {
        terminal.draw(|f| ui::render_page(f, document))?;

        // Poll for keyboard events with 100ms timeout
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    break;
                }
            }
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    };

    setup_logging(&config);
    info!("statusboard v{} for {}", env!("CARGO_PKG_VERSION"), config.page_url);

    let endpoints = Endpoints::from_page(&config.page_url)?;
    let client = reqwest::Client::builder()
        .user_agent(concat!("statusboard/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let dashboard = Dashboard::new(Document::dashboard(), endpoints, config.face.clone())
        .with_fetch(Arc::new(HttpFetch::with_client(client)));
    dashboard.start();

    let document = dashboard.document().clone();
    let result = if config.headless {
        run_headless(&document).await
    } else {
        run_terminal(&document)
    };

    if let Err(e) = &result {
        error!("statusboard stopped: {}", e);
    }
    result
}
