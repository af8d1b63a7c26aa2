use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

mod api;
mod app;
mod config;
mod handler;
mod tui;
mod ui;

use api::{Responder, StoryClient};
use app::App;
use config::Config;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "storytime")]
#[command(about = "Terminal chat client for a story-generation backend")]
struct Cli {
    /// Base URL of the story backend (overrides config file and STORYTIME_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Answer every prompt with a fixed simulated reply instead of calling the backend
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    config.override_api_url(cli.api_url);

    init_logging(&config);

    let responder = if cli.offline {
        Responder::Canned
    } else {
        Responder::Backend(StoryClient::new(config.api_url(), config.timeout())?)
    };

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, App::new(responder)).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, mut app: App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;
        match events.next().await {
            Some(event) => handler::handle_event(&mut app, event).await?,
            None => break,
        }
    }
    Ok(())
}

/// Logs go to a file: the terminal owns stderr while the alternate screen is
/// up. Failure to set up logging is never fatal.
fn init_logging(config: &Config) {
    if !config.logs_enabled() {
        return;
    }
    let Ok(path) = Config::log_path() else { return };
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let Ok(file) = std::fs::File::create(&path) else { return };

    let filter = if config.log_api_calls() {
        "storytime=debug"
    } else {
        "storytime=info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init();
}
