use anyhow::Result;
use clap::Parser;
use enquiry_core::{Config, EnquiryClient};
use std::fs::{self, OpenOptions};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

mod app;
mod cli;
mod handler;
mod tui;
mod ui;

use app::App;
use cli::{Cli, Command};
use tui::{EventHandler, Tui};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    cli.apply(&mut config);

    init_logging(&config)?;
    tracing::info!(base_url = %config.base_url, "starting enquiry client");

    let client = EnquiryClient::from_config(&config)?;
    let deep_link = cli.deep_link();

    match cli.command {
        Some(Command::Ask { message }) => cli::ask(&client, &message).await,
        Some(Command::Faq { action }) => cli::faq(&client, action).await,
        None => run_tui(client, cli.admin, deep_link).await,
    }
}

/// The terminal belongs to the UI, so logs go to a file
fn init_logging(config: &Config) -> Result<()> {
    let path = config.log_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

async fn run_tui(client: EnquiryClient, admin: bool, deep_link: Option<String>) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let mut app = App::new(client, events.sender(), admin);
    if admin {
        app.load_faqs();
    }
    if let Some(link) = deep_link {
        app.open_deep_link(&link);
    }

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }

    tracing::info!("exiting");
    Ok(())
}
