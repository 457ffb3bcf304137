use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use tokio::sync::mpsc;
use tracing::{info, warn};

use climate_engine_tui::api::ClimateClient;
use climate_engine_tui::app::session::SessionStore;
use climate_engine_tui::app::{App, RequestDispatcher};
use climate_engine_tui::cli::CliArgs;
use climate_engine_tui::config::{init_app_config, AppConfig};
use climate_engine_tui::db::create_database_pool;
use climate_engine_tui::event::{self, HeadlessRequest};
use climate_engine_tui::logging::init_logging;
use climate_engine_tui::terminal;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup error handling
    color_eyre::install()?;

    let args = CliArgs::parse();
    args.apply_env_overrides();
    let config = init_app_config()?;

    // Without a terminal there is nothing to draw on
    let headless = args.headless || !is_terminal();
    init_logging(&config, headless)?;
    info!(api_url = %config.api_url, headless, "starting");

    let client = ClimateClient::new(&config.api_url, config.request_timeout)?;

    if headless {
        let token = headless_token(&args, &config).await?;
        let request = HeadlessRequest::from_args(&args, &config.default_dataset)?;
        return event::run_headless(&client, &token, &request, args.json).await;
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let dispatcher = RequestDispatcher::new(Arc::new(client), tx);
    let mut app = App::new(config, dispatcher);

    if let Err(e) = app.initialize().await {
        warn!(error = %e, "startup incomplete, continuing without a stored key");
        app.status_message = format!("Startup problem: {e}");
    }

    let mut terminal = terminal::setup()?;
    let result = event::run(&mut terminal, &mut app, &mut rx).await;
    terminal::cleanup(true, true);

    info!("exiting");
    result
}

/// `--api-key` / `CLIMATE_ENGINE_API_KEY`, else the key stored by an
/// interactive login
async fn headless_token(args: &CliArgs, config: &AppConfig) -> Result<String> {
    if let Some(key) = args.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }

    let pool = match create_database_pool(&config.database_url).await {
        Ok(pool) => Some(pool),
        Err(e) => {
            warn!(error = %e, "credential database unavailable");
            None
        }
    };
    let mut session = SessionStore::new(pool);
    session
        .get_credential()
        .await?
        .map(ToString::to_string)
        .ok_or_else(|| {
            eyre!("No API key: pass --api-key, set CLIMATE_ENGINE_API_KEY or log in interactively")
        })
}

// Check if we're running in a terminal
fn is_terminal() -> bool {
    atty::is(atty::Stream::Stdout)
}
