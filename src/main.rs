use std::sync::Arc;

use anyhow::Result;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;

use giftcert_bot::api::{CertificateApi, HttpCertificateApi};
use giftcert_bot::cli::{Cli, Commands};
use giftcert_bot::core::config::{self, Config};
use giftcert_bot::core::{init_logger, AppResult};
use giftcert_bot::telegram::{create_bot, schema, setup_bot_commands, CreateState, HandlerDeps};

/// Main entry point for the bot
///
/// Parses CLI arguments and dispatches to the selected subcommand.
///
/// # Errors
/// Returns an error if initialization fails (logging, configuration, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Environment first: LOG_FILE_PATH and RUST_LOG may come from the file
    let env_file = config::load_env_file(cli.env_file.as_deref());

    let log_file = std::env::var("LOG_FILE_PATH").ok().filter(|p| !p.trim().is_empty());
    init_logger(log_file.as_deref())?;

    match &env_file {
        Ok(Some(path)) => log::info!("Loaded environment from {}", path),
        Ok(None) => log::info!("No env file loaded, using process environment"),
        Err(e) => log::warn!("{}; using process environment", e),
    }

    let config = Config::from_env()?;
    config.log_summary();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_bot(config).await?,
        Commands::Check => check(config).await?,
    }
    Ok(())
}

/// Run the Telegram bot with long polling
async fn run_bot(config: Config) -> AppResult<()> {
    log::info!("Starting bot...");

    let config = Arc::new(config);
    let api: Arc<dyn CertificateApi> = Arc::new(HttpCertificateApi::from_config(&config)?);
    let bot = create_bot(&config)?;

    let me = bot.get_me().await?;
    log::info!("Bot username: {:?}, Bot ID: {}", me.username, me.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let deps = HandlerDeps::new(api, config);

    log::info!("Starting bot in long polling mode");
    Dispatcher::builder(bot, schema(deps))
        .dependencies(dptree::deps![InMemStorage::<CreateState>::new()])
        .enable_ctrlc_handler()
        .error_handler(LoggingErrorHandler::with_custom_text("An error has occurred in the dispatcher"))
        .build()
        .dispatch()
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}

/// Validate configuration and make one `list` request
async fn check(config: Config) -> AppResult<()> {
    let api = HttpCertificateApi::from_config(&config)?;
    let page = api.list(0, 1).await?;

    log::info!("Certificate API reachable, latest rows returned: {}", page.rows.len());
    println!("OK: configuration valid, certificate API answered ({} row(s))", page.rows.len());
    Ok(())
}
