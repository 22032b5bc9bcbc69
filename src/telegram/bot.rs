//! Bot initialization
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command list registration

use reqwest::ClientBuilder;
use secrecy::ExposeSecret;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config::{self, Config};

/// Bot commands enum with descriptions.
///
/// Parsing is done by the router (it needs the argument and `@botname`
/// handling); this enum feeds the Telegram command list and `/help`.
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "lowercase", description = "Подарочные сертификаты:")]
pub enum Command {
    #[command(description = "главное меню")]
    Start,
    #[command(description = "создать сертификат")]
    New,
    #[command(description = "последние сертификаты")]
    Journal,
    #[command(description = "PDF по коду: /pdf 123456")]
    Pdf,
    #[command(description = "карточка по коду: /scan 123456")]
    Scan,
    #[command(description = "карточка по номеру в магазине: /cert 17")]
    Cert,
    #[command(description = "Google-таблица журнала")]
    Sheet,
    #[command(description = "отменить создание")]
    Cancel,
    #[command(description = "справка")]
    Help,
}

/// Creates a Bot instance with the configured token and request timeout
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(reqwest::Error)` - Failed to build the HTTP client
pub fn create_bot(config: &Config) -> Result<Bot, reqwest::Error> {
    let client = ClientBuilder::new().timeout(config::network::bot_timeout()).build()?;
    Ok(Bot::with_client(config.bot_token.expose_secret(), client))
}

/// Sets up bot commands in Telegram UI
///
/// # Arguments
/// * `bot` - Bot instance to configure
///
/// # Returns
/// * `Ok(())` - Commands set successfully
/// * `Err(RequestError)` - Failed to set commands
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
