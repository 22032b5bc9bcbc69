use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "giftcert-bot")]
#[command(author, version, about = "Telegram bot for OpenCart gift certificates", long_about = None)]
pub struct Cli {
    /// Load environment variables from this file before anything else
    #[arg(long, global = true)]
    pub env_file: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot with long polling (default)
    Run,

    /// Validate configuration and check that the certificate API answers
    Check,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
