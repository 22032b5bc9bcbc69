use thiserror::Error;

use super::config::ConfigError;
use crate::api::ApiError;

/// Centralized error types for the application
///
/// Startup and CLI paths convert everything to this enum; handlers box
/// their errors instead (see `telegram::handlers::HandlerError`).
///
/// # Example
///
/// ```no_run
/// use giftcert_bot::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Certificate API errors
    #[error("Certificate API error: {0}")]
    Api(#[from] ApiError),

    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;
