//! Telegram bot integration and handlers

pub mod bot;
pub mod create;
pub mod deeplink;
pub mod dispatch;
pub mod handlers;
pub mod render;
pub mod router;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use create::CreateState;
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use render::Outgoing;
pub use router::{Action, Rejection, Route, Viewer};
