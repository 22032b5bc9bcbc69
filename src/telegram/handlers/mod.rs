//! Telegram bot handler tree configuration
//!
//! The handler tree only translates updates into routes and sends the
//! rendered replies; the logic lives in `router`, `dispatch` and `render`.

mod callbacks;
mod commands;
mod schema;
mod send;
mod types;

pub use schema::schema;
pub use types::{CreateDialogue, HandlerDeps, HandlerError};
