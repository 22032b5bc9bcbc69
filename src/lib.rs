//! Telegram bot for managing gift certificates of an OpenCart shop
//!
//! The shop exposes a small REST module (`giftcert_pdf_api`); this crate
//! proxies its operations to admins through bot commands and inline buttons.

pub mod api;
pub mod cli;
pub mod core;
pub mod telegram;
