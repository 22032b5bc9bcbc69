//! Delivery of rendered replies to a chat

use teloxide::prelude::*;
use teloxide::types::{InputFile, ParseMode};
use teloxide::RequestError;

use crate::telegram::render::Outgoing;

/// Sends `messages` to `chat_id` in order, stopping at the first failure.
pub(super) async fn send_all(bot: &Bot, chat_id: ChatId, messages: Vec<Outgoing>) -> Result<(), RequestError> {
    for message in messages {
        match message {
            Outgoing::Text { text, html, markup } => {
                let mut request = bot.send_message(chat_id, text);
                if html {
                    request = request.parse_mode(ParseMode::Html);
                }
                if let Some(markup) = markup {
                    request = request.reply_markup(markup);
                }
                request.await?;
            }
            Outgoing::Document {
                bytes,
                file_name,
                caption,
            } => {
                log::debug!("Sending {} ({} bytes) to chat {}", file_name, bytes.len(), chat_id);
                bot.send_document(chat_id, InputFile::memory(bytes).file_name(file_name))
                    .caption(caption)
                    .await?;
            }
        }
    }
    Ok(())
}
