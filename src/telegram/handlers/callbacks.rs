//! Inline-button callbacks on certificate cards

use teloxide::prelude::*;

use super::send::send_all;
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::dispatch;
use crate::telegram::render;
use crate::telegram::router::{self, Rejection};

/// Handle a callback query from a certificate keyboard
pub(super) async fn handle_callback(bot: Bot, q: CallbackQuery, deps: HandlerDeps) -> Result<(), HandlerError> {
    let viewer = deps.viewer(Some(&q.from));
    let data = q.data.as_deref().unwrap_or_default();
    log::info!("Callback {:?} from user {}", data, viewer.user_id);

    let route = match router::route_callback(data, &viewer) {
        Ok(route) => route,
        Err(rejection) => {
            let text = match rejection {
                Rejection::NotUnderstood => "Неизвестное действие.",
                ref other => render::rejection(other),
            };
            bot.answer_callback_query(q.id.clone()).text(text).show_alert(true).await?;
            return Ok(());
        }
    };

    let mut answer = bot.answer_callback_query(q.id.clone());
    if let Some(notice) = route.notice() {
        answer = answer.text(notice);
    }
    answer.await?;

    let Some(chat_id) = q.message.as_ref().map(|m| m.chat().id) else {
        log::warn!("Callback {:?} without a message, nothing to reply to", data);
        return Ok(());
    };

    let replies = dispatch::execute(route, deps.api.as_ref(), &deps.config, &viewer).await;
    send_all(&bot, chat_id, replies).await?;
    Ok(())
}
