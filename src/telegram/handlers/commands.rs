//! Message endpoints: slash commands, the `/new` wizard and menu buttons

use teloxide::prelude::*;
use teloxide::types::Message;

use super::send::send_all;
use super::types::{CreateDialogue, HandlerDeps, HandlerError};
use crate::telegram::create::{self, CreateState, Step};
use crate::telegram::dispatch;
use crate::telegram::render;
use crate::telegram::router::{self, Action, Rejection, Route, Viewer};

/// Handle a slash command
pub(super) async fn handle_command(
    bot: Bot,
    msg: Message,
    dialogue: CreateDialogue,
    deps: HandlerDeps,
) -> Result<(), HandlerError> {
    let text = msg.text().unwrap_or_default();
    let viewer = deps.viewer(msg.from.as_ref());
    log::info!("Received command {:?} from user {} in chat {}", text, viewer.user_id, msg.chat.id);

    match router::route_command(text, &viewer, deps.config.journal_limit) {
        Ok(route) => run_route(&bot, &msg, &dialogue, &deps, &viewer, route).await,
        Err(rejection) => reject(&bot, &msg, &viewer, &rejection).await,
    }
}

/// Handle a plain-text message while the `/new` wizard is running
pub(super) async fn handle_wizard(
    bot: Bot,
    msg: Message,
    dialogue: CreateDialogue,
    state: CreateState,
    deps: HandlerDeps,
) -> Result<(), HandlerError> {
    let text = msg.text().unwrap_or_default();

    match create::advance(state, text) {
        Step::Continue { next, reply } => {
            dialogue.update(next).await?;
            send_all(&bot, msg.chat.id, vec![reply]).await?;
        }
        Step::Cancel => {
            dialogue.exit().await?;
            send_all(&bot, msg.chat.id, vec![create::cancelled()]).await?;
        }
        Step::Submit(new) => {
            dialogue.exit().await?;
            let viewer = deps.viewer(msg.from.as_ref());
            log::info!("User {} submits certificate for {} BYN", viewer.user_id, new.amount);
            send_all(&bot, msg.chat.id, vec![create::submitting()]).await?;
            let replies = dispatch::perform(Action::Create(new), deps.api.as_ref(), &deps.config, &viewer).await;
            send_all(&bot, msg.chat.id, replies).await?;
        }
    }
    Ok(())
}

/// Handle a reply-keyboard button press outside the wizard
pub(super) async fn handle_menu_text(
    bot: Bot,
    msg: Message,
    dialogue: CreateDialogue,
    deps: HandlerDeps,
) -> Result<(), HandlerError> {
    let text = msg.text().unwrap_or_default();
    let viewer = deps.viewer(msg.from.as_ref());

    match router::route_menu_text(text, &viewer, deps.config.journal_limit) {
        Ok(route) => run_route(&bot, &msg, &dialogue, &deps, &viewer, route).await,
        // Free text from strangers stays unanswered
        Err(Rejection::NotUnderstood) if !viewer.is_admin => Ok(()),
        Err(rejection) => reject(&bot, &msg, &viewer, &rejection).await,
    }
}

async fn run_route(
    bot: &Bot,
    msg: &Message,
    dialogue: &CreateDialogue,
    deps: &HandlerDeps,
    viewer: &Viewer,
    route: Route,
) -> Result<(), HandlerError> {
    match route {
        Route::StartCreate => dialogue.update(CreateState::Amount).await?,
        Route::CancelCreate => dialogue.exit().await?,
        _ => {}
    }

    let replies = dispatch::execute(route, deps.api.as_ref(), &deps.config, viewer).await;
    send_all(bot, msg.chat.id, replies).await?;
    Ok(())
}

async fn reject(bot: &Bot, msg: &Message, viewer: &Viewer, rejection: &Rejection) -> Result<(), HandlerError> {
    log::debug!("Rejected message from user {}: {:?}", viewer.user_id, rejection);
    bot.send_message(msg.chat.id, render::rejection(rejection)).await?;
    Ok(())
}
