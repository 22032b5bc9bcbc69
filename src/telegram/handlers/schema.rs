//! Dispatcher schema and handler chain builders

use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::callbacks::handle_callback;
use super::commands::{handle_command, handle_menu_text, handle_wizard};
use super::types::{CreateDialogue, HandlerDeps, HandlerError};
use crate::telegram::create::CreateState;

/// Creates the main dispatcher schema for the bot.
///
/// The dispatcher must provide an `InMemStorage<CreateState>` dependency
/// for the `/new` wizard.
///
/// # Arguments
/// * `deps` - Handler dependencies (certificate API, configuration)
///
/// # Returns
/// The complete handler tree for the bot
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(message_handler(deps_messages))
        .branch(callback_handler(deps_callback))
}

/// Messages: commands first, then the wizard, then menu buttons
fn message_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_wizard = deps.clone();
    let deps_menu = deps;

    Update::filter_message()
        .enter_dialogue::<Message, InMemStorage<CreateState>, CreateState>()
        .branch(
            dptree::filter(|msg: Message| msg.text().is_some_and(|text| text.starts_with('/'))).endpoint(
                move |bot: Bot, msg: Message, dialogue: CreateDialogue| {
                    let deps = deps_commands.clone();
                    async move { handle_command(bot, msg, dialogue, deps).await }
                },
            ),
        )
        .branch(
            dptree::filter(|msg: Message, state: CreateState| msg.text().is_some() && state != CreateState::Idle)
                .endpoint(
                    move |bot: Bot, msg: Message, dialogue: CreateDialogue, state: CreateState| {
                        let deps = deps_wizard.clone();
                        async move { handle_wizard(bot, msg, dialogue, state, deps).await }
                    },
                ),
        )
        .branch(dptree::filter(|msg: Message| msg.text().is_some()).endpoint(
            move |bot: Bot, msg: Message, dialogue: CreateDialogue| {
                let deps = deps_menu.clone();
                async move { handle_menu_text(bot, msg, dialogue, deps).await }
            },
        ))
}

/// Handler for inline-button callbacks
fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move { handle_callback(bot, q, deps).await }
    })
}
