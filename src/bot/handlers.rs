//! User and admin update handlers.

#[path = "handlers/broadcast.rs"]
mod broadcast;
#[path = "handlers/callbacks/mod.rs"]
mod callbacks;
#[path = "handlers/commands/mod.rs"]
mod commands;
#[path = "handlers/format.rs"]
pub(crate) mod format;
#[path = "handlers/gate.rs"]
mod gate;
#[path = "handlers/input.rs"]
mod input;
#[path = "handlers/shared.rs"]
mod shared;
#[path = "handlers/state.rs"]
pub(crate) mod state;

pub use state::BotState;

use teloxide::dispatching::DpHandlerDescription;
use teloxide::dptree;
use teloxide::prelude::*;

pub fn schema() -> dptree::Handler<
    'static,
    Result<(), Box<dyn std::error::Error + Send + Sync + 'static>>,
    DpHandlerDescription,
> {
    let message_handler = Update::filter_message()
        .branch(commands::handler())
        .endpoint(input::handle_text);

    dptree::entry()
        .branch(message_handler)
        .branch(callbacks::handler())
}
