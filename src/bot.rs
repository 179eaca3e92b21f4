//! Telegram bot: command parsing, handlers, middleware and transport

pub mod commands;
pub mod handlers;
pub mod keyboards;
pub mod middleware;
pub mod transport;

pub use commands::{ADMIN_COMMANDS, Command};
pub use handlers::{BotContext, Chat, Clock, CommandHandler, Incoming, Outgoing, PvpcHandler};
pub use keyboards::{Button, Keyboard, keyboard_for};
pub use middleware::{AdminOnly, Logged};
pub use transport::{Outbox, TelegramOutbox, deliver_all};

use std::sync::Arc;

use crate::error::Result;
use crate::logging::get_logger;
use crate::settings::SettingsRepository;

/// Commands that answer "data unavailable" when they fail
pub const PRICE_COMMANDS: [&str; 3] = ["precios", "siguientes", "analisis"];

/// Full handler stack: `Logged(AdminOnly(PvpcHandler))`
pub fn build_handler(ctx: Arc<BotContext>) -> Logged<AdminOnly<PvpcHandler>> {
    let settings = ctx.settings.clone();
    let admin_enabled = ctx.config.telegram.admin_enabled;
    Logged::new(AdminOnly::new(
        PvpcHandler::new(ctx),
        settings,
        admin_enabled,
    ))
    .replying_on_error(&PRICE_COMMANDS)
}

/// Grant admin rights to the configured admin chats
pub fn ensure_admins(settings: &dyn SettingsRepository, admins: &[i64]) -> Result<()> {
    let logger = get_logger("bot");
    for &chat_id in admins {
        if !settings.is_admin(chat_id) {
            settings.update(chat_id, &mut |s| s.admin = true)?;
            logger.for_chat(chat_id).info("Granted admin rights from configuration");
        }
    }
    Ok(())
}
