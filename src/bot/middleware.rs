//! Handler middleware: update logging and admin gating

use async_trait::async_trait;
use std::sync::Arc;

use crate::bot::commands::is_admin_command;
use crate::bot::handlers::{CommandHandler, Incoming, Outgoing};
use crate::error::Result;
use crate::logging::{LogContext, StructuredLogger, get_logger, get_logger_with_context};
use crate::report::DATA_UNAVAILABLE;
use crate::settings::SettingsRepository;

/// Logs every update and contains handler errors.
///
/// Errors never reach the transport: they are logged in full and, for the
/// commands listed in `reply_on_error`, answered with a generic message.
/// Failed callback queries get an empty answer.
pub struct Logged<H> {
    inner: H,
    reply_on_error: Vec<String>,
    logger: StructuredLogger,
}

impl<H: CommandHandler> Logged<H> {
    pub fn new(inner: H) -> Self {
        Self {
            inner,
            reply_on_error: Vec::new(),
            logger: get_logger("bot"),
        }
    }

    /// Commands answered with the "data unavailable" text when they fail
    pub fn replying_on_error(mut self, commands: &[&str]) -> Self {
        self.reply_on_error = commands.iter().map(|c| (*c).to_string()).collect();
        self
    }

    fn replies_on_error(&self, incoming: &Incoming) -> bool {
        incoming
            .command_name()
            .is_some_and(|name| self.reply_on_error.iter().any(|c| c == name))
    }
}

#[async_trait]
impl<H: CommandHandler> CommandHandler for Logged<H> {
    async fn handle(&self, incoming: &Incoming) -> Result<Vec<Outgoing>> {
        let chat_id = incoming.chat().id;
        let logger = self.logger.for_chat(chat_id);
        logger.debug(&incoming.describe());

        match self.inner.handle(incoming).await {
            Ok(actions) => Ok(actions),
            Err(e) => {
                logger.error(&format!("{}\n{}", incoming.describe(), e));
                if let Incoming::Callback { callback_id, .. } = incoming {
                    // Clears the button's loading state
                    return Ok(vec![Outgoing::AnswerCallback {
                        callback_id: callback_id.clone(),
                        text: String::new(),
                    }]);
                }
                if self.replies_on_error(incoming) {
                    Ok(vec![Outgoing::text(chat_id, DATA_UNAVAILABLE)])
                } else {
                    Ok(Vec::new())
                }
            }
        }
    }
}

/// Drops admin commands from chats without admin rights
pub struct AdminOnly<H> {
    inner: H,
    settings: Arc<dyn SettingsRepository>,
    enabled: bool,
    logger: StructuredLogger,
}

impl<H: CommandHandler> AdminOnly<H> {
    /// With `enabled == false` admin commands are ignored for everyone
    pub fn new(inner: H, settings: Arc<dyn SettingsRepository>, enabled: bool) -> Self {
        Self {
            inner,
            settings,
            enabled,
            logger: get_logger_with_context(
                LogContext::new("bot").with_field("layer", "admin".to_string()),
            ),
        }
    }
}

#[async_trait]
impl<H: CommandHandler> CommandHandler for AdminOnly<H> {
    async fn handle(&self, incoming: &Incoming) -> Result<Vec<Outgoing>> {
        if let Some(name) = incoming.command_name()
            && is_admin_command(name)
        {
            let chat_id = incoming.chat().id;
            let logger = self.logger.for_chat(chat_id);
            if !self.enabled || !self.settings.is_admin(chat_id) {
                logger.info(&format!(
                    "USER not ALLOWED TO EXECUTE ADMIN COMMAND '/{}'",
                    name
                ));
                return Ok(Vec::new());
            }
            logger.debug(&format!("USER ALLOWED TO EXECUTE COMMAND '/{}'", name));
        }
        self.inner.handle(incoming).await
    }
}
