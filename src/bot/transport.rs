//! Telegram transport built on teloxide

use async_trait::async_trait;
use std::sync::Arc;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode,
};

use crate::bot::handlers::{Chat, CommandHandler, Incoming, Outgoing};
use crate::bot::keyboards::Keyboard;
use crate::error::Result;
use crate::logging::{StructuredLogger, get_logger};

/// Sink for outgoing actions
#[async_trait]
pub trait Outbox: Send + Sync {
    async fn deliver(&self, action: Outgoing) -> Result<()>;
}

/// Deliver actions in order, stopping at the first failure
pub async fn deliver_all(outbox: &dyn Outbox, actions: Vec<Outgoing>) -> Result<()> {
    for action in actions {
        outbox.deliver(action).await?;
    }
    Ok(())
}

fn markup(keyboard: Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.into_iter().map(|row| {
        row.into_iter()
            .map(|b| InlineKeyboardButton::callback(b.text, b.callback_data))
            .collect::<Vec<_>>()
    }))
}

/// Outbox sending through the Bot API with HTML parse mode
#[derive(Clone)]
pub struct TelegramOutbox {
    bot: Bot,
}

impl TelegramOutbox {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Outbox for TelegramOutbox {
    async fn deliver(&self, action: Outgoing) -> Result<()> {
        match action {
            Outgoing::Text {
                chat_id,
                text,
                keyboard,
            } => {
                let request = self
                    .bot
                    .send_message(ChatId(chat_id), text)
                    .parse_mode(ParseMode::Html);
                match keyboard {
                    Some(k) => request.reply_markup(markup(k)).await?,
                    None => request.await?,
                };
            }
            Outgoing::Document {
                chat_id,
                file_name,
                contents,
                caption,
            } => {
                let mut request = self
                    .bot
                    .send_document(ChatId(chat_id), InputFile::memory(contents).file_name(file_name))
                    .parse_mode(ParseMode::Html);
                if let Some(caption) = caption {
                    request = request.caption(caption);
                }
                request.await?;
            }
            Outgoing::Sticker { chat_id, file_id } => {
                self.bot
                    .send_sticker(ChatId(chat_id), InputFile::file_id(file_id))
                    .await?;
            }
            Outgoing::AnswerCallback { callback_id, text } => {
                let mut request = self.bot.answer_callback_query(callback_id);
                if !text.is_empty() {
                    request = request.text(text);
                }
                request.await?;
            }
            Outgoing::EditText {
                chat_id,
                message_id,
                text,
                keyboard,
            } => {
                let request = self
                    .bot
                    .edit_message_text(ChatId(chat_id), MessageId(message_id), text)
                    .parse_mode(ParseMode::Html);
                match keyboard {
                    Some(k) => request.reply_markup(markup(k)).await?,
                    None => request.await?,
                };
            }
        }
        Ok(())
    }
}

async fn dispatch(
    incoming: Incoming,
    handler: &dyn CommandHandler,
    outbox: &dyn Outbox,
    logger: &StructuredLogger,
) {
    let chat_id = incoming.chat().id;
    let actions = match handler.handle(&incoming).await {
        Ok(actions) => actions,
        Err(e) => {
            logger.for_chat(chat_id).error(&format!("Unhandled error: {}", e));
            return;
        }
    };
    if let Err(e) = deliver_all(outbox, actions).await {
        logger
            .for_chat(chat_id)
            .error(&format!("Failed to deliver reply: {}", e));
    }
}

async fn on_message(
    msg: Message,
    handler: Arc<dyn CommandHandler>,
    outbox: Arc<dyn Outbox>,
) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let incoming = Incoming::Message {
        chat: Chat {
            id: msg.chat.id.0,
            username: msg.chat.username().map(str::to_string),
        },
        text: text.to_string(),
    };
    dispatch(incoming, handler.as_ref(), outbox.as_ref(), &get_logger("transport")).await;
    Ok(())
}

async fn on_callback(
    q: CallbackQuery,
    handler: Arc<dyn CommandHandler>,
    outbox: Arc<dyn Outbox>,
) -> ResponseResult<()> {
    let (Some(message), Some(data)) = (q.message.as_ref(), q.data.clone()) else {
        return Ok(());
    };
    let incoming = Incoming::Callback {
        chat: Chat {
            id: message.chat().id.0,
            username: q.from.username.clone(),
        },
        message_id: message.id().0,
        callback_id: q.id.clone(),
        data,
    };
    dispatch(incoming, handler.as_ref(), outbox.as_ref(), &get_logger("transport")).await;
    Ok(())
}

/// Run long polling until Ctrl-C
pub async fn run(bot: Bot, handler: Arc<dyn CommandHandler>, outbox: Arc<dyn Outbox>) {
    let tree = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    get_logger("transport").info("Starting Telegram long polling");
    Dispatcher::builder(bot, tree)
        .dependencies(dptree::deps![handler, outbox])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::keyboards::keyboard_for;
    use crate::report::SettingsPage;

    #[test]
    fn markup_keeps_rows() {
        let m = markup(keyboard_for(SettingsPage::Regions));
        assert_eq!(m.inline_keyboard.len(), 4);
        assert_eq!(m.inline_keyboard[1].len(), 2);
    }
}
