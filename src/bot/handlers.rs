//! Transport-free command and callback handling
//!
//! Handlers turn an [`Incoming`] update into a list of [`Outgoing`] actions.
//! The Telegram transport executes those actions; tests inspect them.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use crate::analysis::{find_windows, summarize};
use crate::bot::commands::{Command, command_name};
use crate::bot::keyboards::{Keyboard, keyboard_for};
use crate::chart::{chart_file_name, render_price_chart};
use crate::config::Config;
use crate::error::{PvpcError, Result};
use crate::esios::Zone;
use crate::logging::{LogKind, LogSelection, StructuredLogger, get_logger, read_logs};
use crate::prices::PriceService;
use crate::report::{
    HELP_MESSAGE, ReportOptions, SOMETHING_WENT_WRONG, SettingsPage, daily_report,
    settings_text, welcome_message, window_analysis,
};
use crate::settings::{ColorScheme, SNAPSHOT_FILE, SettingsRepository, UserSettings};

/// Chat an update came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,
    pub username: Option<String>,
}

/// An update received from a chat
#[derive(Debug, Clone)]
pub enum Incoming {
    Message {
        chat: Chat,
        text: String,
    },
    Callback {
        chat: Chat,
        message_id: i32,
        callback_id: String,
        data: String,
    },
}

impl Incoming {
    pub fn chat(&self) -> &Chat {
        match self {
            Self::Message { chat, .. } | Self::Callback { chat, .. } => chat,
        }
    }

    /// Command name of a message update (any bot suffix accepted)
    pub fn command_name(&self) -> Option<&str> {
        match self {
            Self::Message { text, .. } => command_name(text, ""),
            Self::Callback { .. } => None,
        }
    }

    /// `[ID: ..] [USERNAME: ..] [COMMAND|QUERY: ..]` line for the logs
    pub fn describe(&self) -> String {
        let chat = self.chat();
        let (kind, data) = match self {
            Self::Message { text, .. } => (
                "COMMAND",
                text.split_whitespace()
                    .next()
                    .filter(|t| t.starts_with('/'))
                    .unwrap_or_default()
                    .to_string(),
            ),
            Self::Callback { data, .. } => ("QUERY", data.clone()),
        };
        format!(
            "[ID: {}] [USERNAME: {}] [{}: {}]",
            chat.id,
            chat.username.as_deref().unwrap_or_default(),
            kind,
            data
        )
    }
}

/// An action for the transport to perform
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    Text {
        chat_id: i64,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Document {
        chat_id: i64,
        file_name: String,
        contents: Vec<u8>,
        caption: Option<String>,
    },
    Sticker {
        chat_id: i64,
        file_id: String,
    },
    AnswerCallback {
        callback_id: String,
        text: String,
    },
    EditText {
        chat_id: i64,
        message_id: i32,
        text: String,
        keyboard: Option<Keyboard>,
    },
}

impl Outgoing {
    pub fn text(chat_id: i64, text: impl Into<String>) -> Self {
        Self::Text {
            chat_id,
            text: text.into(),
            keyboard: None,
        }
    }

    /// Chat the action is addressed to, if any
    pub fn chat_id(&self) -> Option<i64> {
        match self {
            Self::Text { chat_id, .. }
            | Self::Document { chat_id, .. }
            | Self::Sticker { chat_id, .. }
            | Self::EditText { chat_id, .. } => Some(*chat_id),
            Self::AnswerCallback { .. } => None,
        }
    }
}

/// Handler interface shared by the command handler and its middleware
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, incoming: &Incoming) -> Result<Vec<Outgoing>>;
}

/// Source of "today" in the configured timezone
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Shared services used by the handlers and the daily push
pub struct BotContext {
    pub prices: PriceService,
    pub settings: Arc<dyn SettingsRepository>,
    pub config: Arc<Config>,
    clock: Clock,
}

impl BotContext {
    pub fn new(
        prices: PriceService,
        settings: Arc<dyn SettingsRepository>,
        config: Arc<Config>,
    ) -> Result<Self> {
        let tz = config.schedule.tz()?;
        let clock: Clock = Arc::new(move || Utc::now().with_timezone(&tz).date_naive());
        Ok(Self {
            prices,
            settings,
            config,
            clock,
        })
    }

    /// Replace the clock, e.g. to pin "today" in tests
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    fn report_options(&self) -> ReportOptions {
        ReportOptions {
            low_percentile: self.config.analysis.low_percentile,
            high_percentile: self.config.analysis.high_percentile,
            decimals: self.config.analysis.round_decimals,
        }
    }

    fn user_settings(&self, chat_id: i64) -> Result<UserSettings> {
        self.settings.register(chat_id)
    }

    /// Chart with the summary caption, followed by the hourly price list
    pub async fn report_messages(
        &self,
        chat_id: i64,
        date: NaiveDate,
        sorted: bool,
    ) -> Result<Vec<Outgoing>> {
        let settings = self.user_settings(chat_id)?;
        let opts = self.report_options();
        let series = self.prices.daily_series(date, settings.zone).await?;
        let summary = summarize(&series, opts.low_percentile, opts.high_percentile)?;
        let report = daily_report(&series, &summary, settings.color_scheme, sorted, &opts);
        let chart = render_price_chart(&series, &summary, settings.color_scheme)?;

        Ok(vec![
            Outgoing::Document {
                chat_id,
                file_name: chart_file_name(&series, settings.color_scheme),
                contents: chart.into_bytes(),
                caption: Some(report.summary),
            },
            Outgoing::text(chat_id, report.prices),
        ])
    }

    /// Cheapest windows of `width` consecutive hours
    pub async fn window_messages(
        &self,
        chat_id: i64,
        date: NaiveDate,
        width: usize,
    ) -> Result<Vec<Outgoing>> {
        if width == 0 {
            return Err(PvpcError::validation(
                "width".to_string(),
                "window width must be at least one hour".to_string(),
            ));
        }
        let settings = self.user_settings(chat_id)?;
        let opts = self.report_options();
        let series = self.prices.daily_series(date, settings.zone).await?;
        let summary = summarize(&series, opts.low_percentile, opts.high_percentile)?;
        let windows = find_windows(width, &series);
        let text = window_analysis(date, &summary, &windows, width, opts.decimals);
        Ok(vec![Outgoing::text(chat_id, text)])
    }
}

/// The bot's command and callback handler
pub struct PvpcHandler {
    ctx: Arc<BotContext>,
    logger: StructuredLogger,
}

impl PvpcHandler {
    pub fn new(ctx: Arc<BotContext>) -> Self {
        Self {
            ctx,
            logger: get_logger("bot"),
        }
    }

    async fn handle_command(&self, chat: &Chat, command: Command) -> Result<Vec<Outgoing>> {
        let ctx = &self.ctx;
        let chat_id = chat.id;
        match command {
            Command::Start => {
                ctx.settings.register(chat_id)?;
                Ok(vec![
                    Outgoing::text(chat_id, welcome_message(&ctx.config.telegram.username)),
                    Outgoing::Sticker {
                        chat_id,
                        file_id: ctx.config.telegram.welcome_sticker.clone(),
                    },
                ])
            }
            Command::Help => Ok(vec![Outgoing::text(chat_id, HELP_MESSAGE)]),
            Command::Prices { date } => {
                let date = date.unwrap_or_else(|| ctx.today());
                ctx.report_messages(chat_id, date, false).await
            }
            Command::Next { date } => {
                let date = date
                    .unwrap_or_else(|| ctx.today())
                    .succ_opt()
                    .ok_or_else(|| PvpcError::validation("date", "date out of range"))?;
                ctx.report_messages(chat_id, date, false).await
            }
            Command::Analysis { date, width } => {
                let date = date.unwrap_or_else(|| ctx.today());
                match width {
                    Some(width) => ctx.window_messages(chat_id, date, width).await,
                    None => ctx.report_messages(chat_id, date, true).await,
                }
            }
            Command::Settings => {
                let settings = ctx.settings.register(chat_id)?;
                Ok(vec![Outgoing::Text {
                    chat_id,
                    text: settings_text(SettingsPage::Settings, &settings),
                    keyboard: Some(keyboard_for(SettingsPage::Settings)),
                }])
            }
            Command::Users => {
                let path = ctx.settings.write_snapshot()?;
                Ok(vec![Outgoing::Document {
                    chat_id,
                    file_name: SNAPSHOT_FILE.to_string(),
                    contents: tokio::fs::read(&path).await?,
                    caption: None,
                }])
            }
            Command::Logs(selection) => self.log_document(chat_id, LogKind::Logs, selection).await,
            Command::Errors(selection) => {
                self.log_document(chat_id, LogKind::Errors, selection).await
            }
            Command::Op(target) => self.set_admin(chat_id, target, true),
            Command::Deop(target) => self.set_admin(chat_id, target, false),
        }
    }

    async fn log_document(
        &self,
        chat_id: i64,
        kind: LogKind,
        selection: LogSelection,
    ) -> Result<Vec<Outgoing>> {
        let doc = read_logs(&self.ctx.config.storage.logs_dir(), kind, selection).await?;
        Ok(vec![Outgoing::Document {
            chat_id,
            file_name: doc.file_name,
            contents: doc.contents,
            caption: None,
        }])
    }

    fn set_admin(&self, chat_id: i64, target: Option<i64>, admin: bool) -> Result<Vec<Outgoing>> {
        let Some(target) = target else {
            return Ok(vec![Outgoing::text(chat_id, SOMETHING_WENT_WRONG)]);
        };
        self.ctx.settings.update(target, &mut |s| s.admin = admin)?;
        self.logger.for_chat(chat_id).info(&format!(
            "Admin rights of {} set to {}",
            target, admin
        ));
        let verb = if admin { "OPed" } else { "DEOPed" };
        Ok(vec![
            Outgoing::text(chat_id, format!("{} user {}.", verb, target)),
            Outgoing::text(
                chat_id,
                format!("Ahora mismo los ADMINS son: {:?}", self.ctx.settings.admins()),
            ),
        ])
    }

    fn handle_callback(
        &self,
        chat: &Chat,
        message_id: i32,
        callback_id: &str,
        data: &str,
    ) -> Result<Vec<Outgoing>> {
        let (action, value) = data.split_once(':').ok_or_else(|| {
            PvpcError::validation("callback".to_string(), format!("malformed data '{}'", data))
        })?;
        let settings = &self.ctx.settings;

        let (page, answer) = match action {
            "keyboard" => {
                let page = SettingsPage::parse(value)?;
                let answer = if page == SettingsPage::Subscription {
                    settings.update(chat.id, &mut |s| s.subscribed = !s.subscribed)?;
                    "Subscripción actualizada.".to_string()
                } else {
                    String::new()
                };
                (page, answer)
            }
            "regions" => {
                let zone: Zone = value.parse()?;
                settings.update(chat.id, &mut |s| s.zone = zone)?;
                (SettingsPage::Regions, format!("Cambiada la región a {}", zone))
            }
            "colors" => {
                let scheme: ColorScheme = value.parse()?;
                settings.update(chat.id, &mut |s| s.color_scheme = scheme)?;
                (SettingsPage::Colors, format!("Cambiado el color a {}", scheme))
            }
            other => {
                return Err(PvpcError::validation(
                    "callback".to_string(),
                    format!("unknown action '{}'", other),
                ));
            }
        };

        let current = settings.register(chat.id)?;
        Ok(vec![
            Outgoing::AnswerCallback {
                callback_id: callback_id.to_string(),
                text: answer,
            },
            Outgoing::EditText {
                chat_id: chat.id,
                message_id,
                text: settings_text(page, &current),
                keyboard: Some(keyboard_for(page)),
            },
        ])
    }
}

#[async_trait]
impl CommandHandler for PvpcHandler {
    async fn handle(&self, incoming: &Incoming) -> Result<Vec<Outgoing>> {
        match incoming {
            Incoming::Message { chat, text } => {
                match Command::parse(text, &self.ctx.config.telegram.username)? {
                    Some(command) => self.handle_command(chat, command).await,
                    None => Ok(Vec::new()),
                }
            }
            Incoming::Callback {
                chat,
                message_id,
                callback_id,
                data,
            } => self.handle_callback(chat, *message_id, callback_id, data),
        }
    }
}
