//! Chat command parsing
//!
//! Commands are `/name [args...]`, optionally addressed as `/name@botname`.
//! Dates use the `DD/MM/YYYY` format.

use chrono::NaiveDate;

use crate::error::{PvpcError, Result};
use crate::logging::LogSelection;

/// Date format accepted in command arguments
pub const COMMAND_DATE_FORMAT: &str = "%d/%m/%Y";

/// Commands reserved to administrators
pub const ADMIN_COMMANDS: [&str; 5] = ["users", "logs", "errors", "op", "deop"];

/// A parsed chat command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    /// Report for a day, today when absent
    Prices { date: Option<NaiveDate> },
    /// Report for the day after `date` (or after today)
    Next { date: Option<NaiveDate> },
    /// Sorted report, or cheapest windows of `width` hours when given
    Analysis {
        date: Option<NaiveDate>,
        width: Option<usize>,
    },
    Settings,
    Users,
    Logs(LogSelection),
    Errors(LogSelection),
    /// Grant admin rights; `None` when the argument is missing or malformed
    Op(Option<i64>),
    Deop(Option<i64>),
}

impl Command {
    /// Name without the leading slash
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "ayuda",
            Self::Prices { .. } => "precios",
            Self::Next { .. } => "siguientes",
            Self::Analysis { .. } => "analisis",
            Self::Settings => "ajustes",
            Self::Users => "users",
            Self::Logs(_) => "logs",
            Self::Errors(_) => "errors",
            Self::Op(_) => "op",
            Self::Deop(_) => "deop",
        }
    }

    pub fn is_admin(&self) -> bool {
        is_admin_command(self.name())
    }

    /// Parse a message text.
    ///
    /// `Ok(None)` for plain text, unknown commands and commands addressed to
    /// another bot. A malformed date argument is an error.
    pub fn parse(text: &str, bot_username: &str) -> Result<Option<Self>> {
        let Some(name) = command_name(text, bot_username) else {
            return Ok(None);
        };
        let args: Vec<&str> = text.split_whitespace().skip(1).collect();

        let command = match name {
            "start" => Self::Start,
            "ayuda" => Self::Help,
            "precios" => Self::Prices {
                date: first_date(&args)?,
            },
            "siguientes" => Self::Next {
                date: first_date(&args)?,
            },
            "analisis" => {
                let mut date = None;
                let mut width = None;
                for arg in &args {
                    if arg.contains('/') {
                        date.get_or_insert(parse_date(arg)?);
                    } else if let Ok(n) = arg.parse::<usize>() {
                        width.get_or_insert(n);
                    }
                }
                Self::Analysis { date, width }
            }
            "ajustes" => Self::Settings,
            "users" => Self::Users,
            "logs" => Self::Logs(log_selection(&args)?),
            "errors" => Self::Errors(log_selection(&args)?),
            "op" => Self::Op(args.first().and_then(|a| a.parse().ok())),
            "deop" => Self::Deop(args.first().and_then(|a| a.parse().ok())),
            _ => return Ok(None),
        };
        Ok(Some(command))
    }
}

/// Whether a command name is reserved to administrators
pub fn is_admin_command(name: &str) -> bool {
    ADMIN_COMMANDS.contains(&name)
}

/// Command name of a message without slash and bot suffix.
///
/// Returns `None` for non-commands and for commands addressed to a different
/// bot. An unset username (`"@"` or empty) accepts any suffix.
pub fn command_name<'a>(text: &'a str, bot_username: &str) -> Option<&'a str> {
    let first = text.split_whitespace().next()?.strip_prefix('/')?;
    let (name, target) = match first.split_once('@') {
        Some((name, target)) => (name, Some(target)),
        None => (first, None),
    };
    let own = bot_username.trim_start_matches('@');
    if let Some(target) = target
        && !own.is_empty()
        && !target.eq_ignore_ascii_case(own)
    {
        return None;
    }
    (!name.is_empty()).then_some(name)
}

fn parse_date(arg: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(arg, COMMAND_DATE_FORMAT)
        .map_err(|e| PvpcError::validation("date".to_string(), format!("'{}': {}", arg, e)))
}

fn first_date(args: &[&str]) -> Result<Option<NaiveDate>> {
    args.iter()
        .find(|a| a.contains('/'))
        .map(|a| parse_date(a))
        .transpose()
}

fn log_selection(args: &[&str]) -> Result<LogSelection> {
    match args.first() {
        None => Ok(LogSelection::Current),
        Some(arg) if arg.eq_ignore_ascii_case("all") => Ok(LogSelection::All),
        Some(arg) => Ok(LogSelection::Date(parse_date(arg)?)),
    }
}
