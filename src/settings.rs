//! Per-chat user settings and their repository
//!
//! Every chat has one `UserSettings` record, persisted as
//! `<chat-id>_settings.json` in the settings directory. Mutations are written
//! to disk before they return.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

use crate::error::{PvpcError, Result};
use crate::esios::Zone;
use crate::logging::{StructuredLogger, get_logger};
use crate::persistence::{load_json, store_json};

/// File name of the combined settings snapshot
pub const SNAPSHOT_FILE: &str = "system_settings.json";

const SETTINGS_SUFFIX: &str = "_settings.json";

/// How hours are colored in reports and charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ColorScheme {
    /// Relative to the day's low/high percentiles
    #[default]
    #[serde(rename = "percentiles")]
    Percentiles,
    /// By regulated tariff section
    #[serde(rename = "tramos")]
    Sections,
}

impl ColorScheme {
    pub const ALL: [ColorScheme; 2] = [Self::Percentiles, Self::Sections];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percentiles => "percentiles",
            Self::Sections => "tramos",
        }
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorScheme {
    type Err = PvpcError;

    fn from_str(s: &str) -> Result<Self> {
        ColorScheme::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                PvpcError::validation("colors".to_string(), format!("unknown scheme '{}'", s))
            })
    }
}

/// Settings of one chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub subscribed: bool,
    #[serde(rename = "timezone")]
    pub zone: Zone,
    #[serde(rename = "colors")]
    pub color_scheme: ColorScheme,
    #[serde(default)]
    pub admin: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            subscribed: true,
            zone: Zone::Peninsula,
            color_scheme: ColorScheme::Percentiles,
            admin: false,
        }
    }
}

/// Storage of user settings keyed by chat id
pub trait SettingsRepository: Send + Sync {
    /// Settings of a chat, if registered
    fn get(&self, chat_id: i64) -> Option<UserSettings>;

    /// Register a chat with default settings; no-op if already known
    fn register(&self, chat_id: i64) -> Result<UserSettings>;

    /// Apply `change` to a chat's settings and persist them, registering the
    /// chat first when needed
    fn update(
        &self,
        chat_id: i64,
        change: &mut dyn FnMut(&mut UserSettings),
    ) -> Result<UserSettings>;

    /// All registered chats, ordered by id
    fn all(&self) -> Vec<(i64, UserSettings)>;

    /// Write the combined snapshot and return where it was stored
    fn write_snapshot(&self) -> Result<PathBuf>;

    fn subscribers(&self) -> Vec<i64> {
        self.all()
            .into_iter()
            .filter(|(_, s)| s.subscribed)
            .map(|(id, _)| id)
            .collect()
    }

    fn admins(&self) -> Vec<i64> {
        self.all()
            .into_iter()
            .filter(|(_, s)| s.admin)
            .map(|(id, _)| id)
            .collect()
    }

    fn is_admin(&self, chat_id: i64) -> bool {
        self.get(chat_id).is_some_and(|s| s.admin)
    }

    /// Combined `{chat_id: settings}` document
    fn snapshot_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&snapshot_map(self))?)
    }
}

/// Settings repository backed by one JSON file per chat
pub struct FileSettingsStore {
    dir: PathBuf,
    users: Mutex<BTreeMap<i64, UserSettings>>,
    defaults: UserSettings,
    logger: StructuredLogger,
}

impl FileSettingsStore {
    /// Open a settings directory, loading every `<id>_settings.json` in it
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let logger = get_logger("settings");
        std::fs::create_dir_all(&dir)?;

        let mut users = BTreeMap::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(chat_id) = chat_id_from_path(&path) else {
                continue;
            };
            match load_json::<UserSettings>(&path) {
                Ok(settings) => {
                    users.insert(chat_id, settings);
                }
                Err(e) => logger.warn(&format!(
                    "Skipping unreadable settings file {}: {}",
                    path.display(),
                    e
                )),
            }
        }
        logger.info(&format!("Loaded settings for {} chats", users.len()));

        Ok(Self {
            dir,
            users: Mutex::new(users),
            defaults: UserSettings::default(),
            logger,
        })
    }

    /// Settings given to newly registered chats
    pub fn with_defaults(mut self, defaults: UserSettings) -> Self {
        self.defaults = defaults;
        self
    }

    /// Path of a chat's settings file
    pub fn file_path(&self, chat_id: i64) -> PathBuf {
        self.dir.join(format!("{}{}", chat_id, SETTINGS_SUFFIX))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<i64, UserSettings>>> {
        self.users
            .lock()
            .map_err(|_| PvpcError::generic("settings lock poisoned"))
    }
}

fn snapshot_map<R: SettingsRepository + ?Sized>(repo: &R) -> BTreeMap<String, UserSettings> {
    repo.all()
        .into_iter()
        .map(|(id, s)| (id.to_string(), s))
        .collect()
}

fn chat_id_from_path(path: &Path) -> Option<i64> {
    path.file_name()?
        .to_str()?
        .strip_suffix(SETTINGS_SUFFIX)?
        .parse()
        .ok()
}

impl SettingsRepository for FileSettingsStore {
    fn get(&self, chat_id: i64) -> Option<UserSettings> {
        self.lock().ok()?.get(&chat_id).cloned()
    }

    fn register(&self, chat_id: i64) -> Result<UserSettings> {
        let mut users = self.lock()?;
        if let Some(existing) = users.get(&chat_id) {
            return Ok(existing.clone());
        }
        let settings = self.defaults.clone();
        store_json(&settings, &self.file_path(chat_id))?;
        users.insert(chat_id, settings.clone());
        self.logger.for_chat(chat_id).info("Registered new chat");
        Ok(settings)
    }

    fn update(
        &self,
        chat_id: i64,
        change: &mut dyn FnMut(&mut UserSettings),
    ) -> Result<UserSettings> {
        let mut users = self.lock()?;
        let mut settings = users
            .get(&chat_id)
            .cloned()
            .unwrap_or_else(|| self.defaults.clone());
        change(&mut settings);
        store_json(&settings, &self.file_path(chat_id))?;
        users.insert(chat_id, settings.clone());
        Ok(settings)
    }

    fn all(&self) -> Vec<(i64, UserSettings)> {
        self.lock()
            .map(|users| users.iter().map(|(id, s)| (*id, s.clone())).collect())
            .unwrap_or_default()
    }

    /// Write the combined snapshot next to the per-chat files
    fn write_snapshot(&self) -> Result<PathBuf> {
        let path = self.dir.join(SNAPSHOT_FILE);
        store_json(&snapshot_map(self), &path)?;
        Ok(path)
    }
}
