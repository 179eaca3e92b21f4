//! Lookup of rotated log files for the admin log commands

use crate::error::{PvpcError, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;

/// Which log stream to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Everything at the configured file level
    Logs,
    /// Warnings and errors only
    Errors,
}

impl LogKind {
    pub fn file_prefix(&self) -> &'static str {
        match self {
            Self::Logs => "bot_logs",
            Self::Errors => "bot_errors",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Logs => "logs",
            Self::Errors => "errors",
        }
    }
}

/// Which rotated file(s) to return
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSelection {
    /// The most recently written file
    Current,
    /// The file rotated for a given day
    Date(NaiveDate),
    /// All rotated files concatenated in date order
    All,
}

/// A log document ready to be sent
#[derive(Debug, Clone)]
pub struct LogDocument {
    pub file_name: String,
    pub contents: Vec<u8>,
}

fn name_matches(file_name: &str, prefix: &str) -> bool {
    file_name == format!("{}.log", prefix)
        || (file_name.starts_with(&format!("{}.", prefix)) && file_name.ends_with(".log"))
}

async fn matching_files(dir: &Path, prefix: &str) -> Result<Vec<(PathBuf, SystemTime)>> {
    let mut found = Vec::new();
    let mut rd = fs::read_dir(dir).await?;
    while let Some(entry) = rd.next_entry().await? {
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if !name_matches(&name, prefix) {
            continue;
        }
        if let Ok(md) = entry.metadata().await
            && md.is_file()
        {
            let modified = md.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            found.push((entry.path(), modified));
        }
    }
    Ok(found)
}

/// Read the selected log file(s) of a kind from `dir`
pub async fn read_logs(dir: &Path, kind: LogKind, selection: LogSelection) -> Result<LogDocument> {
    let prefix = kind.file_prefix();
    let not_found = || PvpcError::io(format!("No {} file available", kind.as_str()));

    match selection {
        LogSelection::Current => {
            let latest = matching_files(dir, prefix)
                .await?
                .into_iter()
                .max_by_key(|(_, modified)| *modified)
                .ok_or_else(not_found)?;
            document_from_path(&latest.0).await
        }
        LogSelection::Date(date) => {
            let path = dir.join(format!("{}.{}.log", prefix, date.format("%Y-%m-%d")));
            if !path.is_file() {
                return Err(not_found());
            }
            document_from_path(&path).await
        }
        LogSelection::All => {
            let mut files = matching_files(dir, prefix).await?;
            if files.is_empty() {
                return Err(not_found());
            }
            // Date-stamped names sort chronologically
            files.sort_by(|a, b| a.0.cmp(&b.0));
            let mut contents = Vec::new();
            for (path, _) in files {
                contents.extend(fs::read(&path).await?);
            }
            Ok(LogDocument {
                file_name: format!("{}_all.log", prefix),
                contents,
            })
        }
    }
}

async fn document_from_path(path: &Path) -> Result<LogDocument> {
    let contents = fs::read(path).await?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("bot.log")
        .to_string();
    Ok(LogDocument {
        file_name,
        contents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_matches() {
        assert!(name_matches("bot_logs.2022-01-03.log", "bot_logs"));
        assert!(name_matches("bot_logs.log", "bot_logs"));
        assert!(!name_matches("bot_errors.2022-01-03.log", "bot_logs"));
        assert!(!name_matches("bot_logs.2022-01-03.txt", "bot_logs"));
    }

    #[tokio::test]
    async fn test_read_all_concatenates_in_date_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bot_errors.2022-01-04.log"), "second\n").unwrap();
        std::fs::write(dir.path().join("bot_errors.2022-01-03.log"), "first\n").unwrap();
        std::fs::write(dir.path().join("bot_logs.2022-01-03.log"), "other\n").unwrap();

        let doc = read_logs(dir.path(), LogKind::Errors, LogSelection::All)
            .await
            .unwrap();
        assert_eq!(doc.contents, b"first\nsecond\n");
        assert_eq!(doc.file_name, "bot_errors_all.log");
    }

    #[tokio::test]
    async fn test_read_by_date_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bot_logs.2022-01-03.log"), "hello").unwrap();

        let date = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        let doc = read_logs(dir.path(), LogKind::Logs, LogSelection::Date(date))
            .await
            .unwrap();
        assert_eq!(doc.file_name, "bot_logs.2022-01-03.log");

        let other = NaiveDate::from_ymd_opt(2022, 1, 4).unwrap();
        assert!(
            read_logs(dir.path(), LogKind::Logs, LogSelection::Date(other))
                .await
                .is_err()
        );
    }
}
