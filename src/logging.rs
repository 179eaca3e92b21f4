//! Structured logging and tracing for PVPC Bot
//!
//! This module provides logging with daily log rotation into two files, a
//! general log and an error log, plus lookup helpers so administrators can
//! fetch those files through the bot.

use crate::config::LoggingConfig;
use crate::error::{PvpcError, Result};
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub mod files;
pub mod level;
pub mod state;
pub mod structured;

pub use files::{LogDocument, LogKind, LogSelection, read_logs};
pub use level::{min_level, parse_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

use state::{INIT_ERROR, INIT_ONCE, LOG_GUARDS};

/// Initialize logging system based on configuration
pub fn init_logging(config: &LoggingConfig, logs_dir: &Path) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let base_level = parse_log_level(&config.level)?;

            let console_level = config
                .console_level
                .as_ref()
                .and_then(|s| parse_log_level(s).ok())
                .unwrap_or(base_level);
            let file_level = config
                .file_level
                .as_ref()
                .and_then(|s| parse_log_level(s).ok())
                .unwrap_or(base_level);

            let filter = build_env_filter(min_level(console_level, file_level));

            if should_use_console_only() {
                init_console_only_logging(filter, config.json_format, console_level);
                return Ok(());
            }

            init_file_logging(config, logs_dir, filter, console_level, file_level)
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(PvpcError::config(err.clone()));
    }
    Ok(())
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("pvpc_bot={},teloxide=warn,reqwest=warn", level).into()
    })
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os("PVPC_DISABLE_FILE_LOG").is_some()
}

fn init_console_only_logging(filter: EnvFilter, json_format: bool, console_level: Level) {
    let console_layer = {
        let layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if json_format {
            layer
                .json()
                .with_filter(LevelFilter::from_level(console_level))
                .boxed()
        } else {
            layer
                .with_filter(LevelFilter::from_level(console_level))
                .boxed()
        }
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();

    info!(
        "Logging initialized - console_level: {:?}, console-only",
        console_level
    );
}

fn rolling_appender(
    logs_dir: &Path,
    kind: LogKind,
    backup_count: u32,
) -> Result<rolling::RollingFileAppender> {
    rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix(kind.file_prefix())
        .filename_suffix("log")
        .max_log_files(backup_count.max(1) as usize)
        .build(logs_dir)
        .map_err(|e| PvpcError::io(format!("Failed to create log file appender: {}", e)))
}

fn init_file_logging(
    config: &LoggingConfig,
    logs_dir: &Path,
    filter: EnvFilter,
    console_level: Level,
    file_level: Level,
) -> Result<()> {
    std::fs::create_dir_all(logs_dir)?;

    let (general_writer, general_guard) =
        non_blocking(rolling_appender(logs_dir, LogKind::Logs, config.backup_count)?);
    let (errors_writer, errors_guard) =
        non_blocking(rolling_appender(logs_dir, LogKind::Errors, config.backup_count)?);
    let _ = LOG_GUARDS.set(vec![general_guard, errors_guard]);

    let general_layer = {
        let base = fmt::layer()
            .with_writer(general_writer)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if config.json_format {
            base.json()
                .with_filter(LevelFilter::from_level(file_level))
                .boxed()
        } else {
            base.with_filter(LevelFilter::from_level(file_level))
                .boxed()
        }
    };

    let errors_layer = {
        let base = fmt::layer()
            .with_writer(errors_writer)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if config.json_format {
            base.json().with_filter(LevelFilter::WARN).boxed()
        } else {
            base.with_filter(LevelFilter::WARN).boxed()
        }
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(general_layer)
        .with(errors_layer);

    let init = if config.console_output {
        let console_layer = {
            let base = fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false);
            if config.json_format {
                base.json()
                    .with_filter(LevelFilter::from_level(console_level))
                    .boxed()
            } else {
                base.with_filter(LevelFilter::from_level(console_level))
                    .boxed()
            }
        };
        subscriber.with(console_layer).try_init()
    } else {
        subscriber.try_init()
    };
    init.map_err(|e| PvpcError::config(format!("Failed to install subscriber: {}", e)))?;

    info!(
        "Logging initialized - console_level: {:?}, file_level: {:?}, dir: {}",
        console_level,
        file_level,
        logs_dir.display()
    );
    Ok(())
}
