use anyhow::{Context, Result};
use pvpc_bot::bot::{self, BotContext, CommandHandler, Outbox, TelegramOutbox};
use pvpc_bot::esios::{CacheStore, CacheWriter, CachedFetcher, EsiosClient};
use pvpc_bot::logging::init_logging;
use pvpc_bot::prices::PriceService;
use pvpc_bot::scheduler::DailyPush;
use pvpc_bot::settings::{FileSettingsStore, SettingsRepository, UserSettings};
use pvpc_bot::{APP_VERSION, Config};
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::Bot;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let explicit = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(explicit.as_deref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    init_logging(&config.logging, &config.storage.logs_dir())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    info!("PVPC Bot {} starting up", APP_VERSION);

    let config = Arc::new(config);

    // Upstream documents: disk cache in front of the ESIOS API
    let store = Arc::new(CacheStore::new(config.storage.cache_dir()));
    let writer = CacheWriter::spawn(store.clone(), config.cache_writer_capacity);
    let client = EsiosClient::new(config.esios.clone())?;
    let fetcher = CachedFetcher::new(store, writer.clone(), Arc::new(client));

    let settings = FileSettingsStore::open(config.storage.settings_dir())?.with_defaults(
        UserSettings {
            zone: config.analysis.default_zone,
            ..UserSettings::default()
        },
    );
    let settings: Arc<dyn SettingsRepository> = Arc::new(settings);
    if config.telegram.admin_enabled {
        bot::ensure_admins(settings.as_ref(), &config.telegram.admins)?;
    }

    let ctx = Arc::new(BotContext::new(
        PriceService::new(fetcher),
        settings,
        config.clone(),
    )?);

    let telegram = Bot::new(&config.telegram.token);
    let outbox: Arc<dyn Outbox> = Arc::new(TelegramOutbox::new(telegram.clone()));
    let handler: Arc<dyn CommandHandler> = Arc::new(bot::build_handler(ctx.clone()));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let push_task = if config.schedule.enabled {
        let push = DailyPush::new(ctx.clone(), outbox.clone());
        let time = config.schedule.push_time()?;
        let tz = config.schedule.tz()?;
        Some(tokio::spawn(push.run(time, tz, shutdown_rx)))
    } else {
        info!("Daily push disabled");
        None
    };

    bot::transport::run(telegram, handler, outbox).await;

    info!("Dispatcher stopped, shutting down");
    let _ = shutdown_tx.send(true);
    if let Some(task) = push_task
        && let Err(e) = task.await
    {
        error!("Daily push task failed: {}", e);
    }
    writer.flush().await;
    info!("Shutdown complete");
    Ok(())
}
