mod common;

use async_trait::async_trait;
use common::{FakeEsios, date, sample_prices};
use pvpc_bot::bot::{BotContext, Outbox, Outgoing};
use pvpc_bot::config::Config;
use pvpc_bot::error::{PvpcError, Result};
use pvpc_bot::esios::{CacheStore, CacheWriter, CachedFetcher};
use pvpc_bot::prices::PriceService;
use pvpc_bot::scheduler::{DailyPush, PushOutcome};
use pvpc_bot::settings::{FileSettingsStore, SettingsRepository};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Records delivered actions and fails for one chat
struct RecordingOutbox {
    failing_chat: i64,
    delivered: Mutex<Vec<Outgoing>>,
}

#[async_trait]
impl Outbox for RecordingOutbox {
    async fn deliver(&self, action: Outgoing) -> Result<()> {
        if action.chat_id() == Some(self.failing_chat) {
            return Err(PvpcError::telegram("Forbidden: bot was blocked by the user"));
        }
        self.delivered.lock().unwrap().push(action);
        Ok(())
    }
}

fn context(dir: &TempDir, fake: FakeEsios) -> Arc<BotContext> {
    let mut config = Config::default();
    config.storage.data_dir = dir.path().to_string_lossy().to_string();
    let config = Arc::new(config);

    let store = Arc::new(CacheStore::new(config.storage.cache_dir()));
    let writer = CacheWriter::spawn(store.clone(), 8);
    let fetcher = CachedFetcher::new(store, writer, Arc::new(fake));
    let settings: Arc<dyn SettingsRepository> =
        Arc::new(FileSettingsStore::open(config.storage.settings_dir()).unwrap());
    Arc::new(
        BotContext::new(PriceService::new(fetcher), settings, config)
            .unwrap()
            .with_clock(Arc::new(date)),
    )
}

#[tokio::test]
async fn push_skips_unsubscribed_and_isolates_failures() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir, FakeEsios::with_day(date(), &sample_prices()));
    for chat in [1, 2, 3] {
        ctx.settings.register(chat).unwrap();
    }
    ctx.settings.update(3, &mut |s| s.subscribed = false).unwrap();

    let outbox = Arc::new(RecordingOutbox {
        failing_chat: 1,
        delivered: Mutex::new(Vec::new()),
    });
    let push = DailyPush::new(ctx, outbox.clone());

    let outcome = push.push(date()).await;
    assert_eq!(outcome, PushOutcome { sent: 1, failed: 1 });

    let delivered = outbox.delivered.lock().unwrap();
    assert_eq!(delivered.len(), 2);
    assert!(delivered.iter().all(|a| a.chat_id() == Some(2)));
    assert!(matches!(delivered[0], Outgoing::Document { .. }));
}

#[tokio::test]
async fn push_counts_missing_data_as_failures() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir, FakeEsios::default());
    ctx.settings.register(4).unwrap();

    let outbox = Arc::new(RecordingOutbox {
        failing_chat: 0,
        delivered: Mutex::new(Vec::new()),
    });
    let outcome = DailyPush::new(ctx, outbox.clone()).push(date()).await;

    assert_eq!(outcome, PushOutcome { sent: 0, failed: 1 });
    assert!(outbox.delivered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn push_with_no_subscribers_is_a_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context(&dir, FakeEsios::with_day(date(), &sample_prices()));
    let outbox = Arc::new(RecordingOutbox {
        failing_chat: 0,
        delivered: Mutex::new(Vec::new()),
    });
    let outcome = DailyPush::new(ctx, outbox).push(date()).await;
    assert_eq!(outcome, PushOutcome::default());
}
