mod common;

use common::{FakeEsios, date, empty_doc, sample_prices};
use pvpc_bot::esios::{CacheStore, CacheWriter, CachedFetcher, Endpoint};
use std::sync::Arc;

fn fetcher(dir: &std::path::Path, fake: Arc<FakeEsios>) -> (CachedFetcher, Arc<CacheStore>) {
    let store = Arc::new(CacheStore::new(dir));
    let writer = CacheWriter::spawn(store.clone(), 8);
    (CachedFetcher::new(store.clone(), writer, fake), store)
}

#[tokio::test]
async fn second_fetch_is_served_locally() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(FakeEsios::with_day(date(), &sample_prices()));
    let (fetcher, store) = fetcher(dir.path(), fake.clone());

    let first = fetcher.get(Endpoint::Prices, date()).await.unwrap();
    // Before the write lands the pending copy is served
    let second = fetcher.get(Endpoint::Prices, date()).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(fake.calls(), 1);

    fetcher.writer().flush().await;
    assert!(store.file_path(Endpoint::Prices, date()).exists());
    assert_eq!(store.get_document(Endpoint::Prices, date()).unwrap(), first);

    let third = fetcher.get(Endpoint::Prices, date()).await.unwrap();
    assert_eq!(third, first);
    assert_eq!(fake.calls(), 1);
}

#[tokio::test]
async fn cache_survives_a_new_fetcher() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(FakeEsios::with_day(date(), &sample_prices()));
    {
        let (fetcher, _) = fetcher(dir.path(), fake.clone());
        fetcher.get(Endpoint::Sections, date()).await.unwrap();
        fetcher.writer().flush().await;
    }

    let other = Arc::new(FakeEsios::default());
    let (fetcher, _) = fetcher(dir.path(), other.clone());
    fetcher.get(Endpoint::Sections, date()).await.unwrap();
    assert_eq!(other.calls(), 0);
}

#[tokio::test]
async fn empty_responses_are_not_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(FakeEsios::default());
    fake.set(Endpoint::Prices, date(), empty_doc());
    let (fetcher, store) = fetcher(dir.path(), fake.clone());

    fetcher.get(Endpoint::Prices, date()).await.unwrap();
    fetcher.writer().flush().await;
    assert!(!store.file_path(Endpoint::Prices, date()).exists());

    // Next request goes to the remote again
    fetcher.get(Endpoint::Prices, date()).await.unwrap();
    assert_eq!(fake.calls(), 2);
}

#[tokio::test]
async fn remote_errors_surface_and_nothing_is_cached() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(FakeEsios::default());
    let (fetcher, store) = fetcher(dir.path(), fake);

    let err = fetcher.get(Endpoint::Prices, date()).await.unwrap_err();
    assert!(matches!(err, pvpc_bot::PvpcError::Network { .. }));
    fetcher.writer().flush().await;
    assert!(!store.file_path(Endpoint::Prices, date()).exists());
}

#[tokio::test]
async fn cache_files_are_pretty_and_keep_non_ascii() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(FakeEsios::with_day(date(), &sample_prices()));
    let (fetcher, store) = fetcher(dir.path(), fake);

    fetcher.get(Endpoint::Prices, date()).await.unwrap();
    fetcher.writer().flush().await;

    let path = store.file_path(Endpoint::Prices, date());
    assert_eq!(path.file_name().unwrap(), "prices_20220103.json");
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("Península"));
    assert!(text.contains("\n  \"indicator\""));
}

#[test]
fn missing_document_is_a_cache_miss() {
    let dir = tempfile::tempdir().unwrap();
    let store = CacheStore::new(dir.path());
    let err = store.get_document(Endpoint::Sections, date()).unwrap_err();
    assert!(err.is_cache_miss());
}

#[tokio::test]
async fn truncated_cache_file_is_refetched_and_repaired() {
    let dir = tempfile::tempdir().unwrap();
    let fake = Arc::new(FakeEsios::with_day(date(), &sample_prices()));
    let (fetcher, store) = fetcher(dir.path(), fake.clone());

    let path = store.file_path(Endpoint::Prices, date());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "{\"indicator\": {\"va").unwrap();
    assert!(store.get_document(Endpoint::Prices, date()).is_err());

    let doc = fetcher.get(Endpoint::Prices, date()).await.unwrap();
    assert_eq!(fake.calls(), 1);
    fetcher.writer().flush().await;

    // The rewritten file is served from now on
    assert_eq!(store.get_document(Endpoint::Prices, date()).unwrap(), doc);
    fetcher.get(Endpoint::Prices, date()).await.unwrap();
    fetcher.get(Endpoint::Prices, date()).await.unwrap();
    assert_eq!(fake.calls(), 1);
}
