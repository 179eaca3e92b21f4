//! ESIOS (Red Eléctrica) upstream integration
//!
//! Raw indicator documents are fetched per calendar day, cached on disk and
//! handed to the analysis layer as JSON values.

pub mod cache;
pub mod client;
pub mod types;

pub use cache::{CacheStore, CacheWriter, CachedFetcher};
pub use client::{EsiosClient, RemoteSource};
pub use types::{Endpoint, IndicatorDocument, Zone};
