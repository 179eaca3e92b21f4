//! Analytical core: joins the two upstream documents into a daily series,
//! summarizes it and searches cheapest consecutive hours.

pub mod series;
pub mod summary;
pub mod windows;

pub use series::{DailySeries, PricePoint, TariffSection, aggregate, parse_timestamp};
pub use summary::{
    PriceBand, Summary, classify, max_point, mean, min_point, percentile, summarize,
};
pub use windows::{PriceWindow, find_windows};
