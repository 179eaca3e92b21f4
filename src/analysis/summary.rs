use chrono::NaiveDate;
use serde::Serialize;

use crate::analysis::series::{DailySeries, PricePoint, TariffSection};
use crate::error::{PvpcError, Result};

/// Statistical bucket of an hour's price relative to its day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PriceBand {
    High,
    Mid,
    Valley,
}

impl PriceBand {
    pub const ALL: [PriceBand; 3] = [Self::High, Self::Mid, Self::Valley];
}

/// Classify a price against the low/high percentile thresholds.
///
/// HIGH is checked first, then VALLEY; MID is the fallback.
pub fn classify(price: f64, low: f64, high: f64) -> PriceBand {
    if price > high {
        PriceBand::High
    } else if price < low {
        PriceBand::Valley
    } else {
        PriceBand::Mid
    }
}

/// Nearest-rank percentile: the price at index `ceil(N * p / 100)` of the
/// ascending order, clamped to the last element.
///
/// Returns `None` for an empty series.
pub fn percentile(series: &DailySeries, p: u8) -> Option<f64> {
    let n = series.len();
    if n == 0 {
        return None;
    }
    let mut prices: Vec<f64> = series.points().iter().map(|pt| pt.price).collect();
    prices.sort_by(f64::total_cmp);
    let index = (n * usize::from(p.min(100))).div_ceil(100).min(n - 1);
    prices.get(index).copied()
}

/// Arithmetic mean over all points or one tariff section; 0 when nothing matches
pub fn mean(series: &DailySeries, section: Option<TariffSection>) -> f64 {
    let (sum, count) = series
        .points()
        .iter()
        .filter(|pt| section.is_none_or(|s| pt.tariff_section == s))
        .fold((0.0, 0usize), |(sum, count), pt| (sum + pt.price, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

/// Cheapest point, first occurrence on ties
pub fn min_point(series: &DailySeries) -> Option<&PricePoint> {
    series
        .points()
        .iter()
        .fold(None, |best: Option<&PricePoint>, pt| match best {
            Some(b) if b.price <= pt.price => Some(b),
            _ => Some(pt),
        })
}

/// Most expensive point, first occurrence on ties
pub fn max_point(series: &DailySeries) -> Option<&PricePoint> {
    series
        .points()
        .iter()
        .fold(None, |best: Option<&PricePoint>, pt| match best {
            Some(b) if b.price >= pt.price => Some(b),
            _ => Some(pt),
        })
}

/// Read-only aggregate over one daily series
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub date: NaiveDate,
    pub mean: f64,
    pub low_percentile: f64,
    pub high_percentile: f64,
    pub min: PricePoint,
    pub max: PricePoint,
    /// Mean per regulated section, in `TariffSection::ALL` order
    pub section_means: [(TariffSection, f64); 3],
}

impl Summary {
    /// Percentile band of a price under this day's thresholds
    pub fn band(&self, price: f64) -> PriceBand {
        classify(price, self.low_percentile, self.high_percentile)
    }

    pub fn section_mean(&self, section: TariffSection) -> f64 {
        self.section_means
            .iter()
            .find(|(s, _)| *s == section)
            .map_or(0.0, |(_, m)| *m)
    }
}

/// Summarize a series with the given low/high percentiles (0-100)
pub fn summarize(series: &DailySeries, low: u8, high: u8) -> Result<Summary> {
    let no_data = || PvpcError::no_data(series.date().to_string());
    let min = min_point(series).ok_or_else(no_data)?.clone();
    let max = max_point(series).ok_or_else(no_data)?.clone();
    let low_percentile = percentile(series, low).ok_or_else(no_data)?;
    let high_percentile = percentile(series, high).ok_or_else(no_data)?;

    Ok(Summary {
        date: series.date(),
        mean: mean(series, None),
        low_percentile,
        high_percentile,
        min,
        max,
        section_means: TariffSection::ALL.map(|s| (s, mean(series, Some(s)))),
    })
}
