use serde::Serialize;

use crate::analysis::series::DailySeries;

/// A contiguous run of `width` hours and its summed price
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceWindow {
    pub start_hour: usize,
    /// Display label only, wraps at 24
    pub end_hour: usize,
    pub width: usize,
    pub total: f64,
}

impl PriceWindow {
    /// Mean hourly price of the window
    pub fn mean(&self) -> f64 {
        if self.width == 0 {
            0.0
        } else {
            self.total / self.width as f64
        }
    }
}

/// Every window of exactly `width` consecutive hours, cheapest first.
///
/// Windows that would run past the end of the series are not considered.
/// Equal totals keep their start order.
pub fn find_windows(width: usize, series: &DailySeries) -> Vec<PriceWindow> {
    let points = series.points();
    if width == 0 || width > points.len() {
        return Vec::new();
    }

    let mut windows: Vec<PriceWindow> = points
        .windows(width)
        .enumerate()
        .map(|(start, run)| PriceWindow {
            start_hour: start,
            end_hour: (start + width) % 24,
            width,
            total: run.iter().map(|p| p.price).sum(),
        })
        .collect();
    windows.sort_by(|a, b| a.total.total_cmp(&b.total));
    windows
}
