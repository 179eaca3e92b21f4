//! Price service: daily series for a date and zone

use chrono::NaiveDate;

use crate::analysis::{DailySeries, aggregate};
use crate::error::{PvpcError, Result};
use crate::esios::types::has_values;
use crate::esios::{CachedFetcher, Endpoint, Zone};
use crate::logging::{StructuredLogger, get_logger};

/// Fetches both upstream documents for a day and joins them
pub struct PriceService {
    fetcher: CachedFetcher,
    logger: StructuredLogger,
}

impl PriceService {
    pub fn new(fetcher: CachedFetcher) -> Self {
        Self {
            fetcher,
            logger: get_logger("prices"),
        }
    }

    pub fn fetcher(&self) -> &CachedFetcher {
        &self.fetcher
    }

    /// Hourly prices of `date` in `zone`.
    ///
    /// An empty series (prices not yet published) is a `NoData` error.
    pub async fn daily_series(&self, date: NaiveDate, zone: Zone) -> Result<DailySeries> {
        let prices = self.fetcher.get(Endpoint::Prices, date).await?;
        if !has_values(&prices) {
            self.logger.info(&format!("Prices for {} not published yet", date));
            return Err(PvpcError::no_data(date.to_string()));
        }
        let sections = self.fetcher.get(Endpoint::Sections, date).await?;

        let series = aggregate(&prices, &sections, zone, date)?;
        if series.is_empty() {
            self.logger
                .warn(&format!("No prices available for {} in {}", date, zone));
            return Err(PvpcError::no_data(date.to_string()));
        }
        self.logger.debug(&format!(
            "Built series for {} in {} with {} points",
            date,
            zone,
            series.len()
        ));
        Ok(series)
    }
}
