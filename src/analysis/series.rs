use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{PvpcError, Result};
use crate::esios::types::{IndicatorDocument, Zone};

/// Regulator-defined tariff section of an hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TariffSection {
    Peak,
    Mid,
    Valley,
}

impl TariffSection {
    pub const ALL: [TariffSection; 3] = [Self::Peak, Self::Mid, Self::Valley];

    /// Map the upstream numeric section value
    pub fn from_id(id: i64) -> Option<Self> {
        match id {
            1 => Some(Self::Peak),
            2 => Some(Self::Mid),
            3 => Some(Self::Valley),
            _ => None,
        }
    }
}

/// Price of one hour of a day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub hour_index: usize,
    pub timestamp: NaiveDateTime,
    /// €/kWh
    pub price: f64,
    pub tariff_section: TariffSection,
}

/// Ordered hourly prices of one calendar day in one zone
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeries {
    date: NaiveDate,
    zone: Zone,
    points: Vec<PricePoint>,
}

impl DailySeries {
    /// Build a series; hour indices must be strictly increasing
    pub fn new(date: NaiveDate, zone: Zone, points: Vec<PricePoint>) -> Result<Self> {
        if points
            .windows(2)
            .any(|w| w[0].hour_index >= w[1].hour_index)
        {
            return Err(PvpcError::validation(
                "hour_index",
                "Hour indices must be strictly increasing",
            ));
        }
        Ok(Self { date, zone, points })
    }

    /// Build a series from consecutive hourly `(price, section)` pairs
    /// starting at midnight of `date`
    pub fn from_hourly(date: NaiveDate, zone: Zone, hourly: &[(f64, TariffSection)]) -> Self {
        let midnight = date.and_time(NaiveTime::MIN);
        let points = hourly
            .iter()
            .enumerate()
            .map(|(i, &(price, tariff_section))| PricePoint {
                hour_index: i,
                timestamp: midnight + chrono::Duration::hours(i as i64),
                price,
                tariff_section,
            })
            .collect();
        Self { date, zone, points }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Parse an upstream timestamp keeping its local wall-clock time
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_local());
    }
    Ok(NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")?)
}

/// Join the hourly prices and tariff sections documents of one day.
///
/// Prices are converted from €/MWh to €/kWh. A price timestamp without a
/// section entry is an error, never a default.
pub fn aggregate(
    prices: &serde_json::Value,
    sections: &serde_json::Value,
    zone: Zone,
    date: NaiveDate,
) -> Result<DailySeries> {
    let prices = IndicatorDocument::from_value(prices)?;
    let sections = IndicatorDocument::from_value(sections)?;

    let geo_id = prices
        .geo_id(zone)
        .ok_or_else(|| PvpcError::unknown_zone(zone.geo_name()))?;

    let mut section_by_time: HashMap<&str, TariffSection> = HashMap::new();
    for v in sections
        .indicator
        .values
        .iter()
        .filter(|v| v.geo_id == geo_id)
    {
        let section = TariffSection::from_id(v.value as i64).ok_or_else(|| {
            PvpcError::response(format!("Unknown tariff section value {}", v.value))
        })?;
        section_by_time.insert(v.datetime.as_str(), section);
    }

    let points = prices
        .indicator
        .values
        .iter()
        .filter(|v| v.geo_id == geo_id)
        .enumerate()
        .map(|(hour_index, v)| -> Result<PricePoint> {
            let tariff_section = *section_by_time
                .get(v.datetime.as_str())
                .ok_or_else(|| PvpcError::missing_section(v.datetime.as_str()))?;
            Ok(PricePoint {
                hour_index,
                timestamp: parse_timestamp(&v.datetime)?,
                price: v.value / 1000.0,
                tariff_section,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    DailySeries::new(date, zone, points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
    }

    fn geos() -> serde_json::Value {
        json!([
            {"geo_id": 8741, "geo_name": "Península"},
            {"geo_id": 8742, "geo_name": "Canarias"}
        ])
    }

    #[test]
    fn aggregate_filters_zone_and_converts_units() {
        let prices = json!({"indicator": {"geos": geos(), "values": [
            {"value": 120.5, "datetime": "2022-01-03T00:00:00.000+01:00", "geo_id": 8741},
            {"value": 999.0, "datetime": "2022-01-03T00:00:00.000+01:00", "geo_id": 8742},
            {"value": 200.0, "datetime": "2022-01-03T01:00:00.000+01:00", "geo_id": 8741}
        ]}});
        let sections = json!({"indicator": {"geos": geos(), "values": [
            {"value": 3, "datetime": "2022-01-03T00:00:00.000+01:00", "geo_id": 8741},
            {"value": 1, "datetime": "2022-01-03T00:00:00.000+01:00", "geo_id": 8742},
            {"value": 2, "datetime": "2022-01-03T01:00:00.000+01:00", "geo_id": 8741}
        ]}});

        let series = aggregate(&prices, &sections, Zone::Peninsula, date()).unwrap();
        assert_eq!(series.len(), 2);
        let p = &series.points()[0];
        assert_eq!(p.hour_index, 0);
        assert!((p.price - 0.1205).abs() < 1e-12);
        assert_eq!(p.tariff_section, TariffSection::Valley);
        assert_eq!(
            p.timestamp,
            date().and_hms_opt(0, 0, 0).unwrap()
        );
        assert_eq!(series.points()[1].tariff_section, TariffSection::Mid);
        assert_eq!(series.points()[1].hour_index, 1);
    }

    #[test]
    fn aggregate_fails_on_missing_section() {
        let prices = json!({"indicator": {"geos": geos(), "values": [
            {"value": 120.5, "datetime": "2022-01-03T00:00:00.000+01:00", "geo_id": 8741}
        ]}});
        let sections = json!({"indicator": {"geos": geos(), "values": [
            {"value": 3, "datetime": "2022-01-03T05:00:00.000+01:00", "geo_id": 8741}
        ]}});
        let err = aggregate(&prices, &sections, Zone::Peninsula, date()).unwrap_err();
        assert!(matches!(err, PvpcError::MissingSection { .. }));
    }

    #[test]
    fn aggregate_fails_on_unknown_zone() {
        let prices = json!({"indicator": {"geos": geos(), "values": []}});
        let sections = json!({"indicator": {"geos": geos(), "values": []}});
        let err = aggregate(&prices, &sections, Zone::Ceuta, date()).unwrap_err();
        assert!(matches!(err, PvpcError::UnknownZone { .. }));
    }

    #[test]
    fn aggregate_rejects_malformed_documents() {
        let err = aggregate(&json!({"foo": 1}), &json!({}), Zone::Peninsula, date()).unwrap_err();
        assert!(matches!(err, PvpcError::Response { .. }));
    }

    #[test]
    fn new_rejects_non_increasing_hours() {
        let mut series = DailySeries::from_hourly(
            date(),
            Zone::Peninsula,
            &[(0.1, TariffSection::Valley), (0.2, TariffSection::Valley)],
        )
        .points()
        .to_vec();
        series[1].hour_index = 0;
        assert!(DailySeries::new(date(), Zone::Peninsula, series).is_err());
    }

    #[test]
    fn parse_timestamp_without_offset() {
        let ts = parse_timestamp("2022-01-03T07:00:00.000").unwrap();
        assert_eq!(ts, date().and_hms_opt(7, 0, 0).unwrap());
    }
}
