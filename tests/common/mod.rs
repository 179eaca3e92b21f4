#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use pvpc_bot::error::{PvpcError, Result};
use pvpc_bot::esios::{Endpoint, RemoteSource};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const PENINSULA: i64 = 8741;
pub const CANARIAS: i64 = 8742;

pub fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap()
}

fn geos() -> Value {
    json!([
        {"geo_id": PENINSULA, "geo_name": "Península"},
        {"geo_id": CANARIAS, "geo_name": "Canarias"}
    ])
}

fn stamp(date: NaiveDate, hour: u32) -> String {
    format!("{}T{:02}:00:00.000+01:00", date.format("%Y-%m-%d"), hour)
}

/// Prices in €/MWh for Península; Canarias gets a flat 500
pub fn prices_doc(date: NaiveDate, mwh: &[f64]) -> Value {
    let mut values = Vec::new();
    for (hour, price) in mwh.iter().enumerate() {
        let hour = u32::try_from(hour).unwrap();
        values.push(json!({"value": price, "datetime": stamp(date, hour), "geo_id": PENINSULA}));
        values.push(json!({"value": 500.0, "datetime": stamp(date, hour), "geo_id": CANARIAS}));
    }
    json!({"indicator": {"geos": geos(), "values": values}})
}

/// 2.0TD sections: valley 0-7, peak 10-13 and 18-21, mid otherwise
pub fn sections_doc(date: NaiveDate, hours: usize) -> Value {
    let mut values = Vec::new();
    for hour in 0..hours {
        let section = match hour {
            0..=7 => 3,
            10..=13 | 18..=21 => 1,
            _ => 2,
        };
        let hour = u32::try_from(hour).unwrap();
        values.push(json!({"value": section, "datetime": stamp(date, hour), "geo_id": PENINSULA}));
        values.push(json!({"value": section, "datetime": stamp(date, hour), "geo_id": CANARIAS}));
    }
    json!({"indicator": {"geos": geos(), "values": values}})
}

pub fn empty_doc() -> Value {
    json!({"indicator": {"geos": geos(), "values": []}})
}

/// Typical winter day in €/MWh
pub fn sample_prices() -> Vec<f64> {
    vec![
        120.0, 110.0, 105.0, 100.0, 98.0, 99.0, 115.0, 140.0, 180.0, 200.0, 230.0, 250.0,
        240.0, 220.0, 190.0, 170.0, 175.0, 210.0, 260.0, 280.0, 270.0, 230.0, 180.0, 150.0,
    ]
}

/// In-memory upstream that counts remote calls per endpoint
#[derive(Default)]
pub struct FakeEsios {
    documents: Mutex<HashMap<(Endpoint, NaiveDate), Value>>,
    calls: AtomicUsize,
}

impl FakeEsios {
    pub fn with_day(date: NaiveDate, mwh: &[f64]) -> Self {
        let fake = Self::default();
        fake.set(Endpoint::Prices, date, prices_doc(date, mwh));
        fake.set(Endpoint::Sections, date, sections_doc(date, mwh.len()));
        fake
    }

    pub fn set(&self, endpoint: Endpoint, date: NaiveDate, doc: Value) {
        self.documents.lock().unwrap().insert((endpoint, date), doc);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteSource for FakeEsios {
    async fn fetch(&self, endpoint: Endpoint, date: NaiveDate) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.documents
            .lock()
            .unwrap()
            .get(&(endpoint, date))
            .cloned()
            .ok_or_else(|| PvpcError::network("HTTP 503 Service Unavailable"))
    }
}
