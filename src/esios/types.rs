use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{PvpcError, Result};

/// Upstream indicator endpoints requested per calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Hourly PVPC prices (€/MWh)
    Prices,
    /// Hourly regulated tariff sections
    Sections,
}

impl Endpoint {
    /// Name used for cache file stems
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Prices => "prices",
            Self::Sections => "sections",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Geographic zone a daily series is reported for.
///
/// Serialized with the upstream geo names so settings files stay readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Zone {
    #[default]
    #[serde(rename = "Península")]
    Peninsula,
    #[serde(rename = "Baleares")]
    Baleares,
    #[serde(rename = "Canarias")]
    Canarias,
    #[serde(rename = "Ceuta")]
    Ceuta,
    #[serde(rename = "Melilla")]
    Melilla,
}

impl Zone {
    pub const ALL: [Zone; 5] = [
        Zone::Peninsula,
        Zone::Baleares,
        Zone::Canarias,
        Zone::Ceuta,
        Zone::Melilla,
    ];

    /// Upstream `geo_name` for this zone
    pub fn geo_name(&self) -> &'static str {
        match self {
            Self::Peninsula => "Península",
            Self::Baleares => "Baleares",
            Self::Canarias => "Canarias",
            Self::Ceuta => "Ceuta",
            Self::Melilla => "Melilla",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.geo_name())
    }
}

impl FromStr for Zone {
    type Err = PvpcError;

    fn from_str(s: &str) -> Result<Self> {
        Zone::ALL
            .into_iter()
            .find(|z| z.geo_name() == s)
            .ok_or_else(|| PvpcError::unknown_zone(s))
    }
}

/// Indicator document as returned by the upstream API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorDocument {
    pub indicator: Indicator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indicator {
    #[serde(default)]
    pub values: Vec<IndicatorValue>,
    #[serde(default)]
    pub geos: Vec<Geo>,
}

/// One geo-tagged hourly value
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndicatorValue {
    pub value: f64,
    pub datetime: String,
    pub geo_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geo {
    pub geo_id: i64,
    pub geo_name: String,
}

impl IndicatorDocument {
    /// Decode a raw JSON document, mapping shape errors to `Response`
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        serde_json::from_value(value.clone())
            .map_err(|e| PvpcError::response(format!("Unexpected indicator document: {}", e)))
    }

    /// Resolve the internal geo id for a zone
    pub fn geo_id(&self, zone: Zone) -> Option<i64> {
        self.indicator
            .geos
            .iter()
            .find(|g| g.geo_name == zone.geo_name())
            .map(|g| g.geo_id)
    }
}

/// Whether a raw document carries at least one data value
pub fn has_values(value: &serde_json::Value) -> bool {
    value
        .get("indicator")
        .and_then(|i| i.get("values"))
        .and_then(|v| v.as_array())
        .is_some_and(|v| !v.is_empty())
}
