use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};

use crate::config::EsiosConfig;
use crate::error::{PvpcError, Result};
use crate::esios::types::Endpoint;
use crate::logging::{StructuredLogger, get_logger};

/// Query timestamp format expected by the upstream API
pub const API_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Source of raw upstream documents
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Perform exactly one remote call for `endpoint` on `date`
    async fn fetch(&self, endpoint: Endpoint, date: NaiveDate) -> Result<serde_json::Value>;
}

/// HTTP client for the ESIOS indicators API
pub struct EsiosClient {
    http: reqwest::Client,
    config: EsiosConfig,
    logger: StructuredLogger,
}

impl EsiosClient {
    /// Create a new client from configuration
    pub fn new(config: EsiosConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            config,
            logger: get_logger("esios"),
        })
    }

    /// Indicator URL for an endpoint
    pub fn url(&self, endpoint: Endpoint) -> String {
        let indicator = match endpoint {
            Endpoint::Prices => self.config.prices_indicator,
            Endpoint::Sections => self.config.sections_indicator,
        };
        format!(
            "{}/indicators/{}",
            self.config.base_url.trim_end_matches('/'),
            indicator
        )
    }

    /// Query parameters for a day; only sent when a token is configured
    pub fn request_params(&self, date: NaiveDate) -> Vec<(&'static str, String)> {
        if self.config.token.trim().is_empty() {
            return Vec::new();
        }
        let (start, end) = day_bounds(date);
        vec![
            ("start_date", start.format(API_DATETIME_FORMAT).to_string()),
            ("end_date", end.format(API_DATETIME_FORMAT).to_string()),
        ]
    }

    fn authorization(&self) -> Option<String> {
        let token = self.config.token.trim();
        (!token.is_empty()).then(|| format!("Token token=\"{}\"", token))
    }
}

/// First and last second of a calendar day
pub fn day_bounds(date: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let start = date.and_time(chrono::NaiveTime::MIN);
    let end = start + Duration::days(1) - Duration::seconds(1);
    (start, end)
}

#[async_trait]
impl RemoteSource for EsiosClient {
    async fn fetch(&self, endpoint: Endpoint, date: NaiveDate) -> Result<serde_json::Value> {
        let url = self.url(endpoint);
        self.logger
            .debug(&format!("Requesting {} for {} from {}", endpoint, date, url));

        let mut request = self
            .http
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json; application/vnd.esios-api-v1+json")
            .header(USER_AGENT, concat!("pvpc-bot/", env!("APP_VERSION")))
            .query(&self.request_params(date));
        if let Some(auth) = self.authorization() {
            request = request.header(AUTHORIZATION, auth);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        decode(status, &body)
            .inspect_err(|e| self.logger.error(&format!("ESIOS request {} failed: {}", url, e)))
    }
}

/// Turn an upstream reply into a JSON document.
///
/// A non-2xx status is a transport failure (`Network`); a body that is not
/// JSON is `Response`.
fn decode(status: StatusCode, body: &str) -> Result<serde_json::Value> {
    if !status.is_success() {
        return Err(PvpcError::network(format!("HTTP {}", status)));
    }
    serde_json::from_str(body)
        .map_err(|_| PvpcError::response(format!("Could not parse response: {}", body)))
}
