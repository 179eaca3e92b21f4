//! Error types and handling for PVPC Bot
//!
//! This module defines the error types used throughout the application,
//! providing consistent error handling and reporting.

use thiserror::Error;

/// Result type alias for PVPC Bot operations
pub type Result<T> = std::result::Result<T, PvpcError>;

/// Main error type for PVPC Bot
#[derive(Debug, Error)]
pub enum PvpcError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Transport failures talking to the upstream API (includes HTTP status errors)
    #[error("Network error: {message}")]
    Network { message: String },

    /// Upstream payload could not be decoded
    #[error("Response error: {message}")]
    Response { message: String },

    /// No cached document for the requested endpoint and date
    #[error("Document not found: {endpoint} {date}")]
    DocumentNotFound { endpoint: String, date: String },

    /// A price timestamp has no matching tariff section entry
    #[error("Missing tariff section for {timestamp}")]
    MissingSection { timestamp: String },

    /// The requested zone is not listed in the prices document
    #[error("Unknown zone: {zone}")]
    UnknownZone { zone: String },

    /// The daily series is empty (prices not published yet)
    #[error("No price data available for {date}")]
    NoData { date: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Telegram Bot API errors
    #[error("Telegram error: {message}")]
    Telegram { message: String },

    /// Chart rendering errors
    #[error("Chart error: {message}")]
    Chart { message: String },

    /// Generic errors with context
    #[error("Error: {message}")]
    Generic { message: String },
}

impl PvpcError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        PvpcError::Config {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        PvpcError::Io {
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization<S: Into<String>>(message: S) -> Self {
        PvpcError::Serialization {
            message: message.into(),
        }
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        PvpcError::Network {
            message: message.into(),
        }
    }

    /// Create a new response decoding error
    pub fn response<S: Into<String>>(message: S) -> Self {
        PvpcError::Response {
            message: message.into(),
        }
    }

    /// Create a new cache miss error
    pub fn document_not_found<S: Into<String>>(endpoint: S, date: S) -> Self {
        PvpcError::DocumentNotFound {
            endpoint: endpoint.into(),
            date: date.into(),
        }
    }

    /// Create a new missing section error
    pub fn missing_section<S: Into<String>>(timestamp: S) -> Self {
        PvpcError::MissingSection {
            timestamp: timestamp.into(),
        }
    }

    /// Create a new unknown zone error
    pub fn unknown_zone<S: Into<String>>(zone: S) -> Self {
        PvpcError::UnknownZone { zone: zone.into() }
    }

    /// Create a new no data error
    pub fn no_data<S: Into<String>>(date: S) -> Self {
        PvpcError::NoData { date: date.into() }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        PvpcError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new Telegram error
    pub fn telegram<S: Into<String>>(message: S) -> Self {
        PvpcError::Telegram {
            message: message.into(),
        }
    }

    /// Create a new chart error
    pub fn chart<S: Into<String>>(message: S) -> Self {
        PvpcError::Chart {
            message: message.into(),
        }
    }

    /// Create a new generic error
    pub fn generic<S: Into<String>>(message: S) -> Self {
        PvpcError::Generic {
            message: message.into(),
        }
    }

    /// Whether this error is the internal cache-miss signal
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, PvpcError::DocumentNotFound { .. })
    }
}

impl From<std::io::Error> for PvpcError {
    fn from(err: std::io::Error) -> Self {
        PvpcError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for PvpcError {
    fn from(err: serde_yaml::Error) -> Self {
        PvpcError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for PvpcError {
    fn from(err: serde_json::Error) -> Self {
        PvpcError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for PvpcError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PvpcError::response(err.to_string())
        } else {
            PvpcError::network(err.to_string())
        }
    }
}

impl From<teloxide::RequestError> for PvpcError {
    fn from(err: teloxide::RequestError) -> Self {
        PvpcError::telegram(err.to_string())
    }
}

impl From<chrono::ParseError> for PvpcError {
    fn from(err: chrono::ParseError) -> Self {
        PvpcError::validation("datetime".to_string(), err.to_string())
    }
}
