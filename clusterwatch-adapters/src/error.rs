//! Error types for adapters.

use clusterwatch_types::{ErrorKind, ReadingError};
use thiserror::Error;

/// Errors that can occur when querying a metric.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The adapter is not usable as configured (e.g. empty endpoint).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The credential provider could not supply credentials.
    #[error("Credentials unavailable: {0}")]
    Credentials(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Authentication failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The server rejected the query or returned an unexpected result.
    #[error("Query failed: {0}")]
    Query(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The query returned an empty result.
    #[error("No data for metric: {0}")]
    NoData(String),
}

impl AdapterError {
    /// The reading-level classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Config(_) | AdapterError::Credentials(_) => ErrorKind::Config,
            AdapterError::Connection(_) | AdapterError::Http(_) | AdapterError::Timeout => {
                ErrorKind::Transport
            }
            AdapterError::Auth(_) | AdapterError::Query(_) | AdapterError::Parse(_) => {
                ErrorKind::Query
            }
            AdapterError::NoData(_) => ErrorKind::NoData,
        }
    }
}

impl From<&AdapterError> for ReadingError {
    fn from(err: &AdapterError) -> Self {
        ReadingError::new(err.kind(), err.to_string())
    }
}

impl From<AdapterError> for ReadingError {
    fn from(err: AdapterError) -> Self {
        ReadingError::from(&err)
    }
}

#[cfg(feature = "prometheus")]
impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::Timeout
        } else if err.is_connect() {
            AdapterError::Connection(err.to_string())
        } else {
            AdapterError::Http(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(AdapterError::Config("x".into()).kind(), ErrorKind::Config);
        assert_eq!(AdapterError::Credentials("x".into()).kind(), ErrorKind::Config);
        assert_eq!(AdapterError::Timeout.kind(), ErrorKind::Transport);
        assert_eq!(AdapterError::Connection("x".into()).kind(), ErrorKind::Transport);
        assert_eq!(AdapterError::Http("x".into()).kind(), ErrorKind::Transport);
        assert_eq!(AdapterError::Auth("x".into()).kind(), ErrorKind::Query);
        assert_eq!(AdapterError::Query("x".into()).kind(), ErrorKind::Query);
        assert_eq!(AdapterError::Parse("x".into()).kind(), ErrorKind::Query);
        assert_eq!(AdapterError::NoData("up".into()).kind(), ErrorKind::NoData);
    }

    #[test]
    fn test_into_reading_error() {
        let reading: ReadingError = AdapterError::NoData("up".into()).into();
        assert_eq!(reading.kind, ErrorKind::NoData);
        assert_eq!(reading.message, "No data for metric: up");
    }
}
