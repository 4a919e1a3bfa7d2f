use thiserror::Error;

#[derive(Error, Debug)]
pub enum EsbError {
    #[error("Configuration error: {0}")]
    ConfigurationError(#[from] crate::core::config::ConfigError),

    #[error("Unsupported sign method: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Request failed after {attempts} attempt(s): {last}")]
    TransportError {
        attempts: u32,
        #[source]
        last: Box<EsbError>,
    },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("API error: {status} - {body}")]
    ApiError { status: u16, body: String },
}

impl EsbError {
    /// Whether a single failed attempt may be re-issued unchanged.
    ///
    /// Only transport-level failures qualify; signing and serialization
    /// failures are deterministic.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::HttpError(_) | Self::ApiError { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigError;

    #[test]
    fn test_only_transport_failures_are_retryable() {
        let api = EsbError::ApiError {
            status: 502,
            body: "bad gateway".to_string(),
        };
        assert!(api.is_retryable());

        assert!(!EsbError::UnsupportedAlgorithm("crc32".to_string()).is_retryable());
        assert!(!EsbError::SerializationError("bad".to_string()).is_retryable());
        assert!(!EsbError::from(ConfigError::MissingField("secret")).is_retryable());
    }

    #[test]
    fn test_transport_error_exposes_last_failure() {
        let err = EsbError::TransportError {
            attempts: 3,
            last: Box::new(EsbError::ApiError {
                status: 500,
                body: "boom".to_string(),
            }),
        };

        assert_eq!(
            err.to_string(),
            "Request failed after 3 attempt(s): API error: 500 - boom"
        );
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("API error: 500 - boom"));
    }
}
