use reqwest::Url;
use serde_json::Value;
use thiserror::Error;

/// Failure of a single HTTP GET against the trip API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("server responded with HTTP {status}")]
    Status { status: u16 },
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether another attempt at the same request might succeed.
    ///
    /// Network-level failures, 5xx responses and 429 throttling are transient.
    /// Client errors, malformed URLs and undecodable bodies are not.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Network(_) => true,
            TransportError::Status { status } => *status >= 500 || *status == 429,
            TransportError::InvalidRequest(_) | TransportError::Decode(_) => false,
        }
    }
}

/// Blocking GET returning a decoded JSON body.
pub trait HttpClient {
    fn get_json(&self, url: &Url) -> Result<Value, TransportError>;
}

impl<C: HttpClient + ?Sized> HttpClient for &C {
    fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        (**self).get_json(url)
    }
}

impl<C: HttpClient + ?Sized> HttpClient for Box<C> {
    fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        (**self).get_json(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::Network("connection reset".into()).is_transient());
        assert!(TransportError::Status { status: 500 }.is_transient());
        assert!(TransportError::Status { status: 503 }.is_transient());
        assert!(TransportError::Status { status: 429 }.is_transient());

        assert!(!TransportError::Status { status: 400 }.is_transient());
        assert!(!TransportError::Status { status: 404 }.is_transient());
        assert!(!TransportError::InvalidRequest("bad url".into()).is_transient());
        assert!(!TransportError::Decode("not json".into()).is_transient());
    }
}
