use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use super::client::{HttpClient, TransportError};

/// [`HttpClient`] backed by a blocking `reqwest` client.
pub struct BasicClient(reqwest::blocking::Client);

impl BasicClient {
    pub fn new() -> anyhow::Result<Self> {
        Self::from_builder(reqwest::blocking::Client::builder())
    }

    fn from_builder(builder: reqwest::blocking::ClientBuilder) -> anyhow::Result<Self> {
        let client = builder
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self(client))
    }
}

impl HttpClient for BasicClient {
    fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        let resp = self.0.get(url.clone()).send().map_err(classify)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body = resp.json::<Value>().map_err(classify)?;
        debug!(url = %url, "API request succeeded");
        Ok(body)
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_builder() {
        TransportError::InvalidRequest(err.to_string())
    } else if err.is_decode() {
        TransportError::Decode(err.to_string())
    } else {
        TransportError::Network(err.to_string())
    }
}
