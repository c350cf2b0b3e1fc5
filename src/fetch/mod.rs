//! Paginated retrieval of raw trip records from the open-data API.

mod basic;
mod client;
mod paginate;
mod query;
mod retry;
pub mod auth;

pub use basic::BasicClient;
pub use client::{HttpClient, TransportError};
pub use paginate::fetch_all;
pub use query::{DateRange, page_params, page_url};
pub use retry::{RetryPolicy, RetryingClient};

use serde_json::Value;

/// Fetches one page of raw records at `offset`.
///
/// # Errors
///
/// Propagates the transport error of the underlying client. A body that is
/// not a JSON array is reported as a non-transient [`TransportError::Decode`].
pub fn fetch_page<C: HttpClient + ?Sized>(
    client: &C,
    base_url: &str,
    range: &DateRange,
    limit: usize,
    offset: usize,
) -> Result<Vec<Value>, TransportError> {
    let url = page_url(base_url, range, limit, offset)?;

    match client.get_json(&url)? {
        Value::Array(records) => Ok(records),
        other => Err(TransportError::Decode(format!(
            "expected a JSON array of records, got {}",
            json_kind(&other)
        ))),
    }
}

/// Builds the production client stack: blocking HTTP, retries, and an
/// optional application token.
pub fn build_client(
    app_token: Option<String>,
    policy: RetryPolicy,
) -> anyhow::Result<Box<dyn HttpClient>> {
    let retrying = RetryingClient::new(BasicClient::new()?, policy);
    let client: Box<dyn HttpClient> = match app_token {
        Some(token) => Box::new(auth::UrlParam::app_token(retrying, token)),
        None => Box::new(retrying),
    };
    Ok(client)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
