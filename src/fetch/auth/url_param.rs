use reqwest::Url;
use serde_json::Value;

use crate::fetch::client::{HttpClient, TransportError};

/// Query parameter the open-data API reads its application token from.
pub const APP_TOKEN_PARAM: &str = "$$app_token";

/// An [`HttpClient`] wrapper that appends a key as a URL query parameter.
///
/// The data API serves anonymous requests but throttles them harder; an
/// application token lifts the limit.
pub struct UrlParam<C> {
    pub inner: C,
    pub param_name: String,
    pub key: String,
}

impl<C> UrlParam<C> {
    pub fn app_token(inner: C, token: String) -> Self {
        Self {
            inner,
            param_name: APP_TOKEN_PARAM.to_string(),
            key: token,
        }
    }
}

impl<C: HttpClient> HttpClient for UrlParam<C> {
    fn get_json(&self, url: &Url) -> Result<Value, TransportError> {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair(&self.param_name, &self.key);
        self.inner.get_json(&url)
    }
}
