//! Plumbing shared by the token fetchers: client construction, URL resolution
//! and response classification.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use tracing::{debug, error};

use crate::errors::Error;

pub(crate) const USER_AGENT: &str = concat!("sdk-auth-rust/", env!("CARGO_PKG_VERSION"));

pub(crate) fn build_client(disable_ssl: bool, timeout: Option<Duration>) -> Result<Client, Error> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .danger_accept_invalid_certs(disable_ssl);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))
}

pub(crate) fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, Error> {
    let mut map = HeaderMap::with_capacity(headers.len() + 1);
    map.insert(ACCEPT, HeaderValue::from_static("application/json"));
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| Error::Config(format!("Invalid header name '{name}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::Config(format!("Invalid value for header '{name}': {e}")))?;
        map.insert(name, value);
    }
    Ok(map)
}

/// Appends `path` to `base` unless `base` already ends with it.
pub(crate) fn resolve_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if base.ends_with(path) {
        base.to_string()
    } else {
        format!("{base}{path}")
    }
}

/// Sends the request and returns the body of a 2xx response.
pub(crate) async fn send_for_body(request: RequestBuilder, operation: &str) -> Result<String, Error> {
    let resp: Response = request.send().await?;
    let status = resp.status();
    let body = resp.text().await?;
    if status.is_success() {
        debug!(operation, status = status.as_u16(), body_len = body.len(), "token.response");
        Ok(body)
    } else {
        error!(operation, status = status.as_u16(), body = %body, "token.response.rejected");
        Err(Error::Authentication { status, body })
    }
}
