use crate::{Error, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use std::time::Duration;

const APP_USER_AGENT: &str = concat!("mcpkg/", env!("CARGO_PKG_VERSION"));

pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(APP_USER_AGENT)
        .timeout(timeout)
        .build()?)
}

/// Send a request, turning transport failures into readable errors.
///
/// Non-success statuses are returned untouched so callers can map 404s.
pub fn send(request: RequestBuilder, url: &str) -> Result<Response> {
    tracing::debug!(%url, "GET");
    request.send().map_err(|e| {
        if e.is_connect() {
            Error::Network(format!(
                "Cannot connect to {}\n\
                 Please check your network connection and the configured URL.",
                url
            ))
        } else if e.is_timeout() {
            Error::Network(format!("Request to {} timed out", url))
        } else {
            Error::Network(format!("Request to {} failed: {}", url, e))
        }
    })
}

/// Error for an unexpected HTTP status
pub fn status_error(status: StatusCode, url: &str) -> Error {
    match status.as_u16() {
        500 | 502 | 503 | 504 => Error::Network(format!(
            "Server error (HTTP {}) from {}.\n\
             The service is experiencing issues. Please try again later.",
            status.as_u16(),
            url
        )),
        code => Error::Network(format!("HTTP {} from {}", code, url)),
    }
}

/// GET `url` and return the body, failing on any non-success status
pub fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>> {
    let response = send(client.get(url), url)?;
    let status = response.status();
    if !status.is_success() {
        return Err(status_error(status, url));
    }
    Ok(response.bytes()?.to_vec())
}
