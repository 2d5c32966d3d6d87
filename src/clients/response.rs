//! Response handling shared by the EBS and platform clients.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use crate::error::{ClientError, ClientResult};

pub(crate) fn build_client(timeout: Duration) -> ClientResult<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(ClientError::from)
}

/// Join a base URL and a path with exactly one slash between them.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Map the status code to an error or hand back the body text.
pub(crate) async fn read_body(response: Response, path: &str) -> ClientResult<String> {
    let status = response.status();
    let body = response.text().await?;
    debug!(
        event_name = "clients.http.response",
        event_domain = "clients",
        path,
        status = status.as_u16(),
        body_len = body.len(),
        "received response"
    );

    match status {
        s if s.is_success() => Ok(body),
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
        StatusCode::NOT_FOUND => Err(ClientError::NotFound(path.to_string())),
        status => Err(ClientError::Status { status, body }),
    }
}
