use std::time::Duration;

use cached::Return;
#[allow(unused_imports)]
use cached::proc_macro::cached;
use http::header::{ACCEPT, AUTHORIZATION};
use http::Method;
use tracing::{debug, info};

use super::response::{build_client, join_url, read_body};
use crate::config::PlatformConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::platform_user::{DataEnvelope, PlatformUser};
use crate::utils::log_throttle::should_emit;

const CACHE_HIT_LOG_WINDOW: Duration = Duration::from_secs(30);
const CLIENT_ID_HEADER: &str = "Client-Id";

/// Client for the third-party platform API, signed with the extension's
/// client id and the platform token handed to the extension.
#[derive(Clone, Debug)]
pub struct PlatformClient {
    base_url: String,
    client_id: String,
    http: reqwest::Client,
}

impl PlatformClient {
    pub fn new(base_url: &str, client_id: &str, timeout: Duration) -> ClientResult<Self> {
        if client_id.trim().is_empty() {
            return Err(ClientError::Config("platform.client_id is empty".to_string()));
        }
        info!(
            "Creating platform client for '{}', client_id='{}'",
            base_url, client_id
        );
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            http: build_client(timeout)?,
        })
    }

    pub fn from_config(config: &PlatformConfig) -> ClientResult<Self> {
        Self::new(
            &config.base_url,
            &config.client_id,
            Duration::from_millis(config.timeout_in_ms),
        )
    }

    /// Send a request with the `Client-Id` header and `Extension` authorization.
    /// Returns the raw body text of a successful response.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        platform_token: &str,
    ) -> ClientResult<String> {
        if platform_token.trim().is_empty() {
            return Err(ClientError::MissingToken);
        }
        let url = join_url(&self.base_url, path);
        debug!(
            event_name = "clients.platform.request",
            event_domain = "clients",
            method = method.as_str(),
            url = url.as_str(),
            query_len = query.len(),
            "sending platform request"
        );

        let response = self
            .http
            .request(method, &url)
            .query(query)
            .header(CLIENT_ID_HEADER, &self.client_id)
            .header(AUTHORIZATION, format!("Extension {}", platform_token))
            .header(ACCEPT, "application/json")
            .send()
            .await?;
        read_body(response, path).await
    }

    /// GET /users for a batch of ids. No ids, no request.
    pub async fn get_users(
        &self,
        ids: &[&str],
        platform_token: &str,
    ) -> ClientResult<Vec<PlatformUser>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query: Vec<(&str, &str)> = ids.iter().map(|id| ("id", *id)).collect();
        let body = self
            .request(Method::GET, "/users", &query, platform_token)
            .await?;
        let envelope: DataEnvelope<PlatformUser> = serde_json::from_str(&body)
            .map_err(|e| ClientError::decode(format!("invalid users response: {}", e)))?;
        Ok(envelope.data)
    }

    /// Look up a single user. Found users are cached for a minute per user
    /// id; a miss is not cached, so a user who shows up later is picked up on
    /// the next call.
    pub async fn get_user(
        &self,
        id: &str,
        platform_token: &str,
    ) -> ClientResult<Option<PlatformUser>> {
        let user = match lookup_user(self, id, platform_token).await {
            Ok(user) => user,
            Err(ClientError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };
        if user.was_cached {
            if let Some(suppressed_count) =
                should_emit("clients.platform.user.cache.hit", CACHE_HIT_LOG_WINDOW)
            {
                debug!(
                    event_name = "clients.platform.user.cache.hit",
                    event_domain = "clients",
                    user_id = id,
                    cache_result = "hit",
                    cache_ttl_seconds = 60,
                    suppressed_count,
                    "platform user served from cache"
                );
            }
        }
        Ok(Some((*user).clone()))
    }
}

#[cfg_attr(
    not(test),
    cached(
        time = 60,
        result = true,
        with_cached_flag = true,
        key = "String",
        convert = r#"{ format!("{}|{}|{}", client.base_url, client.client_id, id) }"#
    )
)]
async fn lookup_user(
    client: &PlatformClient,
    id: &str,
    platform_token: &str,
) -> ClientResult<Return<PlatformUser>> {
    // Only `Ok` is cached; an absent user comes back as `NotFound`.
    let users = client.get_users(&[id], platform_token).await?;
    users
        .into_iter()
        .find(|user| user.id == id)
        .map(Return::new)
        .ok_or_else(|| ClientError::NotFound(format!("/users?id={}", id)))
}
