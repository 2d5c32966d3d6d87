use std::time::Duration;

use http::header::{ACCEPT, AUTHORIZATION};
use http::Method;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::response::{build_client, join_url, read_body};
use crate::config::EbsConfig;
use crate::error::{ClientError, ClientResult};
use crate::models::token::decode_claims;
use crate::models::Substate;
use crate::utils::parse_value;

/// Client for the extension backend service that persists extension state.
#[derive(Clone, Debug)]
pub struct EbsClient {
    base_url: String,
    http: reqwest::Client,
}

impl EbsClient {
    pub fn new(base_url: &str, timeout: Duration) -> ClientResult<Self> {
        info!("Creating EBS client for '{}'", base_url);
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: build_client(timeout)?,
        })
    }

    pub fn from_config(config: &EbsConfig) -> ClientResult<Self> {
        let base_url = config
            .base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ClientError::Config("ebs.base_url is not set".to_string()))?;
        Self::new(base_url, Duration::from_millis(config.timeout_in_ms))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request signed with the extension token.
    ///
    /// Malformed or expired tokens are rejected before anything goes on the
    /// wire. Successful bodies are run through [`parse_value`], an empty body
    /// is `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: Option<&Value>,
    ) -> ClientResult<Value> {
        if token.trim().is_empty() {
            return Err(ClientError::MissingToken);
        }
        let claims = decode_claims(token)?;
        if claims.exp <= chrono::Utc::now().timestamp() {
            warn!(
                event_name = "clients.ebs.token_expired",
                event_domain = "clients",
                path,
                exp = claims.exp,
                "refusing to send EBS request with an expired token"
            );
            return Err(ClientError::TokenExpired);
        }

        let url = join_url(&self.base_url, path);
        debug!(
            event_name = "clients.ebs.request",
            event_domain = "clients",
            method = method.as_str(),
            url = url.as_str(),
            "sending EBS request"
        );

        let mut builder = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let text = read_body(builder.send().await?, path).await?;
        if text.trim().is_empty() {
            Ok(Value::Null)
        } else {
            Ok(parse_value(&text))
        }
    }

    /// GET /state: every substate in one object keyed by "<name>_state".
    pub async fn fetch_state(&self, token: &str) -> ClientResult<Value> {
        self.request(Method::GET, "/state", token, None).await
    }

    pub async fn fetch_substate(&self, kind: Substate, token: &str) -> ClientResult<Value> {
        self.request(Method::GET, &kind.path(), token, None).await
    }

    /// Replace a substate.
    pub async fn save_substate(
        &self,
        kind: Substate,
        value: &Value,
        token: &str,
    ) -> ClientResult<Value> {
        self.request(Method::POST, &kind.path(), token, Some(value))
            .await
    }

    /// Merge `patch` into a substate on the EBS side.
    pub async fn update_substate(
        &self,
        kind: Substate,
        patch: &Value,
        token: &str,
    ) -> ClientResult<Value> {
        self.request(Method::PATCH, &kind.path(), token, Some(patch))
            .await
    }

    pub async fn delete_substate(&self, kind: Substate, token: &str) -> ClientResult<()> {
        self.request(Method::DELETE, &kind.path(), token, None)
            .await
            .map(|_| ())
    }

    /// Unsigned liveness probe. Any failure reads as "not healthy".
    pub async fn health(&self) -> bool {
        let url = join_url(&self.base_url, "/health");
        match self.http.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("EBS health check against {} failed: {}", url, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MockToken, Role};
    use chrono::Duration as ChronoDuration;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn valid_token() -> String {
        MockToken::new(Role::Viewer, "555").sign(None).unwrap()
    }

    fn client(url: &str) -> EbsClient {
        EbsClient::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_substate_sends_bearer_and_coerces_body() {
        let token = valid_token();
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/viewer_state")
            .match_header("authorization", format!("Bearer {}", token).as_str())
            .match_header("accept", "application/json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"votes": "[1,2,3]", "nickname": "bob"}"#)
            .create_async()
            .await;

        let value = client(&server.url())
            .fetch_substate(Substate::Viewer, &token)
            .await
            .expect("request should succeed");
        m.assert_async().await;
        assert_eq!(value, json!({"votes": [1, 2, 3], "nickname": "bob"}));
    }

    #[tokio::test]
    async fn test_save_substate_posts_json() {
        let token = valid_token();
        let mut server = Server::new_async().await;
        let m = server
            .mock("POST", "/channel_state")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(json!({"theme": "dark"})))
            .with_status(204)
            .create_async()
            .await;

        let result = client(&server.url())
            .save_substate(Substate::Channel, &json!({"theme": "dark"}), &token)
            .await
            .expect("request should succeed");
        m.assert_async().await;
        assert_eq!(result, Value::Null);
    }

    #[tokio::test]
    async fn test_update_and_delete_use_their_methods() {
        let token = valid_token();
        let mut server = Server::new_async().await;
        let patch = server
            .mock("PATCH", "/extension_state")
            .match_body(Matcher::Json(json!({"enabled": true})))
            .with_status(200)
            .with_body(r#"{"enabled": true, "version": "2"}"#)
            .create_async()
            .await;
        let delete = server
            .mock("DELETE", "/aggregate_state")
            .with_status(200)
            .create_async()
            .await;

        let ebs = client(&server.url());
        let merged = ebs
            .update_substate(Substate::Extension, &json!({"enabled": true}), &token)
            .await
            .unwrap();
        assert_eq!(merged, json!({"enabled": true, "version": 2}));
        ebs.delete_substate(Substate::Aggregate, &token).await.unwrap();
        patch.assert_async().await;
        delete.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_token_never_reaches_the_server() {
        let token = MockToken::new(Role::Viewer, "555")
            .with_ttl(ChronoDuration::seconds(-5))
            .sign(None)
            .unwrap();
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let ebs = client(&server.url());
        assert!(matches!(
            ebs.fetch_state(&token).await,
            Err(ClientError::TokenExpired)
        ));
        assert!(matches!(
            ebs.fetch_state("not.a-token").await,
            Err(ClientError::MalformedToken(_))
        ));
        assert!(matches!(
            ebs.fetch_state("").await,
            Err(ClientError::MissingToken)
        ));
        m.assert_async().await;
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let token = valid_token();
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/user_state")
            .with_status(401)
            .create_async()
            .await;
        server
            .mock("GET", "/viewer_state")
            .with_status(404)
            .create_async()
            .await;
        server
            .mock("GET", "/channel_state")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let ebs = client(&server.url());
        assert!(matches!(
            ebs.fetch_substate(Substate::User, &token).await,
            Err(ClientError::Unauthorized)
        ));
        assert!(matches!(
            ebs.fetch_substate(Substate::Viewer, &token).await,
            Err(ClientError::NotFound(path)) if path == "/viewer_state"
        ));
        match ebs.fetch_substate(Substate::Channel, &token).await {
            Err(ClientError::Status { status, body }) => {
                assert_eq!(status.as_u16(), 500);
                assert_eq!(body, "boom");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/health")
            .with_status(200)
            .with_body("OK")
            .create_async()
            .await;
        assert!(client(&server.url()).health().await);
        assert!(!client("http://127.0.0.1:1").health().await);
    }

    #[test]
    fn test_from_config_requires_base_url() {
        let config = EbsConfig {
            base_url: None,
            mock: false,
            fallback_to_mock: false,
            timeout_in_ms: 100,
        };
        assert!(matches!(
            EbsClient::from_config(&config),
            Err(ClientError::Config(_))
        ));
    }
}
