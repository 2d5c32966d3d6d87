use tracing::{debug, info, warn};

use super::user_store::UserStore;
use crate::clients::PlatformClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{AuthToken, UserAction, UserState};

/// Fills a [`UserStore`] from the extension token and, for viewers that shared
/// their identity, one platform user lookup.
pub struct UserAggregator {
    platform: Option<PlatformClient>,
    extension_secret: Option<String>,
}

impl UserAggregator {
    pub fn new(platform: Option<PlatformClient>, extension_secret: Option<String>) -> Self {
        Self {
            platform,
            extension_secret,
        }
    }

    /// Decode a raw token, verifying its signature if a secret is configured.
    pub fn parse_token(&self, raw: &str) -> ClientResult<AuthToken> {
        AuthToken::parse_with_secret(raw, self.extension_secret.as_deref())
    }

    /// Replace the store contents with what `token` (and the platform) say about the user.
    ///
    /// Platform failures are logged and leave the token-derived fields in
    /// place; only an expired token is an error.
    pub async fn populate(
        &self,
        store: &UserStore,
        token: &AuthToken,
        platform_token: Option<&str>,
    ) -> ClientResult<UserState> {
        if token.is_expired() {
            return Err(ClientError::TokenExpired);
        }

        store.dispatch(UserAction::Reset).await;
        store.dispatch(UserAction::SetFromToken(token.clone())).await;
        debug!(
            event_name = "aggregator.user.token_applied",
            event_domain = "aggregator",
            role = token.role().as_str(),
            linked = token.is_linked(),
            "user fields copied from token"
        );

        if let Some(user_id) = token.user_id().filter(|_| token.is_linked()) {
            self.apply_platform_user(store, user_id, platform_token).await;
        }

        store.dispatch(UserAction::MarkLoaded).await;
        let state = store.snapshot().await;
        info!(
            "User state loaded for opaque id '{}' (role={})",
            token.opaque_user_id(),
            state.role
        );
        Ok(state)
    }

    async fn apply_platform_user(&self, store: &UserStore, user_id: &str, platform_token: Option<&str>) {
        let (Some(platform), Some(platform_token)) = (
            self.platform.as_ref(),
            platform_token.filter(|t| !t.trim().is_empty()),
        ) else {
            debug!("No platform client or token, skipping user lookup for '{}'", user_id);
            return;
        };

        match platform.get_user(user_id, platform_token).await {
            Ok(Some(user)) => store.dispatch(UserAction::SetFromPlatform(user)).await,
            Ok(None) => warn!("Platform returned no record for user '{}'", user_id),
            Err(e) => warn!(
                event_name = "aggregator.user.platform_failed",
                event_domain = "aggregator",
                user_id,
                error = %e,
                "platform user lookup failed, keeping token fields only"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MockToken, Role};
    use chrono::Duration as ChronoDuration;
    use mockito::{Matcher, Server};
    use std::time::Duration;

    fn token(user_id: Option<&str>) -> AuthToken {
        let mut mock = MockToken::new(Role::Viewer, "555");
        if let Some(id) = user_id {
            mock = mock.with_user_id(id);
        }
        AuthToken::parse(&mock.sign(None).unwrap()).unwrap()
    }

    fn aggregator(url: &str) -> UserAggregator {
        let platform = PlatformClient::new(url, "client-abc", Duration::from_secs(5)).unwrap();
        UserAggregator::new(Some(platform), None)
    }

    #[tokio::test]
    async fn test_linked_user_gets_platform_fields() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/users")
            .match_query(Matcher::UrlEncoded("id".into(), "42".into()))
            .with_status(200)
            .with_body(r#"{"data": [{"id": "42", "login": "dev", "display_name": "Dev"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let store = UserStore::new();
        let state = aggregator(&server.url())
            .populate(&store, &token(Some("42")), Some("helix"))
            .await
            .expect("populate should succeed");
        m.assert_async().await;
        assert_eq!(state.id.as_deref(), Some("42"));
        assert_eq!(state.display_name.as_deref(), Some("Dev"));
        assert_eq!(state.channel_id.as_deref(), Some("555"));
        assert!(state.loaded);
        assert_eq!(store.snapshot().await, state);
    }

    #[tokio::test]
    async fn test_unlinked_user_makes_no_request() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let state = aggregator(&server.url())
            .populate(&UserStore::new(), &token(None), Some("helix"))
            .await
            .unwrap();
        m.assert_async().await;
        assert!(state.id.is_none());
        assert!(!state.is_linked);
        assert!(state.loaded);
    }

    #[tokio::test]
    async fn test_platform_failure_keeps_token_fields() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/users")
            .match_query(Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let state = aggregator(&server.url())
            .populate(&UserStore::new(), &token(Some("42")), Some("helix"))
            .await
            .unwrap();
        assert_eq!(state.id.as_deref(), Some("42"));
        assert!(state.login.is_none());
        assert!(state.loaded);
    }

    #[tokio::test]
    async fn test_missing_platform_token_skips_lookup() {
        let state = UserAggregator::new(None, None)
            .populate(&UserStore::new(), &token(Some("42")), None)
            .await
            .unwrap();
        assert_eq!(state.id.as_deref(), Some("42"));
        assert!(state.display_name.is_none());
    }

    #[tokio::test]
    async fn test_expired_token_leaves_store_untouched() {
        let raw = MockToken::new(Role::Viewer, "555")
            .with_ttl(ChronoDuration::seconds(-1))
            .sign(None)
            .unwrap();
        let expired = AuthToken::parse(&raw).unwrap();
        let store = UserStore::new();
        store.dispatch(UserAction::SetFromToken(token(Some("7")))).await;

        let result = UserAggregator::new(None, None)
            .populate(&store, &expired, None)
            .await;
        assert!(matches!(result, Err(ClientError::TokenExpired)));
        assert_eq!(store.snapshot().await.id.as_deref(), Some("7"));
    }

    #[test]
    fn test_parse_token_verifies_with_secret() {
        let raw = MockToken::new(Role::Viewer, "1").sign(None).unwrap();
        let strict = UserAggregator::new(None, Some("c2VjcmV0".to_string()));
        assert!(matches!(
            strict.parse_token(&raw),
            Err(ClientError::InvalidSignature(_))
        ));
        assert!(UserAggregator::new(None, None).parse_token(&raw).is_ok());
    }
}
