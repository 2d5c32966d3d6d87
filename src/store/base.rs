use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, warn};

use super::{ebs_store::EbsStore, mock_store::MockStore};
use crate::clients::EbsClient;
use crate::config::EbsConfig;
use crate::error::ClientResult;
use crate::models::{AuthToken, Substate};

/// Persistence for the extension state partitions.
///
/// Absent substates load as `Value::Null` on every implementation.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Every stored substate in one object keyed by "<name>_state".
    async fn load_all(&self) -> ClientResult<Value>;
    async fn load(&self, kind: Substate) -> ClientResult<Value>;
    async fn save(&self, kind: Substate, value: Value) -> ClientResult<()>;
    /// Shallow-merge `patch` into the stored object and return the result.
    async fn update(&self, kind: Substate, patch: Value) -> ClientResult<Value>;
    async fn remove(&self, kind: Substate) -> ClientResult<()>;
    fn is_mock(&self) -> bool {
        // Real stores keep the default, MockStore overrides it
        false
    }
}

/// Pick the store for this configuration.
///
/// The mock store is used when configured (or when no EBS URL is set). With
/// `fallback_to_mock`, an EBS that fails its health check is replaced by the
/// mock store as well.
pub async fn create_store(config: &EbsConfig, token: AuthToken) -> ClientResult<Arc<dyn StateStore>> {
    if config.use_mock() {
        info!("EBS is not configured or mock mode is on. Using MockStore.");
        return Ok(Arc::new(MockStore::new()));
    }

    let client = EbsClient::from_config(config)?;
    if config.fallback_to_mock && !client.health().await {
        warn!(
            event_name = "store.ebs.unhealthy",
            event_domain = "store",
            base_url = client.base_url(),
            "EBS failed its health check, falling back to MockStore"
        );
        return Ok(Arc::new(MockStore::new()));
    }

    info!("Using EBS store at {}", client.base_url());
    Ok(Arc::new(EbsStore::new(client, token)))
}

/// Shallow object merge: keys of `patch` overwrite keys of `target`. A patch
/// that is not an object, or a target that is not one, replaces the target.
pub(crate) fn merge_shallow(target: Value, patch: Value) -> Value {
    match (target, patch) {
        (Value::Object(mut base), Value::Object(changes)) => {
            base.extend(changes);
            Value::Object(base)
        }
        (_, patch) => patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MockToken, Role};
    use serde_json::json;

    fn token() -> AuthToken {
        AuthToken::parse(&MockToken::new(Role::Viewer, "1").sign(None).unwrap()).unwrap()
    }

    #[test]
    fn test_merge_shallow() {
        assert_eq!(
            merge_shallow(json!({"a": 1, "b": {"x": 1}}), json!({"b": {"y": 2}, "c": 3})),
            json!({"a": 1, "b": {"y": 2}, "c": 3})
        );
        assert_eq!(merge_shallow(json!({"a": 1}), json!([1])), json!([1]));
        assert_eq!(merge_shallow(Value::Null, json!({"a": 1})), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_mock_mode_yields_mock_store() {
        let config = EbsConfig {
            base_url: Some("https://ebs.example.com".to_string()),
            mock: true,
            fallback_to_mock: false,
            timeout_in_ms: 100,
        };
        let store = create_store(&config, token()).await.unwrap();
        assert!(store.is_mock());
    }

    #[tokio::test]
    async fn test_unhealthy_ebs_falls_back_when_allowed() {
        let mut config = EbsConfig {
            base_url: Some("http://127.0.0.1:1".to_string()),
            mock: false,
            fallback_to_mock: true,
            timeout_in_ms: 500,
        };
        assert!(create_store(&config, token()).await.unwrap().is_mock());

        config.fallback_to_mock = false;
        assert!(!create_store(&config, token()).await.unwrap().is_mock());
    }
}
