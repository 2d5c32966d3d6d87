//! Wiring for the command line entrypoint.
//!
//! Builds the clients from configuration, resolves the extension token,
//! aggregates the user fields and loads the persisted state.

use serde_json::{json, Value};
use tracing::{info, warn};

use crate::aggregator::{UserAggregator, UserStore};
use crate::clients::PlatformClient;
use crate::config::ConfigV1;
use crate::error::{ClientError, ClientResult};
use crate::models::{MockToken, Role};
use crate::store::create_store;

/// Environment variable holding the extension JWT.
pub const TOKEN_ENV: &str = "EXTENSION_TOKEN";
/// Environment variable holding the platform token for user lookups.
pub const PLATFORM_TOKEN_ENV: &str = "PLATFORM_TOKEN";

/// Channel used for tokens minted in mock mode.
const MOCK_CHANNEL_ID: &str = "000000";

fn resolve_token(config: &ConfigV1, provided: Option<String>) -> ClientResult<String> {
    match provided.filter(|t| !t.trim().is_empty()) {
        Some(token) => Ok(token),
        None if config.ebs.use_mock() => {
            warn!("No {} set, minting a mock broadcaster token", TOKEN_ENV);
            MockToken::new(Role::Broadcaster, MOCK_CHANNEL_ID)
                .sign(config.platform.extension_secret.as_deref())
        }
        None => Err(ClientError::MissingToken),
    }
}

/// Load the user and all extension state for one token.
///
/// Returns `{"mock": bool, "user": {...}, "state": {...}}`.
pub async fn run(
    config: &ConfigV1,
    token: Option<String>,
    platform_token: Option<String>,
) -> ClientResult<Value> {
    let raw = resolve_token(config, token)?;

    // Without a platform token there is nothing to look up, so the platform
    // client (and its client id) is only needed when one is present.
    let platform_token = platform_token.filter(|t| !t.trim().is_empty());
    let platform = match &platform_token {
        Some(_) => Some(PlatformClient::from_config(&config.platform)?),
        None => None,
    };
    let aggregator = UserAggregator::new(platform, config.platform.extension_secret.clone());
    let token = aggregator.parse_token(&raw)?;

    let users = UserStore::new();
    let user = aggregator
        .populate(&users, &token, platform_token.as_deref())
        .await?;

    let store = create_store(&config.ebs, token).await?;
    let state = store.load_all().await?;
    info!(
        "Loaded extension state (mock={}) for channel {:?}",
        store.is_mock(),
        user.channel_id
    );

    Ok(json!({
        "mock": store.is_mock(),
        "user": user,
        "state": state,
    }))
}

/// [`run`] with tokens taken from the environment.
pub async fn run_from_env(config: &ConfigV1) -> ClientResult<Value> {
    run(
        config,
        std::env::var(TOKEN_ENV).ok(),
        std::env::var(PLATFORM_TOKEN_ENV).ok(),
    )
    .await
}
