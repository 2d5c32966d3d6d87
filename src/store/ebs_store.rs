use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::base::StateStore;
use crate::clients::EbsClient;
use crate::error::{ClientError, ClientResult};
use crate::models::{AuthToken, Substate};

/// A [`StateStore`] backed by the EBS, signing every call with one token.
pub struct EbsStore {
    client: EbsClient,
    token: AuthToken,
}

impl EbsStore {
    pub fn new(client: EbsClient, token: AuthToken) -> Self {
        Self { client, token }
    }
}

#[async_trait]
impl StateStore for EbsStore {
    async fn load_all(&self) -> ClientResult<Value> {
        self.client.fetch_state(self.token.as_str()).await
    }

    async fn load(&self, kind: Substate) -> ClientResult<Value> {
        match self.client.fetch_substate(kind, self.token.as_str()).await {
            Err(ClientError::NotFound(path)) => {
                debug!("No {} stored on the EBS ({})", kind, path);
                Ok(Value::Null)
            }
            other => other,
        }
    }

    async fn save(&self, kind: Substate, value: Value) -> ClientResult<()> {
        self.client
            .save_substate(kind, &value, self.token.as_str())
            .await
            .map(|_| ())
    }

    async fn update(&self, kind: Substate, patch: Value) -> ClientResult<Value> {
        self.client
            .update_substate(kind, &patch, self.token.as_str())
            .await
    }

    async fn remove(&self, kind: Substate) -> ClientResult<()> {
        self.client.delete_substate(kind, self.token.as_str()).await
    }
}
