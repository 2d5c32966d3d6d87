use std::collections::HashMap;

use async_trait::async_trait;
use futures::lock::Mutex;
use serde_json::{Map, Value};
use tracing::debug;

use super::base::{merge_shallow, StateStore};
use crate::error::ClientResult;
use crate::models::Substate;

/// In-memory stand-in for the EBS, used in mock mode and as a fallback.
#[derive(Default)]
pub struct MockStore {
    states: Mutex<HashMap<Substate, Value>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn seeded(states: impl IntoIterator<Item = (Substate, Value)>) -> Self {
        Self {
            states: Mutex::new(states.into_iter().collect()),
        }
    }
}

#[async_trait]
impl StateStore for MockStore {
    async fn load_all(&self) -> ClientResult<Value> {
        let states = self.states.lock().await;
        let mut all = Map::new();
        for kind in Substate::ALL {
            if let Some(value) = states.get(&kind) {
                all.insert(kind.state_key(), value.clone());
            }
        }
        Ok(Value::Object(all))
    }

    async fn load(&self, kind: Substate) -> ClientResult<Value> {
        let states = self.states.lock().await;
        Ok(states.get(&kind).cloned().unwrap_or(Value::Null))
    }

    async fn save(&self, kind: Substate, value: Value) -> ClientResult<()> {
        debug!("MockStore: saving {}", kind);
        self.states.lock().await.insert(kind, value);
        Ok(())
    }

    async fn update(&self, kind: Substate, patch: Value) -> ClientResult<Value> {
        let mut states = self.states.lock().await;
        let current = states.remove(&kind).unwrap_or(Value::Null);
        let merged = merge_shallow(current, patch);
        states.insert(kind, merged.clone());
        Ok(merged)
    }

    async fn remove(&self, kind: Substate) -> ClientResult<()> {
        self.states.lock().await.remove(&kind);
        Ok(())
    }

    fn is_mock(&self) -> bool {
        true
    }
}
