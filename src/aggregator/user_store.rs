use std::sync::Arc;

use futures::lock::Mutex;

use crate::models::{UserAction, UserState};

/// Shared, clonable handle on the current [`UserState`]. All writes go through
/// [`UserStore::dispatch`].
#[derive(Clone, Default)]
pub struct UserStore {
    state: Arc<Mutex<UserState>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn dispatch(&self, action: UserAction) {
        self.state.lock().await.apply(action);
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> UserState {
        self.state.lock().await.clone()
    }
}
