use std::fmt;

use serde::{Deserialize, Serialize};

/// One named partition of the persisted extension state.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Substate {
    Authentication,
    User,
    Viewer,
    Channel,
    Extension,
    Aggregate,
}

impl Substate {
    pub const ALL: [Substate; 6] = [
        Substate::Authentication,
        Substate::User,
        Substate::Viewer,
        Substate::Channel,
        Substate::Extension,
        Substate::Aggregate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Substate::Authentication => "authentication",
            Substate::User => "user",
            Substate::Viewer => "viewer",
            Substate::Channel => "channel",
            Substate::Extension => "extension",
            Substate::Aggregate => "aggregate",
        }
    }

    /// Key used in the combined `/state` document, e.g. "viewer_state".
    pub fn state_key(&self) -> String {
        format!("{}_state", self.name())
    }

    /// Endpoint path relative to the EBS root, e.g. "/viewer_state".
    pub fn path(&self) -> String {
        format!("/{}", self.state_key())
    }
}

impl fmt::Display for Substate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.state_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(Substate::Viewer.path(), "/viewer_state");
        assert_eq!(Substate::Aggregate.state_key(), "aggregate_state");
    }
}
