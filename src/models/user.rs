use serde::{Deserialize, Serialize};

use super::platform_user::PlatformUser;
use super::token::{AuthToken, Role};

/// The user fields the extension front-end reads, merged from the extension
/// token and the platform user record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct UserState {
    pub opaque_id: Option<String>,
    /// Real platform id, only set for viewers that shared their identity.
    pub id: Option<String>,
    pub role: Role,
    pub channel_id: Option<String>,
    pub is_linked: bool,
    pub is_anonymous: bool,
    /// Unix seconds.
    pub token_expires_at: Option<i64>,
    pub login: Option<String>,
    pub display_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub broadcaster_type: Option<String>,
    pub user_type: Option<String>,
    pub description: Option<String>,
    pub created_at: Option<String>,
    /// Set once an aggregation pass finished, whether or not the platform lookup worked.
    pub loaded: bool,
}

/// The mutations a [`UserState`] accepts.
#[derive(Debug, Clone)]
pub enum UserAction {
    SetFromToken(AuthToken),
    SetFromPlatform(PlatformUser),
    MarkLoaded,
    Reset,
}

impl UserState {
    /// Apply one mutation. This is the only place user fields are written.
    pub fn apply(&mut self, action: UserAction) {
        match action {
            UserAction::SetFromToken(token) => {
                let claims = token.claims();
                self.opaque_id = Some(claims.opaque_user_id.clone());
                self.id = claims.user_id.clone();
                self.role = claims.role;
                self.channel_id = claims.channel_id.clone();
                self.is_linked = token.is_linked();
                self.is_anonymous = token.is_anonymous();
                self.token_expires_at = Some(claims.exp);
            }
            UserAction::SetFromPlatform(user) => {
                // A record for somebody else must not overwrite this user.
                if self.id.as_deref().is_some_and(|id| id != user.id) {
                    return;
                }
                self.id = Some(user.id);
                self.login = user.login;
                self.display_name = user.display_name;
                self.profile_image_url = user.profile_image_url;
                self.broadcaster_type = user.broadcaster_type;
                self.user_type = user.user_type;
                self.description = user.description;
                self.created_at = user.created_at;
            }
            UserAction::MarkLoaded => self.loaded = true,
            UserAction::Reset => *self = UserState::default(),
        }
    }
}
