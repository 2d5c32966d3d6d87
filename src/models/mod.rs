pub mod platform_user;
pub mod substate;
pub mod token;
pub mod user;

pub use platform_user::PlatformUser;
pub use substate::Substate;
pub use token::{AuthToken, ExtensionClaims, MockToken, Role};
pub use user::{UserAction, UserState};
