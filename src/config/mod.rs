// This module re-exports important pieces for convenience,
// so we can "use crate::config::*" easily.
pub mod backends;
pub mod logging;
pub mod types;

pub use backends::*;
pub use logging::*;
pub use types::*;
