pub mod base;
pub mod ebs_store;
pub mod mock_store;

// Re-export the primary store items so code outside can do
// "use crate::store::{StateStore, create_store};"
pub use base::{create_store, StateStore};
pub use ebs_store::EbsStore;
pub use mock_store::MockStore;
