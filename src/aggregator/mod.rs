pub mod user_aggregator;
pub mod user_store;

pub use user_aggregator::UserAggregator;
pub use user_store::UserStore;
