//! Library exports for extstate, shared between the binary and tests.

pub mod aggregator;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod startup;
pub mod store;
pub mod utils;

pub use error::{ClientError, ClientResult};
