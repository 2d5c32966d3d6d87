pub mod log_throttle;
pub mod logger;
pub mod value;

pub use value::{coerce_value, parse_value};
