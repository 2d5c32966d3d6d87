pub mod ebs;
mod response;
pub mod platform;

pub use ebs::EbsClient;
pub use platform::PlatformClient;
