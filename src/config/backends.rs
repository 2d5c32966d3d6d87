use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PLATFORM_URL: &str = "https://api.twitch.tv/helix";

fn default_timeout_in_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_platform_url() -> String {
    DEFAULT_PLATFORM_URL.to_string()
}

/// Where extension state is persisted.
/// - base_url: the EBS root, e.g. "https://ebs.example.com/api".
/// - mock: if true (or no base_url is set) state lives in memory only.
/// - fallback_to_mock: use the in-memory store when the EBS fails its health check.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct EbsConfig {
    pub base_url: Option<String>,
    #[serde(default)]
    pub mock: bool,
    #[serde(default = "default_true")]
    pub fallback_to_mock: bool,
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}

impl EbsConfig {
    /// The mock store is used when asked for explicitly or when there is nothing to talk to.
    pub fn use_mock(&self) -> bool {
        self.mock
            || self
                .base_url
                .as_deref()
                .map(|url| url.trim().is_empty())
                .unwrap_or(true)
    }
}

impl Default for EbsConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            mock: true,
            fallback_to_mock: true,
            timeout_in_ms: default_timeout_in_ms(),
        }
    }
}

/// The third-party platform API used for user lookups.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct PlatformConfig {
    pub client_id: String,
    #[serde(default = "default_platform_url")]
    pub base_url: String,
    /// Base64 encoded extension secret. When present, tokens are signature-checked.
    pub extension_secret: Option<String>,
    #[serde(default = "default_timeout_in_ms")]
    pub timeout_in_ms: u64,
}
