use std::path::Path;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::backends::{EbsConfig, PlatformConfig};
use super::logging::LoggingConfig;
use crate::error::{ClientError, ClientResult};

/// Prefix for environment overrides, e.g. `EXTSTATE_EBS__BASE_URL`.
pub const ENV_PREFIX: &str = "EXTSTATE_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ebs: EbsConfig,
    pub platform: PlatformConfig,
}

fn extract(figment: Figment) -> ClientResult<ConfigV1> {
    let config = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract::<Config>()
        .map_err(|e| ClientError::Config(e.to_string()))?;
    // handle configuration migration between versions here when necessary
    match config {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Load config from a YAML file, with `EXTSTATE_` environment overrides on top.
pub fn load_config(path: impl AsRef<Path>) -> ClientResult<ConfigV1> {
    extract(Figment::new().merge(Yaml::file(path.as_ref())))
}

/// Same as [`load_config`] but from an in-memory YAML document.
pub fn load_config_from_str(yaml: &str) -> ClientResult<ConfigV1> {
    extract(Figment::new().merge(Yaml::string(yaml)))
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> ClientResult<()> {
    let schema = schema_for!(Config);
    let rendered =
        serde_json::to_string_pretty(&schema).map_err(|e| ClientError::decode(e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}
