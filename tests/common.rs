#![allow(dead_code)]

use extstate::config::{load_config_from_str, ConfigV1};
use extstate::models::{MockToken, Role};

pub const CLIENT_ID: &str = "integration-client";

/// A config pointing both the EBS and the platform API at `server_url`.
pub fn config_for(server_url: &str, mock: bool, fallback_to_mock: bool) -> ConfigV1 {
    config_with_client_id(server_url, mock, fallback_to_mock, CLIENT_ID)
}

pub fn config_with_client_id(
    server_url: &str,
    mock: bool,
    fallback_to_mock: bool,
    client_id: &str,
) -> ConfigV1 {
    let yaml = format!(
        r#"
version: "1.0.0"
logging:
  level: "debug"
  format: "json"
ebs:
  base_url: "{url}"
  mock: {mock}
  fallback_to_mock: {fallback}
  timeout_in_ms: 2000
platform:
  client_id: "{client_id}"
  base_url: "{url}"
"#,
        url = server_url,
        mock = mock,
        fallback = fallback_to_mock,
        client_id = client_id,
    );
    load_config_from_str(&yaml).expect("Failed to parse test config YAML")
}

pub fn viewer_token(user_id: Option<&str>) -> String {
    let mut token = MockToken::new(Role::Viewer, "31337");
    if let Some(id) = user_id {
        token = token.with_user_id(id);
    }
    token.sign(None).expect("mock token should sign")
}
