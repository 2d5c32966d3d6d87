use std::fmt;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ClientError, ClientResult};

/// Secret used to sign mock tokens when no extension secret is configured.
const MOCK_SECRET: &[u8] = b"extstate-mock-secret";

/// The role the platform assigned to the viewer of the extension.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Broadcaster,
    Moderator,
    Viewer,
    #[default]
    #[serde(other)]
    External,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Broadcaster => "broadcaster",
            Role::Moderator => "moderator",
            Role::Viewer => "viewer",
            Role::External => "external",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claims carried by an extension token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ExtensionClaims {
    pub exp: i64,
    pub opaque_user_id: String,
    /// Real platform user id, only present once the viewer shared their identity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub is_unlinked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pubsub_perms: Option<Value>,
}

fn check_segments(token: &str) -> ClientResult<()> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(ClientError::malformed(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    }
    if segments.iter().any(|s| s.is_empty()) {
        return Err(ClientError::malformed("empty segment"));
    }
    Ok(())
}

/// Validation that only checks claim presence/shape; expiry is handled separately.
fn claims_validation(algorithm: Algorithm) -> Validation {
    let mut validation = Validation::new(algorithm);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Decode the claims of `token` without verifying the signature.
pub fn decode_claims(token: &str) -> ClientResult<ExtensionClaims> {
    check_segments(token)?;
    let mut validation = claims_validation(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    decode::<ExtensionClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| ClientError::malformed(e.to_string()))
}

/// Decode the claims of `token`, checking the HS256 signature against a base64 encoded secret.
pub fn verify_claims(token: &str, secret_b64: &str) -> ClientResult<ExtensionClaims> {
    check_segments(token)?;
    let secret = general_purpose::STANDARD
        .decode(secret_b64.trim())
        .map_err(|e| ClientError::Config(format!("extension secret is not base64: {}", e)))?;
    decode::<ExtensionClaims>(
        token,
        &DecodingKey::from_secret(&secret),
        &claims_validation(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
            ClientError::InvalidSignature(e.to_string())
        }
        _ => ClientError::malformed(e.to_string()),
    })
}

/// A token is expired at `now` (unix seconds) when `exp <= now`. Tokens that
/// cannot be decoded count as expired.
pub fn is_expired_at(token: &str, now: i64) -> bool {
    match decode_claims(token) {
        Ok(claims) => claims.exp <= now,
        Err(_) => true,
    }
}

/// [`is_expired_at`] against the current time.
pub fn is_token_expired(token: &str) -> bool {
    is_expired_at(token, Utc::now().timestamp())
}

/// A decoded extension token together with its raw form for signing requests.
#[derive(Clone, PartialEq)]
pub struct AuthToken {
    raw: String,
    claims: ExtensionClaims,
}

impl AuthToken {
    /// Decode a token without signature verification. A leading "Bearer " is ignored.
    pub fn parse(token: &str) -> ClientResult<Self> {
        let raw = strip_bearer(token);
        let claims = decode_claims(raw)?;
        Ok(Self {
            raw: raw.to_string(),
            claims,
        })
    }

    /// Decode a token, verifying it when a secret is given.
    pub fn parse_with_secret(token: &str, secret_b64: Option<&str>) -> ClientResult<Self> {
        match secret_b64 {
            Some(secret) => {
                let raw = strip_bearer(token);
                let claims = verify_claims(raw, secret)?;
                Ok(Self {
                    raw: raw.to_string(),
                    claims,
                })
            }
            None => Self::parse(token),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn claims(&self) -> &ExtensionClaims {
        &self.claims
    }

    pub fn role(&self) -> Role {
        self.claims.role
    }

    pub fn opaque_user_id(&self) -> &str {
        &self.claims.opaque_user_id
    }

    pub fn user_id(&self) -> Option<&str> {
        self.claims.user_id.as_deref()
    }

    pub fn channel_id(&self) -> Option<&str> {
        self.claims.channel_id.as_deref()
    }

    /// Logged-out viewers get an opaque id starting with "A".
    pub fn is_anonymous(&self) -> bool {
        self.claims.opaque_user_id.starts_with('A')
    }

    /// The viewer shared their identity with the extension.
    pub fn is_linked(&self) -> bool {
        self.claims.user_id.is_some() && !self.claims.is_unlinked
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.claims.exp, 0).single()
    }

    pub fn is_expired_at(&self, now: i64) -> bool {
        self.claims.exp <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}

// The raw token is a credential, keep it out of logs.
impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("raw", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

fn strip_bearer(token: &str) -> &str {
    let token = token.trim();
    token
        .strip_prefix("Bearer ")
        .map(str::trim)
        .unwrap_or(token)
}

/// Builds locally signed tokens for running against the mock store.
#[derive(Debug, Clone)]
pub struct MockToken {
    pub role: Role,
    pub channel_id: String,
    pub user_id: Option<String>,
    pub ttl: Duration,
}

impl MockToken {
    pub fn new(role: Role, channel_id: impl Into<String>) -> Self {
        Self {
            role,
            channel_id: channel_id.into(),
            user_id: None,
            ttl: Duration::hours(1),
        }
    }

    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Sign the token with the given base64 secret, or the built-in mock secret.
    pub fn sign(&self, secret_b64: Option<&str>) -> ClientResult<String> {
        let secret = match secret_b64 {
            Some(secret) => general_purpose::STANDARD
                .decode(secret.trim())
                .map_err(|e| ClientError::Config(format!("extension secret is not base64: {}", e)))?,
            None => MOCK_SECRET.to_vec(),
        };
        let claims = ExtensionClaims {
            exp: (Utc::now() + self.ttl).timestamp(),
            opaque_user_id: format!("U{}", uuid::Uuid::new_v4().simple()),
            user_id: self.user_id.clone(),
            channel_id: Some(self.channel_id.clone()),
            role: self.role,
            is_unlinked: self.user_id.is_none(),
            pubsub_perms: Some(json!({ "listen": ["broadcast", "global"], "send": [] })),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&secret),
        )
        .map_err(|e| ClientError::malformed(e.to_string()))
    }
}
