//! Bearer credential issued at login and registration.
//!
//! The credential is a base64-encoded JSON object
//! `{"user_id", "name", "email", "expires"}` where `expires` is an absolute
//! Unix timestamp in seconds.
//!
//! # Integrity
//!
//! The encoding is NOT signed. Anyone who knows a user id can build a token
//! the server will accept; the only checks are structure, expiry, and that
//! the user still exists. It provides session continuity for the demo store
//! and nothing more. Upgrading to a signed or server-side session is a scope
//! change that has not been made.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Errors from decoding or checking a credential.
#[derive(thiserror::Error, Debug)]
pub enum CredentialError {
    /// The token is not base64, not JSON, or lacks required fields.
    #[error("malformed token")]
    Malformed,
    /// `expires` is not in the future.
    #[error("token expired")]
    Expired,
    /// The claims could not be serialized.
    #[error("token encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Decoded credential claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// Account the bearer acts as.
    pub user_id: UserId,
    /// Display name at issue time.
    pub name: String,
    /// Email at issue time.
    pub email: String,
    /// Unix timestamp (seconds) after which the token is rejected.
    pub expires: i64,
}

impl Credential {
    /// Default lifetime of an issued credential.
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    /// Build claims expiring `ttl` after `now`.
    #[must_use]
    pub fn issue(
        user_id: UserId,
        name: impl Into<String>,
        email: impl Into<String>,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        Self {
            user_id,
            name: name.into(),
            email: email.into(),
            expires: (now + ttl).timestamp(),
        }
    }

    /// Encode as the bearer token string.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Encoding` if JSON serialization fails.
    pub fn encode(&self) -> Result<String, CredentialError> {
        let json = serde_json::to_vec(self)?;
        Ok(STANDARD.encode(json))
    }

    /// Decode a bearer token. Does not check expiry.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Malformed` if the token is not base64 JSON
    /// with the expected fields.
    pub fn decode(token: &str) -> Result<Self, CredentialError> {
        let bytes = STANDARD
            .decode(token.trim())
            .map_err(|_| CredentialError::Malformed)?;
        serde_json::from_slice(&bytes).map_err(|_| CredentialError::Malformed)
    }

    /// Whether the credential has expired at `now`.
    ///
    /// A credential is live only while `expires > now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires <= now.timestamp()
    }

    /// Decode and reject expired credentials in one step.
    ///
    /// This is the "valid-looking" check the client uses to pick a cart mode;
    /// the server additionally re-validates the user id.
    ///
    /// # Errors
    ///
    /// Returns `Malformed` or `Expired`.
    pub fn decode_live(token: &str, now: DateTime<Utc>) -> Result<Self, CredentialError> {
        let credential = Self::decode(token)?;
        if credential.is_expired_at(now) {
            return Err(CredentialError::Expired);
        }
        Ok(credential)
    }
}
