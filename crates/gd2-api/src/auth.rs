//! Request signing.
//!
//! Every request carries `Authorization: bearer <jwt>` where the token is an
//! HS256 JWT bound to one method and path through its `qsh` claim, so a token
//! can never be replayed against a different endpoint.

use crate::error::Result;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Lifetime of a signed token.
pub const TOKEN_TTL_SECS: i64 = 100;

/// Claims carried by a request token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Caller identity.
    pub iss: String,
    /// Issue time, seconds since the epoch.
    pub iat: i64,
    /// Expiry, `iat + TOKEN_TTL_SECS`.
    pub exp: i64,
    /// Hex SHA-256 of `"{METHOD}&{PATH}"`.
    pub qsh: String,
}

/// Query string hash binding a token to `method` and `path`.
///
/// `path` must already include the `/v1` prefix.
pub fn qsh(method: &str, path: &str) -> String {
    let input = format!("{}&{}", method.to_uppercase(), path);
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Signs per-request tokens for one user and shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    user: String,
    key: EncodingKey,
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(user: &str, secret: &str) -> Self {
        Self {
            user: user.to_string(),
            key: EncodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn claims_at(&self, method: &str, path: &str, now: i64) -> Claims {
        Claims {
            iss: self.user.clone(),
            iat: now,
            exp: now + TOKEN_TTL_SECS,
            qsh: qsh(method, path),
        }
    }

    /// Signs a token issued at `now`.
    pub fn sign_at(&self, method: &str, path: &str, now: i64) -> Result<String> {
        let claims = self.claims_at(method, path, now);
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.key)?)
    }

    /// Value for the `Authorization` header of a request issued now.
    pub fn authorization(&self, method: &str, path: &str) -> Result<String> {
        let token = self.sign_at(method, path, chrono::Utc::now().timestamp())?;
        Ok(format!("bearer {}", token))
    }
}
