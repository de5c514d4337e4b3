//! Signed bearer tokens.
//!
//! Tokens are HS256 JWTs. Access and refresh tokens carry the same claims and
//! differ only in the custom `kind` claim.

use std::env;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::factory::ConfigurationError;
use crate::domain::UserId;

/// Minimum accepted length of a configured signing secret, in bytes.
pub const MIN_SECRET_LENGTH: usize = 32;

/// Default lifetime of access tokens, in seconds.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 300;

/// Default lifetime of refresh tokens, in seconds.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 86_400;

// =============================================================================
// Claims
// =============================================================================

/// Which of the two token flavours a token is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Payload carried by every token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user id.
    pub sub: i64,
    pub kind: TokenKind,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

impl Claims {
    /// Returns the subject as a `UserId`.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        UserId::new(self.sub)
    }
}

/// A freshly issued access/refresh pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Errors raised while issuing or verifying tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// The token is not a JWT holding valid claims.
    #[error("Token is malformed")]
    Malformed,

    /// The signature does not match the claims.
    #[error("Token signature is invalid")]
    BadSignature,

    /// The token's `exp` is in the past.
    #[error("Token has expired")]
    Expired,

    /// An access token was presented where a refresh token was expected, or vice versa.
    #[error("Token has wrong type")]
    WrongKind,

    /// The claims could not be signed.
    #[error("Token signing failed: {0}")]
    Signing(String),
}

// =============================================================================
// Configuration
// =============================================================================

/// Token configuration read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    /// Signing secret; a random one is generated when absent.
    pub secret: Option<String>,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: None,
            access_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            refresh_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
        }
    }
}

impl AuthConfig {
    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AUTH_SECRET`: signing secret, at least 32 bytes
    /// - `ACCESS_TOKEN_TTL_SECONDS`: access token lifetime (default 300)
    /// - `REFRESH_TOKEN_TTL_SECONDS`: refresh token lifetime (default 86400)
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a TTL is not a positive integer or the
    /// secret is too short.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let secret = env::var("AUTH_SECRET")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let config = Self {
            secret,
            access_ttl_seconds: ttl_from_env(
                "ACCESS_TOKEN_TTL_SECONDS",
                DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            )?,
            refresh_ttl_seconds: ttl_from_env(
                "REFRESH_TOKEN_TTL_SECONDS",
                DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` for a short secret or a non-positive TTL.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self
            .secret
            .as_ref()
            .is_some_and(|secret| secret.len() < MIN_SECRET_LENGTH)
        {
            return Err(ConfigurationError::WeakAuthSecret(MIN_SECRET_LENGTH));
        }
        for (name, value) in [
            ("ACCESS_TOKEN_TTL_SECONDS", self.access_ttl_seconds),
            ("REFRESH_TOKEN_TTL_SECONDS", self.refresh_ttl_seconds),
        ] {
            if value <= 0 {
                return Err(ConfigurationError::InvalidNumber {
                    name,
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn ttl_from_env(name: &'static str, default: i64) -> Result<i64, ConfigurationError> {
    match env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(default),
        Ok(value) => value
            .trim()
            .parse::<i64>()
            .map_err(|_| ConfigurationError::InvalidNumber { name, value }),
        Err(_) => Ok(default),
    }
}

// =============================================================================
// Token Signer
// =============================================================================

/// Issues and verifies HS256 tokens.
#[derive(Clone)]
pub struct TokenSigner {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
    validation: Arc<Validation>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TokenSigner")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenSigner {
    /// Creates a signer with an explicit secret and lifetimes.
    #[must_use]
    pub fn new(secret: impl AsRef<[u8]>, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret.as_ref())),
            decoding_key: Arc::new(DecodingKey::from_secret(secret.as_ref())),
            validation: Arc::new(validation),
            access_ttl,
            refresh_ttl,
        }
    }

    /// Creates a signer from configuration.
    ///
    /// Without a configured secret, a random 32-byte secret is generated; tokens
    /// then stop validating when the process restarts.
    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        let access_ttl = Duration::seconds(config.access_ttl_seconds);
        let refresh_ttl = Duration::seconds(config.refresh_ttl_seconds);

        if let Some(secret) = &config.secret {
            return Self::new(secret.as_bytes(), access_ttl, refresh_ttl);
        }

        tracing::warn!("AUTH_SECRET is not set, generating an ephemeral signing secret");
        let mut secret = [0u8; MIN_SECRET_LENGTH];
        rand::rng().fill_bytes(&mut secret);
        Self::new(secret, access_ttl, refresh_ttl)
    }

    /// Issues a token of `kind` for `user_id`, valid from `now`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if the claims cannot be encoded.
    pub fn issue(
        &self,
        user_id: UserId,
        kind: TokenKind,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let claims = Claims {
            sub: user_id.get(),
            kind,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|error| TokenError::Signing(error.to_string()))
    }

    /// Issues an access token and a refresh token for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if either token cannot be issued.
    pub fn issue_pair(&self, user_id: UserId, now: DateTime<Utc>) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue(user_id, TokenKind::Access, now)?,
            refresh: self.issue(user_id, TokenKind::Refresh, now)?,
        })
    }

    /// Verifies `token` and checks that it is of the `expected` kind.
    ///
    /// Expiry is checked against the system clock.
    ///
    /// # Errors
    ///
    /// Returns the matching `TokenError` for a malformed, forged, expired or
    /// wrong-kind token.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|error| match error.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            })?
            .claims;

        if claims.kind != expected {
            return Err(TokenError::WrongKind);
        }
        Ok(claims)
    }
}
