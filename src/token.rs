//! Bearer token issuance and verification.
//!
//! Tokens are self-contained HS256 claim sets; nothing is persisted per
//! token. Verification checks signature, expiry, and not-before. The sliding
//! refresh policy is advisory: when a verified token is inside the final
//! fraction of its lifetime a replacement is minted alongside the response,
//! and the old token stays valid until its own expiry.
//!
//! Password changes invalidate outstanding tokens without a revocation list:
//! the verification flow compares the token's `iat` against the account's
//! `password_changed_at` (see [`crate::flows::SessionVerifier`]).
//!
//! # Example
//!
//! ```rust,ignore
//! use gatewick::{TokenAuthority, TokenConfig};
//!
//! let authority = TokenAuthority::new(
//!     TokenConfig::new("server-held-secret", "my-app")
//! )?;
//!
//! let signed = authority.issue("account-123")?;
//! let claims = authority.verify(&signed.token)?;
//! assert_eq!(claims.sub, "account-123");
//! ```

use crate::error::{GatewickError, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Default token lifetime (7 days).
const DEFAULT_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default refresh window: reissue inside the final 28% of the lifetime.
const DEFAULT_REFRESH_WINDOW: f64 = 0.28;

/// Configuration for token issuance and verification.
///
/// The signing secret is injected once at startup and is process-wide
/// read-only from then on. The struct intentionally has no `Debug`
/// implementation so the secret cannot leak through formatting.
#[derive(Clone)]
pub struct TokenConfig {
    secret: Vec<u8>,
    /// Token issuer (`iss` claim).
    pub issuer: String,
    /// Token lifetime (default: 7 days).
    pub ttl: Duration,
    /// Fraction of the lifetime, measured from expiry backwards, inside
    /// which verification should mint a replacement token (default: 0.28).
    pub refresh_window: f64,
}

impl TokenConfig {
    /// Create a config with an HS256 symmetric secret.
    pub fn new(secret: impl Into<Vec<u8>>, issuer: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: issuer.into(),
            ttl: DEFAULT_TTL,
            refresh_window: DEFAULT_REFRESH_WINDOW,
        }
    }

    /// Set the token lifetime.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the refresh window fraction (clamped to `0.0..=1.0`).
    pub fn refresh_window(mut self, fraction: f64) -> Self {
        self.refresh_window = fraction.clamp(0.0, 1.0);
        self
    }

    /// Create config from environment variables.
    ///
    /// Reads from:
    /// - `GATEWICK_TOKEN_SECRET` (required)
    /// - `GATEWICK_TOKEN_ISSUER` (optional, default: "gatewick")
    /// - `GATEWICK_TOKEN_TTL_SECS` (optional, default: 7 days)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("GATEWICK_TOKEN_SECRET").map_err(|_| {
            GatewickError::internal("GATEWICK_TOKEN_SECRET environment variable not set")
        })?;

        let issuer =
            std::env::var("GATEWICK_TOKEN_ISSUER").unwrap_or_else(|_| "gatewick".to_string());

        let mut config = Self::new(secret, issuer);
        if let Some(secs) = std::env::var("GATEWICK_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.ttl = Duration::from_secs(secs);
        }
        Ok(config)
    }
}

/// The claim set carried by every token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Expiration time (unix timestamp)
    pub exp: u64,
    /// Issued at (unix timestamp)
    pub iat: u64,
    /// Not before (unix timestamp)
    pub nbf: u64,
    /// Unique token identifier
    pub jti: String,
}

/// A freshly issued token with its timestamps.
#[derive(Debug, Clone, Serialize)]
pub struct SignedToken {
    pub token: String,
    /// Unix seconds.
    pub issued_at: u64,
    /// Unix seconds.
    pub expires_at: u64,
}

/// Issues and verifies bearer tokens.
#[derive(Clone)]
pub struct TokenAuthority {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenAuthority {
    /// Create a new token authority with the given configuration.
    pub fn new(config: TokenConfig) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(GatewickError::internal("token signing secret is empty"));
        }

        let encoding_key = EncodingKey::from_secret(&config.secret);
        let decoding_key = DecodingKey::from_secret(&config.secret);

        Ok(Self {
            config,
            encoding_key,
            decoding_key,
        })
    }

    /// Issue a token for a subject, valid from now for the configured TTL.
    pub fn issue(&self, subject_id: &str) -> Result<SignedToken> {
        let now = current_timestamp();
        let expires_at = now + self.config.ttl.as_secs();

        let claims = Claims {
            sub: subject_id.to_string(),
            iss: self.config.issuer.clone(),
            exp: expires_at,
            iat: now,
            nbf: now,
            jti: generate_jti(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| GatewickError::internal(format!("Failed to encode token: {e}")))?;

        Ok(SignedToken {
            token,
            issued_at: now,
            expires_at,
        })
    }

    /// Verify signature, expiry, and not-before; returns the claims.
    ///
    /// Zero leeway: a token is expired the second its `exp` passes, and not
    /// active until its `nbf` arrives.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);
        validation.validate_nbf = true;
        validation.leeway = 0;

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => GatewickError::TokenExpired,
                ErrorKind::ImmatureSignature => GatewickError::TokenNotActive,
                _ => GatewickError::InvalidToken,
            })
    }

    /// Whether a verified token is inside the refresh window.
    pub fn needs_refresh(&self, claims: &Claims) -> bool {
        self.needs_refresh_at(claims, current_timestamp())
    }

    /// [`Self::needs_refresh`] against an explicit timestamp.
    pub fn needs_refresh_at(&self, claims: &Claims, now: u64) -> bool {
        let remaining = claims.exp.saturating_sub(now);
        let threshold = (self.config.ttl.as_secs() as f64 * self.config.refresh_window) as u64;
        remaining < threshold
    }

    /// Get the issuer string.
    pub fn issuer(&self) -> &str {
        &self.config.issuer
    }

    /// Get the configured token lifetime.
    pub fn token_ttl(&self) -> Duration {
        self.config.ttl
    }
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

fn generate_jti() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 16];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-32-bytes-long!!";

    fn test_authority() -> TokenAuthority {
        TokenAuthority::new(TokenConfig::new(TEST_SECRET, "test-app")).unwrap()
    }

    /// Encode claims directly, bypassing `issue`, to control timestamps.
    fn encode_claims(claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn claims_at(iat: u64, exp: u64, nbf: u64) -> Claims {
        Claims {
            sub: "account-123".to_string(),
            iss: "test-app".to_string(),
            exp,
            iat,
            nbf,
            jti: "test-jti".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let authority = test_authority();
        let signed = authority.issue("account-123").unwrap();

        assert!(!signed.token.is_empty());
        assert!(signed.expires_at > signed.issued_at);

        let claims = authority.verify(&signed.token).unwrap();
        assert_eq!(claims.sub, "account-123");
        assert_eq!(claims.iss, "test-app");
        assert_eq!(claims.iat, signed.issued_at);
        assert_eq!(claims.exp, signed.expires_at);
    }

    #[test]
    fn test_jti_is_unique() {
        let authority = test_authority();
        let a = authority.verify(&authority.issue("x").unwrap().token).unwrap();
        let b = authority.verify(&authority.issue("x").unwrap().token).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_tampered_token_is_invalid() {
        let authority = test_authority();
        let signed = authority.issue("account-123").unwrap();

        let other = TokenAuthority::new(TokenConfig::new("another-secret", "test-app")).unwrap();
        assert!(matches!(
            other.verify(&signed.token),
            Err(GatewickError::InvalidToken)
        ));

        assert!(matches!(
            authority.verify("not-even-a-jwt"),
            Err(GatewickError::InvalidToken)
        ));
    }

    #[test]
    fn test_expired_token() {
        let authority = test_authority();
        let now = current_timestamp();
        let token = encode_claims(&claims_at(now - 7200, now - 3600, now - 7200));

        assert!(matches!(
            authority.verify(&token),
            Err(GatewickError::TokenExpired)
        ));
    }

    #[test]
    fn test_not_yet_valid_token() {
        let authority = test_authority();
        let now = current_timestamp();
        let token = encode_claims(&claims_at(now, now + 7200, now + 3600));

        assert!(matches!(
            authority.verify(&token),
            Err(GatewickError::TokenNotActive)
        ));
    }

    #[test]
    fn test_wrong_issuer_is_invalid() {
        let authority = test_authority();
        let now = current_timestamp();
        let mut claims = claims_at(now, now + 3600, now);
        claims.iss = "someone-else".to_string();
        let token = encode_claims(&claims);

        assert!(matches!(
            authority.verify(&token),
            Err(GatewickError::InvalidToken)
        ));
    }

    #[test]
    fn test_needs_refresh_window() {
        let authority = TokenAuthority::new(
            TokenConfig::new(TEST_SECRET, "test-app")
                .ttl(Duration::from_secs(1000))
                .refresh_window(0.28),
        )
        .unwrap();

        let claims = claims_at(0, 1000, 0);

        // 500s remaining: comfortably outside the final 280s.
        assert!(!authority.needs_refresh_at(&claims, 500));
        // 281s remaining: still outside.
        assert!(!authority.needs_refresh_at(&claims, 719));
        // 279s remaining: inside the window.
        assert!(authority.needs_refresh_at(&claims, 721));
        // Past expiry still reports true; verification rejects it anyway.
        assert!(authority.needs_refresh_at(&claims, 1500));
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(TokenAuthority::new(TokenConfig::new(Vec::new(), "app")).is_err());
    }
}
