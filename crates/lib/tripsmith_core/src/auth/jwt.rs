//! JWT issuance and verification for access and refresh tokens.
//!
//! Each kind is signed with its own HS256 secret, so an access token never
//! verifies as a refresh token and vice versa.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use super::AuthError;
use super::config::AuthConfig;
use crate::models::auth::{AccessClaims, Identity, RefreshClaims};

/// Which secret a token was signed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SigningKeys {
    fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }
}

/// Unix expiry for a token issued at `now`.
fn expiry(now: DateTime<Utc>, ttl: Duration) -> Result<i64, AuthError> {
    now.checked_add_signed(ttl)
        .map(|t| t.timestamp())
        .ok_or_else(|| AuthError::Internal(format!("token lifetime out of range: {ttl}")))
}

/// Mints and verifies signed tokens. Stateless.
pub struct TokenIssuer {
    access: SigningKeys,
    refresh: SigningKeys,
    validation: Validation,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        Self {
            access: SigningKeys::new(&config.access_secret, config.access_ttl),
            refresh: SigningKeys::new(&config.refresh_secret, config.refresh_ttl),
            validation,
        }
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Lifetime of tokens of the given kind, in seconds.
    pub fn ttl_secs(&self, kind: TokenKind) -> i64 {
        self.keys(kind).ttl.num_seconds()
    }

    /// Access token carrying subject id, email and name.
    pub fn issue_access_token(&self, identity: &Identity) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: identity.id.to_string(),
            email: identity.email.clone(),
            name: identity.name.clone(),
            jti: Uuid::new_v4().to_string(),
            exp: expiry(now, self.access.ttl)?,
            iat: now.timestamp(),
        };
        self.sign(&claims, TokenKind::Access)
    }

    /// Refresh token carrying only the subject id.
    pub fn issue_refresh_token(&self, identity_id: &Uuid) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: identity_id.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: expiry(now, self.refresh.ttl)?,
            iat: now.timestamp(),
        };
        self.sign(&claims, TokenKind::Refresh)
    }

    fn sign<C: Serialize>(&self, claims: &C, kind: TokenKind) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.keys(kind).encoding)
            .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
    }

    /// Verify signature and expiry against the secret for `kind`.
    ///
    /// Bad signatures, malformed tokens and expired tokens all collapse into
    /// [`AuthError::InvalidToken`].
    pub fn verify<C: DeserializeOwned>(&self, token: &str, kind: TokenKind) -> Result<C, AuthError> {
        decode::<C>(token, &self.keys(kind).decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(?kind, error = %e, "token rejected");
                AuthError::InvalidToken
            })
    }

    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.verify(token, TokenKind::Access)
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.verify(token, TokenKind::Refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(access_ttl: Duration) -> AuthConfig {
        AuthConfig {
            access_secret: "access-secret".into(),
            refresh_secret: "refresh-secret".into(),
            access_ttl,
            refresh_ttl: Duration::days(10),
        }
    }

    fn identity() -> Identity {
        Identity {
            id: Uuid::new_v4(),
            email: "a@example.com".into(),
            name: "Ada".into(),
            password_hash: String::new(),
        }
    }

    #[test]
    fn access_token_round_trips_claims() {
        let issuer = TokenIssuer::new(&config(Duration::minutes(15)));
        let who = identity();
        let token = issuer.issue_access_token(&who).unwrap();
        let claims = issuer.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, who.id.to_string());
        assert_eq!(claims.email, who.email);
        assert_eq!(claims.name, who.name);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn kinds_do_not_cross_verify() {
        let issuer = TokenIssuer::new(&config(Duration::minutes(15)));
        let who = identity();
        let access = issuer.issue_access_token(&who).unwrap();
        let refresh = issuer.issue_refresh_token(&who.id).unwrap();
        assert!(matches!(
            issuer.verify_refresh_token(&access),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            issuer.verify_access_token(&refresh),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn expired_and_tampered_tokens_share_one_error() {
        let issuer = TokenIssuer::new(&config(Duration::seconds(-120)));
        let expired = issuer.issue_access_token(&identity()).unwrap();
        assert!(matches!(
            issuer.verify_access_token(&expired),
            Err(AuthError::InvalidToken)
        ));

        let fresh = TokenIssuer::new(&config(Duration::minutes(5)));
        let mut tampered = fresh.issue_access_token(&identity()).unwrap();
        tampered.push('x');
        assert!(matches!(
            fresh.verify_access_token(&tampered),
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            fresh.verify_access_token("not-a-jwt"),
            Err(AuthError::InvalidToken)
        ));
    }

    #[test]
    fn overflowing_lifetime_is_an_error() {
        // Built directly to bypass the lifetime cap in `AuthConfig::new`.
        let issuer = TokenIssuer::new(&config(Duration::MAX));
        assert!(matches!(
            issuer.issue_access_token(&identity()),
            Err(AuthError::Internal(_))
        ));
    }

    #[test]
    fn same_second_refresh_tokens_differ() {
        let issuer = TokenIssuer::new(&config(Duration::minutes(15)));
        let id = Uuid::new_v4();
        let a = issuer.issue_refresh_token(&id).unwrap();
        let b = issuer.issue_refresh_token(&id).unwrap();
        assert_ne!(a, b);
    }
}
