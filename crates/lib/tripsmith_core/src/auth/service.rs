//! Session orchestration: register, login, refresh rotation, logout.
//!
//! Per identity the session is either absent or exactly one live refresh
//! token. Login and refresh move it to a new token, logout clears it.
//! Refresh only succeeds for the exact token on record, so a superseded
//! token is rejected even before it expires.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::AuthError;
use super::config::AuthConfig;
use super::jwt::{TokenIssuer, TokenKind};
use super::password::{hash_password, verify_password};
use super::session::{SessionRegistry, digest_token};
use crate::models::auth::{AccessClaims, Identity, NewIdentity, PublicUser, Session, TokenPair};
use crate::store::{IdentityStore, StoreError};

pub struct AuthSessionService {
    identities: Arc<dyn IdentityStore>,
    sessions: Arc<dyn SessionRegistry>,
    issuer: TokenIssuer,
}

impl AuthSessionService {
    pub fn new(
        config: &AuthConfig,
        identities: Arc<dyn IdentityStore>,
        sessions: Arc<dyn SessionRegistry>,
    ) -> Self {
        Self {
            identities,
            sessions,
            issuer: TokenIssuer::new(config),
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    /// Create an identity. Does not open a session.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<PublicUser, AuthError> {
        let name = name.trim();
        let email = normalize_email(email);
        if name.is_empty() || email.is_empty() || password.trim().is_empty() {
            return Err(AuthError::Validation("All fields are required".into()));
        }
        if !looks_like_email(&email) {
            return Err(AuthError::Validation("Please use a valid email address".into()));
        }

        let password_hash = hash_password(password)?;
        let identity = self
            .identities
            .create_identity(NewIdentity {
                email,
                name: name.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Store(other),
            })?;

        info!(user_id = %identity.id, "registered identity");
        Ok(identity.public())
    }

    /// Verify credentials and open a session, superseding any previous one.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let identity = self
            .identities
            .find_identity_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &identity.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        let tokens = self.issue_pair(&identity)?;
        self.sessions
            .set_refresh_token(&identity.id, &digest_token(&tokens.refresh_token))
            .await?;

        info!(user_id = %identity.id, "login succeeded");
        Ok(Session {
            user: identity.public(),
            tokens,
        })
    }

    /// Exchange the live refresh token for a new pair (rotation).
    pub async fn refresh(&self, presented: Option<&str>) -> Result<TokenPair, AuthError> {
        let presented = presented
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.issuer.verify_refresh_token(presented)?;
        let identity_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidToken)?;
        let identity = self
            .identities
            .find_identity_by_id(&identity_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        let presented_digest = digest_token(presented);
        let stored = self.sessions.get_refresh_token(&identity_id).await?;
        if stored.as_deref() != Some(presented_digest.as_str()) {
            warn!(user_id = %identity_id, "stale refresh token presented");
            return Err(AuthError::TokenMismatch);
        }

        let tokens = self.issue_pair(&identity)?;
        let rotated = self
            .sessions
            .rotate_refresh_token(
                &identity_id,
                &presented_digest,
                &digest_token(&tokens.refresh_token),
            )
            .await?;
        if !rotated {
            // Another refresh with the same token won the compare-and-swap.
            warn!(user_id = %identity_id, "concurrent refresh lost rotation race");
            return Err(AuthError::TokenMismatch);
        }

        Ok(tokens)
    }

    /// End the session. Idempotent.
    pub async fn logout(&self, identity_id: &Uuid) -> Result<(), AuthError> {
        self.sessions.clear_refresh_token(identity_id).await?;
        info!(user_id = %identity_id, "logged out");
        Ok(())
    }

    /// Resolve the caller's public identity.
    pub async fn current_user(&self, identity_id: Option<&Uuid>) -> Result<PublicUser, AuthError> {
        let identity_id = identity_id.ok_or(AuthError::Unauthorized)?;
        self.identities
            .find_identity_by_id(identity_id)
            .await?
            .map(|i| i.public())
            .ok_or(AuthError::Unauthorized)
    }

    /// Verify an access token presented with a request.
    pub fn authenticate(&self, access_token: &str) -> Result<AccessClaims, AuthError> {
        self.issuer.verify_access_token(access_token)
    }

    fn issue_pair(&self, identity: &Identity) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access_token: self.issuer.issue_access_token(identity)?,
            refresh_token: self.issuer.issue_refresh_token(&identity.id)?,
            access_expires_in: self.issuer.ttl_secs(TokenKind::Access),
            refresh_expires_in: self.issuer.ttl_secs(TokenKind::Refresh),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::store::MemoryStore;

    fn service() -> (AuthSessionService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let config = AuthConfig::new(
            "access-secret",
            "refresh-secret",
            Duration::minutes(15),
            Duration::days(10),
        )
        .unwrap();
        let svc = AuthSessionService::new(&config, store.clone(), store.clone());
        (svc, store)
    }

    async fn registered() -> (AuthSessionService, Arc<MemoryStore>, PublicUser) {
        let (svc, store) = service();
        let user = svc.register("Ada", "a@example.com", "secret").await.unwrap();
        (svc, store, user)
    }

    #[tokio::test]
    async fn register_normalizes_and_rejects_duplicates() {
        let (svc, _) = service();
        let user = svc
            .register(" Ada ", "  A@Example.com ", "secret")
            .await
            .unwrap();
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.name, "Ada");

        let dup = svc.register("Other", "a@example.com", "secret2").await;
        assert!(matches!(dup, Err(AuthError::EmailTaken)));
    }

    #[tokio::test]
    async fn register_validates_fields() {
        let (svc, _) = service();
        assert!(matches!(
            svc.register("", "a@example.com", "secret").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            svc.register("Ada", "not-an-email", "secret").await,
            Err(AuthError::Validation(_))
        ));
        assert!(matches!(
            svc.register("Ada", "a@example.com", "   ").await,
            Err(AuthError::Validation(_))
        ));
        // Any non-blank password is accepted.
        assert!(svc.register("Ada", "a@example.com", "abc").await.is_ok());
    }

    #[tokio::test]
    async fn login_stores_digest_of_refresh_token() {
        let (svc, store, user) = registered().await;
        let session = svc.login("a@example.com", "secret").await.unwrap();
        assert_eq!(session.user, user);

        let stored = store.get_refresh_token(&user.id).await.unwrap();
        assert_eq!(stored, Some(digest_token(&session.tokens.refresh_token)));

        let claims = svc.authenticate(&session.tokens.access_token).unwrap();
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(session.tokens.access_expires_in, 15 * 60);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let (svc, _, _) = registered().await;
        assert!(matches!(
            svc.login("nobody@example.com", "secret").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            svc.login("a@example.com", "wrong").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn refresh_rotates_and_rejects_replay() {
        let (svc, _, _) = registered().await;
        let t1 = svc.login("a@example.com", "secret").await.unwrap().tokens;

        let t2 = svc.refresh(Some(&t1.refresh_token)).await.unwrap();
        assert_ne!(t2.refresh_token, t1.refresh_token);

        assert!(matches!(
            svc.refresh(Some(&t1.refresh_token)).await,
            Err(AuthError::TokenMismatch)
        ));

        // the rotated token still works
        let t3 = svc.refresh(Some(&t2.refresh_token)).await.unwrap();
        assert_ne!(t3.refresh_token, t2.refresh_token);
    }

    #[tokio::test]
    async fn second_login_supersedes_first_session() {
        let (svc, _, _) = registered().await;
        let first = svc.login("a@example.com", "secret").await.unwrap().tokens;
        let second = svc.login("a@example.com", "secret").await.unwrap().tokens;

        assert!(matches!(
            svc.refresh(Some(&first.refresh_token)).await,
            Err(AuthError::TokenMismatch)
        ));
        assert!(svc.refresh(Some(&second.refresh_token)).await.is_ok());
    }

    #[tokio::test]
    async fn refresh_error_kinds() {
        let (svc, _, _) = registered().await;
        let session = svc.login("a@example.com", "secret").await.unwrap();

        assert!(matches!(svc.refresh(None).await, Err(AuthError::MissingToken)));
        assert!(matches!(svc.refresh(Some("  ")).await, Err(AuthError::MissingToken)));
        assert!(matches!(
            svc.refresh(Some("garbage")).await,
            Err(AuthError::InvalidToken)
        ));
        assert!(matches!(
            svc.refresh(Some(&session.tokens.access_token)).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn logout_then_refresh_fails_and_logout_is_idempotent() {
        let (svc, store, user) = registered().await;
        let tokens = svc.login("a@example.com", "secret").await.unwrap().tokens;

        svc.logout(&user.id).await.unwrap();
        svc.logout(&user.id).await.unwrap();
        assert!(store.get_refresh_token(&user.id).await.unwrap().is_none());

        assert!(matches!(
            svc.refresh(Some(&tokens.refresh_token)).await,
            Err(AuthError::TokenMismatch)
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_refresh_with_same_token_has_one_winner() {
        let (svc, _, _) = registered().await;
        let svc = Arc::new(svc);
        let tokens = svc.login("a@example.com", "secret").await.unwrap().tokens;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let svc = svc.clone();
                let token = tokens.refresh_token.clone();
                tokio::spawn(async move { svc.refresh(Some(&token)).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => winners += 1,
                Err(AuthError::TokenMismatch) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn current_user_requires_resolvable_identity() {
        let (svc, _, user) = registered().await;
        assert_eq!(svc.current_user(Some(&user.id)).await.unwrap(), user);
        assert!(matches!(
            svc.current_user(None).await,
            Err(AuthError::Unauthorized)
        ));
        assert!(matches!(
            svc.current_user(Some(&Uuid::new_v4())).await,
            Err(AuthError::Unauthorized)
        ));
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@example.com"));
        assert!(!looks_like_email("a@example"));
        assert!(!looks_like_email("@example.com"));
        assert!(!looks_like_email("a b@example.com"));
        assert!(!looks_like_email("a@@example.com"));
    }
}
