//! Session registry: the single live refresh token per identity.
//!
//! Values stored here are refresh-token digests (see [`digest_token`]).
//! Setting a value supersedes whatever was there; there is no revocation
//! list, so any previously issued refresh token stops matching the moment a
//! new one is stored.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::store::StoreError;

/// Persists the currently valid refresh token for each identity.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Unconditionally overwrite the stored value.
    async fn set_refresh_token(&self, identity_id: &Uuid, token: &str) -> Result<(), StoreError>;

    async fn get_refresh_token(&self, identity_id: &Uuid) -> Result<Option<String>, StoreError>;

    /// Clear the stored value. Clearing an empty slot is not an error.
    async fn clear_refresh_token(&self, identity_id: &Uuid) -> Result<(), StoreError>;

    /// Replace `expected` with `replacement` atomically.
    ///
    /// Returns `false` without writing when the stored value is not exactly
    /// `expected` (including when nothing is stored).
    async fn rotate_refresh_token(
        &self,
        identity_id: &Uuid,
        expected: &str,
        replacement: &str,
    ) -> Result<bool, StoreError>;
}

/// SHA-256 hex digest of a refresh token, the form kept at rest.
pub fn digest_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
