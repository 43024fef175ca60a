//! In-memory grant store for authorization codes and access tokens.
//!
//! Entries are indexed by a keyed SHA-256 digest of the artifact, so the raw
//! codes and tokens handed to clients are never held as map keys. Every read
//! re-checks expiry; the sweeper only bounds memory.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::sync::{Mutex, RwLock};

use super::types::{Grant, GrantContext};
use crate::error::{OAuthError, OAuthResult};

/// Maximum number of entries removed per write-lock acquisition during a sweep.
pub const SWEEP_BATCH_SIZE: usize = 256;

/// Generate a random opaque token using two UUIDs (256 bits, 64 hex chars).
#[must_use]
pub fn generate_token() -> String {
    format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
}

/// Shared store of issued grants.
#[derive(Clone)]
pub struct GrantStore {
    grants: Arc<RwLock<HashMap<String, Grant>>>,
    secret: Arc<[u8]>,
    sweep_guard: Arc<Mutex<()>>,
}

impl GrantStore {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            grants: Arc::new(RwLock::new(HashMap::new())),
            secret: Arc::from(secret.as_bytes()),
            sweep_guard: Arc::new(Mutex::new(())),
        }
    }

    fn key(&self, artifact: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&*self.secret);
        hasher.update(artifact.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Store a grant under `artifact`, replacing any previous entry.
    pub async fn insert(&self, artifact: &str, grant: Grant) {
        let key = self.key(artifact);
        self.grants.write().await.insert(key, grant);
    }

    /// Mint a fresh artifact for `grant` and store it.
    pub async fn issue(&self, grant: Grant) -> String {
        let artifact = generate_token();
        self.insert(&artifact, grant).await;
        artifact
    }

    /// Fetch a grant if present and unexpired.
    pub async fn get(&self, artifact: &str) -> Option<Grant> {
        let key = self.key(artifact);
        let grants = self.grants.read().await;
        grants.get(&key).filter(|g| !g.is_expired()).cloned()
    }

    /// Whether an entry exists for `artifact`, expired or not.
    #[cfg(test)]
    pub(crate) async fn contains(&self, artifact: &str) -> bool {
        let key = self.key(artifact);
        self.grants.read().await.contains_key(&key)
    }

    /// Resolve a bearer token into the context attached to verified requests.
    pub async fn resolve_access_token(&self, token: &str) -> Option<GrantContext> {
        self.get(token)
            .await
            .filter(Grant::is_access_token)
            .map(|grant| GrantContext::from(&grant))
    }

    /// Spend an authorization code and issue an access token in one critical section.
    ///
    /// `check` runs under the write lock against the live code grant; any error
    /// it returns leaves the code in place. On success the code is removed and
    /// the token grant built by `mint` is stored.
    pub async fn redeem_code<C, M>(&self, code: &str, check: C, mint: M) -> OAuthResult<(String, Grant)>
    where
        C: FnOnce(&Grant) -> OAuthResult<()>,
        M: FnOnce(&Grant) -> Grant,
    {
        let code_key = self.key(code);
        let token = generate_token();
        let token_key = self.key(&token);

        let mut grants = self.grants.write().await;
        let code_grant = grants
            .get(&code_key)
            .filter(|g| g.is_authorization_code() && !g.is_expired())
            .ok_or(OAuthError::InvalidGrant("Invalid or expired authorization code"))?;

        check(code_grant)?;
        let token_grant = mint(code_grant);

        grants.remove(&code_key);
        grants.insert(token_key, token_grant.clone());
        Ok((token, token_grant))
    }

    /// Delete every expired entry, returning how many were removed.
    ///
    /// Concurrent sweeps are serialized. Keys are collected under a read lock
    /// and removed in batches of [`SWEEP_BATCH_SIZE`], yielding between
    /// batches; each removal re-checks expiry under the write lock.
    pub async fn sweep_expired(&self) -> usize {
        let _sweeping = self.sweep_guard.lock().await;
        let now = Utc::now();

        let expired: Vec<String> = {
            let grants = self.grants.read().await;
            grants
                .iter()
                .filter(|(_, g)| g.is_expired_at(now))
                .map(|(k, _)| k.clone())
                .collect()
        };

        let mut removed = 0;
        for batch in expired.chunks(SWEEP_BATCH_SIZE) {
            {
                let mut grants = self.grants.write().await;
                for key in batch {
                    if grants.get(key).is_some_and(|g| g.is_expired_at(now)) {
                        grants.remove(key);
                        removed += 1;
                    }
                }
            }
            tokio::task::yield_now().await;
        }

        if removed > 0 {
            tracing::info!(count = removed, "Swept expired grants");
        }
        removed
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub async fn len(&self) -> usize {
        self.grants.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.grants.read().await.is_empty()
    }
}

impl std::fmt::Debug for GrantStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GrantStore").finish()
    }
}
