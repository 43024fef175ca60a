//! Registered client credentials.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use chrono::Utc;
use subtle::ConstantTimeEq;
use tokio::sync::RwLock;

use super::store::generate_token;
use super::types::{ClientInfo, DEFAULT_SCOPE, OAuthClient, RegisteredClient};
use crate::error::{OAuthError, OAuthResult};

/// In-memory client registry, keyed by `client_id`.
#[derive(Clone, Default)]
pub struct CredentialStore {
    clients: Arc<RwLock<HashMap<String, OAuthClient>>>,
}

impl CredentialStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client (RFC 7591 dynamic registration).
    ///
    /// Returns the full record including the secret; later lookups never expose it.
    pub async fn register(&self, redirect_uris: Vec<String>) -> RegisteredClient {
        let client_secret = generate_token();
        let mut clients = self.clients.write().await;

        loop {
            let client_id = uuid::Uuid::new_v4().to_string();
            if let Entry::Vacant(slot) = clients.entry(client_id) {
                let client = OAuthClient {
                    client_id: slot.key().clone(),
                    client_secret,
                    redirect_uris,
                    scope: DEFAULT_SCOPE.to_string(),
                    created_at: Utc::now(),
                };
                return RegisteredClient::from(&*slot.insert(client));
            }
            tracing::warn!("client_id collision during registration, retrying");
        }
    }

    /// Look up a client by ID.
    pub async fn lookup(&self, client_id: &str) -> Option<ClientInfo> {
        let clients = self.clients.read().await;
        clients.get(client_id).map(|c| ClientInfo {
            client_id: c.client_id.clone(),
            redirect_uris: c.redirect_uris.clone(),
            scope: c.scope.clone(),
        })
    }

    /// Verify a client's credentials with a constant-time secret comparison.
    pub async fn authenticate(
        &self,
        client_id: Option<&str>,
        client_secret: Option<&str>,
    ) -> OAuthResult<ClientInfo> {
        let (Some(client_id), Some(client_secret)) = (client_id, client_secret) else {
            return Err(OAuthError::InvalidClient);
        };

        let clients = self.clients.read().await;
        let client = clients.get(client_id).ok_or(OAuthError::InvalidClient)?;

        if !bool::from(client.client_secret.as_bytes().ct_eq(client_secret.as_bytes())) {
            return Err(OAuthError::InvalidClient);
        }

        Ok(ClientInfo {
            client_id: client.client_id.clone(),
            redirect_uris: client.redirect_uris.clone(),
            scope: client.scope.clone(),
        })
    }

    /// Number of registered clients.
    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.clients.read().await.is_empty()
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_twice_yields_distinct_credentials() {
        let store = CredentialStore::new();
        let a = store.register(vec!["https://cb.example/cb".into()]).await;
        let b = store.register(vec!["https://cb.example/cb".into()]).await;

        assert_ne!(a.client_id, b.client_id);
        assert_ne!(a.client_secret, b.client_secret);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_registered_client_shape() {
        let store = CredentialStore::new();
        let client = store.register(vec![]).await;

        assert_eq!(client.grant_types, vec!["authorization_code"]);
        assert_eq!(client.response_types, vec!["code"]);
        assert_eq!(client.scope, "read write mcp");
        assert_eq!(client.client_secret.len(), 64);
    }

    #[tokio::test]
    async fn test_lookup() {
        let store = CredentialStore::new();
        let client = store.register(vec!["https://cb.example/cb".into()]).await;

        let info = store.lookup(&client.client_id).await.unwrap();
        assert_eq!(info.redirect_uris, vec!["https://cb.example/cb".to_string()]);
        assert!(store.lookup("nope").await.is_none());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let store = CredentialStore::new();
        let client = store.register(vec![]).await;

        assert!(store.authenticate(Some(&client.client_id), Some(&client.client_secret)).await.is_ok());
        assert_eq!(
            store.authenticate(Some(&client.client_id), Some("wrong")).await,
            Err(OAuthError::InvalidClient)
        );
        assert_eq!(
            store.authenticate(Some("unknown"), Some(&client.client_secret)).await,
            Err(OAuthError::InvalidClient)
        );
        assert_eq!(store.authenticate(Some(&client.client_id), None).await, Err(OAuthError::InvalidClient));
    }
}
