//! Partner credential lifecycle: encrypt-on-write, status without secrets,
//! and session invalidation on rotation so no cached token outlives the
//! credentials that produced it.

use std::sync::Arc;

use domain_types::{
    lift, CustomResult, ExchangeError, PartnerCredential,
};
use interfaces::{CredentialStore, SessionStore};
use masking::{PeekInterface, Secret};
use serde::Serialize;

use crate::crypto::CredentialCipher;

/// Plaintext credentials as received from onboarding. Never stored, never
/// logged; the secrets go through the cipher before anything persists.
pub struct CredentialInput {
    pub exchange_user_id: String,
    pub member_id: String,
    pub arn: String,
    pub euin: Option<String>,
    pub password: Secret<String>,
    pub pass_key: Secret<String>,
}

/// Non-secret view for status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct CredentialStatus {
    pub configured: bool,
    pub active: bool,
    pub exchange_user_id: Option<String>,
    pub member_id: Option<String>,
    pub arn: Option<String>,
    pub euin: Option<String>,
}

pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    cipher: Arc<CredentialCipher>,
}

impl CredentialService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        cipher: Arc<CredentialCipher>,
    ) -> Self {
        Self {
            store,
            sessions,
            cipher,
        }
    }

    /// Creates or replaces the user's exchange credentials. Every cached
    /// session for the user is dropped afterwards: tokens minted under the
    /// old password must not survive the rotation.
    pub async fn set_credentials(
        &self,
        user_id: &str,
        input: CredentialInput,
    ) -> CustomResult<(), ExchangeError> {
        let password = lift(self.cipher.encrypt(input.password.peek()))?;
        let pass_key = lift(self.cipher.encrypt(input.pass_key.peek()))?;

        lift(
            self.store
                .upsert(PartnerCredential {
                    user_id: user_id.to_string(),
                    exchange_user_id: input.exchange_user_id,
                    member_id: input.member_id,
                    arn: input.arn,
                    euin: input.euin,
                    password,
                    pass_key,
                    active: true,
                })
                .await,
        )?;
        lift(self.sessions.delete_all(user_id).await)
    }

    pub async fn status(&self, user_id: &str) -> CustomResult<CredentialStatus, ExchangeError> {
        Ok(match lift(self.store.fetch(user_id).await)? {
            Some(credential) => CredentialStatus {
                configured: true,
                active: credential.active,
                exchange_user_id: Some(credential.exchange_user_id),
                member_id: Some(credential.member_id),
                arn: Some(credential.arn),
                euin: credential.euin,
            },
            None => CredentialStatus {
                configured: false,
                active: false,
                exchange_user_id: None,
                member_id: None,
                arn: None,
                euin: None,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use domain_types::{SessionKey, SessionTokenEntry, SessionType};
    use time::OffsetDateTime;

    use super::*;
    use crate::stores::{MemoryCredentialStore, MemorySessionStore};

    fn input() -> CredentialInput {
        CredentialInput {
            exchange_user_id: "1010101".into(),
            member_id: "10123".into(),
            arn: "ARN-12345".into(),
            euin: Some("E123456".into()),
            password: Secret::new("hunter2".to_string()),
            pass_key: Secret::new("pass-key".to_string()),
        }
    }

    fn service() -> (CredentialService, Arc<MemoryCredentialStore>, Arc<MemorySessionStore>) {
        let store = Arc::new(MemoryCredentialStore::default());
        let sessions = Arc::new(MemorySessionStore::default());
        let service = CredentialService::new(
            Arc::clone(&store) as Arc<dyn CredentialStore>,
            Arc::clone(&sessions) as Arc<dyn SessionStore>,
            Arc::new(CredentialCipher::ephemeral()),
        );
        (service, store, sessions)
    }

    #[tokio::test]
    async fn secrets_are_encrypted_before_persisting() {
        let (service, store, _) = service();
        service.set_credentials("advisor-1", input()).await.unwrap();

        let stored = store.fetch("advisor-1").await.unwrap().unwrap();
        assert!(!stored.password.ciphertext.contains("hunter2"));
        assert!(stored.password.ciphertext.contains(':'));
        assert_ne!(stored.password.iv, stored.pass_key.iv);
    }

    #[tokio::test]
    async fn rotation_drops_cached_sessions() {
        let (service, _, sessions) = service();
        let key = SessionKey::new("advisor-1", SessionType::OrderEntry);
        sessions
            .put(
                key.clone(),
                SessionTokenEntry {
                    token: "stale".into(),
                    expires_at: OffsetDateTime::now_utc() + time::Duration::hours(1),
                },
            )
            .await
            .unwrap();

        service.set_credentials("advisor-1", input()).await.unwrap();

        assert!(sessions.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_never_carries_secrets() {
        let (service, _, _) = service();
        let unconfigured = service.status("advisor-1").await.unwrap();
        assert!(!unconfigured.configured);

        service.set_credentials("advisor-1", input()).await.unwrap();
        let status = service.status("advisor-1").await.unwrap();
        assert!(status.configured && status.active);
        assert_eq!(status.member_id.as_deref(), Some("10123"));
        let as_json = serde_json::to_string(&status).unwrap();
        assert!(!as_json.contains("hunter2"));
        assert!(!as_json.contains("pass"));
    }
}
