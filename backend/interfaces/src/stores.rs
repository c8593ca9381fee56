//! Persistence collaborators. The relational engine behind them is out of
//! scope; the gateway only needs key/value semantics.

use async_trait::async_trait;
use domain_types::{
    CustomResult, PartnerCredential, SessionKey, SessionTokenEntry, StoreError,
};

/// Encrypted partner credentials, read on every session refresh.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn fetch(&self, user_id: &str) -> CustomResult<Option<PartnerCredential>, StoreError>;
    async fn upsert(&self, credential: PartnerCredential) -> CustomResult<(), StoreError>;
}

/// Cached session tokens keyed by (user, session type). Writers are the
/// session manager only.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &SessionKey) -> CustomResult<Option<SessionTokenEntry>, StoreError>;
    async fn put(
        &self,
        key: SessionKey,
        entry: SessionTokenEntry,
    ) -> CustomResult<(), StoreError>;
    async fn delete(&self, key: &SessionKey) -> CustomResult<(), StoreError>;
    async fn delete_all(&self, user_id: &str) -> CustomResult<(), StoreError>;
}

/// Per-prefix order sequence. `next_for_prefix` is an atomic
/// fetch-and-increment: two concurrent calls for the same prefix must never
/// observe the same value.
#[async_trait]
pub trait SequenceStore: Send + Sync {
    async fn next_for_prefix(&self, prefix: &str) -> CustomResult<u64, StoreError>;
}
