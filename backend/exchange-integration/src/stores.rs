//! In-memory store implementations, used for sandbox operation and tests.
//! Production deployments wire the same traits to the platform's relational
//! store.

use std::{
    collections::HashMap,
    sync::Mutex,
};

use async_trait::async_trait;
use domain_types::{
    CustomResult, PartnerCredential, SessionKey, SessionTokenEntry, StoreError,
};
use error_stack::report;
use interfaces::{CredentialStore, SessionStore, SequenceStore};

fn lock_or_unavailable<'a, T>(
    mutex: &'a Mutex<T>,
    what: &str,
) -> CustomResult<std::sync::MutexGuard<'a, T>, StoreError> {
    mutex
        .lock()
        .map_err(|_| report!(StoreError::Unavailable(format!("{what} store poisoned"))))
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: Mutex<HashMap<String, PartnerCredential>>,
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn fetch(&self, user_id: &str) -> CustomResult<Option<PartnerCredential>, StoreError> {
        Ok(lock_or_unavailable(&self.inner, "credential")?
            .get(user_id)
            .cloned())
    }

    async fn upsert(&self, credential: PartnerCredential) -> CustomResult<(), StoreError> {
        lock_or_unavailable(&self.inner, "credential")?
            .insert(credential.user_id.clone(), credential);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStore {
    inner: Mutex<HashMap<SessionKey, SessionTokenEntry>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &SessionKey) -> CustomResult<Option<SessionTokenEntry>, StoreError> {
        Ok(lock_or_unavailable(&self.inner, "session")?.get(key).cloned())
    }

    async fn put(
        &self,
        key: SessionKey,
        entry: SessionTokenEntry,
    ) -> CustomResult<(), StoreError> {
        lock_or_unavailable(&self.inner, "session")?.insert(key, entry);
        Ok(())
    }

    async fn delete(&self, key: &SessionKey) -> CustomResult<(), StoreError> {
        lock_or_unavailable(&self.inner, "session")?.remove(key);
        Ok(())
    }

    async fn delete_all(&self, user_id: &str) -> CustomResult<(), StoreError> {
        lock_or_unavailable(&self.inner, "session")?
            .retain(|key, _| key.user_id != user_id);
        Ok(())
    }
}

/// Monotonic per-prefix counter. The increment happens under one lock, so two
/// concurrent callers for the same prefix always observe distinct values.
#[derive(Debug, Default)]
pub struct MemorySequenceStore {
    inner: Mutex<HashMap<String, u64>>,
}

#[async_trait]
impl SequenceStore for MemorySequenceStore {
    async fn next_for_prefix(&self, prefix: &str) -> CustomResult<u64, StoreError> {
        let mut counters = lock_or_unavailable(&self.inner, "sequence")?;
        let next = counters.entry(prefix.to_string()).or_insert(0);
        *next += 1;
        Ok(*next)
    }
}
