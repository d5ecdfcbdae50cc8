//! In-memory credential store.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use super::{CredentialInfo, CredentialStore, NewCredential, StoreError, StoredCredentialRecord};

/// DashMap-backed store with sequential ids starting at 1.
#[derive(Debug)]
pub struct MemoryCredentialStore {
    rows: DashMap<i64, NewCredential>,
    next_id: AtomicI64,
    available: AtomicBool,
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicI64::new(1),
            available: AtomicBool::new(true),
        }
    }

    /// Insert with an explicit id, replacing any existing row.
    pub fn insert_with_id(&self, id: i64, credential: NewCredential) {
        self.rows.insert(id, credential);
        self.next_id.fetch_max(id + 1, Ordering::Relaxed);
    }

    /// Make every operation fail, as if the backing database went away.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn ensure_available(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store disabled".into()))
        }
    }
}

fn to_info(id: i64, row: &NewCredential) -> CredentialInfo {
    CredentialInfo {
        id,
        subject: row.subject.clone(),
        name: row.name.clone(),
        algorithm: row.algorithm.clone(),
        public_key: row.public_key.clone(),
        expires_at: row.expires_at,
        extra: row.extra.clone(),
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_credential_for_verify(
        &self,
        id: i64,
    ) -> Result<Option<StoredCredentialRecord>, StoreError> {
        self.ensure_available()?;
        let now = Utc::now();

        Ok(self
            .rows
            .get(&id)
            .filter(|row| row.expires_at.is_none_or(|exp| exp > now))
            .map(|row| StoredCredentialRecord {
                id,
                secret_hash: row.secret_hash.clone(),
                public_key: row.public_key.clone(),
                algorithm: row.algorithm.clone(),
                subject: row.subject.clone(),
                expires_at: row.expires_at,
                extra: row.extra.clone(),
            }))
    }

    async fn insert(&self, credential: NewCredential) -> Result<i64, StoreError> {
        self.ensure_available()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.rows.insert(id, credential);
        Ok(id)
    }

    async fn search_by_subject(&self, subject: &str) -> Result<Vec<CredentialInfo>, StoreError> {
        self.ensure_available()?;
        let mut found: Vec<_> = self
            .rows
            .iter()
            .filter(|entry| entry.value().subject == subject)
            .map(|entry| to_info(*entry.key(), entry.value()))
            .collect();
        found.sort_by_key(|info| info.id);
        Ok(found)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<CredentialInfo>, StoreError> {
        self.ensure_available()?;
        Ok(self.rows.get(&id).map(|row| to_info(id, row.value())))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.ensure_available()
    }
}
