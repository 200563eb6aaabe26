//! In-memory [`Repository`] and [`UserDirectory`] implementations backed by [`DashMap`].
//!
//! Provides concurrent read/write access without external locking. Suitable
//! for development, testing, and single-node deployments where all data fits
//! in memory.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use crate::traits::{OwnedRecord, Repository, UserAccount, UserDirectory};

/// In-memory repository keyed by record id.
pub struct MemoryRepository<T> {
    records: DashMap<Uuid, T>,
}

impl<T> MemoryRepository<T> {
    /// Creates a new, empty `MemoryRepository`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }

    /// Number of records across all owners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> Default for MemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: OwnedRecord> Repository<T> for MemoryRepository<T> {
    async fn insert(&self, record: T) -> anyhow::Result<()> {
        match self.records.entry(record.id()) {
            Entry::Occupied(_) => anyhow::bail!("{} {} already exists", T::ENTITY, record.id()),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn get(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<T>> {
        Ok(self
            .records
            .get(&id)
            .filter(|r| r.owner() == owner)
            .map(|r| r.clone()))
    }

    async fn put(&self, record: T) -> anyhow::Result<bool> {
        match self.records.get_mut(&record.id()) {
            Some(mut existing) if existing.owner() == record.owner() => {
                *existing = record;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list(&self, owner: &str) -> anyhow::Result<Vec<T>> {
        Ok(self
            .records
            .iter()
            .filter(|r| r.owner() == owner)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn remove(&self, owner: &str, id: Uuid) -> anyhow::Result<Option<T>> {
        Ok(self
            .records
            .remove_if(&id, |_, r| r.owner() == owner)
            .map(|(_, r)| r))
    }
}

/// In-memory user directory keyed by lower-cased email.
#[derive(Default)]
pub struct MemoryUserDirectory {
    accounts: DashMap<String, UserAccount>,
}

impl MemoryUserDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryUserDirectory {
    async fn insert_user(&self, account: UserAccount) -> anyhow::Result<bool> {
        match self.accounts.entry(account.email.to_lowercase()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(account);
                Ok(true)
            }
        }
    }

    async fn find_user(&self, email: &str) -> anyhow::Result<Option<UserAccount>> {
        Ok(self
            .accounts
            .get(&email.to_lowercase())
            .map(|a| a.value().clone()))
    }
}
