//! In-memory user repository implementation

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::user::{User, UserId, UserRepository, UserStatus};
use crate::domain::versioning::{CachedAggregate, RecordFetcher, VersionProbe, VersionStamp};
use crate::domain::DomainError;

/// In-memory implementation of UserRepository.
///
/// Serves users in any status unless a status filter is set.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<UserId, User>>>,
    counter: AtomicU64,
    status_filter: Option<UserStatus>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only fetch users in `status`
    pub fn with_status_filter(mut self, status: UserStatus) -> Self {
        self.status_filter = Some(status);
        self
    }

    fn next_version(&self) -> VersionStamp {
        VersionStamp::from_counter(self.counter.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn not_found(id: &UserId) -> DomainError {
        DomainError::not_found(format!("User '{}' not found", id))
    }
}

#[async_trait]
impl VersionProbe<UserId> for InMemoryUserRepository {
    async fn current_version(&self, id: &UserId) -> Result<VersionStamp, DomainError> {
        let users = self.users.read().await;

        users
            .get(id)
            .map(|u| u.version().clone())
            .ok_or_else(|| Self::not_found(id))
    }
}

#[async_trait]
impl RecordFetcher<User, UserId> for InMemoryUserRepository {
    async fn fetch(&self, id: &UserId) -> Result<User, DomainError> {
        let users = self.users.read().await;

        users
            .get(id)
            .filter(|u| self.status_filter.is_none_or(|status| u.status() == status))
            .cloned()
            .ok_or_else(|| Self::not_found(id))
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find(&self, id: &UserId) -> Result<Option<User>, DomainError> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn create(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;

        if users.contains_key(user.identifier())
            || users.values().any(|u| u.email_id() == user.email_id())
        {
            return Err(DomainError::conflict("User already exists"));
        }

        let stored = user.with_version(self.next_version());
        users.insert(*stored.identifier(), stored.clone());
        Ok(stored)
    }

    async fn update(&self, user: User) -> Result<User, DomainError> {
        let mut users = self.users.write().await;

        if !users.contains_key(user.identifier()) {
            return Err(Self::not_found(user.identifier()));
        }

        let stored = user.with_version(self.next_version());
        users.insert(*stored.identifier(), stored.clone());
        Ok(stored)
    }
}
