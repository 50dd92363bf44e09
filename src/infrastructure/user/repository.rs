//! In-memory user store

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::user::{User, UserId, UserRepository, UserStore};
use crate::domain::DomainError;

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    /// Index for username -> user ID lookup
    username_index: HashMap<String, UserId>,
    next_id: i64,
}

impl Tables {
    fn allocate_id(&mut self) -> UserId {
        self.next_id += 1;
        UserId::new(self.next_id)
    }
}

/// In-memory implementation of UserStore
///
/// A unit of work holds the table lock until it is committed or dropped, so
/// units of work run one at a time.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// True while a unit of work holds the tables
    #[cfg(test)]
    pub(crate) fn is_locked(&self) -> bool {
        self.tables.try_lock().is_err()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn begin(&self) -> Result<Box<dyn UserRepository>, DomainError> {
        let guard = self.tables.clone().lock_owned().await;
        let working = Tables::clone(&guard);

        Ok(Box::new(InMemoryUserTransaction { guard, working }))
    }
}

/// Unit of work over a private copy of the tables
struct InMemoryUserTransaction {
    guard: OwnedMutexGuard<Tables>,
    working: Tables,
}

#[async_trait]
impl UserRepository for InMemoryUserTransaction {
    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, DomainError> {
        Ok(self.working.users.get(&id).cloned())
    }

    async fn find_by_username(&mut self, username: &str) -> Result<Option<User>, DomainError> {
        let Some(id) = self.working.username_index.get(username) else {
            return Ok(None);
        };

        Ok(self.working.users.get(id).cloned())
    }

    async fn find_all(&mut self) -> Result<Vec<User>, DomainError> {
        Ok(self.working.users.values().cloned().collect())
    }

    async fn save(&mut self, user: User) -> Result<User, DomainError> {
        let tables = &mut self.working;

        if let Some(&owner) = tables.username_index.get(user.username()) {
            if Some(owner) != user.id() {
                return Err(DomainError::conflict(format!(
                    "Username '{}' already exists",
                    user.username()
                )));
            }
        }

        let (id, user) = match user.id() {
            Some(id) => {
                let old = tables
                    .users
                    .get(&id)
                    .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))?;

                if old.username() != user.username() {
                    let old_username = old.username().to_string();
                    tables.username_index.remove(&old_username);
                }

                (id, user)
            }
            None => {
                let id = tables.allocate_id();
                (id, user.with_id(id))
            }
        };

        tables
            .username_index
            .insert(user.username().to_string(), id);
        tables.users.insert(id, user.clone());

        Ok(user)
    }

    async fn delete(&mut self, user: &User) -> Result<(), DomainError> {
        let Some(id) = user.id() else {
            return Ok(());
        };

        if let Some(removed) = self.working.users.remove(&id) {
            self.working.username_index.remove(removed.username());
        }

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        let InMemoryUserTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
