//! User persistence traits

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserId};
use crate::domain::DomainError;

/// Unit of work over stored users
///
/// Every read and write made through one value belongs to the same
/// transaction. Changes become visible to other units of work only after
/// [`commit`](UserRepository::commit); dropping the value without committing
/// discards them.
#[async_trait]
pub trait UserRepository: Send {
    /// Get a user by id
    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, DomainError>;

    /// Get a user by username
    async fn find_by_username(&mut self, username: &str) -> Result<Option<User>, DomainError>;

    /// List all users in storage order
    async fn find_all(&mut self) -> Result<Vec<User>, DomainError>;

    /// Insert a user without an id, or overwrite the stored user with the same id.
    /// Returns the stored user with its id set.
    async fn save(&mut self, user: User) -> Result<User, DomainError>;

    /// Delete a user and its role assignments. Deleting an unknown user is a no-op.
    async fn delete(&mut self, user: &User) -> Result<(), DomainError>;

    /// Publish the changes made in this unit of work
    async fn commit(self: Box<Self>) -> Result<(), DomainError>;
}

/// Source of units of work
#[async_trait]
pub trait UserStore: Send + Sync + Debug {
    /// Open a new unit of work
    async fn begin(&self) -> Result<Box<dyn UserRepository>, DomainError>;
}
