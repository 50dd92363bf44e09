//! Role lookup trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::Role;
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Read-only lookup of pre-seeded roles
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync + Debug {
    /// Get a role by name, failing with `NotFound` if it is unknown
    async fn get_role(&self, name: &str) -> Result<Role, DomainError>;

    /// List all known roles
    async fn list(&self) -> Result<Vec<Role>, DomainError>;
}
