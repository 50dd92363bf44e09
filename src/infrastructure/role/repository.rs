//! In-memory role lookup

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::domain::role::{Role, RoleRepository};
use crate::domain::DomainError;

/// Fixed set of roles held in memory
#[derive(Debug, Clone)]
pub struct InMemoryRoleRepository {
    roles: BTreeMap<String, Role>,
}

impl InMemoryRoleRepository {
    /// Repository seeded with `ROLE_USER` and `ROLE_ADMIN`
    pub fn new() -> Self {
        Self::with_roles([Role::new(Role::USER), Role::new(Role::ADMIN)])
    }

    pub fn with_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        let roles = roles
            .into_iter()
            .map(|role| (role.name().to_string(), role))
            .collect();

        Self { roles }
    }
}

impl Default for InMemoryRoleRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoleRepository for InMemoryRoleRepository {
    async fn get_role(&self, name: &str) -> Result<Role, DomainError> {
        self.roles
            .get(name)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("Role '{}' not found", name)))
    }

    async fn list(&self) -> Result<Vec<Role>, DomainError> {
        Ok(self.roles.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_roles() {
        let repo = InMemoryRoleRepository::new();

        assert_eq!(repo.get_role("ROLE_USER").await.unwrap().name(), "ROLE_USER");
        assert!(repo.get_role("ROLE_ADMIN").await.unwrap().is_admin());
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_role_is_not_found() {
        let repo = InMemoryRoleRepository::new();

        let err = repo.get_role("ROLE_ROOT").await.unwrap_err();
        assert!(err.is_not_found());
    }
}
