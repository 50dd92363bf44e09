//! PostgreSQL role lookup

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::role::{Role, RoleRepository};
use crate::domain::DomainError;

/// Reads the `roles` table seeded by the schema migrations
#[derive(Debug, Clone)]
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn get_role(&self, name: &str) -> Result<Role, DomainError> {
        let found: Option<String> = sqlx::query_scalar("SELECT name FROM roles WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get role: {}", e)))?;

        found
            .map(Role::new)
            .ok_or_else(|| DomainError::not_found(format!("Role '{}' not found", name)))
    }

    async fn list(&self) -> Result<Vec<Role>, DomainError> {
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list roles: {}", e)))?;

        Ok(names.into_iter().map(Role::new).collect())
    }
}
