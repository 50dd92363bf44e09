//! Storage factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::domain::role::RoleRepository;
use crate::domain::user::UserStore;
use crate::domain::DomainError;
use crate::infrastructure::role::{InMemoryRoleRepository, PostgresRoleRepository};
use crate::infrastructure::user::{InMemoryUserStore, PostgresUserStore};

use super::migrations::run_user_migrations;
use super::postgres::{connect, PostgresConfig};

/// Supported storage types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
}

impl StorageConfig {
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    /// Creates a PostgreSQL configuration from a URL
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres(PostgresConfig::new(url))
    }

    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
        }
    }
}

/// Persistence collaborators of the account service
#[derive(Debug, Clone)]
pub struct UserBackends {
    pub users: Arc<dyn UserStore>,
    pub roles: Arc<dyn RoleRepository>,
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates the user store and role lookup for the configured backend.
    /// PostgreSQL schemas are migrated before the backends are returned.
    pub async fn create_user_backends(config: &StorageConfig) -> Result<UserBackends, DomainError> {
        match config {
            StorageConfig::InMemory => Ok(Self::create_in_memory()),
            StorageConfig::Postgres(pg_config) => {
                let pool = connect(pg_config).await?;
                let applied = run_user_migrations(&pool).await?;
                info!(applied, "PostgreSQL schema ready");

                Ok(UserBackends {
                    users: Arc::new(PostgresUserStore::new(pool.clone())),
                    roles: Arc::new(PostgresRoleRepository::new(pool)),
                })
            }
        }
    }

    /// Creates empty in-memory backends with the default roles
    pub fn create_in_memory() -> UserBackends {
        UserBackends {
            users: Arc::new(InMemoryUserStore::new()),
            roles: Arc::new(InMemoryRoleRepository::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_type_from_str() {
        assert_eq!(StorageType::from_str("memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::from_str("In-Memory"), Some(StorageType::InMemory));
        assert_eq!(StorageType::from_str("postgres"), Some(StorageType::Postgres));
        assert_eq!(StorageType::from_str("PG"), Some(StorageType::Postgres));
        assert_eq!(StorageType::from_str("mysql"), None);
    }

    #[test]
    fn test_storage_config_type() {
        assert_eq!(StorageConfig::in_memory().storage_type(), StorageType::InMemory);
        assert_eq!(
            StorageConfig::postgres_url("postgres://localhost/test").storage_type(),
            StorageType::Postgres
        );
    }

    #[tokio::test]
    async fn test_in_memory_backends() {
        let backends = StorageFactory::create_user_backends(&StorageConfig::in_memory())
            .await
            .unwrap();

        assert_eq!(backends.roles.list().await.unwrap().len(), 2);

        let mut tx = backends.users.begin().await.unwrap();
        assert!(tx.find_all().await.unwrap().is_empty());
    }
}
