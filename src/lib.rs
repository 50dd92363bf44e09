//! User Admin
//!
//! User and role account management for the admin panel:
//! - Authentication lookup (principal with password digest and authorities)
//! - Account lifecycle: add, update, delete, list
//! - Admin promotion and demotion with role/flag kept in sync
//! - One-time seeding of the baseline "Admin" and "User" accounts
//! - In-memory and PostgreSQL storage behind a unit-of-work interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use infrastructure::storage::{StorageConfig, StorageFactory};
use infrastructure::user::{Argon2Hasher, DynUserService, PasswordHasher, UserService};

/// Build the account service for the configured storage backend
pub async fn create_user_service(config: &AppConfig) -> anyhow::Result<DynUserService> {
    let storage = config.storage.storage_config()?;
    info!("Storage backend: {:?}", storage.storage_type());

    let backends = StorageFactory::create_user_backends(&storage).await?;
    let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new());

    Ok(UserService::new(backends.users, backends.roles, hasher)
        .with_duplicate_policy(config.accounts.duplicate_username))
}

/// Build the account service for a command run.
///
/// The in-memory backend starts empty in every process and is seeded here when
/// seeding is enabled. Persistent stores are only seeded by the `seed` command.
pub async fn create_seeded_user_service(config: &AppConfig) -> anyhow::Result<DynUserService> {
    let service = create_user_service(config).await?;

    let in_memory = matches!(config.storage.storage_config()?, StorageConfig::InMemory);
    if in_memory && config.accounts.seed_default_accounts {
        service.bootstrap().await?;
    }

    Ok(service)
}
