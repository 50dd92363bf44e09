//! Role lookup implementations

mod postgres_repository;
mod repository;

pub use postgres_repository::PostgresRoleRepository;
pub use repository::InMemoryRoleRepository;
