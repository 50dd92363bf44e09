//! User infrastructure module
//!
//! This module provides the account service together with its adapters:
//! password hashing with Argon2, an in-memory store and a PostgreSQL store.

mod password;
mod postgres_repository;
mod repository;
mod service;

pub use password::{Argon2Hasher, PasswordHasher};
pub use postgres_repository::PostgresUserStore;
pub use repository::InMemoryUserStore;
pub use service::{
    CreateUserRequest, DuplicateUsernamePolicy, DynUserService, UpdateUserRequest, UserService,
};
