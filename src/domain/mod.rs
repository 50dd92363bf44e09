//! Domain layer: entities, errors and persistence traits

pub mod error;
pub mod role;
pub mod user;

pub use error::DomainError;
pub use role::{Role, RoleRepository};
pub use user::{AuthPrincipal, User, UserId, UserRepository, UserStore};
