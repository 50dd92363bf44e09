//! Role domain
//!
//! Roles are named permission groups. They are pre-seeded reference data:
//! the account service looks them up by name but never creates them.

mod entity;
mod repository;

pub use entity::Role;
pub use repository::RoleRepository;

#[cfg(test)]
pub use repository::MockRoleRepository;
