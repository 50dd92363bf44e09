//! User domain
//!
//! This module provides domain types and traits for user accounts,
//! including the user entity, the authentication principal, boundary
//! validation, and the unit-of-work persistence traits.

mod entity;
mod repository;
mod validation;

pub use entity::{AuthPrincipal, User, UserId};
pub use repository::{UserRepository, UserStore};
pub use validation::{validate_age, validate_password, validate_username, UserValidationError};
