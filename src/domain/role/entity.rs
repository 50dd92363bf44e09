//! Role entity

use serde::{Deserialize, Serialize};

/// A named permission group such as `ROLE_USER` or `ROLE_ADMIN`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role {
    name: String,
}

impl Role {
    /// Base role held by every account
    pub const USER: &'static str = "ROLE_USER";
    /// Role granting admin panel access
    pub const ADMIN: &'static str = "ROLE_ADMIN";

    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Authority string granted to holders of this role
    pub fn authority(&self) -> &str {
        &self.name
    }

    pub fn is_admin(&self) -> bool {
        self.name == Self::ADMIN
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_role() {
        assert!(Role::new(Role::ADMIN).is_admin());
        assert!(!Role::new(Role::USER).is_admin());
    }

    #[test]
    fn test_roles_order_by_name() {
        let mut roles = vec![Role::new(Role::USER), Role::new(Role::ADMIN)];
        roles.sort();
        assert_eq!(roles[0].name(), "ROLE_ADMIN");
        assert_eq!(roles[1].name(), "ROLE_USER");
    }

    #[test]
    fn test_role_serializes_as_name() {
        let json = serde_json::to_string(&Role::new(Role::USER)).unwrap();
        assert_eq!(json, "\"ROLE_USER\"");
    }
}
