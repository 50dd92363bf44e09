//! User entity and related types

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::role::Role;

/// User identifier assigned by the store on first save
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User account
///
/// `is_admin` is a projection of role membership. It is recomputed by every
/// mutator that touches the role set and cannot be set on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    /// `None` until the user has been saved
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<UserId>,
    username: String,
    /// Password digest - never exposed in serialization
    #[serde(skip_serializing)]
    password_hash: String,
    age: i32,
    is_admin: bool,
    roles: BTreeSet<Role>,
}

impl User {
    /// Create an unsaved user
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        age: i32,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        let mut user = Self {
            id: None,
            username: username.into(),
            password_hash: password_hash.into(),
            age,
            is_admin: false,
            roles: BTreeSet::new(),
        };
        user.set_roles(roles);
        user
    }

    /// Attach a store-assigned id
    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    // Getters

    pub fn id(&self) -> Option<UserId> {
        self.id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn age(&self) -> i32 {
        self.age
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    /// Role names in ascending order
    pub fn role_names(&self) -> Vec<&str> {
        self.roles.iter().map(Role::name).collect()
    }

    pub fn has_role(&self, name: &str) -> bool {
        self.roles.iter().any(|r| r.name() == name)
    }

    /// Authority strings derived from the role set
    pub fn authorities(&self) -> BTreeSet<String> {
        self.roles.iter().map(|r| r.authority().to_string()).collect()
    }

    // Mutators

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
    }

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
    }

    pub fn set_age(&mut self, age: i32) {
        self.age = age;
    }

    /// Replace the whole role set
    pub fn set_roles(&mut self, roles: impl IntoIterator<Item = Role>) {
        self.roles = roles.into_iter().collect();
        self.sync_admin_flag();
    }

    /// Add a role; returns false if it was already held
    pub fn add_role(&mut self, role: Role) -> bool {
        let added = self.roles.insert(role);
        self.sync_admin_flag();
        added
    }

    /// Remove a role; returns false if it was not held
    pub fn remove_role(&mut self, role: &Role) -> bool {
        let removed = self.roles.remove(role);
        self.sync_admin_flag();
        removed
    }

    pub fn clear_roles(&mut self) {
        self.roles.clear();
        self.sync_admin_flag();
    }

    fn sync_admin_flag(&mut self) {
        self.is_admin = self.roles.iter().any(Role::is_admin);
    }
}

/// Identity, credential and authorities handed to the authentication layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPrincipal {
    username: String,
    password_hash: String,
    authorities: BTreeSet<String>,
}

impl AuthPrincipal {
    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn authorities(&self) -> &BTreeSet<String> {
        &self.authorities
    }

    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.contains(authority)
    }
}

impl From<&User> for AuthPrincipal {
    fn from(user: &User) -> Self {
        Self {
            username: user.username().to_string(),
            password_hash: user.password_hash().to_string(),
            authorities: user.authorities(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Role {
        Role::new(Role::USER)
    }

    fn admin() -> Role {
        Role::new(Role::ADMIN)
    }

    #[test]
    fn test_new_user_is_unsaved() {
        let user = User::new("alice", "digest", 30, [base()]);

        assert!(user.id().is_none());
        assert_eq!(user.username(), "alice");
        assert_eq!(user.password_hash(), "digest");
        assert_eq!(user.age(), 30);
        assert!(!user.is_admin());
    }

    #[test]
    fn test_admin_flag_follows_roles() {
        let user = User::new("root", "digest", 40, [base(), admin()]);
        assert!(user.is_admin());

        let mut user = User::new("bob", "digest", 20, [base()]);
        assert!(user.add_role(admin()));
        assert!(user.is_admin());

        assert!(!user.add_role(admin()));
        assert_eq!(user.roles().len(), 2);

        assert!(user.remove_role(&admin()));
        assert!(!user.is_admin());
        assert!(!user.remove_role(&admin()));
    }

    #[test]
    fn test_clear_roles_drops_admin() {
        let mut user = User::new("root", "digest", 40, [base(), admin()]);
        user.clear_roles();

        assert!(user.roles().is_empty());
        assert!(!user.is_admin());
    }

    #[test]
    fn test_authorities() {
        let user = User::new("root", "digest", 40, [admin(), base()]);
        let authorities: Vec<String> = user.authorities().into_iter().collect();

        assert_eq!(authorities, vec!["ROLE_ADMIN", "ROLE_USER"]);
        assert_eq!(user.role_names(), vec!["ROLE_ADMIN", "ROLE_USER"]);
    }

    #[test]
    fn test_principal_from_user() {
        let user = User::new("alice", "digest", 30, [base()]).with_id(UserId::new(7));
        let principal = AuthPrincipal::from(&user);

        assert_eq!(principal.username(), "alice");
        assert_eq!(principal.password_hash(), "digest");
        assert!(principal.has_authority("ROLE_USER"));
        assert!(!principal.has_authority("ROLE_ADMIN"));
    }

    #[test]
    fn test_user_serialization_excludes_password() {
        let user = User::new("alice", "secret_digest", 30, [base()]).with_id(UserId::new(1));

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret_digest"));
        assert!(!json.contains("password_hash"));
        assert!(json.contains("\"roles\":[\"ROLE_USER\"]"));
    }
}
