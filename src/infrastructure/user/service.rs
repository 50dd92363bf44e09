//! User account service
//!
//! Orchestrates the user store, role lookup and password hasher to implement
//! the account lifecycle and the authentication lookup. The service is
//! stateless: every operation opens its own unit of work and either commits
//! it or drops it on the way out.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::role::{Role, RoleRepository};
use crate::domain::user::{AuthPrincipal, User, UserId, UserRepository, UserStore};
use crate::domain::DomainError;

use super::password::PasswordHasher;

/// Plaintext password given to the seeded accounts
const SEED_PASSWORD: &str = "123";

/// What `add` does when the username is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateUsernamePolicy {
    /// Delete the existing account and store the new one in its place
    #[default]
    Replace,
    /// Fail with a conflict and leave the existing account untouched
    Reject,
}

/// Request for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUserRequest {
    pub username: String,
    /// Plaintext; hashed by the service
    pub password: String,
    pub age: i32,
    pub is_admin: bool,
}

/// Full replacement of an existing user's fields
#[derive(Debug, Clone)]
pub struct UpdateUserRequest {
    pub id: UserId,
    pub username: String,
    /// Plaintext; always re-hashed, so never pass a stored digest here
    pub password: String,
    pub age: i32,
    /// Role names; the admin role is then added or removed to match `is_admin`
    pub roles: Vec<String>,
    pub is_admin: bool,
}

/// User account service
#[derive(Debug)]
pub struct UserService<S, R, H>
where
    S: UserStore + ?Sized,
    R: RoleRepository + ?Sized,
    H: PasswordHasher + ?Sized,
{
    store: Arc<S>,
    roles: Arc<R>,
    hasher: Arc<H>,
    duplicate_policy: DuplicateUsernamePolicy,
}

/// Service over runtime-selected collaborators
pub type DynUserService = UserService<dyn UserStore, dyn RoleRepository, dyn PasswordHasher>;

impl<S, R, H> UserService<S, R, H>
where
    S: UserStore + ?Sized,
    R: RoleRepository + ?Sized,
    H: PasswordHasher + ?Sized,
{
    /// Create a new user service
    pub fn new(store: Arc<S>, roles: Arc<R>, hasher: Arc<H>) -> Self {
        Self {
            store,
            roles,
            hasher,
            duplicate_policy: DuplicateUsernamePolicy::default(),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicateUsernamePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn duplicate_policy(&self) -> DuplicateUsernamePolicy {
        self.duplicate_policy
    }

    /// Look up the principal the authentication layer verifies a login against
    #[instrument(skip(self))]
    pub async fn load_for_authentication(&self, username: &str) -> Result<AuthPrincipal, DomainError> {
        let user = self.find_by_username(username).await?;
        Ok(AuthPrincipal::from(&user))
    }

    /// Check a plaintext password against the stored digest.
    /// Returns `None` for an unknown user or a wrong password.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<AuthPrincipal>, DomainError> {
        let mut tx = self.store.begin().await?;

        let Some(user) = tx.find_by_username(username).await? else {
            debug!("Unknown user");
            return Ok(None);
        };

        if !self.hasher.verify(password, user.password_hash()) {
            debug!("Password mismatch");
            return Ok(None);
        }

        Ok(Some(AuthPrincipal::from(&user)))
    }

    /// Get a user by username
    pub async fn find_by_username(&self, username: &str) -> Result<User, DomainError> {
        let mut tx = self.store.begin().await?;

        tx.find_by_username(username)
            .await?
            .ok_or_else(|| user_not_found(username))
    }

    /// Get a user by id
    pub async fn find_by_id(&self, id: UserId) -> Result<User, DomainError> {
        let mut tx = self.store.begin().await?;

        tx.find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", id)))
    }

    /// List all users in storage order
    pub async fn list_all(&self) -> Result<Vec<User>, DomainError> {
        let mut tx = self.store.begin().await?;
        tx.find_all().await
    }

    /// Create a user with a hashed password and the default roles for its admin flag.
    ///
    /// An existing account with the same username is replaced or rejected
    /// according to the duplicate-username policy.
    #[instrument(skip(self, request), fields(username = %request.username, is_admin = request.is_admin))]
    pub async fn add(&self, request: CreateUserRequest) -> Result<User, DomainError> {
        let password_hash = self.hasher.hash(&request.password)?;
        let roles = self.default_roles(request.is_admin).await?;

        let mut tx = self.store.begin().await?;

        if let Some(existing) = tx.find_by_username(&request.username).await? {
            match self.duplicate_policy {
                DuplicateUsernamePolicy::Reject => {
                    return Err(DomainError::conflict(format!(
                        "Username '{}' already exists",
                        request.username
                    )));
                }
                DuplicateUsernamePolicy::Replace => {
                    warn!(existing_id = ?existing.id(), "Replacing existing account with the same username");
                    purge(&mut *tx, existing).await?;
                }
            }
        }

        let user = User::new(request.username, password_hash, request.age, roles);

        let user = tx.save(user).await?;
        tx.commit().await?;

        info!(id = ?user.id(), "User created");
        Ok(user)
    }

    /// Overwrite every field of an existing user.
    ///
    /// The password is re-hashed from the supplied plaintext on every call.
    #[instrument(skip(self, request), fields(id = %request.id))]
    pub async fn update(&self, request: UpdateUserRequest) -> Result<User, DomainError> {
        let password_hash = self.hasher.hash(&request.password)?;

        let mut roles = Vec::with_capacity(request.roles.len());
        for name in &request.roles {
            roles.push(self.roles.get_role(name).await?);
        }
        let admin = self.roles.get_role(Role::ADMIN).await?;

        let mut tx = self.store.begin().await?;

        let mut user = tx
            .find_by_id(request.id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("User '{}' not found", request.id)))?;

        user.set_username(request.username);
        user.set_age(request.age);
        user.set_password_hash(password_hash);
        user.set_roles(roles);

        if request.is_admin {
            user.add_role(admin);
        } else {
            user.remove_role(&admin);
        }

        let user = tx.save(user).await?;
        tx.commit().await?;

        info!(username = %user.username(), is_admin = user.is_admin(), "User updated");
        Ok(user)
    }

    /// Delete a user by username. Returns false, without failing, if no such user exists.
    #[instrument(skip(self))]
    pub async fn delete(&self, username: &str) -> Result<bool, DomainError> {
        let mut tx = self.store.begin().await?;

        let Some(user) = tx.find_by_username(username).await? else {
            debug!("Nothing to delete");
            return Ok(false);
        };

        purge(&mut *tx, user).await?;
        tx.commit().await?;

        info!("User deleted");
        Ok(true)
    }

    /// Grant the admin role
    #[instrument(skip(self))]
    pub async fn make_admin(&self, username: &str) -> Result<User, DomainError> {
        let admin = self.roles.get_role(Role::ADMIN).await?;

        self.modify_roles(username, |user| {
            user.add_role(admin);
        })
        .await
    }

    /// Revoke the admin role
    #[instrument(skip(self))]
    pub async fn unmake_admin(&self, username: &str) -> Result<User, DomainError> {
        let admin = self.roles.get_role(Role::ADMIN).await?;

        self.modify_roles(username, |user| {
            user.remove_role(&admin);
        })
        .await
    }

    /// Create the baseline "Admin" and "User" accounts on an empty store.
    ///
    /// A store that already holds any account is left untouched, so seed
    /// accounts deleted by an operator are not recreated. Returns the number
    /// created.
    #[instrument(skip(self))]
    pub async fn bootstrap(&self) -> Result<usize, DomainError> {
        let base = self.roles.get_role(Role::USER).await?;
        let admin = self.roles.get_role(Role::ADMIN).await?;

        let seeds = [
            ("Admin", 13, vec![base.clone(), admin], self.hasher.hash(SEED_PASSWORD)?),
            ("User", 11, vec![base], self.hasher.hash(SEED_PASSWORD)?),
        ];

        let mut tx = self.store.begin().await?;

        if !tx.find_all().await?.is_empty() {
            debug!("Store already holds accounts; skipping seed");
            return Ok(0);
        }

        let mut created = 0;
        for (username, age, roles, password_hash) in seeds {
            tx.save(User::new(username, password_hash, age, roles)).await?;
            created += 1;
        }

        tx.commit().await?;

        info!(created, "Seed accounts created");
        Ok(created)
    }

    async fn default_roles(&self, is_admin: bool) -> Result<Vec<Role>, DomainError> {
        let mut roles = vec![self.roles.get_role(Role::USER).await?];

        if is_admin {
            roles.push(self.roles.get_role(Role::ADMIN).await?);
        }

        Ok(roles)
    }

    async fn modify_roles<F>(&self, username: &str, change: F) -> Result<User, DomainError>
    where
        F: FnOnce(&mut User) + Send,
    {
        let mut tx = self.store.begin().await?;

        let mut user = tx
            .find_by_username(username)
            .await?
            .ok_or_else(|| user_not_found(username))?;

        change(&mut user);

        let user = tx.save(user).await?;
        tx.commit().await?;

        info!(is_admin = user.is_admin(), "Admin status changed");
        Ok(user)
    }
}

/// Drop a user's role assignments, then the user itself
async fn purge(tx: &mut dyn UserRepository, mut user: User) -> Result<(), DomainError> {
    user.clear_roles();
    tx.delete(&user).await
}

fn user_not_found(username: &str) -> DomainError {
    DomainError::not_found(format!("User '{}' not found", username))
}
