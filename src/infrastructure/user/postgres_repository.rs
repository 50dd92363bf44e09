//! PostgreSQL user store implementation

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Row, Transaction};

use crate::domain::role::Role;
use crate::domain::user::{User, UserId, UserRepository, UserStore};
use crate::domain::DomainError;

/// PostgreSQL implementation of UserStore
#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    /// Create a new store with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn begin(&self) -> Result<Box<dyn UserRepository>, DomainError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        Ok(Box::new(PostgresUserTransaction { tx }))
    }
}

/// Unit of work backed by a database transaction; rolled back on drop
struct PostgresUserTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PostgresUserTransaction {
    async fn roles_of(&mut self, id: i64) -> Result<Vec<Role>, DomainError> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT role_name FROM user_roles WHERE user_id = $1 ORDER BY role_name",
        )
        .bind(id)
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to load user roles: {}", e)))?;

        Ok(names.into_iter().map(Role::new).collect())
    }

    async fn replace_roles(&mut self, id: i64, user: &User) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to clear user roles: {}", e)))?;

        for role in user.roles() {
            sqlx::query("INSERT INTO user_roles (user_id, role_name) VALUES ($1, $2)")
                .bind(id)
                .bind(role.name())
                .execute(&mut *self.tx)
                .await
                .map_err(|e| {
                    if is_foreign_key_violation(&e.to_string()) {
                        DomainError::not_found(format!("Role '{}' not found", role.name()))
                    } else {
                        DomainError::storage(format!("Failed to assign role: {}", e))
                    }
                })?;
        }

        Ok(())
    }
}

#[async_trait]
impl UserRepository for PostgresUserTransaction {
    async fn find_by_id(&mut self, id: UserId) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, age FROM users WHERE id = $1",
        )
        .bind(id.value())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get user: {}", e)))?;

        match row {
            Some(row) => {
                let roles = self.roles_of(id.value()).await?;
                Ok(Some(row_to_user(&row, roles)))
            }
            None => Ok(None),
        }
    }

    async fn find_by_username(&mut self, username: &str) -> Result<Option<User>, DomainError> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, age FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get user by username: {}", e)))?;

        match row {
            Some(row) => {
                let id: i64 = row.get("id");
                let roles = self.roles_of(id).await?;
                Ok(Some(row_to_user(&row, roles)))
            }
            None => Ok(None),
        }
    }

    async fn find_all(&mut self) -> Result<Vec<User>, DomainError> {
        let rows = sqlx::query("SELECT id, username, password_hash, age FROM users ORDER BY id")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list users: {}", e)))?;

        let assignments = sqlx::query("SELECT user_id, role_name FROM user_roles")
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to list user roles: {}", e)))?;

        let mut roles_by_user: HashMap<i64, Vec<Role>> = HashMap::new();

        for row in assignments {
            let user_id: i64 = row.get("user_id");
            let role_name: String = row.get("role_name");
            roles_by_user
                .entry(user_id)
                .or_default()
                .push(Role::new(role_name));
        }

        let users = rows
            .iter()
            .map(|row| {
                let id: i64 = row.get("id");
                row_to_user(row, roles_by_user.remove(&id).unwrap_or_default())
            })
            .collect();

        Ok(users)
    }

    async fn save(&mut self, user: User) -> Result<User, DomainError> {
        let id = match user.id() {
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE users
                    SET username = $2, password_hash = $3, age = $4, is_admin = $5
                    WHERE id = $1
                    "#,
                )
                .bind(id.value())
                .bind(user.username())
                .bind(user.password_hash())
                .bind(user.age())
                .bind(user.is_admin())
                .execute(&mut *self.tx)
                .await
                .map_err(|e| map_write_error(e, user.username(), "update"))?;

                if result.rows_affected() == 0 {
                    return Err(DomainError::not_found(format!("User '{}' not found", id)));
                }

                id
            }
            None => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO users (username, password_hash, age, is_admin)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(user.username())
                .bind(user.password_hash())
                .bind(user.age())
                .bind(user.is_admin())
                .fetch_one(&mut *self.tx)
                .await
                .map_err(|e| map_write_error(e, user.username(), "create"))?;

                UserId::new(id)
            }
        };

        self.replace_roles(id.value(), &user).await?;

        Ok(user.with_id(id))
    }

    async fn delete(&mut self, user: &User) -> Result<(), DomainError> {
        let Some(id) = user.id() else {
            return Ok(());
        };

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(id.value())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to clear user roles: {}", e)))?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.value())
            .execute(&mut *self.tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to delete user: {}", e)))?;

        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), DomainError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit transaction: {}", e)))
    }
}

/// Build a user from a `users` row; `is_admin` is recomputed from `roles`
fn row_to_user(row: &sqlx::postgres::PgRow, roles: Vec<Role>) -> User {
    let id: i64 = row.get("id");
    let username: String = row.get("username");
    let password_hash: String = row.get("password_hash");
    let age: i32 = row.get("age");

    User::new(username, password_hash, age, roles).with_id(UserId::new(id))
}

fn map_write_error(e: sqlx::Error, username: &str, action: &str) -> DomainError {
    let msg = e.to_string();

    if is_unique_violation(&msg) {
        DomainError::conflict(format!("Username '{}' already exists", username))
    } else {
        DomainError::storage(format!("Failed to {} user: {}", action, msg))
    }
}

fn is_unique_violation(msg: &str) -> bool {
    msg.contains("duplicate key") || msg.contains("unique constraint")
}

fn is_foreign_key_violation(msg: &str) -> bool {
    msg.contains("foreign key constraint")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_detection() {
        assert!(is_unique_violation(
            "error returned from database: duplicate key value violates unique constraint \"users_username_key\""
        ));
        assert!(!is_unique_violation("connection refused"));
    }

    #[test]
    fn test_foreign_key_violation_detection() {
        assert!(is_foreign_key_violation(
            "insert or update on table \"user_roles\" violates foreign key constraint \"user_roles_role_name_fkey\""
        ));
        assert!(!is_foreign_key_violation("duplicate key value"));
    }

    #[test]
    fn test_map_write_error_defaults_to_storage() {
        let error = map_write_error(sqlx::Error::RowNotFound, "alice", "create");
        assert!(matches!(error, DomainError::Storage { .. }));
    }
}
