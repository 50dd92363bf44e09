//! `users` subcommands

use clap::{Args, Subcommand};

use crate::config::AppConfig;
use crate::domain::user::{validate_age, validate_password, validate_username, User, UserId};
use crate::domain::DomainError;
use crate::infrastructure::user::{CreateUserRequest, UpdateUserRequest};

#[derive(Subcommand)]
pub enum UsersCommand {
    /// List all accounts
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show one account with its authorities
    Show { username: String },

    /// Create an account, replacing or rejecting an existing one per configuration
    Add(AddArgs),

    /// Overwrite every field of an account
    Update(UpdateArgs),

    /// Delete an account; succeeds if it does not exist
    Delete { username: String },

    /// Grant the admin role
    Promote { username: String },

    /// Revoke the admin role
    Demote { username: String },

    /// Check a password against the stored digest
    Verify {
        username: String,
        #[arg(long)]
        password: String,
    },
}

#[derive(Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub age: i32,
    /// Grant the admin role as well as the base role
    #[arg(long)]
    pub admin: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[arg(long)]
    pub id: i64,
    #[arg(long)]
    pub username: String,
    /// New plaintext password; always re-hashed
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub age: i32,
    /// Role name, repeatable
    #[arg(long = "role", default_value = "ROLE_USER")]
    pub roles: Vec<String>,
    #[arg(long)]
    pub admin: bool,
}

impl AddArgs {
    fn into_request(self) -> Result<CreateUserRequest, DomainError> {
        validate_fields(&self.username, &self.password, self.age)?;

        Ok(CreateUserRequest {
            username: self.username,
            password: self.password,
            age: self.age,
            is_admin: self.admin,
        })
    }
}

impl UpdateArgs {
    fn into_request(self) -> Result<UpdateUserRequest, DomainError> {
        validate_fields(&self.username, &self.password, self.age)?;

        Ok(UpdateUserRequest {
            id: UserId::new(self.id),
            username: self.username,
            password: self.password,
            age: self.age,
            roles: self.roles,
            is_admin: self.admin,
        })
    }
}

fn validate_fields(username: &str, password: &str, age: i32) -> Result<(), DomainError> {
    validate_username(username).map_err(|e| DomainError::validation(e.to_string()))?;
    validate_password(password).map_err(|e| DomainError::validation(e.to_string()))?;
    validate_age(age).map_err(|e| DomainError::validation(e.to_string()))?;
    Ok(())
}

pub async fn run(config: &AppConfig, command: UsersCommand) -> anyhow::Result<()> {
    let service = crate::create_seeded_user_service(config).await?;

    match command {
        UsersCommand::List { json } => {
            let users = service.list_all().await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                for user in &users {
                    println!("{}", format_user(user));
                }
            }
        }
        UsersCommand::Show { username } => {
            let user = service.find_by_username(&username).await?;
            let principal = service.load_for_authentication(&username).await?;
            let authorities: Vec<&str> = principal.authorities().iter().map(String::as_str).collect();

            println!("{}", format_user(&user));
            println!("authorities: {}", authorities.join(", "));
        }
        UsersCommand::Add(args) => {
            let user = service.add(args.into_request()?).await?;
            println!("{}", format_user(&user));
        }
        UsersCommand::Update(args) => {
            let user = service.update(args.into_request()?).await?;
            println!("{}", format_user(&user));
        }
        UsersCommand::Delete { username } => {
            if service.delete(&username).await? {
                println!("Deleted {}", username);
            } else {
                println!("No user named {}", username);
            }
        }
        UsersCommand::Promote { username } => {
            let user = service.make_admin(&username).await?;
            println!("{}", format_user(&user));
        }
        UsersCommand::Demote { username } => {
            let user = service.unmake_admin(&username).await?;
            println!("{}", format_user(&user));
        }
        UsersCommand::Verify { username, password } => {
            match service.authenticate(&username, &password).await? {
                Some(_) => println!("Password accepted for {}", username),
                None => anyhow::bail!("Invalid username or password"),
            }
        }
    }

    Ok(())
}

fn format_user(user: &User) -> String {
    let id = user
        .id()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{:>5}  {:<20} age={:<3} admin={:<5} roles={}",
        id,
        user.username(),
        user.age(),
        user.is_admin(),
        user.role_names().join(",")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    #[test]
    fn test_add_args_are_validated() {
        let args = AddArgs {
            username: "bad name".to_string(),
            password: "pw".to_string(),
            age: 30,
            admin: false,
        };

        assert!(matches!(args.into_request(), Err(DomainError::Validation { .. })));

        let args = AddArgs {
            username: "alice".to_string(),
            password: "pw".to_string(),
            age: -4,
            admin: false,
        };

        assert!(args.into_request().is_err());
    }

    #[test]
    fn test_update_args_into_request() {
        let args = UpdateArgs {
            id: 3,
            username: "alice".to_string(),
            password: "pw".to_string(),
            age: 30,
            roles: vec![Role::USER.to_string()],
            admin: true,
        };

        let request = args.into_request().unwrap();
        assert_eq!(request.id, UserId::new(3));
        assert_eq!(request.roles, vec!["ROLE_USER"]);
        assert!(request.is_admin);
    }

    #[test]
    fn test_format_user() {
        let user = User::new("alice", "digest", 30, [Role::new(Role::USER)]).with_id(UserId::new(1));
        let line = format_user(&user);

        assert!(line.contains("alice"));
        assert!(line.contains("admin=false"));
        assert!(line.contains("roles=ROLE_USER"));
        assert!(!line.contains("digest"));
    }
}
