//! CLI module for User Admin
//!
//! Provides subcommands for operating on accounts:
//! - `migrate`: apply the PostgreSQL schema
//! - `seed`: create the baseline accounts in an empty store
//! - `users`: list, inspect and modify accounts

pub mod migrate;
pub mod users;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// User Admin - user and role account management
#[derive(Parser)]
#[command(name = "user-admin")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply pending PostgreSQL schema migrations
    Migrate,

    /// Create the "Admin" and "User" accounts if the store is empty
    Seed,

    /// Manage user accounts
    #[command(subcommand)]
    Users(users::UsersCommand),
}

/// Load configuration, initialise logging and dispatch the command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    logging::init_logging(&config.logging);

    match cli.command {
        Command::Migrate => migrate::run(&config).await,
        Command::Seed => {
            let service = crate::create_user_service(&config).await?;
            let created = service.bootstrap().await?;
            println!("Created {} seed account(s)", created);
            Ok(())
        }
        Command::Users(command) => users::run(&config, command).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_promote() {
        let cli = Cli::try_parse_from(["user-admin", "users", "promote", "alice"]).unwrap();

        match cli.command {
            Command::Users(users::UsersCommand::Promote { username }) => {
                assert_eq!(username, "alice")
            }
            _ => panic!("expected users promote"),
        }
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "user-admin", "users", "add", "--username", "alice", "--password", "pw1", "--age",
            "30", "--admin",
        ])
        .unwrap();

        match cli.command {
            Command::Users(users::UsersCommand::Add(args)) => {
                assert_eq!(args.username, "alice");
                assert_eq!(args.password, "pw1");
                assert_eq!(args.age, 30);
                assert!(args.admin);
            }
            _ => panic!("expected users add"),
        }
    }
}
