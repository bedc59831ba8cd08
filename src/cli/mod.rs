//! CLI module for the user service
//!
//! Provides subcommands:
//! - `serve`: run the HTTP API (default deployment mode)
//! - `migrate`: apply, revert or inspect database migrations

pub mod migrate;
pub mod serve;

use clap::{Parser, Subcommand};

/// User Service - signup, login and user management over HTTP
#[derive(Parser)]
#[command(name = "user-service")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the API server
    Serve,

    /// Manage database migrations
    Migrate(migrate::MigrateArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_serve() {
        let cli = Cli::try_parse_from(["user-service", "serve"]).unwrap();
        assert!(matches!(cli.command, Command::Serve));
    }

    #[test]
    fn test_parse_migrate_flags() {
        let cli = Cli::try_parse_from(["user-service", "migrate", "--revert"]).unwrap();
        match cli.command {
            Command::Migrate(args) => {
                assert!(args.revert);
                assert!(!args.status);
            }
            _ => panic!("expected migrate command"),
        }
    }

    #[test]
    fn test_revert_and_status_conflict() {
        assert!(Cli::try_parse_from(["user-service", "migrate", "--revert", "--status"]).is_err());
    }
}
