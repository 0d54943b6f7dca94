use std::{net::SocketAddr, path::PathBuf};

use clap::{Parser, Subcommand};

/// CLI surface definition.
#[derive(Parser, Debug)]
#[command(
    name = "signbook",
    about = "Account sign-up and login service backed by a CSV file",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Optional subcommand; defaults to serving HTTP when absent.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP API until interrupted.
    Serve(ServeArgs),
    /// Print version and exit.
    Version,
    /// Check that the user table exists and parses.
    Health,
    /// Print every registered user (passwords omitted).
    Users,
    /// Manage service configuration.
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeArgs {
    /// Address to bind, e.g. 127.0.0.1:8000.
    #[arg(long)]
    pub listen: Option<SocketAddr>,
    /// Path of the CSV user table.
    #[arg(long)]
    pub data_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Create a default config file if one does not exist.
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_when_missing_subcommand() {
        let cli = Cli::try_parse_from(["signbook"]).expect("parse should succeed");
        assert_eq!(cli.command, None);
    }

    #[test]
    fn parses_serve_overrides() {
        let cli = Cli::try_parse_from([
            "signbook",
            "serve",
            "--listen",
            "0.0.0.0:9000",
            "--data-file",
            "/tmp/users.csv",
        ])
        .expect("parse should succeed");
        assert_eq!(
            cli.command,
            Some(Command::Serve(ServeArgs {
                listen: Some("0.0.0.0:9000".parse().expect("addr")),
                data_file: Some(PathBuf::from("/tmp/users.csv")),
            }))
        );
    }

    #[test]
    fn rejects_bad_listen_address() {
        assert!(Cli::try_parse_from(["signbook", "serve", "--listen", "nope"]).is_err());
    }

    #[test]
    fn parses_health_subcommand() {
        let cli = Cli::try_parse_from(["signbook", "health"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Health));
    }

    #[test]
    fn parses_config_init_subcommand() {
        let cli =
            Cli::try_parse_from(["signbook", "config", "init"]).expect("parse should succeed");
        assert_eq!(cli.command, Some(Command::Config(ConfigCommand::Init)));
    }
}
