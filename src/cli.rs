use clap::{Parser, Subcommand};

/// Loan Tracker: personal loan-payment tracking API
#[derive(Parser)]
#[command(name = "loan-tracker", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind (overrides LOANTRACKER_PORT / PORT)
        #[arg(short, long)]
        port: Option<u16>,
        /// Keep all data in process memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },

    /// Apply pending database migrations and exit
    Migrate,

    /// Manage accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
pub enum UserCommands {
    /// Register a new account
    Create {
        #[arg(long)]
        username: String,
        #[arg(long, env = "LOANTRACKER_PASSWORD")]
        password: String,
    },
    /// Log in and print a bearer token
    Token {
        #[arg(long)]
        username: String,
        #[arg(long, env = "LOANTRACKER_PASSWORD")]
        password: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["loan-tracker"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_serve_flags() {
        let cli = Cli::try_parse_from(["loan-tracker", "serve", "--port", "8080", "--in-memory"])
            .unwrap();
        match cli.command {
            Some(Commands::Serve { port, in_memory }) => {
                assert_eq!(port, Some(8080));
                assert!(in_memory);
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn test_user_create_args() {
        let cli = Cli::try_parse_from([
            "loan-tracker",
            "user",
            "create",
            "--username",
            "ana",
            "--password",
            "secret1",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::User {
                command: UserCommands::Create { .. }
            })
        ));
    }
}
