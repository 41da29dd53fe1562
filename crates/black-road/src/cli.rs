//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Black Road - infrastructure deployments with gpg-encrypted
/// configuration and remote Terraform state
#[derive(Parser, Debug)]
#[command(name = "black-road")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the configuration document (defaults to ./black-road.json)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Interactively set up the encrypted configuration and validate
    /// Vault connectivity
    Init,

    /// Deploy: pull remote state, terraform apply, push updated state
    Apply,

    /// Preview changes: pull remote state and terraform plan
    Plan,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_subcommands() {
        let cli = Cli::try_parse_from(["black-road", "apply"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Apply)));

        let cli = Cli::try_parse_from(["black-road"]).unwrap();
        assert!(cli.command.is_none());

        let cli =
            Cli::try_parse_from(["black-road", "plan", "--config", "elsewhere.json"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Plan)));
        assert_eq!(cli.config.as_deref().map(|p| p.as_str()), Some("elsewhere.json"));
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["black-road", "destroy"]).is_err());
    }
}
