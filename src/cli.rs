//! Command-line interface argument parsing
//!
//! Defines all CLI commands and their arguments using Clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Nexus push CLI - publish Maven repository content through the Nexus staging lifecycle
#[derive(Parser, Debug)]
#[command(name = "nexus-push")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Publish Maven repository content to a Nexus staging repository and promote it")]
#[command(long_about = concat!(
    "nexus-push (v", env!("CARGO_PKG_VERSION"), ")\n",
    "Publishes Maven repository content to a Nexus repository manager: opens a staging\n",
    "repository, uploads partitioned zip archives into it, closes it, waits for server-side\n",
    "validation, and promotes the result through the configured promotion profiles."
))]
pub struct Cli {
    /// Print REST traffic and full error context for debugging
    #[arg(short = 'D', long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a starter configuration file
    ///
    /// Writes a commented config template to ~/.config/nexus-push/config.toml
    ///
    /// Example:
    ///   nexus-push init
    #[command(display_order = 1)]
    Init,

    /// Push repository content through the staging lifecycle
    ///
    /// Partitions the given directory or zip archive into bounded zip parts,
    /// uploads them to a freshly opened staging repository, closes it, and
    /// promotes it through the promotion profile chain for the product.
    ///
    /// Examples:
    ///   nexus-push push ./repo-dir -p eap -v 7.1.0
    ///   nexus-push push repo.zip -p eap -v 7.1.0 --ga
    #[command(visible_alias = "upload")]
    #[command(display_order = 2)]
    Push {
        /// Repository directory or zip archive to push
        repo: PathBuf,

        /// The target Nexus environment (from the config file)
        #[arg(short, long, default_value = "prod")]
        environment: String,

        /// The product key, used to look up staging/promotion profiles
        #[arg(short, long)]
        product: String,

        /// The product version, used in repository metadata
        #[arg(short = 'v', long)]
        version: String,

        /// Push content to the GA group (as opposed to Early-Access)
        #[arg(short, long)]
        ga: bool,
    },

    /// Drop a staging repository
    ///
    /// Undoes a push that did not make it through verification; the staging
    /// repository and its content are discarded on the server.
    ///
    /// Example:
    ///   nexus-push rollback xyz-1001
    #[command(visible_alias = "drop")]
    #[command(display_order = 3)]
    Rollback {
        /// Id of the staging repository to drop
        staging_repo_id: String,

        /// The target Nexus environment (from the config file)
        #[arg(short, long, default_value = "prod")]
        environment: String,
    },

    /// Manage content group membership directly (legacy mode)
    #[command(display_order = 4)]
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },

    /// List products and their staging profile ids
    ///
    /// Example:
    ///   nexus-push list-products
    #[command(display_order = 5)]
    ListProducts,
}

/// Legacy content-group membership commands
#[derive(Subcommand, Debug)]
pub enum GroupCommands {
    /// Add a repository to a content group
    Add {
        /// Id of the content group
        group: String,

        /// Id of the repository to add
        repository: String,

        /// The target Nexus environment (from the config file)
        #[arg(short, long, default_value = "prod")]
        environment: String,
    },

    /// Remove a repository from a content group
    Remove {
        /// Id of the content group
        group: String,

        /// Id of the repository to remove
        repository: String,

        /// The target Nexus environment (from the config file)
        #[arg(short, long, default_value = "prod")]
        environment: String,
    },
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }
}
