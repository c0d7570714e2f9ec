//! Nexus push CLI - publish Maven repository content through the Nexus
//! staging lifecycle.

use nexus_push::cli::{Cli, Commands, GroupCommands};
use nexus_push::config::{Config, QualityLevel};
use nexus_push::workflow::{self, PushRequest};
use nexus_push::Result;

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

/// Main application entry point
fn run() -> i32 {
    let cli = Cli::parse_args();
    let debug = cli.debug;

    match execute(cli) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("Error: {err}");
            if debug {
                eprintln!("{err:?}");
            }
            err.exit_code()
        }
    }
}

/// Execute the requested command
fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init => workflow::run_init(),
        Commands::Push {
            repo,
            environment,
            product,
            version,
            ga,
        } => {
            let config = Config::load()?;
            workflow::run_push(
                &config,
                &PushRequest {
                    repo: &repo,
                    environment: &environment,
                    product: &product,
                    version: &version,
                    quality: QualityLevel::from_ga_flag(ga),
                },
                cli.debug,
            )
        }
        Commands::Rollback {
            staging_repo_id,
            environment,
        } => {
            let config = Config::load()?;
            workflow::run_rollback(&config, &environment, &staging_repo_id, cli.debug)
        }
        Commands::Group { command } => {
            let config = Config::load()?;
            match command {
                GroupCommands::Add {
                    group,
                    repository,
                    environment,
                } => workflow::run_group_add(&config, &environment, &group, &repository, cli.debug),
                GroupCommands::Remove {
                    group,
                    repository,
                    environment,
                } => {
                    workflow::run_group_remove(&config, &environment, &group, &repository, cli.debug)
                }
            }
        }
        Commands::ListProducts => {
            let config = Config::load()?;
            workflow::run_list_products(&config);
            Ok(())
        }
    }
}
