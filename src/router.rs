//! Command routing logic for CLI

use quill_core::QuillConfig;

use crate::args::{CheckpointAction, Cli, Commands};
use crate::commands;

/// Route CLI commands to their respective handlers
pub async fn route(cli: Cli, config: QuillConfig) -> anyhow::Result<()> {
    let project = cli.project;
    let verbose = cli.verbose;

    match cli.command {
        Commands::Apply { response } => {
            commands::apply::apply(&project, &config, &response, verbose).await
        }
        Commands::Validate { response } => {
            commands::apply::validate(&project, &config, &response, verbose).await
        }
        Commands::Checkpoint { action } => match action {
            CheckpointAction::Create { description } => {
                commands::checkpoint::create(&project, &config, &description).await
            }
            CheckpointAction::List => commands::checkpoint::list(&project, &config).await,
        },
        Commands::Diff { id } => commands::history::diff(&project, &config, &id).await,
        Commands::Revert {
            id,
            exact,
            backup,
            dry_run,
        } => {
            let options = commands::history::RevertFlags {
                exact,
                backup,
                dry_run,
            };
            commands::history::revert(&project, &config, &id, options).await
        }
    }
}
