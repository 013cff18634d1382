// server/src/cli/cli.rs

use anyhow::Result;
use clap::Parser;
use lib::{ClinicConfig, Database};
use log::info;

use crate::cli::commands::CliArgs;
use crate::cli::handlers::{execute, ClinicContext};

/// Entry point of `clinic-cli`.
pub async fn start_cli() -> Result<()> {
    run(CliArgs::parse()).await
}

/// Opens the configured database, runs one command, prints its JSON result
/// and closes the database again, also when the command failed.
pub async fn run(args: CliArgs) -> Result<()> {
    let config = ClinicConfig::load(args.config.as_deref())?;
    let policy = config.policy_table()?;
    let db = Database::open(&config.storage).await?;
    info!("clinic-cli running {} as {:?}", args.command.name(), args.acting_as);

    let context = ClinicContext::new(config, db.clone(), policy);
    let outcome = execute(&context, args.acting_as, args.command).await;
    db.close().await?;

    let output = outcome?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::ClinicCommands;
    use std::io::Write;

    #[tokio::test]
    async fn runs_against_the_configured_engine() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "storage:\n  engine: memory").unwrap();
        let args = CliArgs {
            config: Some(file.path().to_path_buf()),
            acting_as: None,
            command: ClinicCommands::Policy { kind: None },
        };
        run(args).await.unwrap();

        let args = CliArgs {
            config: Some(file.path().to_path_buf()),
            acting_as: None,
            command: ClinicCommands::Whoami,
        };
        assert!(run(args).await.is_err());
    }
}
