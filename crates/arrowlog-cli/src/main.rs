//! arrowlog CLI - score archery practice from the terminal
//!
//! Sessions are kept in a local database first and pushed to the
//! spreadsheet-backed remote store on `sync` or `publish`.

mod cli;
mod commands;
mod config_file;
mod error;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, SyncCommands};
use crate::commands::common::{open_service, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::create::run_new;
use crate::commands::delete::{run_delete, run_discard};
use crate::commands::edit::{
    run_date, run_distance, run_end, run_location, run_notes, run_shot, run_shots,
};
use crate::commands::export::run_export;
use crate::commands::list::run_list;
use crate::commands::show::run_show;
use crate::commands::stats::run_stats;
use crate::commands::sync::{
    run_logout, run_publish, run_pull, run_sync, run_sync_conflicts, run_sync_queue,
};
use crate::config_file::{load_effective, resolve_config_path};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("arrowlog=info")),
        )
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config_path = resolve_config_path(cli.config).map_err(CliError::Config)?;
    let command = match command {
        Commands::Completions { shell, output } => {
            return run_completions(shell, output.as_deref());
        }
        Commands::Config { command } => return run_config(command, &config_path),
        command => command,
    };

    let config = load_effective(&config_path).map_err(CliError::Config)?;
    let db_path = resolve_db_path(cli.db_path)?;
    let service = open_service(&db_path, &config)?;

    match command {
        Commands::New { date } => run_new(date.as_deref(), &service).await?,
        Commands::List { limit, json } => run_list(limit, json, &service).await?,
        Commands::Show { id, json } => run_show(&id, json, &service).await?,
        Commands::Delete { id } => run_delete(&id, &service).await?,
        Commands::Discard { id } => run_discard(&id, &service).await?,
        Commands::End { command } => run_end(command, &service).await?,
        Commands::Distance { id, meters, clear } => {
            run_distance(&id, meters, clear, &service).await?;
        }
        Commands::Shots { id, count } => run_shots(&id, count, &service).await?,
        Commands::Shot {
            id,
            end,
            shot,
            value,
        } => run_shot(&id, end, shot, &value, &service).await?,
        Commands::Notes { id, text } => run_notes(&id, &text, &service).await?,
        Commands::Location {
            id,
            text,
            coordinates,
        } => run_location(&id, &text, coordinates, &service).await?,
        Commands::Date { id, date } => run_date(&id, &date, &service).await?,
        Commands::Publish { id } => {
            run_publish(&id, &service, &config.remote_store()?).await?;
        }
        Commands::Pull => run_pull(&service, &config.remote_store()?).await?,
        Commands::Sync { command } => match command {
            None => run_sync(&service, &config.remote_store()?).await?,
            Some(SyncCommands::Queue { json }) => run_sync_queue(json, &service).await?,
            Some(SyncCommands::Conflicts { limit, json }) => {
                run_sync_conflicts(limit, json, &service).await?;
            }
        },
        Commands::Stats { json } => run_stats(json, &service).await?,
        Commands::Export { format, output } => {
            run_export(format, output.as_deref(), &service).await?;
        }
        Commands::Logout => run_logout(&service).await?,
        Commands::Completions { .. } | Commands::Config { .. } => {}
    }

    Ok(())
}
