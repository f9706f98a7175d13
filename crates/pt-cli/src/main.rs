use std::io;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use pt_cli::commands::{import, stats, status, submit, view};
use pt_cli::{Cli, Commands, Config, error_report};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(pt_db::Database, Config)> {
    let config = load_config(config_path)?;

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = pt_db::Database::open(&config.database_path)
        .context("failed to open database")?
        .with_roster_role(config.roster_role.clone());
    Ok((db, config))
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    let mut stdout = io::stdout().lock();

    match &cli.command {
        Some(Commands::Status) => {
            let (db, config) = open_database(cli.config.as_deref())?;
            status::run(&mut stdout, &db, &config)?;
        }
        Some(Commands::Import) => {
            let (mut db, config) = open_database(cli.config.as_deref())?;
            let summary = import::run(&mut db, &config.roster_role)?;
            eprintln!(
                "Imported {} session(s) and {} participant(s).",
                summary.sessions, summary.participants
            );
        }
        Some(Commands::View { session, day, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            view::run(&mut stdout, &db, *session, *day, *json)?;
        }
        Some(Commands::Get {
            session,
            participant,
            day,
        }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            view::run_lookup(&mut stdout, &db, *session, *participant, *day)?;
        }
        Some(Commands::Submit { file }) => {
            let (mut db, _config) = open_database(cli.config.as_deref())?;
            submit::run(&mut stdout, &mut db, file.as_deref())?;
        }
        Some(Commands::Stats { session, json }) => {
            let (db, _config) = open_database(cli.config.as_deref())?;
            stats::run(&mut stdout, &db, *session, *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match error_report(&err) {
                Some(report) => match serde_json::to_string(&report) {
                    Ok(json) => eprintln!("{json}"),
                    Err(_) => eprintln!("Error: {err:#}"),
                },
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
