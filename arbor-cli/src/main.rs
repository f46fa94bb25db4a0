// SPDX-FileCopyrightText: 2026 Arbor Developers
// SPDX-License-Identifier: MIT

use std::path::PathBuf;
use std::process::ExitCode;

use arbor_cli::config::Config;
use arbor_cli::error::Result;
use arbor_cli::provision;
use arbor_query::Platform;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Create or dump the arbor database schema.
#[derive(Parser, Debug)]
#[command(name = "arbor-schema", version)]
struct Args {
    /// Apply the schema to the configured SQLite database
    #[arg(long)]
    force: bool,

    /// Print the schema statements instead of applying them
    #[arg(long)]
    dump_sql: bool,

    /// Drop existing tables first
    #[arg(long)]
    drop: bool,

    /// Configuration file
    #[arg(long, env = "ARBOR_CONFIG")]
    config: Option<PathBuf>,
}

fn run(args: &Args) -> Result<()> {
    let config = Config::load(args.config.as_deref(), &std::env::current_dir().unwrap_or_default())?;
    info!("Database: {}", config.database.display());
    info!("Platform: {}", config.platform);

    if args.dump_sql {
        if args.drop && !args.force && config.platform == Platform::Sqlite {
            provision::check_droppable(&config.database)?;
        }
        print!("{}", provision::script(config.platform, args.drop));
    }
    if args.force {
        provision::apply(&config, args.drop)?;
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    if !args.dump_sql && !args.force {
        eprintln!("Nothing to do: pass --dump-sql to print the schema or --force to apply it.");
        return ExitCode::from(2);
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
