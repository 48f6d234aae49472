//! CLI entrypoint for conclave
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod cli;
mod commands;
mod logging;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use conclave_infrastructure::{ConfigLoader, FileConfig};
use std::path::PathBuf;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Configuration comes first so `[logging] log_dir` can feed the subscriber
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).context("Failed to load configuration")?
    };

    let log_dir = cli
        .log_dir
        .clone()
        .or_else(|| config.logging.log_dir.as_ref().map(PathBuf::from));
    let _guard = logging::init(cli.verbose, log_dir.as_deref());

    info!("Starting conclave");

    if let Command::Config = cli.command {
        commands::show_config(&cli, &config);
        return Ok(());
    }

    let issues = config.validate();
    for issue in issues.iter().filter(|i| !i.is_error()) {
        warn!("config: {}", issue);
    }
    if FileConfig::has_errors(&issues) {
        for issue in issues.iter().filter(|i| i.is_error()) {
            eprintln!("config error: {}", issue);
        }
        bail!("Configuration has errors. Run `conclave config` for details.");
    }

    let app = commands::App::build(&config)?;

    match cli.command {
        Command::Run {
            goal,
            strategy,
            scope,
            budget,
        } => {
            app.run(&goal, strategy.map(Into::into), &scope, budget, cli.json)
                .await
        }
        Command::Swarm {
            goals,
            budget,
            fraction,
            scope,
        } => {
            let fraction = fraction.unwrap_or(config.pool.budget_fraction);
            app.swarm(goals, budget, fraction, &scope, cli.json).await
        }
        Command::Deliberate {
            file,
            refine,
            context,
        } => {
            app.deliberate(&file, refine, context.as_deref(), cli.json)
                .await
        }
        Command::Heartbeat { once } => app.heartbeat(&config, once, cli.json).await,
        Command::Config => Ok(()),
    }
}
