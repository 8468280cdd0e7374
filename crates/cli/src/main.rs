//! # ferrous-dsync
//!
//! Keeps the delegation of served child zones in sync with their parents.

mod bootstrap;
mod cli;
mod commands;
mod di;

use clap::Parser;
use cli::{Cli, Command};
use di::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = bootstrap::load_config(cli.config.as_deref(), cli.overrides())?;
    bootstrap::init_logging(&config.logging);
    bootstrap::log_config(&config, cli.config.as_deref());

    let pool = bootstrap::init_database(&config.database).await?;
    let periodic_check = matches!(cli.command, Command::Serve);
    let app = App::build(config, pool, periodic_check).await?;

    let json = cli.json;
    let result = match cli.command {
        Command::Serve => return commands::serve::run(app).await,
        Command::Keystore { kind } => commands::keystore::run(&app, kind, json).await,
        Command::Truststore { command } => commands::truststore::run(&app, command, json).await,
        Command::Dsync { command } => commands::dsync::run(&app, command, json).await,
        Command::Delegation { command } => commands::delegation::run(&app, command, json).await,
        Command::Sig0 { command } => commands::sig0::run(&app, command, json).await,
    };

    app.shutdown().await;
    result
}
