mod cli;
mod commands;
mod config_sections;
mod scheduler;
mod wiring;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use cli::{Cli, Command};
use wayreel_common::Config;

#[tokio::main]
async fn main() -> Result<()> {
    wayreel_common::logging::init("wayreel=info");

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    info!("wayreel starting");

    match cli.command {
        Command::Scout { iterations } => commands::scout(&config, iterations).await,
        Command::Record { iterations } => commands::record(&config, iterations).await,
        Command::Approve { iterations, tts } => commands::approve(&config, iterations, tts).await,
        Command::Publish { iterations } => commands::publish(&config, iterations).await,
        Command::Compile { selection, tts, color, duration, sfx } => {
            commands::compile(&config, &selection, tts, color, duration, sfx).await
        }
        Command::Enqueue { stage, url, timestamp } => commands::enqueue(&config, stage, url, timestamp).await,
        Command::Save { url } => commands::save(&config, url).await,
        Command::Delete { unapproved, compiled, temporary, registry } => {
            commands::delete(&config, unapproved, compiled, temporary, registry).await
        }
        Command::Stats => commands::stats(&config).await,
        Command::Graph { query } => commands::graph(&config, &query).await,
    }
}
