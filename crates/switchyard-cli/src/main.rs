//! Switchyard CLI
//!
//! Operator tooling over `switchyard-core`: inspect fallback ladders and the
//! resolved configuration, or run the full dispatch path against an
//! in-process demo provider.
//!
//! ```bash
//! switchyard chain coding
//! switchyard config
//! switchyard simulate --intent factual --fail 2 --stream
//! ```

mod args;
mod commands;
mod console;

use args::{Cli, Commands};
use clap::Parser;
use switchyard_core::config::{self, SwitchyardConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs, cli.verbose);

    let config = load_config(&cli)?;
    match cli.command {
        Commands::Chain { intent } => commands::chain::show(&intent, cli.verbose),
        Commands::Config => commands::config::show(&config),
        Commands::Simulate(args) => commands::simulate::run(config, args).await,
    }
}

/// RUST_LOG wins; otherwise `info`, or `debug` with --verbose
fn init_logging(json: bool, verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<SwitchyardConfig> {
    let config = match &cli.config_file {
        Some(path) => config::load_from_file(path)?,
        None => config::load_from_env()?,
    };
    Ok(config)
}
