//! CLI argument definitions using clap

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "switchyard")]
#[command(about = "Provider fallback, pacing and de-duplication for LLM dispatch")]
#[command(version)]
pub struct Cli {
    /// TOML configuration file (environment variables are used when omitted)
    #[arg(long, global = true, env = "SWITCHYARD_CONFIG")]
    pub config_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the fallback ladder for an intent label
    Chain {
        /// Intent label, e.g. "coding" or "factual lookup"
        intent: String,
    },

    /// Print the resolved configuration as JSON (API keys omitted)
    Config,

    /// Dispatch through the full stack against a demo provider
    Simulate(SimulateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Intent label used to pick the ladder
    #[arg(long, default_value = "ambiguous")]
    pub intent: String,

    /// Number of upstream calls that fail with a rate-limit error first
    #[arg(long, default_value_t = 0)]
    pub fail: usize,

    /// Prompt sent as the user turn
    #[arg(long, default_value = "Hello from switchyard")]
    pub prompt: String,

    /// Use the streaming path
    #[arg(long)]
    pub stream: bool,

    /// Identical requests issued at once, to exercise de-duplication
    #[arg(long, default_value_t = 1)]
    pub concurrent: usize,

    /// Dispatch the same request again afterwards, to exercise the cache
    #[arg(long)]
    pub repeat: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_simulate() {
        let cli = Cli::try_parse_from([
            "switchyard",
            "simulate",
            "--intent",
            "coding",
            "--fail",
            "2",
            "--stream",
            "--concurrent",
            "3",
        ])
        .unwrap();

        match cli.command {
            Commands::Simulate(args) => {
                assert_eq!(args.intent, "coding");
                assert_eq!(args.fail, 2);
                assert!(args.stream);
                assert_eq!(args.concurrent, 3);
                assert!(!args.repeat);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["switchyard", "chain", "factual", "--json-logs"]).unwrap();
        assert!(cli.json_logs);
        assert!(matches!(cli.command, Commands::Chain { intent } if intent == "factual"));
    }
}
