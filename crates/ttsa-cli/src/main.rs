//! # ttsa CLI entry point
//!
//! Parses command-line arguments, installs logging on stderr and dispatches
//! to the handlers in `ttsa_cli`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ttsa_cli::{
    error_document, load_config, run_combinations, run_indices, run_models, EngineOverrides,
    IndicesArgs, SelectionArgs,
};
use ttsa_sensitivity::ModelRegistry;

/// Tensor-train global sensitivity analysis
///
/// Builds a compressed surrogate of a registered model and reports Sobol
/// indices, directional covariances and subset listings as JSON.
#[derive(Parser, Debug)]
#[command(name = "ttsa", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a JSON engine configuration.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: EngineOverrides,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the registered models and their inputs.
    Models,

    /// List the variable subsets of a model, grouped by size.
    Combinations(SelectionArgs),

    /// Compute all index families of a model's variable subsets.
    Indices(IndicesArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("ttsa CLI starting");

    let registry = ModelRegistry::with_builtins();
    let result = load_config(cli.config.as_deref(), &cli.overrides).and_then(|config| {
        match &cli.command {
            Commands::Models => run_models(&registry),
            Commands::Combinations(args) => run_combinations(args, &registry, &config),
            Commands::Indices(args) => run_indices(args, &registry, &config),
        }
    });

    match result {
        Ok(document) => {
            println!("{document}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            println!("{}", serde_json::to_string(&error_document(&e)).unwrap_or_default());
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parse_models() {
        let cli = Cli::try_parse_from(["ttsa", "models"]).unwrap();
        assert!(matches!(cli.command, Commands::Models));
        assert_eq!(cli.verbose, 0);
        assert_eq!(cli.overrides, EngineOverrides::default());
    }

    #[test]
    fn cli_parse_combinations_with_variables() {
        let cli = Cli::try_parse_from([
            "ttsa",
            "combinations",
            "--model",
            "wake",
            "--variables",
            "1,3,4",
        ])
        .unwrap();
        if let Commands::Combinations(args) = cli.command {
            assert_eq!(args.model, "wake");
            assert_eq!(args.variables, Some(vec![1, 3, 4]));
        } else {
            panic!("expected combinations");
        }
    }

    #[test]
    fn cli_parse_indices_with_global_flags() {
        let cli = Cli::try_parse_from([
            "ttsa",
            "indices",
            "--model",
            "covid",
            "--relatives",
            "--ticks",
            "32",
            "--eps",
            "1e-4",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.overrides.ticks, Some(32));
        assert_eq!(cli.overrides.eps, Some(1e-4));
        if let Commands::Indices(args) = cli.command {
            assert!(args.relatives);
            assert!(args.selection.variables.is_none());
        } else {
            panic!("expected indices");
        }
    }

    #[test]
    fn cli_parse_requires_model() {
        assert!(Cli::try_parse_from(["ttsa", "indices"]).is_err());
        assert!(Cli::try_parse_from(["ttsa", "combinations", "--model", "x", "--variables", "a"]).is_err());
    }

    #[test]
    fn cli_parse_config_path() {
        let cli = Cli::try_parse_from(["ttsa", "models", "--config", "engine.json"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("engine.json")));
    }
}
