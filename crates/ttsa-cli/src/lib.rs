//! # ttsa-cli
//!
//! Handlers behind the `ttsa` binary. Every command prints exactly one JSON
//! document on stdout:
//!
//! ```bash
//! ttsa models
//! ttsa combinations --model wake --variables 1,3
//! ttsa indices --model covid --relatives -v
//! ```
//!
//! Failures print `{"error": {"kind", "message"}}` instead and exit with a
//! non-zero status.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use ttsa_sensitivity::report::{resolve_variables, ModelListing};
use ttsa_sensitivity::{
    build_surrogate, combination_listing, index_listing, EngineConfig, ErrorDocument,
    ModelRegistry, SensitivityError,
};

/// Engine settings that override the configuration file
#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct EngineOverrides {
    /// Cross-approximation and rounding tolerance
    #[arg(long, global = true)]
    pub eps: Option<f64>,

    /// Half-sweep cap of the cross approximation
    #[arg(long, global = true)]
    pub max_iter: Option<usize>,

    /// Grid points per input interval
    #[arg(long, global = true)]
    pub ticks: Option<usize>,

    /// Largest subset size listed
    #[arg(long, global = true)]
    pub max_order: Option<usize>,

    /// Decimal digits kept in the output
    #[arg(long, global = true)]
    pub digits: Option<u32>,

    /// Seed of the random searches
    #[arg(long, global = true)]
    pub seed: Option<u64>,
}

/// Read the configuration file, if any, and apply the overrides
pub fn load_config(path: Option<&Path>, overrides: &EngineOverrides) -> Result<EngineConfig> {
    let mut config = match path {
        Some(path) => EngineConfig::from_path(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => EngineConfig::default(),
    };
    if let Some(eps) = overrides.eps {
        config.eps = eps;
    }
    if let Some(max_iter) = overrides.max_iter {
        config.max_iter = max_iter;
    }
    if let Some(ticks) = overrides.ticks {
        config.ticks = ticks;
    }
    if let Some(max_order) = overrides.max_order {
        config.max_order = max_order;
    }
    if let Some(digits) = overrides.digits {
        config.digits = digits;
    }
    if let Some(seed) = overrides.seed {
        config.seed = seed;
    }
    config.validate()?;
    tracing::debug!(?config, "engine configuration");
    Ok(config)
}

/// Model and variable selection shared by the analysis commands
#[derive(Args, Debug, Clone, PartialEq)]
pub struct SelectionArgs {
    /// Registered model key (see `ttsa models`)
    #[arg(long)]
    pub model: String,

    /// 1-based variables to analyse, comma separated (default: all)
    #[arg(long, value_delimiter = ',')]
    pub variables: Option<Vec<usize>>,
}

/// Arguments of `ttsa indices`
#[derive(Args, Debug, Clone, PartialEq)]
pub struct IndicesArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Also compute relative importances
    #[arg(long)]
    pub relatives: bool,
}

/// `ttsa models`
pub fn run_models(registry: &ModelRegistry) -> Result<Value> {
    Ok(serde_json::to_value(ModelListing::from_registry(registry)?)?)
}

/// `ttsa combinations`: no surrogate is needed, only the model inputs
pub fn run_combinations(
    args: &SelectionArgs,
    registry: &ModelRegistry,
    config: &EngineConfig,
) -> Result<Value> {
    let source = registry.resolve(&args.model)?;
    let names: Vec<String> = source.axes().iter().map(|a| a.name.clone()).collect();
    let variables = resolve_variables(args.variables.as_deref(), names.len())?;
    let listing = combination_listing(&names, &variables, config.max_order);
    Ok(serde_json::to_value(listing)?)
}

/// `ttsa indices`
pub fn run_indices(
    args: &IndicesArgs,
    registry: &ModelRegistry,
    config: &EngineConfig,
) -> Result<Value> {
    let source = registry.resolve(&args.selection.model)?;
    let variables = resolve_variables(args.selection.variables.as_deref(), source.axes().len())?;
    let surrogate = build_surrogate(&source, config)
        .with_context(|| format!("building the surrogate of '{}'", args.selection.model))?;
    if !surrogate.converged {
        tracing::warn!(model = %args.selection.model, "surrogate did not converge");
    }
    let listing = index_listing(&surrogate.tensor, &variables, config, args.relatives)?;
    Ok(serde_json::to_value(listing)?)
}

/// Error document for a failed command
pub fn error_document(err: &anyhow::Error) -> ErrorDocument {
    match err.downcast_ref::<SensitivityError>() {
        Some(inner) => ErrorDocument::new(inner.kind(), format!("{err:#}")),
        None => ErrorDocument::new("internal", format!("{err:#}")),
    }
}
