//! Models and their tensor-train surrogates
//!
//! A model is either a batch function of real coordinates or an existing
//! tensor train, together with one named axis per input. Building the
//! surrogate samples the function on the product of the axis grids.

use crate::config::EngineConfig;
use crate::error::{Result, SensitivityError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use ttsa_tensorci::cross_grid;
use ttsa_tensortrain::{AbstractTensorTrain, TensorTrain};

/// Sampling domain of one input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Domain {
    /// Closed interval, sampled at `ticks` equispaced points
    Interval(f64, f64),
    /// Explicit sample points, used as given
    Ticks(Vec<f64>),
}

/// A named model input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    pub name: String,
    pub domain: Domain,
}

impl Axis {
    /// Axis over the interval `[lo, hi]`
    pub fn interval(name: impl Into<String>, lo: f64, hi: f64) -> Self {
        Self {
            name: name.into(),
            domain: Domain::Interval(lo, hi),
        }
    }

    /// Axis over explicit sample points
    pub fn ticks(name: impl Into<String>, ticks: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            domain: Domain::Ticks(ticks),
        }
    }

    /// Sample points of this axis
    pub fn grid(&self, ticks: usize) -> Result<Vec<f64>> {
        let invalid = |message: String| SensitivityError::InvalidModel { message };
        match &self.domain {
            Domain::Interval(lo, hi) => {
                if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                    return Err(invalid(format!(
                        "axis '{}' has an invalid interval [{lo}, {hi}]",
                        self.name
                    )));
                }
                if ticks < 2 {
                    return Err(invalid(format!("axis '{}' needs at least 2 ticks", self.name)));
                }
                let step = (hi - lo) / (ticks - 1) as f64;
                Ok((0..ticks)
                    .map(|i| if i + 1 == ticks { *hi } else { lo + step * i as f64 })
                    .collect())
            }
            Domain::Ticks(points) => {
                if points.is_empty() {
                    return Err(invalid(format!("axis '{}' has no ticks", self.name)));
                }
                if let Some(bad) = points.iter().find(|v| !v.is_finite()) {
                    return Err(invalid(format!("axis '{}' has a non-finite tick {bad}", self.name)));
                }
                Ok(points.clone())
            }
        }
    }
}

/// A function mapping a batch of coordinate rows to one output per row
pub type BatchFunction = Arc<dyn Fn(&[Vec<f64>]) -> Vec<f64> + Send + Sync>;

/// Where the surrogate comes from
#[derive(Clone)]
pub enum ModelSource {
    /// Black-box function sampled by cross approximation
    Function {
        function: BatchFunction,
        axes: Vec<Axis>,
    },
    /// Precomputed tensor train, one axis per mode
    Tensor {
        tensor: TensorTrain<f64>,
        axes: Vec<Axis>,
    },
}

impl ModelSource {
    /// Wrap a batch function
    pub fn function<F>(function: F, axes: Vec<Axis>) -> Self
    where
        F: Fn(&[Vec<f64>]) -> Vec<f64> + Send + Sync + 'static,
    {
        Self::Function {
            function: Arc::new(function),
            axes,
        }
    }

    /// The model inputs
    pub fn axes(&self) -> &[Axis] {
        match self {
            Self::Function { axes, .. } | Self::Tensor { axes, .. } => axes,
        }
    }
}

impl fmt::Debug for ModelSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Function { axes, .. } => f
                .debug_struct("Function")
                .field("axes", axes)
                .finish_non_exhaustive(),
            Self::Tensor { tensor, axes } => f
                .debug_struct("Tensor")
                .field("site_dims", &tensor.site_dims())
                .field("axes", axes)
                .finish(),
        }
    }
}

/// Tensor-train surrogate of a model
#[derive(Debug, Clone)]
pub struct Surrogate {
    pub tensor: TensorTrain<f64>,
    pub names: Vec<String>,
    pub grids: Vec<Vec<f64>>,
    /// Distinct model evaluations (0 for tensor sources)
    pub n_evals: usize,
    pub converged: bool,
}

impl Surrogate {
    /// Number of model inputs
    pub fn num_variables(&self) -> usize {
        self.names.len()
    }
}

/// Build the surrogate of `source` under `config`
pub fn build_surrogate(source: &ModelSource, config: &EngineConfig) -> Result<Surrogate> {
    config.validate()?;
    let axes = source.axes();
    if axes.is_empty() {
        return Err(SensitivityError::NotImplemented {
            feature: "models without inputs".to_string(),
        });
    }
    let names: Vec<String> = axes.iter().map(|a| a.name.clone()).collect();

    match source {
        ModelSource::Function { function, .. } => {
            let grids = axes
                .iter()
                .map(|a| a.grid(config.ticks))
                .collect::<Result<Vec<_>>>()?;
            let f = |rows: &[Vec<f64>]| function(rows);
            let result = cross_grid(f, &grids, &config.cross_options())?;
            tracing::info!(
                variables = names.len(),
                n_evals = result.n_evals,
                rank = result.tensor_train.rank(),
                converged = result.converged,
                "surrogate built"
            );
            Ok(Surrogate {
                tensor: result.tensor_train,
                names,
                grids,
                n_evals: result.n_evals,
                converged: result.converged,
            })
        }
        ModelSource::Tensor { tensor, .. } => {
            let dims = tensor.site_dims();
            if dims.len() != axes.len() {
                return Err(SensitivityError::NotImplemented {
                    feature: format!(
                        "tensor models with {} modes but {} axes",
                        dims.len(),
                        axes.len()
                    ),
                });
            }
            let grids = axes
                .iter()
                .zip(&dims)
                .map(|(a, &d)| {
                    let grid = a.grid(d)?;
                    if grid.len() != d {
                        return Err(SensitivityError::NotImplemented {
                            feature: format!(
                                "axis '{}' with {} ticks on a mode of size {d}",
                                a.name,
                                grid.len()
                            ),
                        });
                    }
                    Ok(grid)
                })
                .collect::<Result<Vec<_>>>()?;
            tracing::info!(variables = names.len(), rank = tensor.rank(), "tensor model loaded");
            Ok(Surrogate {
                tensor: tensor.clone(),
                names,
                grids,
                n_evals: 0,
                converged: true,
            })
        }
    }
}
