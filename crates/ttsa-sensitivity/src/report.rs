//! JSON report documents
//!
//! Variables are numbered from 1 in every document. Numeric values are
//! rounded to `EngineConfig::digits` decimals when the document is built.

use crate::config::{EngineConfig, MAX_DIGITS};
use crate::dircov::DirectionalCovariance;
use crate::enumeration::combinations;
use crate::error::{Result, SensitivityError};
use crate::indices::SensitivityIndices;
use crate::registry::ModelRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use ttsa_tensortrain::{AbstractTensorTrain, TensorTrain};

/// Round `x` to `digits` decimals, at most [`MAX_DIGITS`]
pub fn round_to(x: f64, digits: u32) -> f64 {
    let scale = 10f64.powi(digits.min(MAX_DIGITS) as i32);
    (x * scale).round() / scale
}

/// Validate 1-based `variables` against `n`; `None` selects all of them
pub fn resolve_variables(variables: Option<&[usize]>, n: usize) -> Result<Vec<usize>> {
    let Some(variables) = variables else {
        return Ok((1..=n).collect());
    };
    if variables.is_empty() {
        return Err(SensitivityError::InvalidArgument {
            message: "no variables selected".to_string(),
        });
    }
    let mut seen = HashSet::new();
    for &v in variables {
        if v == 0 || v > n {
            return Err(SensitivityError::VariableOutOfRange { variable: v, n });
        }
        if !seen.insert(v) {
            return Err(SensitivityError::DuplicateVariable { variable: v });
        }
    }
    Ok(variables.to_vec())
}

fn zero_based(subset: &[usize]) -> Vec<usize> {
    subset.iter().map(|v| v - 1).collect()
}

/// Subsets of the chosen variables, grouped by size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinationListing {
    pub order: usize,
    pub name: Vec<String>,
    pub sets: Vec<BTreeMap<usize, Vec<Vec<usize>>>>,
}

/// List the subsets of `variables` up to `max_order` members
pub fn combination_listing(
    names: &[String],
    variables: &[usize],
    max_order: usize,
) -> CombinationListing {
    let order = max_order.min(names.len());
    let groups = (1..=order)
        .map(|k| (k, combinations(variables, k)))
        .collect();
    CombinationListing {
        order,
        name: names.to_vec(),
        sets: vec![groups],
    }
}

/// Index values of all subsets of one size, in combination order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexNode {
    pub dc: Vec<f64>,
    pub sobol: Vec<f64>,
    pub closed: Vec<f64>,
    pub total: Vec<f64>,
    #[serde(rename = "super")]
    pub superset: Vec<f64>,
}

/// Relative importances, per subset `V`, per size of `D`, per `D`
pub type RelativeGroup = Vec<Vec<Vec<f64>>>;

/// All index families of the chosen variables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexListing {
    /// Number of model inputs
    pub order: usize,
    /// Largest subset size listed
    pub od: usize,
    /// Number of chosen variables
    pub chosenorder: usize,
    pub nodes: Vec<BTreeMap<usize, IndexNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relatives: Option<Vec<BTreeMap<usize, RelativeGroup>>>,
}

/// Compute the index listing of surrogate `t` for 1-based `variables`
///
/// With `with_relatives`, every listed subset `V` also gets its relative
/// importance against each non-empty subset `D` of the remaining chosen
/// variables.
pub fn index_listing(
    t: &TensorTrain<f64>,
    variables: &[usize],
    config: &EngineConfig,
    with_relatives: bool,
) -> Result<IndexListing> {
    let n = t.len();
    let variables = resolve_variables(Some(variables), n)?;
    let indices = SensitivityIndices::new(t, config)?;
    let dircov = DirectionalCovariance::new(t, config)?;
    let od = config.max_order.min(n);
    let round = |x: f64| round_to(x, config.digits);

    let mut nodes = BTreeMap::new();
    let mut relatives = BTreeMap::new();
    for k in 1..=od {
        let mut node = IndexNode::default();
        let mut group = Vec::new();
        for subset in combinations(&variables, k) {
            let s = zero_based(&subset);
            node.dc.push(round(dircov.index(&s)?));
            node.sobol.push(round(indices.variance_component(&s)?));
            node.closed.push(round(indices.closed_index(&s)?));
            node.total.push(round(indices.total_index(&s)?));
            node.superset.push(round(indices.superset_index(&s)?));

            if with_relatives {
                let rest: Vec<usize> = variables
                    .iter()
                    .copied()
                    .filter(|v| !subset.contains(v))
                    .collect();
                let per_size = (1..=rest.len())
                    .map(|m| {
                        combinations(&rest, m)
                            .iter()
                            .map(|d| Ok(round(indices.relative_importance(&s, &zero_based(d))?)))
                            .collect::<Result<Vec<f64>>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                group.push(per_size);
            }
        }
        nodes.insert(k, node);
        if with_relatives {
            relatives.insert(k, group);
        }
    }
    tracing::info!(variables = variables.len(), od, with_relatives, "index listing ready");
    Ok(IndexListing {
        order: n,
        od,
        chosenorder: variables.len(),
        nodes: vec![nodes],
        relatives: with_relatives.then(|| vec![relatives]),
    })
}

/// One registered model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSummary {
    pub key: String,
    pub description: String,
    pub variables: Vec<String>,
}

/// The models of a registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelListing {
    pub models: Vec<ModelSummary>,
}

impl ModelListing {
    /// Summarize every model of `registry`, sorted by key
    pub fn from_registry(registry: &ModelRegistry) -> Result<Self> {
        let models = registry
            .keys()
            .into_iter()
            .map(|key| {
                let source = registry.resolve(key)?;
                Ok(ModelSummary {
                    key: key.to_string(),
                    description: registry.describe(key).unwrap_or_default().to_string(),
                    variables: source.axes().iter().map(|a| a.name.clone()).collect(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { models })
    }
}

/// Body of an error document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

/// `{"error": {"kind": .., "message": ..}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDocument {
    pub error: ErrorBody,
}

impl ErrorDocument {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                kind: kind.into(),
                message: message.into(),
            },
        }
    }
}

impl From<&SensitivityError> for ErrorDocument {
    fn from(err: &SensitivityError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}
