//! Model registry
//!
//! Models are selected by key. A registry maps each key to a description and
//! a provider that builds a fresh [`ModelSource`].

use crate::error::{Result, SensitivityError};
use crate::model::{Axis, ModelSource};
use std::collections::BTreeMap;
use std::fmt;

type Provider = Box<dyn Fn() -> ModelSource + Send + Sync>;

struct Entry {
    description: String,
    provider: Provider,
}

/// Key to model lookup table
pub struct ModelRegistry {
    entries: BTreeMap<String, Entry>,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("keys", &self.keys())
            .finish()
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn map_rows(rows: &[Vec<f64>], f: impl Fn(&[f64]) -> f64) -> Vec<f64> {
    rows.iter().map(|x| f(x)).collect()
}

fn linear() -> ModelSource {
    ModelSource::function(
        |rows: &[Vec<f64>]| {
            map_rows(rows, |x| 2.4 * x[0] + 0.5 * x[1] - 1.2 * x[2] - 2.0 * x[3])
        },
        (1..=4)
            .map(|i| Axis::interval(format!("x_{i}"), -10.0, 10.0))
            .collect(),
    )
}

fn polynomial() -> ModelSource {
    ModelSource::function(
        |rows: &[Vec<f64>]| {
            map_rows(rows, |x| {
                (x[0] - 1.0).powi(2) + 2.0 * (2.0 * x[1] * x[1] - x[0]).powi(2)
            })
        },
        vec![
            Axis::interval("x1", -10.0, 10.0),
            Axis::interval("x2", -10.0, 10.0),
        ],
    )
}

/// Velocity deficit behind a wind turbine (Jensen wake model)
fn wake() -> ModelSource {
    ModelSource::function(
        |rows: &[Vec<f64>]| {
            map_rows(rows, |x| {
                let (thrust, kwake, d0, dist) = (x[0], x[1], x[2], x[3]);
                (1.0 - (1.0 - thrust).sqrt()) / (1.0 + 2.0 * kwake * dist / d0).powi(2)
            })
        },
        vec![
            Axis::interval("C_T", 0.4, 0.8),
            Axis::interval("k_{wake}", 0.1, 0.2),
            Axis::interval("d_0", 1.0, 80.0),
            Axis::interval("x", 1.0, 200.0),
        ],
    )
}

/// Basic reproduction number of a compartmental epidemic model
fn covid() -> ModelSource {
    ModelSource::function(
        |rows: &[Vec<f64>]| {
            map_rows(rows, |x| {
                let (c, beta, q, theta, o) = (x[0], x[1], x[2], x[3], x[4]);
                let (delta_i, gamma_i, gamma_a, alpha) = (x[5], x[6], x[7], x[8]);
                let symptomatic = beta * o * c * (1.0 - q) / (delta_i + alpha + gamma_i);
                let asymptomatic = beta * c * theta * (1.0 - o) * (1.0 - q) / gamma_a;
                8_570_000.0 * (symptomatic + asymptomatic)
            })
        },
        vec![
            Axis::interval("c: Contact rate", 12.069, 17.493),
            Axis::interval(
                "beta: Probability of transmission per contact",
                1.74453e-8,
                2.45769e-8,
            ),
            Axis::interval("q: Quarantined rate of exposed individuals", 0.0, 3.79832e-7),
            Axis::interval("theta", 0.0, 1.0),
            Axis::interval("o: symptoms among infected individuals", 0.720659, 1.016021),
            Axis::interval(
                "delta_I: Transition rate of symptomatic infected individuals to the quarantined infected class",
                0.068715,
                0.196605,
            ),
            Axis::interval(
                "gamma_I: Recovery rate of symptomatic infected individuals",
                0.173885,
                0.486695,
            ),
            Axis::interval(
                "gamma_A: Recovery rate of asymptomatic infected individuals",
                0.035317,
                0.244243,
            ),
            Axis::interval("alpha: Disease-induced death rate", 0.0, 3.83253),
        ],
    )
}

impl ModelRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// A registry holding the built-in models
    pub fn with_builtins() -> Self {
        let builtins: [(&str, &str, fn() -> ModelSource); 4] = [
            ("linear", "2.4 x1 + 0.5 x2 - 1.2 x3 - 2 x4 on [-10, 10]^4", linear),
            ("polynomial", "(x1 - 1)^2 + 2 (2 x2^2 - x1)^2 on [-10, 10]^2", polynomial),
            ("wake", "Jensen wind-turbine wake velocity deficit", wake),
            ("covid", "Reproduction number of an epidemic model with 9 rates", covid),
        ];
        let mut registry = Self::new();
        for (key, description, provider) in builtins {
            registry.entries.insert(
                key.to_string(),
                Entry {
                    description: description.to_string(),
                    provider: Box::new(provider),
                },
            );
        }
        registry
    }

    /// Register a model; an existing key is an error
    pub fn register<F>(
        &mut self,
        key: impl Into<String>,
        description: impl Into<String>,
        provider: F,
    ) -> Result<()>
    where
        F: Fn() -> ModelSource + Send + Sync + 'static,
    {
        let key = key.into();
        if self.entries.contains_key(&key) {
            return Err(SensitivityError::InvalidModel {
                message: format!("model '{key}' is already registered"),
            });
        }
        self.entries.insert(
            key,
            Entry {
                description: description.into(),
                provider: Box::new(provider),
            },
        );
        Ok(())
    }

    /// Build the model registered under `key`
    pub fn resolve(&self, key: &str) -> Result<ModelSource> {
        self.entries
            .get(key)
            .map(|entry| (entry.provider)())
            .ok_or_else(|| SensitivityError::UnknownModel {
                key: key.to_string(),
            })
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Description of `key`
    pub fn describe(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.description.as_str())
    }
}
