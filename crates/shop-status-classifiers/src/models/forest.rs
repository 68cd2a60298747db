//! Random forest of shallow `gbdt` trees.
//!
//! Each member is a single boosting round fit on its own seeded bootstrap
//! sample, restricted to a seeded random subset of `max_features` columns.
//! Columns outside the subset are held at zero during that tree's fit, so
//! it never splits on them. Members are trained in parallel; prediction
//! averages their probabilities.

use anyhow::{bail, ensure, Result};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::PredictError;
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::models::classifier_trait::ClassifierModel;
use crate::models::gbdt::{validate_binary_labels, GbdtClassifier, GbdtParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub max_depth: u32,
    pub min_leaf_size: usize,
    pub bootstrap_ratio: f64,
    pub max_features: usize,
    pub seed: u64,
}

impl ForestParams {
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        match &config.model_type {
            ModelType::RandomForest {
                n_estimators,
                max_depth,
                min_leaf_size,
                bootstrap_ratio,
                max_features,
                seed,
            } => {
                ensure!(*n_estimators > 0, "n_estimators must be positive");
                ensure!(
                    *bootstrap_ratio > 0.0 && *bootstrap_ratio <= 1.0,
                    "bootstrap_ratio must be in (0, 1], got {}",
                    bootstrap_ratio
                );
                ensure!(
                    (1..=FEATURE_COUNT).contains(max_features),
                    "max_features must be in 1..={}, got {}",
                    FEATURE_COUNT,
                    max_features
                );
                Ok(Self {
                    n_estimators: *n_estimators,
                    max_depth: *max_depth,
                    min_leaf_size: *min_leaf_size,
                    bootstrap_ratio: *bootstrap_ratio,
                    max_features: *max_features,
                    seed: *seed,
                })
            }
            other => bail!("Expected ModelType::RandomForest params, got {:?}", other),
        }
    }

    fn tree_params(&self) -> GbdtParams {
        GbdtParams {
            learning_rate: 1.0,
            max_depth: self.max_depth,
            num_boost_round: 1,
            min_leaf_size: self.min_leaf_size,
            training_optimization_level: 2,
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct ForestClassifier {
    params: ForestParams,
    feature_size: usize,
    trees: Vec<GbdtClassifier>,
}

impl ForestClassifier {
    pub fn new(params: ForestParams) -> Self {
        Self {
            params,
            feature_size: FEATURE_COUNT,
            trees: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Draw `size` row indices with replacement. If the draw misses a class
/// entirely, one row of that class is swapped in so every member sees
/// both labels.
fn bootstrap_indices(y: &[usize], size: usize, rng: &mut StdRng) -> Vec<usize> {
    let n = y.len();
    let mut indices: Vec<usize> = (0..size).map(|_| rng.gen_range(0..n)).collect();
    for class in [0usize, 1] {
        if !indices.iter().any(|&i| y[i] == class) {
            let members: Vec<usize> = (0..n).filter(|&i| y[i] == class).collect();
            let pick = members[rng.gen_range(0..members.len())];
            let slot = rng.gen_range(0..indices.len());
            indices[slot] = pick;
        }
    }
    indices
}

/// Sorted column indices a member tree may split on.
fn feature_subset(n_features: usize, max_features: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut columns = index::sample(rng, n_features, max_features.min(n_features)).into_vec();
    columns.sort_unstable();
    columns
}

impl ClassifierModel for ForestClassifier {
    fn fit(&mut self, x: &[FeatureVector], y: &[usize]) -> Result<()> {
        validate_binary_labels(x, y)?;

        let sample_size = ((x.len() as f64) * self.params.bootstrap_ratio).ceil().max(2.0) as usize;
        let tree_params = self.params.tree_params();
        let seed = self.params.seed;
        let n_features = x[0].as_slice().len();
        let max_features = self.params.max_features;

        let trees = (0..self.params.n_estimators)
            .into_par_iter()
            .map(|member| -> Result<GbdtClassifier> {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(member as u64));
                let indices = bootstrap_indices(y, sample_size, &mut rng);
                let columns = feature_subset(n_features, max_features, &mut rng);
                let bx: Vec<FeatureVector> = indices.iter().map(|&i| x[i].masked(&columns)).collect();
                let by: Vec<usize> = indices.iter().map(|&i| y[i]).collect();

                let mut tree = GbdtClassifier::new(tree_params.clone());
                tree.fit(&bx, &by)?;
                Ok(tree)
            })
            .collect::<Result<Vec<_>>>()?;

        self.feature_size = n_features;
        self.trees = trees;
        log::debug!(
            "Fitted forest of {} trees on {} rows (bootstrap size {}, {} of {} features per tree)",
            self.n_trees(),
            x.len(),
            sample_size,
            max_features,
            n_features
        );
        Ok(())
    }

    fn predict_proba(&self, x: &[f32]) -> Result<f32, PredictError> {
        if x.len() != self.feature_size {
            return Err(PredictError::InvalidInputShape {
                expected: self.feature_size,
                actual: x.len(),
            });
        }
        if self.trees.is_empty() {
            return Err(PredictError::NotFitted);
        }
        let mut total = 0.0f32;
        for tree in &self.trees {
            total += tree.predict_proba(x)?;
        }
        Ok(total / self.trees.len() as f32)
    }

    fn name(&self) -> &str {
        "random_forest"
    }
}
