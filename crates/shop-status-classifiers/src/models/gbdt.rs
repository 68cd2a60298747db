use anyhow::{bail, ensure, Result};
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::PredictError;
use crate::features::{FeatureVector, FEATURE_COUNT};
use crate::models::classifier_trait::ClassifierModel;

/// Loss understood by `gbdt` for binary classification with ±1 targets.
const BINARY_LOSS: &str = "LogLikelyhood";

/// Tree-learner settings passed through to `gbdt::config::Config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtParams {
    pub learning_rate: f32,
    pub max_depth: u32,
    pub num_boost_round: u32,
    pub min_leaf_size: usize,
    pub training_optimization_level: u8,
}

impl GbdtParams {
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        match &config.model_type {
            ModelType::GBDT {
                max_depth,
                num_boost_round,
                min_leaf_size,
                training_optimization_level,
            } => Ok(Self {
                learning_rate: config.learning_rate,
                max_depth: *max_depth,
                num_boost_round: *num_boost_round,
                min_leaf_size: *min_leaf_size,
                training_optimization_level: *training_optimization_level,
            }),
            other => bail!("Expected ModelType::GBDT params, got {:?}", other),
        }
    }

    fn to_gbdt_config(&self, feature_size: usize) -> Config {
        let mut config = Config::new();
        config.set_feature_size(feature_size);
        config.set_shrinkage(self.learning_rate);
        config.set_max_depth(self.max_depth);
        config.set_iterations(self.num_boost_round as usize);
        config.set_min_leaf_size(self.min_leaf_size);
        config.set_debug(false);
        config.set_training_optimization_level(self.training_optimization_level);
        config.set_loss(BINARY_LOSS);
        config
    }
}

/// Gradient Boosting Decision Tree (GBDT) classifier
#[derive(Serialize, Deserialize)]
pub struct GbdtClassifier {
    params: GbdtParams,
    feature_size: usize,
    model: Option<GBDT>,
}

impl GbdtClassifier {
    pub fn new(params: GbdtParams) -> Self {
        GbdtClassifier {
            params,
            feature_size: FEATURE_COUNT,
            model: None,
        }
    }
}

/// Check a binary training set: matching lengths, codes in {0, 1}, and
/// both classes present.
pub(crate) fn validate_binary_labels(x: &[FeatureVector], y: &[usize]) -> Result<()> {
    ensure!(!x.is_empty(), "Cannot fit a classifier on an empty training set");
    ensure!(
        x.len() == y.len(),
        "Feature rows ({}) and labels ({}) differ in length",
        x.len(),
        y.len()
    );
    if let Some(bad) = y.iter().find(|&&code| code > 1) {
        bail!("Binary classifier received label code {}", bad);
    }
    ensure!(
        y.contains(&0) && y.contains(&1),
        "Training labels must contain both classes"
    );
    Ok(())
}

impl ClassifierModel for GbdtClassifier {
    fn fit(&mut self, x: &[FeatureVector], y: &[usize]) -> Result<()> {
        validate_binary_labels(x, y)?;

        let feature_size = x[0].as_slice().len();
        let config = self.params.to_gbdt_config(feature_size);
        let mut gbdt = GBDT::new(&config);

        let mut train_x = DataVec::with_capacity(x.len());
        for (row, &label) in x.iter().zip(y) {
            let target = if label == 1 { 1.0 } else { -1.0 };
            train_x.push(Data::new_training_data(row.to_vec(), 1.0, target, None));
        }

        gbdt.fit(&mut train_x);
        log::debug!(
            "Fitted GBDT with {} rounds on {} rows",
            self.params.num_boost_round,
            x.len()
        );

        self.feature_size = feature_size;
        self.model = Some(gbdt);
        Ok(())
    }

    fn predict_proba(&self, x: &[f32]) -> Result<f32, PredictError> {
        if x.len() != self.feature_size {
            return Err(PredictError::InvalidInputShape {
                expected: self.feature_size,
                actual: x.len(),
            });
        }
        let model = self.model.as_ref().ok_or(PredictError::NotFitted)?;
        let test_x: DataVec = vec![Data::new_test_data(x.to_vec(), None)];
        model
            .predict(&test_x)
            .first()
            .copied()
            .ok_or(PredictError::NotFitted)
    }

    fn name(&self) -> &str {
        "gbdt"
    }
}
