use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Central configuration for models in the crate.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub learning_rate: f32,

    #[serde(flatten)]
    pub model_type: ModelType,
}

/// Supported model types and their hyper-parameters.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub enum ModelType {
    GBDT {
        max_depth: u32,
        num_boost_round: u32,
        min_leaf_size: usize,
        training_optimization_level: u8,
    },
    RandomForest {
        n_estimators: usize,
        max_depth: u32,
        min_leaf_size: usize,
        /// Fraction of the training set drawn (with replacement) per tree.
        bootstrap_ratio: f64,
        /// Number of feature columns each tree may split on.
        #[serde(default = "default_max_features")]
        max_features: usize,
        seed: u64,
    },
}

fn default_max_features() -> usize {
    2
}

impl ModelType {
    pub fn name(&self) -> &'static str {
        match self {
            ModelType::GBDT { .. } => "gbdt",
            ModelType::RandomForest { .. } => "random_forest",
        }
    }
}

impl Default for ModelType {
    fn default() -> Self {
        ModelType::RandomForest {
            n_estimators: 100,
            max_depth: 8,
            min_leaf_size: 1,
            bootstrap_ratio: 1.0,
            max_features: default_max_features(),
            seed: 42,
        }
    }
}

impl FromStr for ModelType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gbdt" => Ok(ModelType::GBDT {
                max_depth: 6,
                num_boost_round: 50,
                min_leaf_size: 1,
                training_optimization_level: 2,
            }),
            "random_forest" | "random-forest" | "rf" => Ok(ModelType::default()),
            _ => Err(format!(
                "Unknown model type: {}. Expected one of: gbdt, random_forest",
                s
            )),
        }
    }
}

impl ModelConfig {
    pub fn new(learning_rate: f32, model_type: ModelType) -> Self {
        Self {
            learning_rate,
            model_type,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            model_type: ModelType::default(),
        }
    }
}

/// How the day of week enters the feature vector.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DayEncoding {
    /// Integer 0..=6, Monday = 0. Weekday names are converted.
    #[default]
    Ordinal,
    /// Category looked up in a day encoder fitted on the training data.
    Categorical,
}

impl FromStr for DayEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ordinal" => Ok(DayEncoding::Ordinal),
            "categorical" => Ok(DayEncoding::Categorical),
            _ => Err(format!(
                "Unknown day encoding: {}. Expected 'ordinal' or 'categorical'",
                s
            )),
        }
    }
}

/// Parameters for training a status model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct TrainConfig {
    pub model: ModelConfig,
    pub day_encoding: DayEncoding,
}

/// Load a training configuration from a JSON file.
pub fn load_train_config<P: AsRef<Path>>(path: P) -> Result<TrainConfig> {
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config: {}", path.as_ref().display()))?;
    let config: TrainConfig = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config: {}", path.as_ref().display()))?;
    Ok(config)
}
