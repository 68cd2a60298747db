use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::{ModelConfig, ModelType};
use crate::error::PredictError;
use crate::features::FeatureVector;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::forest::{ForestClassifier, ForestParams};
use crate::models::gbdt::{GbdtClassifier, GbdtParams};

/// A classifier of any supported type. Kept as an enum rather than a
/// boxed trait object so it can be written to and read from the
/// artifact store.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusModel {
    Gbdt(GbdtClassifier),
    RandomForest(ForestClassifier),
}

impl StatusModel {
    fn inner(&self) -> &dyn ClassifierModel {
        match self {
            StatusModel::Gbdt(m) => m,
            StatusModel::RandomForest(m) => m,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn ClassifierModel {
        match self {
            StatusModel::Gbdt(m) => m,
            StatusModel::RandomForest(m) => m,
        }
    }
}

impl ClassifierModel for StatusModel {
    fn fit(&mut self, x: &[FeatureVector], y: &[usize]) -> Result<()> {
        self.inner_mut().fit(x, y)
    }

    fn predict_proba(&self, x: &[f32]) -> Result<f32, PredictError> {
        self.inner().predict_proba(x)
    }

    fn name(&self) -> &str {
        self.inner().name()
    }
}

/// Build an unfitted classifier from a `ModelConfig`.
pub fn build_model(params: &ModelConfig) -> Result<StatusModel> {
    let model = match params.model_type {
        ModelType::GBDT { .. } => StatusModel::Gbdt(GbdtClassifier::new(GbdtParams::from_config(params)?)),
        ModelType::RandomForest { .. } => {
            StatusModel::RandomForest(ForestClassifier::new(ForestParams::from_config(params)?))
        }
    };
    Ok(model)
}
