//! Fit encoders and a classifier from labelled samples.
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::TrainConfig;
use crate::data_handling::{TrainingSample, TrainingSet};
use crate::encoding::EncoderRegistry;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::{build_model, StatusModel};
use crate::stats::{accuracy, class_counts};

/// Summary of a training run, written into the artifact manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub model_name: String,
    pub n_samples: usize,
    pub n_shops: usize,
    pub class_counts: Vec<(String, usize)>,
    pub training_accuracy: f32,
}

/// Everything the serving side needs, produced together so the encoders
/// and the model can never come from different runs.
pub struct TrainedArtifacts {
    pub registry: EncoderRegistry,
    pub model: StatusModel,
    pub report: TrainingReport,
}

pub fn train(samples: &[TrainingSample], config: &TrainConfig) -> Result<TrainedArtifacts> {
    let set = TrainingSet::build(samples, config.day_encoding)?;
    log::info!(
        "Training {} model on {} samples ({:?} day encoding)",
        config.model.model_type.name(),
        set.len(),
        config.day_encoding
    );

    let mut model = build_model(&config.model)?;
    model
        .fit(&set.x, &set.y)
        .with_context(|| format!("Failed to fit {} model", config.model.model_type.name()))?;

    let predicted = set
        .x
        .par_iter()
        .map(|row| model.predict(row.as_slice()))
        .collect::<Result<Vec<usize>, _>>()
        .context("Fitted model failed to score its own training data")?;

    let labels = set.registry.label_encoder();
    let counts = class_counts(&set.y, labels.len());
    let report = TrainingReport {
        model_name: model.name().to_string(),
        n_samples: set.len(),
        n_shops: set.registry.shop_encoder().len(),
        class_counts: labels.classes().iter().cloned().zip(counts).collect(),
        training_accuracy: accuracy(&predicted, &set.y),
    };
    log::info!(
        "Training accuracy {:.3} over {} samples",
        report.training_accuracy,
        report.n_samples
    );

    Ok(TrainedArtifacts {
        registry: set.registry,
        model,
        report,
    })
}
