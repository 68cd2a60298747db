//! The serving pipeline: assemble, classify, decode.
//!
//! A `Predictor` is loaded once at process start and then only read. It
//! holds no interior mutability, so one instance behind an `Arc` serves
//! any number of threads without locking. Replacing a model means
//! building a new `Predictor` and swapping the `Arc`, never mutating the
//! one in use.

use std::path::Path;

use anyhow::Result;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::artifacts::{load_artifacts, Manifest};
use crate::encoding::EncoderRegistry;
use crate::error::{ErrorKind, PredictError};
use crate::features::{assemble, FeatureRecord};
use crate::models::classifier_trait::{label_code, ClassifierModel};
use crate::models::factory::StatusModel;
use crate::trainer::TrainedArtifacts;

/// A successful prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub predicted_status: String,
    pub code: usize,
    /// Model probability for label code `1`.
    pub probability: f32,
}

/// Outbound record handed to the transport layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionResponse {
    Success { predicted_status: String },
    Failure { error: String, kind: ErrorKind },
}

impl PredictionResponse {
    pub fn http_status(&self) -> u16 {
        match self {
            PredictionResponse::Success { .. } => 200,
            PredictionResponse::Failure { kind, .. } => kind.http_status(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, PredictionResponse::Success { .. })
    }
}

impl From<Result<Prediction, PredictError>> for PredictionResponse {
    fn from(result: Result<Prediction, PredictError>) -> Self {
        match result {
            Ok(prediction) => PredictionResponse::Success {
                predicted_status: prediction.predicted_status,
            },
            Err(err) => PredictionResponse::Failure {
                error: err.public_message(),
                kind: err.kind(),
            },
        }
    }
}

/// A response paired with its status code, one per served request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub body: PredictionResponse,
}

impl From<PredictionResponse> for ResponseEnvelope {
    fn from(body: PredictionResponse) -> Self {
        Self {
            status: body.http_status(),
            body,
        }
    }
}

pub struct Predictor {
    registry: EncoderRegistry,
    model: StatusModel,
    manifest: Option<Manifest>,
}

impl Predictor {
    pub fn new(registry: EncoderRegistry, model: StatusModel) -> Self {
        Self {
            registry,
            model,
            manifest: None,
        }
    }

    /// Load a predictor from an artifact directory written by training.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let loaded = load_artifacts(dir)?;
        Ok(Self {
            registry: loaded.registry,
            model: loaded.model,
            manifest: Some(loaded.manifest),
        })
    }

    pub fn registry(&self) -> &EncoderRegistry {
        &self.registry
    }

    pub fn manifest(&self) -> Option<&Manifest> {
        self.manifest.as_ref()
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn predict(&self, record: &FeatureRecord) -> Result<Prediction, PredictError> {
        let vector = assemble(&self.registry, record)?;
        let probability = self.model.predict_proba(vector.as_slice())?;
        let code = label_code(probability)?;
        let status = self.registry.decode_label(code)?;
        Ok(Prediction {
            predicted_status: status.to_string(),
            code,
            probability,
        })
    }

    /// Predict and shape the outcome for the transport layer. Server-side
    /// faults are logged with full detail and reported generically.
    pub fn respond(&self, record: &FeatureRecord) -> PredictionResponse {
        let result = self.predict(record);
        if let Err(err) = &result {
            match err.kind() {
                ErrorKind::Client => log::debug!("Rejected request {:?}: {}", record, err),
                ErrorKind::Server => log::error!("Prediction failed for {:?}: {}", record, err),
            }
        }
        result.into()
    }

    /// Decode a JSON request body and respond to it.
    pub fn respond_json(&self, body: &str) -> PredictionResponse {
        match FeatureRecord::from_json(body) {
            Ok(record) => self.respond(&record),
            Err(err) => {
                log::debug!("Rejected request body: {}", err);
                Err::<Prediction, _>(err).into()
            }
        }
    }

    /// Respond to many independent records in parallel, preserving order.
    pub fn predict_batch(&self, records: &[FeatureRecord]) -> Vec<PredictionResponse> {
        records.par_iter().map(|record| self.respond(record)).collect()
    }
}

impl From<TrainedArtifacts> for Predictor {
    fn from(trained: TrainedArtifacts) -> Self {
        Predictor::new(trained.registry, trained.model)
    }
}
