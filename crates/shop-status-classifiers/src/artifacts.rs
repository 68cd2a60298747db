//! On-disk artifact store.
//!
//! A trained pipeline is a directory of JSON files:
//!
//! - `manifest.json`: format version, feature order, day encoding, training summary
//! - `model.json`: the fitted classifier
//! - `shop_encoder.json`, `status_encoder.json`
//! - `day_encoder.json`: only when days are categorical
//!
//! Only training writes here. Serving loads the directory once and
//! rejects it if the pieces disagree. Each encoder file must match the
//! size and fingerprint the manifest recorded for it, so a vocabulary
//! copied in from another training run never loads.

use std::fs;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::DayEncoding;
use crate::encoding::{CategoryEncoder, EncoderRegistry};
use crate::features::FEATURE_ORDER;
use crate::models::classifier_trait::ClassifierModel;
use crate::models::factory::StatusModel;
use crate::trainer::{TrainedArtifacts, TrainingReport};

pub const FORMAT_VERSION: u32 = 2;

const MANIFEST_FILE: &str = "manifest.json";
const MODEL_FILE: &str = "model.json";
const SHOP_ENCODER_FILE: &str = "shop_encoder.json";
const DAY_ENCODER_FILE: &str = "day_encoder.json";
const STATUS_ENCODER_FILE: &str = "status_encoder.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: u32,
    pub feature_order: Vec<String>,
    pub day_encoding: DayEncoding,
    pub trained_at: DateTime<Utc>,
    pub encoders: Vec<EncoderDigest>,
    pub report: TrainingReport,
}

/// Identity of one saved encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderDigest {
    pub name: String,
    pub size: usize,
    pub fingerprint: String,
}

impl EncoderDigest {
    fn of(name: &str, encoder: &CategoryEncoder) -> Self {
        Self {
            name: name.to_string(),
            size: encoder.len(),
            fingerprint: encoder.fingerprint(),
        }
    }
}

/// Everything loaded from an artifact directory.
pub struct LoadedArtifacts {
    pub manifest: Manifest,
    pub registry: EncoderRegistry,
    pub model: StatusModel,
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to move {} into place", path.display()))?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read artifact: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse artifact: {}", path.display()))
}

/// Write a trained pipeline to `dir`, creating it if needed. The manifest
/// is written last so a partially written directory never loads.
pub fn save_artifacts<P: AsRef<Path>>(dir: P, trained: &TrainedArtifacts) -> Result<Manifest> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    let stale_manifest = dir.join(MANIFEST_FILE);
    if stale_manifest.exists() {
        fs::remove_file(&stale_manifest)
            .with_context(|| format!("Failed to remove {}", stale_manifest.display()))?;
    }

    write_json(&dir.join(MODEL_FILE), &trained.model)?;
    write_json(&dir.join(SHOP_ENCODER_FILE), trained.registry.shop_encoder())?;
    write_json(&dir.join(STATUS_ENCODER_FILE), trained.registry.label_encoder())?;

    let day_path = dir.join(DAY_ENCODER_FILE);
    match trained.registry.day_encoder() {
        Some(day) => write_json(&day_path, day)?,
        None if day_path.exists() => fs::remove_file(&day_path)
            .with_context(|| format!("Failed to remove {}", day_path.display()))?,
        None => {}
    }

    let manifest = Manifest {
        format_version: FORMAT_VERSION,
        feature_order: FEATURE_ORDER.iter().map(|s| s.to_string()).collect(),
        day_encoding: trained.registry.day_encoding(),
        trained_at: Utc::now(),
        encoders: trained
            .registry
            .named_encoders()
            .into_iter()
            .map(|(name, encoder)| EncoderDigest::of(name, encoder))
            .collect(),
        report: trained.report.clone(),
    };
    write_json(&dir.join(MANIFEST_FILE), &manifest)?;

    log::info!(
        "Saved {} artifacts to {}",
        manifest.report.model_name,
        dir.display()
    );
    Ok(manifest)
}

/// Load and cross-check a trained pipeline.
pub fn load_artifacts<P: AsRef<Path>>(dir: P) -> Result<LoadedArtifacts> {
    let dir = dir.as_ref();
    let manifest: Manifest = read_json(&dir.join(MANIFEST_FILE))?;

    ensure!(
        manifest.format_version == FORMAT_VERSION,
        "Unsupported artifact format version {} (expected {})",
        manifest.format_version,
        FORMAT_VERSION
    );
    if manifest.feature_order != FEATURE_ORDER {
        bail!(
            "Artifact feature order {:?} does not match serving order {:?}",
            manifest.feature_order,
            FEATURE_ORDER
        );
    }

    let shop: CategoryEncoder = read_json(&dir.join(SHOP_ENCODER_FILE))?;
    let label: CategoryEncoder = read_json(&dir.join(STATUS_ENCODER_FILE))?;
    ensure!(
        label.len() == 2,
        "Status encoder must have two classes, found {:?}",
        label.classes()
    );

    let day_path = dir.join(DAY_ENCODER_FILE);
    let day = match manifest.day_encoding {
        DayEncoding::Categorical => Some(read_json::<CategoryEncoder>(&day_path)?),
        DayEncoding::Ordinal => {
            ensure!(
                !day_path.exists(),
                "Found {} but the manifest declares ordinal days",
                DAY_ENCODER_FILE
            );
            None
        }
    };

    let registry = EncoderRegistry::new(shop, day, label);
    check_encoders(&manifest, &registry)?;

    let model: StatusModel = read_json(&dir.join(MODEL_FILE))?;
    ensure!(
        model.name() == manifest.report.model_name,
        "Model file holds '{}' but the manifest declares '{}'",
        model.name(),
        manifest.report.model_name
    );

    log::info!(
        "Loaded {} model trained at {} ({} shops)",
        manifest.report.model_name,
        manifest.trained_at.to_rfc3339(),
        registry.shop_encoder().len()
    );

    Ok(LoadedArtifacts {
        manifest,
        registry,
        model,
    })
}

/// Compare the loaded encoders with what the manifest recorded at save time.
fn check_encoders(manifest: &Manifest, registry: &EncoderRegistry) -> Result<()> {
    let loaded: Vec<EncoderDigest> = registry
        .named_encoders()
        .into_iter()
        .map(|(name, encoder)| EncoderDigest::of(name, encoder))
        .collect();

    let recorded: Vec<&str> = manifest.encoders.iter().map(|d| d.name.as_str()).collect();
    let present: Vec<&str> = loaded.iter().map(|d| d.name.as_str()).collect();
    ensure!(
        recorded == present,
        "Manifest records encoders {:?} but the directory holds {:?}",
        recorded,
        present
    );

    for (expected, actual) in manifest.encoders.iter().zip(&loaded) {
        ensure!(
            expected.size == actual.size,
            "Encoder '{}' has {} classes but the manifest records {}",
            actual.name,
            actual.size,
            expected.size
        );
        ensure!(
            expected.fingerprint == actual.fingerprint,
            "Encoder '{}' was not fitted by the training run that wrote this manifest",
            actual.name
        );
    }

    ensure!(
        registry.shop_encoder().len() == manifest.report.n_shops,
        "Shop encoder has {} shops but the training report counted {}",
        registry.shop_encoder().len(),
        manifest.report.n_shops
    );
    let reported: Vec<&str> = manifest
        .report
        .class_counts
        .iter()
        .map(|(status, _)| status.as_str())
        .collect();
    ensure!(
        registry.label_encoder().classes() == reported.as_slice(),
        "Status encoder classes {:?} differ from the trained classes {:?}",
        registry.label_encoder().classes(),
        reported
    );
    Ok(())
}
