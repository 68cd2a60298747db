//! Training samples and the encoded training set.
use std::path::Path;

use anyhow::{anyhow, ensure, Context, Result};
use serde::Deserialize;

use crate::config::DayEncoding;
use crate::encoding::{CategoryEncoder, EncoderRegistry};
use crate::features::{assemble, day_category, FeatureRecord, FeatureVector, FieldValue};

/// One labelled observation of a shop's status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSample {
    pub shop_id: String,
    pub hour: FieldValue,
    pub day_of_week: FieldValue,
    pub status: String,
}

impl TrainingSample {
    pub fn new(shop_id: &str, hour: impl Into<FieldValue>, day_of_week: impl Into<FieldValue>, status: &str) -> Self {
        Self {
            shop_id: shop_id.to_string(),
            hour: hour.into(),
            day_of_week: day_of_week.into(),
            status: status.to_string(),
        }
    }

    fn record(&self) -> FeatureRecord {
        FeatureRecord {
            shop_id: Some(self.shop_id.clone()),
            hour: Some(self.hour.clone()),
            day_of_week: Some(self.day_of_week.clone()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SampleRow {
    shop_id: String,
    #[serde(alias = "hour")]
    hour_of_day: String,
    day_of_week: String,
    status: String,
}

/// Read labelled samples from a CSV or TSV file with the columns
/// `shop_id`, `hour_of_day` (or `hour`), `day_of_week` and `status`.
pub fn read_training_samples<P: AsRef<Path>>(path: P) -> Result<Vec<TrainingSample>> {
    let path = path.as_ref();
    let delimiter = match path.extension().and_then(|s| s.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => b'\t',
        _ => b',',
    };

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open training data: {}", path.display()))?;

    let mut samples = Vec::new();
    for (row_idx, result) in reader.deserialize::<SampleRow>().enumerate() {
        let row = result.with_context(|| format!("Failed to read row {}", row_idx + 1))?;
        samples.push(TrainingSample {
            shop_id: row.shop_id,
            hour: FieldValue::Text(row.hour_of_day),
            day_of_week: FieldValue::Text(row.day_of_week),
            status: row.status,
        });
    }
    log::info!("Loaded {} training samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Encoders fitted on a sample set together with the encoded rows.
#[derive(Debug, Clone)]
pub struct TrainingSet {
    pub registry: EncoderRegistry,
    pub x: Vec<FeatureVector>,
    pub y: Vec<usize>,
}

impl TrainingSet {
    /// Fit every encoder on the samples and encode them. Rows are encoded
    /// through the same `assemble` used at serving time.
    pub fn build(samples: &[TrainingSample], day_encoding: DayEncoding) -> Result<Self> {
        ensure!(!samples.is_empty(), "No training samples provided");

        if let Some(idx) = samples.iter().position(|s| s.shop_id.trim().is_empty()) {
            return Err(anyhow!("Empty shop_id at row {}", idx + 1));
        }

        let shop = CategoryEncoder::fit(samples.iter().map(|s| s.shop_id.as_str()));
        let day = match day_encoding {
            DayEncoding::Ordinal => None,
            DayEncoding::Categorical => Some(CategoryEncoder::fit(
                samples.iter().map(|s| day_category(&s.day_of_week)),
            )),
        };
        let label = CategoryEncoder::fit(samples.iter().map(|s| s.status.trim()));
        ensure!(
            label.len() == 2,
            "Status must have exactly two classes, found {:?}",
            label.classes()
        );

        let registry = EncoderRegistry::new(shop, day, label);

        let mut x = Vec::with_capacity(samples.len());
        let mut y = Vec::with_capacity(samples.len());
        for (idx, sample) in samples.iter().enumerate() {
            let row = assemble(&registry, &sample.record())
                .map_err(|e| anyhow!("Invalid training row {}: {}", idx + 1, e))?;
            let code = registry
                .encode_label(sample.status.trim())
                .map_err(|e| anyhow!("Invalid training row {}: {}", idx + 1, e))?;
            x.push(row);
            y.push(code);
        }

        log::debug!(
            "Encoded {} rows: {} shops, status classes {:?}",
            x.len(),
            registry.shop_encoder().len(),
            registry.label_encoder().classes()
        );

        Ok(Self { registry, x, y })
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
