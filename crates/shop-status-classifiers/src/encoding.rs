//! Categorical encoders fitted at training time and loaded read-only at
//! serving time.
//!
//! A `CategoryEncoder` is a bijection between a sorted vocabulary of
//! strings and the dense codes `0..len`. The `EncoderRegistry` owns one
//! encoder per categorical input plus the encoder for the status label.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::config::DayEncoding;
use crate::error::PredictError;

/// Categorical inputs known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    ShopId,
    DayOfWeek,
}

impl Feature {
    pub fn as_str(self) -> &'static str {
        match self {
            Feature::ShopId => "shop_id",
            Feature::DayOfWeek => "day_of_week",
        }
    }
}

/// Name used for the label encoder in errors and logs.
pub const LABEL_NAME: &str = "status";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "EncoderRepr", into = "EncoderRepr")]
pub struct CategoryEncoder {
    classes: Vec<String>,
    index: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct EncoderRepr {
    classes: Vec<String>,
}

impl TryFrom<EncoderRepr> for CategoryEncoder {
    type Error = String;

    fn try_from(repr: EncoderRepr) -> Result<Self, Self::Error> {
        if repr.classes.is_empty() {
            return Err("encoder vocabulary is empty".to_string());
        }
        let mut index = HashMap::with_capacity(repr.classes.len());
        for (code, class) in repr.classes.iter().enumerate() {
            if index.insert(class.clone(), code).is_some() {
                return Err(format!("duplicate class '{}' in encoder vocabulary", class));
            }
        }
        Ok(Self {
            classes: repr.classes,
            index,
        })
    }
}

impl From<CategoryEncoder> for EncoderRepr {
    fn from(encoder: CategoryEncoder) -> Self {
        EncoderRepr {
            classes: encoder.classes,
        }
    }
}

impl CategoryEncoder {
    /// Fit an encoder from observed values. The vocabulary is sorted, so
    /// the codes depend only on the set of values, not their order.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        let classes: Vec<String> = vocabulary.into_iter().collect();
        let index = classes
            .iter()
            .enumerate()
            .map(|(code, class)| (class.clone(), code))
            .collect();
        Self { classes, index }
    }

    pub fn encode(&self, value: &str) -> Option<usize> {
        self.index.get(value).copied()
    }

    pub fn decode(&self, code: usize) -> Option<&str> {
        self.classes.get(code).map(String::as_str)
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// SHA-256 over the ordered vocabulary. Two encoders share a
    /// fingerprint only if they assign every class the same code.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for class in &self.classes {
            hasher.update((class.len() as u64).to_le_bytes());
            hasher.update(class.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }
}

/// All encoders of a trained pipeline. Built once by training and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderRegistry {
    shop: CategoryEncoder,
    day: Option<CategoryEncoder>,
    label: CategoryEncoder,
}

impl EncoderRegistry {
    /// `day` is present only when the day of week is treated as a
    /// category rather than an ordinal.
    pub fn new(shop: CategoryEncoder, day: Option<CategoryEncoder>, label: CategoryEncoder) -> Self {
        Self { shop, day, label }
    }

    pub fn encoder(&self, feature: Feature) -> Option<&CategoryEncoder> {
        match feature {
            Feature::ShopId => Some(&self.shop),
            Feature::DayOfWeek => self.day.as_ref(),
        }
    }

    pub fn shop_encoder(&self) -> &CategoryEncoder {
        &self.shop
    }

    pub fn day_encoder(&self) -> Option<&CategoryEncoder> {
        self.day.as_ref()
    }

    pub fn label_encoder(&self) -> &CategoryEncoder {
        &self.label
    }

    pub fn day_encoding(&self) -> DayEncoding {
        match self.day {
            Some(_) => DayEncoding::Categorical,
            None => DayEncoding::Ordinal,
        }
    }

    /// Encode a categorical value. Values outside the trained vocabulary
    /// are rejected; there is no fallback code.
    pub fn encode(&self, feature: Feature, value: &str) -> Result<usize, PredictError> {
        let unknown = || PredictError::UnknownCategory {
            feature: feature.as_str().to_string(),
            value: value.to_string(),
        };
        self.encoder(feature)
            .ok_or_else(unknown)?
            .encode(value)
            .ok_or_else(unknown)
    }

    pub fn encode_label(&self, label: &str) -> Result<usize, PredictError> {
        self.label
            .encode(label)
            .ok_or_else(|| PredictError::UnknownCategory {
                feature: LABEL_NAME.to_string(),
                value: label.to_string(),
            })
    }

    pub fn decode_label(&self, code: usize) -> Result<&str, PredictError> {
        self.label.decode(code).ok_or(PredictError::UnknownCode {
            code: code as i64,
            vocabulary_size: self.label.len(),
        })
    }

    /// Every encoder held, keyed by the name it is recorded under in the
    /// artifact manifest. The day encoder is listed only when present.
    pub fn named_encoders(&self) -> Vec<(&'static str, &CategoryEncoder)> {
        let mut encoders = vec![(Feature::ShopId.as_str(), &self.shop)];
        if let Some(day) = &self.day {
            encoders.push((Feature::DayOfWeek.as_str(), day));
        }
        encoders.push((LABEL_NAME, &self.label));
        encoders
    }
}
