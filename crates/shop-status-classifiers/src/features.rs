//! Request records and feature-vector assembly.
//!
//! The vector layout is `(shop_code, hour, day_code)`. Training and
//! serving both go through the same coercion helpers in this module so
//! the two sides cannot drift apart.

use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DayEncoding;
use crate::encoding::{EncoderRegistry, Feature};
use crate::error::PredictError;

/// Column order of every feature vector, recorded in the artifact manifest.
pub const FEATURE_ORDER: [&str; 3] = ["shop_id", "hour", "day_of_week"];
pub const FEATURE_COUNT: usize = FEATURE_ORDER.len();

/// A scalar request field that may arrive as a number or as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl FieldValue {
    fn text_form(&self) -> String {
        match self {
            FieldValue::Integer(v) => v.to_string(),
            FieldValue::Text(s) => s.trim().to_string(),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Integer(v.into())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

/// One inference request as decoded from the request body. Fields stay
/// optional here; `assemble` enforces that all of them are present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(default)]
    pub shop_id: Option<String>,
    #[serde(default)]
    pub hour: Option<FieldValue>,
    #[serde(default)]
    pub day_of_week: Option<FieldValue>,
}

impl FeatureRecord {
    pub fn new(shop_id: &str, hour: impl Into<FieldValue>, day_of_week: impl Into<FieldValue>) -> Self {
        Self {
            shop_id: Some(shop_id.to_string()),
            hour: Some(hour.into()),
            day_of_week: Some(day_of_week.into()),
        }
    }

    /// Decode a JSON request body. Absent and `null` fields become `None`;
    /// fields of the wrong JSON type are rejected with the field name.
    pub fn from_json(body: &str) -> Result<Self, PredictError> {
        let value: Value =
            serde_json::from_str(body).map_err(|e| PredictError::MalformedRequest(e.to_string()))?;
        let object = value
            .as_object()
            .ok_or_else(|| PredictError::MalformedRequest("expected a JSON object".to_string()))?;

        let shop_id = match object.get("shop_id") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => {
                return Err(PredictError::InvalidField {
                    field: "shop_id",
                    reason: format!("expected a string, got {}", other),
                })
            }
        };

        Ok(Self {
            shop_id,
            hour: scalar_field(object.get("hour"), "hour")?,
            day_of_week: scalar_field(object.get("day_of_week"), "day_of_week")?,
        })
    }
}

fn scalar_field(value: Option<&Value>, field: &'static str) -> Result<Option<FieldValue>, PredictError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(FieldValue::Text(s.clone()))),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(FieldValue::Integer(i)));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
                    Ok(Some(FieldValue::Integer(f as i64)))
                }
                _ => Err(PredictError::InvalidField {
                    field,
                    reason: format!("expected an integer, got {}", n),
                }),
            }
        }
        Some(other) => Err(PredictError::InvalidField {
            field,
            reason: format!("expected an integer or string, got {}", other),
        }),
    }
}

/// Fixed-width numeric input to the classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f32; FEATURE_COUNT]);

impl FeatureVector {
    pub fn new(shop_code: usize, hour: u8, day_code: usize) -> Self {
        FeatureVector([shop_code as f32, hour as f32, day_code as f32])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }

    /// Copy with every column outside `keep` zeroed.
    pub fn masked(&self, keep: &[usize]) -> FeatureVector {
        let mut values = [0.0f32; FEATURE_COUNT];
        for &column in keep {
            if let Some(v) = values.get_mut(column) {
                *v = self.0[column];
            }
        }
        FeatureVector(values)
    }
}

/// Coerce an hour of day from an integer or numeric string.
pub fn resolve_hour(value: &FieldValue) -> Result<u8, PredictError> {
    let hour = match value {
        FieldValue::Integer(v) => *v,
        FieldValue::Text(s) => s.trim().parse::<i64>().map_err(|_| PredictError::InvalidField {
            field: "hour",
            reason: format!("'{}' is not an integer", s),
        })?,
    };
    if !(0..=23).contains(&hour) {
        return Err(PredictError::InvalidField {
            field: "hour",
            reason: format!("{} is outside 0..=23", hour),
        });
    }
    Ok(hour as u8)
}

/// Convert a day value to its Monday-based ordinal (Monday = 0).
pub fn resolve_day_ordinal(value: &FieldValue) -> Result<u8, PredictError> {
    let day = match value {
        FieldValue::Integer(v) => *v,
        FieldValue::Text(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(v) => v,
                Err(_) => {
                    let weekday = Weekday::from_str(s).map_err(|_| PredictError::InvalidField {
                        field: "day_of_week",
                        reason: format!("'{}' is neither an integer nor a weekday name", s),
                    })?;
                    weekday.num_days_from_monday() as i64
                }
            }
        }
    };
    if !(0..=6).contains(&day) {
        return Err(PredictError::InvalidField {
            field: "day_of_week",
            reason: format!("{} is outside 0..=6", day),
        });
    }
    Ok(day as u8)
}

/// The vocabulary key a day value is looked up by in categorical mode.
pub fn day_category(value: &FieldValue) -> String {
    value.text_form()
}

fn resolve_day(registry: &EncoderRegistry, value: &FieldValue) -> Result<usize, PredictError> {
    match registry.day_encoding() {
        DayEncoding::Ordinal => resolve_day_ordinal(value).map(usize::from),
        DayEncoding::Categorical => registry.encode(Feature::DayOfWeek, &day_category(value)),
    }
}

/// Build the classifier input for one record.
///
/// Presence of every field is checked before anything is encoded, so a
/// missing field is always reported as such even if another field holds
/// an unknown category.
pub fn assemble(registry: &EncoderRegistry, record: &FeatureRecord) -> Result<FeatureVector, PredictError> {
    let shop_id = record
        .shop_id
        .as_deref()
        .filter(|s| !s.is_empty())
        .ok_or(PredictError::MissingField { field: "shop_id" })?;
    let hour = record
        .hour
        .as_ref()
        .ok_or(PredictError::MissingField { field: "hour" })?;
    let day = record
        .day_of_week
        .as_ref()
        .ok_or(PredictError::MissingField { field: "day_of_week" })?;

    let hour = resolve_hour(hour)?;
    let day_code = resolve_day(registry, day)?;
    let shop_code = registry.encode(Feature::ShopId, shop_id)?;

    Ok(FeatureVector::new(shop_code, hour, day_code))
}
