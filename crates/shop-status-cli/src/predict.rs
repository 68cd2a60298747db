use anyhow::{bail, Result};
use clap::ArgMatches;

use shop_status_classifiers::features::{FeatureRecord, FieldValue};
use shop_status_classifiers::predictor::ResponseEnvelope;
use shop_status_classifiers::Predictor;

/// Parse a numeric argument as an integer field, anything else as text.
fn field_from_arg(raw: &str) -> FieldValue {
    match raw.trim().parse::<i64>() {
        Ok(v) => FieldValue::Integer(v),
        Err(_) => FieldValue::Text(raw.to_string()),
    }
}

/// Build the request body from either `--request` JSON or the individual field
/// flags. Absent flags stay absent so the predictor reports them.
pub fn request_from_arguments(matches: &ArgMatches) -> Result<String> {
    let request = matches.get_one::<String>("request");
    let has_fields = ["shop_id", "hour", "day_of_week"]
        .iter()
        .any(|name| matches.get_one::<String>(name).is_some());
    if request.is_some() && has_fields {
        bail!("--request cannot be combined with --shop-id, --hour or --day");
    }
    if let Some(body) = request {
        return Ok(body.clone());
    }
    let record = FeatureRecord {
        shop_id: matches.get_one::<String>("shop_id").cloned(),
        hour: matches.get_one::<String>("hour").map(|s| field_from_arg(s)),
        day_of_week: matches.get_one::<String>("day_of_week").map(|s| field_from_arg(s)),
    };
    Ok(serde_json::to_string(&record)?)
}

/// Answer a single request body.
pub fn predict_one(predictor: &Predictor, body: &str) -> ResponseEnvelope {
    ResponseEnvelope::from(predictor.respond_json(body))
}
