//! End-to-end inference behaviour on a freshly trained pipeline.

mod common;

use std::sync::Arc;
use std::thread;

use shop_status_classifiers::config::DayEncoding;
use shop_status_classifiers::encoding::Feature;
use shop_status_classifiers::features::{FeatureRecord, FieldValue};
use shop_status_classifiers::trainer::train;
use shop_status_classifiers::{ErrorKind, PredictError, PredictionResponse, Predictor};

use common::*;

fn gbdt_predictor() -> Predictor {
    let trained = train(&ordinal_samples(), &gbdt_config(DayEncoding::Ordinal)).unwrap();
    Predictor::from(trained)
}

// ---------------------------------------------------------------------------
// Encoder registry
// ---------------------------------------------------------------------------

#[test]
fn known_shops_encode_deterministically() {
    let predictor = gbdt_predictor();
    let registry = predictor.registry();
    for shop in SHOP_IDS {
        let first = registry.encode(Feature::ShopId, shop).unwrap();
        let second = registry.encode(Feature::ShopId, shop).unwrap();
        assert_eq!(first, second);
        assert_eq!(registry.shop_encoder().decode(first), Some(shop));
    }
}

#[test]
fn label_round_trips() {
    let predictor = gbdt_predictor();
    let registry = predictor.registry();
    for label in ["open", "closed"] {
        let code = registry.encode_label(label).unwrap();
        assert_eq!(registry.decode_label(code).unwrap(), label);
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn known_shop_gets_a_status() {
    let predictor = gbdt_predictor();
    let record = FeatureRecord::new("67e13cb212a99ad39a2b16ff", 10, 2);
    let response = predictor.respond(&record);
    assert_eq!(response.http_status(), 200);
    match response {
        PredictionResponse::Success { predicted_status } => {
            assert!(predicted_status == "open" || predicted_status == "closed");
            assert_eq!(predicted_status, "open");
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[test]
fn learns_closed_hours() {
    let predictor = gbdt_predictor();
    let prediction = predictor
        .predict(&FeatureRecord::new("67e1b9c512a99ad39a2b1703", 3, 5))
        .unwrap();
    assert_eq!(prediction.predicted_status, "closed");
}

#[test]
fn unknown_shop_is_a_client_error() {
    let predictor = gbdt_predictor();
    let record = FeatureRecord::new("nonexistent-shop", 10, 2);

    let err = predictor.predict(&record).unwrap_err();
    assert!(matches!(err, PredictError::UnknownCategory { ref value, .. } if value == "nonexistent-shop"));
    assert_eq!(err.kind(), ErrorKind::Client);

    let response = predictor.respond(&record);
    assert_eq!(response.http_status(), 400);
    assert!(!response.is_success());
}

#[test]
fn missing_hour_is_reported_before_encoding() {
    let predictor = gbdt_predictor();
    let record = FeatureRecord {
        shop_id: Some("nonexistent-shop".to_string()),
        hour: None,
        day_of_week: Some(FieldValue::Integer(2)),
    };
    let err = predictor.predict(&record).unwrap_err();
    assert_eq!(err, PredictError::MissingField { field: "hour" });
}

#[test]
fn json_bodies_are_validated() {
    let predictor = gbdt_predictor();

    let ok = predictor.respond_json(r#"{"shop_id": "67e13cb212a99ad39a2b16ff", "hour": "10", "day_of_week": 2}"#);
    assert_eq!(ok.http_status(), 200);

    let missing = predictor.respond_json(r#"{"shop_id": "67e13cb212a99ad39a2b16ff", "day_of_week": 2}"#);
    assert_eq!(
        missing,
        PredictionResponse::Failure {
            error: "Missing required field 'hour'".to_string(),
            kind: ErrorKind::Client,
        }
    );

    let wrong_type = predictor.respond_json(r#"{"shop_id": "67e13cb212a99ad39a2b16ff", "hour": true, "day_of_week": 2}"#);
    assert_eq!(wrong_type.http_status(), 400);

    let garbage = predictor.respond_json("not json");
    assert_eq!(garbage.http_status(), 400);
}

#[test]
fn identical_inputs_give_identical_outputs() {
    let predictor = gbdt_predictor();
    let record = FeatureRecord::new("682a2c8d4ef9383cda0483ca", 14, 4);
    let first = predictor.predict(&record).unwrap();
    for _ in 0..20 {
        assert_eq!(predictor.predict(&record).unwrap(), first);
    }
}

#[test]
fn concurrent_requests_agree() {
    let predictor = Arc::new(gbdt_predictor());
    let record = FeatureRecord::new("67e13cb212a99ad39a2b16ff", 10, 2);
    let expected = predictor.respond(&record);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let predictor = Arc::clone(&predictor);
            let record = record.clone();
            thread::spawn(move || (0..50).map(|_| predictor.respond(&record)).collect::<Vec<_>>())
        })
        .collect();

    for handle in handles {
        for response in handle.join().unwrap() {
            assert_eq!(response, expected);
        }
    }
}

#[test]
fn batch_preserves_order() {
    let predictor = gbdt_predictor();
    let records = vec![
        FeatureRecord::new("67e13cb212a99ad39a2b16ff", 10, 2),
        FeatureRecord::new("nonexistent-shop", 10, 2),
        FeatureRecord::new("67e13cb212a99ad39a2b16ff", 2, 6),
    ];
    let responses = predictor.predict_batch(&records);
    assert_eq!(responses.len(), 3);
    for (record, response) in records.iter().zip(&responses) {
        assert_eq!(&predictor.respond(record), response);
    }
    assert_eq!(responses[1].http_status(), 400);
}

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

#[test]
fn forest_with_categorical_days() {
    let trained = train(&named_day_samples(), &forest_config(DayEncoding::Categorical)).unwrap();
    assert_eq!(trained.report.model_name, "random_forest");
    assert!(trained.report.training_accuracy > 0.85);
    let predictor = Predictor::from(trained);

    let open = predictor
        .predict(&FeatureRecord::new("67e13cb212a99ad39a2b16ff", 12, "Wednesday"))
        .unwrap();
    assert_eq!(open.predicted_status, "open");

    let err = predictor
        .predict(&FeatureRecord::new("67e13cb212a99ad39a2b16ff", 12, "Someday"))
        .unwrap_err();
    assert!(matches!(err, PredictError::UnknownCategory { ref feature, .. } if feature == "day_of_week"));
}

#[test]
fn ordinal_mode_accepts_weekday_names() {
    let predictor = gbdt_predictor();
    let by_name = predictor
        .predict(&FeatureRecord::new("67e13cb212a99ad39a2b16ff", 11, "Wednesday"))
        .unwrap();
    let by_index = predictor
        .predict(&FeatureRecord::new("67e13cb212a99ad39a2b16ff", 11, 2))
        .unwrap();
    assert_eq!(by_name, by_index);

    let err = predictor
        .predict(&FeatureRecord::new("67e13cb212a99ad39a2b16ff", 11, 9))
        .unwrap_err();
    assert!(matches!(err, PredictError::InvalidField { field: "day_of_week", .. }));
}
