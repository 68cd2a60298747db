//! Integration tests for CLI config parsing, util helpers, and the serve loop.

use std::io::Cursor;

use shop_status_classifiers::config::{DayEncoding, ModelType};
use shop_status_classifiers::data_handling::TrainingSample;
use shop_status_classifiers::predictor::{PredictionResponse, ResponseEnvelope};
use shop_status_classifiers::trainer::train;
use shop_status_classifiers::{ErrorKind, Predictor};
use shop_status_cli::serve::serve_lines;
use shop_status_cli::train::input::TrainRunConfig;
use shop_status_cli::train::trainer::run_training;
use shop_status_cli::util::{validate_artifact_dir, validate_tsv_or_csv_file};

fn write_samples(path: &std::path::Path) {
    let mut csv = String::from("shop_id,hour_of_day,day_of_week,status\n");
    for shop in ["67e13cb212a99ad39a2b16ff", "682a2c8d4ef9383cda0483ca"] {
        for hour in 0..24 {
            for day in 0..7 {
                let status = if day < 5 && (9..18).contains(&hour) { "open" } else { "closed" };
                csv.push_str(&format!("{},{},{},{}\n", shop, hour, day, status));
            }
        }
    }
    std::fs::write(path, csv).unwrap();
}

// ---------------------------------------------------------------------------
// validate_tsv_or_csv_file / validate_artifact_dir
// ---------------------------------------------------------------------------

#[test]
fn validate_csv_file_exists() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.csv");
    std::fs::File::create(&path).unwrap();
    assert!(validate_tsv_or_csv_file(&path).is_ok());
}

#[test]
fn validate_wrong_extension_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.txt");
    std::fs::File::create(&path).unwrap();
    assert!(validate_tsv_or_csv_file(&path).is_err());
}

#[test]
fn validate_nonexistent_file_errors() {
    assert!(validate_tsv_or_csv_file("/nonexistent/path/data.tsv").is_err());
}

#[test]
fn artifact_dir_needs_manifest() {
    let dir = tempfile::tempdir().unwrap();
    assert!(validate_artifact_dir(dir.path()).is_err());
    assert!(validate_artifact_dir(dir.path().join("missing")).is_err());
}

// ---------------------------------------------------------------------------
// TrainRunConfig defaults & serialization
// ---------------------------------------------------------------------------

#[test]
fn train_config_default_values() {
    let cfg = TrainRunConfig::default();
    assert!(cfg.train_data.is_empty());
    assert_eq!(cfg.output_dir, "shop_status_model");
    assert_eq!(cfg.training.day_encoding, DayEncoding::Ordinal);
    assert_eq!(cfg.training.model.model_type.name(), "random_forest");
}

#[test]
fn train_config_reads_flattened_json() {
    let json = r#"{
        "train_data": "samples.csv",
        "output_dir": "out",
        "day_encoding": "categorical",
        "model": {"learning_rate": 0.2, "GBDT": {"max_depth": 4, "num_boost_round": 10, "min_leaf_size": 1, "training_optimization_level": 2}}
    }"#;
    let cfg: TrainRunConfig = serde_json::from_str(json).unwrap();
    assert_eq!(cfg.train_data, "samples.csv");
    assert_eq!(cfg.training.day_encoding, DayEncoding::Categorical);
    assert!(matches!(cfg.training.model.model_type, ModelType::GBDT { max_depth: 4, .. }));
}

#[test]
fn train_config_round_trips_json() {
    let cfg = TrainRunConfig::default();
    let json = serde_json::to_string(&cfg).unwrap();
    let cfg2: TrainRunConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(cfg, cfg2);
}

// ---------------------------------------------------------------------------
// Training run and serve loop
// ---------------------------------------------------------------------------

#[test]
fn run_training_writes_loadable_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let data = dir.path().join("samples.csv");
    write_samples(&data);

    let mut cfg = TrainRunConfig::default();
    cfg.train_data = data.to_string_lossy().into_owned();
    cfg.output_dir = dir.path().join("model").to_string_lossy().into_owned();
    cfg.training.model.model_type = "gbdt".parse().unwrap();

    let manifest = run_training(&cfg).unwrap();
    assert_eq!(manifest.report.n_samples, 2 * 24 * 7);
    assert!(validate_artifact_dir(&cfg.output_dir).is_ok());

    let predictor = Predictor::load(&cfg.output_dir).unwrap();
    assert_eq!(predictor.model_name(), "gbdt");
}

fn single_shop_predictor() -> Predictor {
    let mut samples = Vec::new();
    for hour in 0..24 {
        for day in 0..7 {
            let status = if day < 5 && (9..18).contains(&hour) { "open" } else { "closed" };
            samples.push(TrainingSample::new("67e13cb212a99ad39a2b16ff", hour, day, status));
        }
    }
    let mut cfg = shop_status_classifiers::config::TrainConfig::default();
    cfg.model.model_type = "gbdt".parse().unwrap();
    Predictor::from(train(&samples, &cfg).unwrap())
}

fn parse_envelopes(output: Vec<u8>) -> Vec<ResponseEnvelope> {
    String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

#[test]
fn serve_answers_each_line_in_order() {
    let predictor = single_shop_predictor();

    let input = concat!(
        r#"{"shop_id": "67e13cb212a99ad39a2b16ff", "hour": 10, "day_of_week": 2}"#,
        "\n\n",
        r#"{"shop_id": "nonexistent-shop", "hour": 10, "day_of_week": 2}"#,
        "\n",
        r#"{"shop_id": "67e13cb212a99ad39a2b16ff", "day_of_week": 2}"#,
        "\n",
    );
    let mut output = Vec::new();
    let served = serve_lines(&predictor, Cursor::new(input), &mut output).unwrap();
    assert_eq!(served, 3);

    let responses = parse_envelopes(output);
    assert_eq!(
        responses.iter().map(|r| r.status).collect::<Vec<_>>(),
        vec![200, 400, 400]
    );
}

#[test]
fn serve_rejects_invalid_utf8_line_and_continues() {
    let predictor = single_shop_predictor();

    let mut input: Vec<u8> = Vec::new();
    input.extend_from_slice(br#"{"shop_id": "67e13cb212a99ad39a2b16ff", "hour": ""#);
    input.push(0xff);
    input.extend_from_slice(b"\", \"day_of_week\": 2}\n");
    input.extend_from_slice(br#"{"shop_id": "67e13cb212a99ad39a2b16ff", "hour": 10, "day_of_week": 2}"#);
    input.push(b'\n');

    let mut output = Vec::new();
    let served = serve_lines(&predictor, Cursor::new(input), &mut output).unwrap();
    assert_eq!(served, 2);

    let responses = parse_envelopes(output);
    assert_eq!(responses[0].status, 400);
    match &responses[0].body {
        PredictionResponse::Failure { error, kind } => {
            assert_eq!(*kind, ErrorKind::Client);
            assert!(error.contains("not valid UTF-8"), "unexpected error: {}", error);
        }
        other => panic!("expected a failure, got {:?}", other),
    }
    assert_eq!(responses[1].status, 200);
    assert_eq!(
        responses[1].body,
        PredictionResponse::Success {
            predicted_status: "open".to_string()
        }
    );
}
