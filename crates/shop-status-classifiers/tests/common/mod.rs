#![allow(dead_code)]

use shop_status_classifiers::config::{DayEncoding, ModelConfig, ModelType, TrainConfig};
use shop_status_classifiers::data_handling::TrainingSample;

pub const SHOP_IDS: [&str; 4] = [
    "67e13cb212a99ad39a2b16ff",
    "67e1b9c512a99ad39a2b1703",
    "67e1b9c512a99ad39a2b1704",
    "682a2c8d4ef9383cda0483ca",
];

pub const DAY_NAMES: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

/// Shops are open 09:00-17:59 on weekdays and closed otherwise.
pub fn status_for(hour: i64, day: usize) -> &'static str {
    if day < 5 && (9..18).contains(&hour) {
        "open"
    } else {
        "closed"
    }
}

pub fn ordinal_samples() -> Vec<TrainingSample> {
    let mut samples = Vec::new();
    for shop in SHOP_IDS {
        for hour in 0..24i64 {
            for day in 0..7usize {
                samples.push(TrainingSample::new(shop, hour, day as i64, status_for(hour, day)));
            }
        }
    }
    samples
}

pub fn named_day_samples() -> Vec<TrainingSample> {
    let mut samples = Vec::new();
    for shop in SHOP_IDS {
        for hour in 0..24i64 {
            for (day, name) in DAY_NAMES.iter().enumerate() {
                samples.push(TrainingSample::new(shop, hour, *name, status_for(hour, day)));
            }
        }
    }
    samples
}

pub fn gbdt_config(day_encoding: DayEncoding) -> TrainConfig {
    TrainConfig {
        model: ModelConfig::new(
            0.3,
            ModelType::GBDT {
                max_depth: 5,
                num_boost_round: 30,
                min_leaf_size: 1,
                training_optimization_level: 2,
            },
        ),
        day_encoding,
    }
}

pub fn forest_config(day_encoding: DayEncoding) -> TrainConfig {
    TrainConfig {
        model: ModelConfig::new(
            0.1,
            ModelType::RandomForest {
                n_estimators: 12,
                max_depth: 6,
                min_leaf_size: 1,
                bootstrap_ratio: 1.0,
                max_features: 3,
                seed: 42,
            },
        ),
        day_encoding,
    }
}
