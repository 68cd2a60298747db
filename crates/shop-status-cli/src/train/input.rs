use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::ArgMatches;
use serde::{Deserialize, Serialize};

use shop_status_classifiers::config::{DayEncoding, ModelType, TrainConfig};

use crate::util::validate_tsv_or_csv_file;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TrainRunConfig {
    pub train_data: String,
    pub output_dir: String,
    #[serde(flatten)]
    pub training: TrainConfig,
}

impl Default for TrainRunConfig {
    fn default() -> Self {
        TrainRunConfig {
            train_data: String::new(),
            output_dir: String::from("shop_status_model"),
            training: TrainConfig::default(),
        }
    }
}

impl TrainRunConfig {
    /// Read the JSON config (when given) and apply CLI overrides on top.
    pub fn from_arguments(config_path: Option<&PathBuf>, matches: &ArgMatches) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => {
                let config_json = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                serde_json::from_str(&config_json)
                    .with_context(|| format!("Failed to parse config file: {:?}", path))?
            }
            None => {
                log::info!("No config provided; using defaults.");
                TrainRunConfig::default()
            }
        };

        if let Some(train_data) = matches.get_one::<String>("train_data") {
            config.train_data = train_data.clone();
        }
        validate_tsv_or_csv_file(&config.train_data)?;

        if let Some(output_dir) = matches.get_one::<String>("output_dir") {
            config.output_dir = output_dir.clone();
        }

        if let Some(model_type) = matches.get_one::<String>("model_type") {
            config.training.model.model_type =
                ModelType::from_str(model_type).map_err(anyhow::Error::msg)?;
        }

        if let Some(day_encoding) = matches.get_one::<String>("day_encoding") {
            config.training.day_encoding =
                DayEncoding::from_str(day_encoding).map_err(anyhow::Error::msg)?;
        }

        Ok(config)
    }
}
