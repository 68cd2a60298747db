use anyhow::Result;

use shop_status_classifiers::artifacts::{save_artifacts, Manifest};
use shop_status_classifiers::data_handling::read_training_samples;
use shop_status_classifiers::trainer::train;

use super::input::TrainRunConfig;

pub fn run_training(config: &TrainRunConfig) -> Result<Manifest> {
    let samples = read_training_samples(&config.train_data)?;
    let trained = train(&samples, &config.training)?;
    for (status, count) in &trained.report.class_counts {
        log::info!("  {}: {} samples", status, count);
    }
    save_artifacts(&config.output_dir, &trained)
}
