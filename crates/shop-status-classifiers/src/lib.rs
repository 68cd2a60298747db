//! shop-status-classifiers: predict whether a shop is open or closed.
//!
//! The crate covers both halves of the pipeline. Training fits one
//! categorical encoder per categorical input plus one for the status
//! label, then fits a tree classifier on vectors laid out as
//! `(shop_code, hour, day_code)`. Serving loads those artifacts once and
//! runs each request through the same encoders, rejecting any category
//! that was not seen during training.
pub mod artifacts;
pub mod config;
pub mod data_handling;
pub mod encoding;
pub mod error;
pub mod features;
pub mod models;
pub mod predictor;
pub mod stats;
pub mod trainer;

pub use error::{ErrorKind, PredictError};
pub use features::FeatureRecord;
pub use predictor::{PredictionResponse, Predictor};
