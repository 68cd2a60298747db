//! Error taxonomy for the inference path.
//!
//! Every failure on the request path is classified as either a client
//! problem (the caller sent something the model cannot represent) or a
//! server problem (the loaded artifacts disagree with each other). The
//! classification drives the response status; nothing is ever converted
//! into a default prediction.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who is at fault for a failed prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    #[serde(rename = "client_error")]
    Client,
    #[serde(rename = "server_error")]
    Server,
}

impl ErrorKind {
    /// HTTP-equivalent status code for this class of failure.
    pub fn http_status(self) -> u16 {
        match self {
            ErrorKind::Client => 400,
            ErrorKind::Server => 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    #[error("Missing required field '{field}'")]
    MissingField { field: &'static str },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Malformed request body: {0}")]
    MalformedRequest(String),

    #[error("Unknown {feature} '{value}'")]
    UnknownCategory { feature: String, value: String },

    #[error("Classifier emitted code {code} outside the trained label vocabulary of size {vocabulary_size}")]
    UnknownCode { code: i64, vocabulary_size: usize },

    #[error("Feature vector has {actual} values, model expects {expected}")]
    InvalidInputShape { expected: usize, actual: usize },

    #[error("Model has not been fitted")]
    NotFitted,
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictError::MissingField { .. }
            | PredictError::InvalidField { .. }
            | PredictError::MalformedRequest(_)
            | PredictError::UnknownCategory { .. } => ErrorKind::Client,
            PredictError::UnknownCode { .. }
            | PredictError::InvalidInputShape { .. }
            | PredictError::NotFitted => ErrorKind::Server,
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Client
    }

    /// Message safe to return to the caller. Server faults are reported
    /// generically; their detail only goes to the log.
    pub fn public_message(&self) -> String {
        match self.kind() {
            ErrorKind::Client => self.to_string(),
            ErrorKind::Server => "internal model error".to_string(),
        }
    }
}
