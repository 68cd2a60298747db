//! Newline-delimited JSON request loop.
//!
//! Each input line is one request body; each output line is the matching
//! `{ "status": .., "body": .. }` envelope. Lines are answered in order
//! and flushed immediately. A line that is not valid UTF-8 is answered
//! as a malformed request; only I/O failures end the loop.
use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use shop_status_classifiers::predictor::{Prediction, PredictionResponse, ResponseEnvelope};
use shop_status_classifiers::{PredictError, Predictor};

/// Serve requests until `input` is exhausted. Returns the number of
/// requests answered.
pub fn serve_lines<R: BufRead, W: Write>(predictor: &Predictor, input: R, mut output: W) -> Result<usize> {
    let mut served = 0usize;
    for raw in input.split(b'\n') {
        let raw = raw.context("Failed to read request line")?;
        let response = match String::from_utf8(raw) {
            Ok(line) if line.trim().is_empty() => continue,
            Ok(line) => predictor.respond_json(&line),
            Err(e) => {
                log::debug!("Rejected request line: {}", e);
                PredictionResponse::from(Err::<Prediction, _>(PredictError::MalformedRequest(
                    format!("request is not valid UTF-8: {}", e.utf8_error()),
                )))
            }
        };
        let envelope = ResponseEnvelope::from(response);
        serde_json::to_writer(&mut output, &envelope).context("Failed to encode response")?;
        output.write_all(b"\n").context("Failed to write response")?;
        output.flush().context("Failed to flush response")?;
        served += 1;
    }
    log::info!("Served {} requests", served);
    Ok(served)
}
