// src/processing/rectify.rs
//! Full-wave rectification

use crate::dataset::Recording;
use crate::error::EmgResult;

/// Absolute value of every channel reading; labels untouched
pub fn rectify(recording: &Recording) -> EmgResult<Recording> {
    recording.with_emg(recording.emg().mapv(f64::abs))
}
