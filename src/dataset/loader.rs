// src/dataset/loader.rs
//! Recording loaders for NinaPro MAT files and flat CSV exports

use super::Recording;
use crate::config::constants::dataset::{
    EMG_ENTRY, REPETITION_COLUMN, REPETITION_ENTRY, STIMULUS_COLUMN, STIMULUS_ENTRY,
};
use crate::error::{EmgError, EmgErrorBuilder, EmgResult, IntoEmgError, ProcessingStage};
use matfile::{MatFile, NumericData};
use ndarray::{Array1, Array2};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Load a NinaPro subject file from `dir`/`file`
pub fn get_data(dir: impl AsRef<Path>, file: &str) -> EmgResult<Recording> {
    load_mat(dir.as_ref().join(file))
}

/// Load a recording from a MAT (v5) container with `emg`, `restimulus` and `repetition` entries
pub fn load_mat(path: impl AsRef<Path>) -> EmgResult<Recording> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| EmgError::io(path, e))?;
    let mat = MatFile::parse(BufReader::new(file))
        .map_err(|e| EmgError::Dataset(format!("Failed to parse {:?}: {:?}", path, e)))?;

    let (emg_dims, emg_values) = read_entry(&mat, EMG_ENTRY)?;
    let (rows, cols) = match emg_dims.as_slice() {
        [rows, cols] => (*rows, *cols),
        other => {
            return Err(EmgError::Dataset(format!(
                "Entry '{}' must be two-dimensional, found dimensions {:?}",
                EMG_ENTRY, other
            )))
        }
    };

    if emg_values.len() != rows * cols {
        return Err(EmgError::Dataset(format!(
            "Entry '{}' holds {} values for dimensions {}x{}",
            EMG_ENTRY,
            emg_values.len(),
            rows,
            cols
        )));
    }

    // MAT arrays are stored column-major
    let emg = Array2::from_shape_fn((rows, cols), |(r, c)| emg_values[r + c * rows]);

    let stimulus = read_label_entry(&mat, STIMULUS_ENTRY)?;
    let repetition = read_label_entry(&mat, REPETITION_ENTRY)?;

    let recording = Recording::new(emg, stimulus, repetition)?;
    info!(
        path = %path.display(),
        samples = recording.n_samples(),
        channels = recording.n_channels(),
        "Loaded recording"
    );
    Ok(recording)
}

fn read_entry(mat: &MatFile, name: &str) -> EmgResult<(Vec<usize>, Vec<f64>)> {
    let array = mat
        .find_by_name(name)
        .ok_or_else(|| EmgError::Dataset(format!("Missing entry '{}'", name)))?;
    let values = numeric_to_f64(array.data());
    debug!(entry = name, dims = ?array.size(), "Read dataset entry");
    Ok((array.size().to_vec(), values))
}

fn read_label_entry(mat: &MatFile, name: &str) -> EmgResult<Array1<i32>> {
    let (dims, values) = read_entry(mat, name)?;
    let non_singleton = dims.iter().filter(|&&d| d > 1).count();
    if non_singleton > 1 {
        return Err(EmgError::Dataset(format!(
            "Entry '{}' must be a column vector, found dimensions {:?}",
            name, dims
        )));
    }
    Ok(values.into_iter().map(|v| v.round() as i32).collect())
}

fn numeric_to_f64(data: &NumericData) -> Vec<f64> {
    match data {
        NumericData::Int8 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::UInt8 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::Int16 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::UInt16 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::Int32 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::UInt32 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::Int64 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::UInt64 { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::Single { real, .. } => real.iter().map(|&v| v as f64).collect(),
        NumericData::Double { real, .. } => real.clone(),
    }
}

/// Load a recording from CSV with header `0,1,..,N-1,stimulus,repetition`
pub fn load_csv(path: impl AsRef<Path>) -> EmgResult<Recording> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| EmgError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let width = headers.len();
    if width < 3
        || &headers[width - 2] != STIMULUS_COLUMN
        || &headers[width - 1] != REPETITION_COLUMN
    {
        return Err(EmgErrorBuilder::new("loader", "load_csv").invalid_data(
            "csv header",
            &format!(
                "last two columns must be '{}' and '{}'",
                STIMULUS_COLUMN, REPETITION_COLUMN
            ),
        ));
    }
    let channels = width - 2;

    let mut values = Vec::new();
    let mut stimulus = Vec::new();
    let mut repetition = Vec::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        if record.len() != width {
            return Err(EmgErrorBuilder::new("loader", "load_csv").mismatch(
                "csv row",
                &format!("row {} has the wrong number of columns", row_idx + 1),
                width,
                record.len(),
            ));
        }
        for field in record.iter().take(channels) {
            values.push(parse_field::<f64>(field, row_idx)?);
        }
        stimulus.push(parse_label(&record[channels], row_idx)?);
        repetition.push(parse_label(&record[channels + 1], row_idx)?);
    }

    let samples = stimulus.len();
    let emg = Array2::from_shape_vec((samples, channels), values)
        .emg_err(ProcessingStage::Loading, "load_csv")?;

    let recording = Recording::new(emg, Array1::from(stimulus), Array1::from(repetition))?;
    info!(
        path = %path.display(),
        samples = recording.n_samples(),
        channels = recording.n_channels(),
        "Loaded recording"
    );
    Ok(recording)
}

fn parse_field<T: std::str::FromStr>(field: &str, row_idx: usize) -> EmgResult<T>
where
    T::Err: std::fmt::Display,
{
    field.trim().parse::<T>().map_err(|e| {
        EmgErrorBuilder::new("loader", "load_csv").invalid_data(
            "csv field",
            &format!("row {}: '{}' ({})", row_idx + 1, field, e),
        )
    })
}

// Labels exported from float tables look like "3.0"
fn parse_label(field: &str, row_idx: usize) -> EmgResult<i32> {
    match field.trim().parse::<i32>() {
        Ok(v) => Ok(v),
        Err(_) => parse_field::<f64>(field, row_idx).map(|v| v.round() as i32),
    }
}

/// Write a recording as CSV with header `0,1,..,N-1,stimulus,repetition`
pub fn write_csv(recording: &Recording, path: impl AsRef<Path>) -> EmgResult<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<String> = (0..recording.n_channels()).map(|c| c.to_string()).collect();
    header.push(STIMULUS_COLUMN.to_string());
    header.push(REPETITION_COLUMN.to_string());
    writer.write_record(&header)?;

    for (i, row) in recording.emg().rows().into_iter().enumerate() {
        let mut fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        fields.push(recording.stimulus()[i].to_string());
        fields.push(recording.repetition()[i].to_string());
        writer.write_record(&fields)?;
    }

    writer.flush().map_err(|e| EmgError::io(path, e))?;
    debug!(path = %path.display(), rows = recording.n_samples(), "Wrote recording");
    Ok(())
}
