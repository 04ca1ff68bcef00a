// src/processing/windowing.rs
//! Segmentation of recordings into fixed-length labelled windows

use crate::dataset::Recording;
use crate::error::{EmgError, EmgErrorBuilder, EmgResult, ProcessingStage};
use ndarray::{s, Array1, Array3, ArrayView2, Axis};
use tracing::{debug, warn};

/// Windows cut from one recording
///
/// `windows` is windows × win_len × channels. Each window carries the gesture label and
/// repetition of its last sample.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSet {
    pub windows: Array3<f64>,
    pub labels: Array1<i32>,
    pub repetitions: Array1<i32>,
}

impl WindowSet {
    fn empty(win_len: usize, channels: usize) -> Self {
        Self {
            windows: Array3::zeros((0, win_len, channels)),
            labels: Array1::zeros(0),
            repetitions: Array1::zeros(0),
        }
    }

    pub fn len(&self) -> usize {
        self.windows.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn win_len(&self) -> usize {
        self.windows.len_of(Axis(1))
    }

    pub fn n_channels(&self) -> usize {
        self.windows.len_of(Axis(2))
    }

    /// One window, win_len × channels
    pub fn window(&self, index: usize) -> ArrayView2<'_, f64> {
        self.windows.index_axis(Axis(0), index)
    }
}

/// Number of windows of `win_len` rows, `win_stride` apart, that fit in `rows`
pub fn window_count(rows: usize, win_len: usize, win_stride: usize) -> usize {
    if win_len == 0 || win_stride == 0 || rows < win_len {
        0
    } else {
        (rows - win_len) / win_stride + 1
    }
}

/// Cut `recording` into windows after restricting it to `repetitions` and `gestures`
///
/// Filters are applied in that order and keep the temporal order of the retained rows,
/// which are then treated as one contiguous signal.
pub fn windowing(
    recording: &Recording,
    repetitions: Option<&[i32]>,
    gestures: Option<&[i32]>,
    win_len: usize,
    win_stride: usize,
) -> EmgResult<WindowSet> {
    if win_len == 0 || win_stride == 0 {
        return Err(EmgErrorBuilder::new("windowing", "windowing").configuration(&format!(
            "window length and stride must be positive, got {} and {}",
            win_len, win_stride
        )));
    }

    let mut selected = recording.clone();
    if let Some(reps) = repetitions {
        selected = selected.filter_repetitions(reps);
        if selected.is_empty() {
            return Err(EmgError::EmptySelection {
                stage: ProcessingStage::Windowing,
                what: format!("repetitions {:?}", reps),
            });
        }
    }
    if let Some(gestures) = gestures {
        selected = selected.filter_gestures(gestures);
        if selected.is_empty() {
            return Err(EmgError::EmptySelection {
                stage: ProcessingStage::Windowing,
                what: format!("gestures {:?}", gestures),
            });
        }
    }

    let rows = selected.n_samples();
    let channels = selected.n_channels();
    let count = window_count(rows, win_len, win_stride);
    if count == 0 {
        warn!(rows, win_len, "Selection is shorter than one window");
        return Ok(WindowSet::empty(win_len, channels));
    }

    let mut windows = Array3::<f64>::zeros((count, win_len, channels));
    let mut labels = Array1::<i32>::zeros(count);
    let mut reps = Array1::<i32>::zeros(count);

    for i in 0..count {
        let start = i * win_stride;
        let end = start + win_len;
        windows
            .index_axis_mut(Axis(0), i)
            .assign(&selected.emg().slice(s![start..end, ..]));
        labels[i] = selected.stimulus()[end - 1];
        reps[i] = selected.repetition()[end - 1];
    }

    debug!(
        rows,
        windows = count,
        win_len,
        win_stride,
        "Windowed recording"
    );

    Ok(WindowSet {
        windows,
        labels,
        repetitions: reps,
    })
}
