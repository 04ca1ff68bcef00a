// src/diagnostics/cross_validation.rs
//! Stratified cross-validation, learning curves and validation curves

use super::estimator::Estimator;
use crate::config::constants::diagnostics::DEFAULT_CV_FOLDS;
use crate::error::{EmgError, EmgErrorBuilder, EmgResult, ProcessingStage};
use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;
use tracing::{debug, info, warn};

/// K folds preserving class proportions, without shuffling
///
/// Samples of each class are assigned to folds in contiguous runs in their original order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StratifiedKFold {
    n_splits: usize,
}

/// Train and test row indices of one fold, both ascending
pub type Fold = (Vec<usize>, Vec<usize>);

impl StratifiedKFold {
    pub fn new(n_splits: usize) -> EmgResult<Self> {
        if n_splits < 2 {
            return Err(EmgErrorBuilder::new("cross_validation", "new")
                .configuration(&format!("need at least 2 folds, got {}", n_splits)));
        }
        Ok(Self { n_splits })
    }

    pub fn n_splits(&self) -> usize {
        self.n_splits
    }

    pub fn split(&self, y: &[i32]) -> EmgResult<Vec<Fold>> {
        // Classes are numbered by first appearance, not by label value
        let mut classes: HashMap<i32, usize> = HashMap::new();
        let encoded: Vec<usize> = y
            .iter()
            .map(|&label| {
                let next = classes.len();
                *classes.entry(label).or_insert(next)
            })
            .collect();

        let mut class_counts = vec![0usize; classes.len()];
        for &c in &encoded {
            class_counts[c] += 1;
        }
        let largest = class_counts.iter().copied().max().unwrap_or(0);
        if largest < self.n_splits {
            return Err(EmgErrorBuilder::new("cross_validation", "split").mismatch(
                "labels",
                "every class has fewer members than the number of folds",
                format!(">= {}", self.n_splits),
                largest,
            ));
        }
        if class_counts.iter().any(|&c| c < self.n_splits) {
            warn!(
                n_splits = self.n_splits,
                smallest = class_counts.iter().copied().min().unwrap_or(0),
                "Some classes have fewer members than folds"
            );
        }

        // Deal the class-sorted labels round robin, then give each class its share per fold
        let mut sorted = encoded.clone();
        sorted.sort_unstable();
        let mut allocation = vec![vec![0usize; classes.len()]; self.n_splits];
        for (position, &class) in sorted.iter().enumerate() {
            allocation[position % self.n_splits][class] += 1;
        }

        let mut test_fold = vec![0usize; y.len()];
        for class in 0..classes.len() {
            let mut fold_ids = (0..self.n_splits)
                .flat_map(|fold| std::iter::repeat(fold).take(allocation[fold][class]));
            for (row, _) in encoded.iter().enumerate().filter(|(_, &c)| c == class) {
                test_fold[row] = fold_ids.next().unwrap_or(self.n_splits - 1);
            }
        }

        Ok((0..self.n_splits)
            .map(|fold| {
                let (test, train): (Vec<usize>, Vec<usize>) =
                    (0..y.len()).partition(|&row| test_fold[row] == fold);
                (train, test)
            })
            .collect())
    }
}

impl Default for StratifiedKFold {
    fn default() -> Self {
        Self {
            n_splits: DEFAULT_CV_FOLDS,
        }
    }
}

/// Mean and population standard deviation of each row of a score table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurveSummary {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl CurveSummary {
    pub fn of(scores: &[Vec<f64>]) -> Self {
        let mut mean = Vec::with_capacity(scores.len());
        let mut std = Vec::with_capacity(scores.len());
        for row in scores {
            let n = row.len().max(1) as f64;
            let m = row.iter().sum::<f64>() / n;
            let var = row.iter().map(|s| (s - m).powi(2)).sum::<f64>() / n;
            mean.push(m);
            std.push(var.sqrt());
        }
        Self { mean, std }
    }
}

/// Scores as a function of training set size
///
/// Score tables are indexed `[size][fold]`; times are in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningCurve {
    pub train_sizes: Vec<usize>,
    pub train_scores: Vec<Vec<f64>>,
    pub test_scores: Vec<Vec<f64>>,
    pub fit_times: Vec<Vec<f64>>,
    pub score_times: Vec<Vec<f64>>,
}

impl LearningCurve {
    pub fn train_summary(&self) -> CurveSummary {
        CurveSummary::of(&self.train_scores)
    }

    pub fn test_summary(&self) -> CurveSummary {
        CurveSummary::of(&self.test_scores)
    }

    pub fn fit_time_summary(&self) -> CurveSummary {
        CurveSummary::of(&self.fit_times)
    }
}

/// Scores as a function of one estimator parameter, indexed `[param][fold]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationCurve<P> {
    pub param_name: String,
    pub param_range: Vec<P>,
    pub train_scores: Vec<Vec<f64>>,
    pub test_scores: Vec<Vec<f64>>,
}

impl<P> ValidationCurve<P> {
    pub fn train_summary(&self) -> CurveSummary {
        CurveSummary::of(&self.train_scores)
    }

    pub fn test_summary(&self) -> CurveSummary {
        CurveSummary::of(&self.test_scores)
    }
}

/// Cross-validated train and test accuracy for growing training subsets
///
/// `train_sizes` are fractions in (0, 1] of the largest training fold. Each subset is
/// the leading part of the fold's training rows.
pub fn learning_curve<E, F>(
    factory: F,
    x: &Array2<f64>,
    y: &[i32],
    cv: &StratifiedKFold,
    train_sizes: &[f64],
) -> EmgResult<LearningCurve>
where
    E: Estimator,
    F: Fn() -> EmgResult<E>,
{
    check_xy(x, y)?;
    let folds = cv.split(y)?;
    let max_train = folds.first().map(|(train, _)| train.len()).unwrap_or(0);

    if train_sizes.is_empty() || train_sizes.iter().any(|&f| !(f > 0.0 && f <= 1.0)) {
        return Err(EmgErrorBuilder::new("learning_curve", "learning_curve")
            .configuration("train sizes must be fractions in (0, 1]"));
    }
    let mut sizes: Vec<usize> = train_sizes
        .iter()
        .map(|&f| ((f * max_train as f64) as usize).clamp(1, max_train))
        .collect();
    sizes.sort_unstable();
    sizes.dedup();

    let mut curve = LearningCurve {
        train_sizes: sizes.clone(),
        train_scores: vec![Vec::new(); sizes.len()],
        test_scores: vec![Vec::new(); sizes.len()],
        fit_times: vec![Vec::new(); sizes.len()],
        score_times: vec![Vec::new(); sizes.len()],
    };

    for (fold_idx, (train, test)) in folds.iter().enumerate() {
        let x_test = x.select(Axis(0), test);
        let y_test = select_labels(y, test);

        for (size_idx, &size) in sizes.iter().enumerate() {
            let subset = &train[..size.min(train.len())];
            let x_train = x.select(Axis(0), subset);
            let y_train = select_labels(y, subset);

            let mut estimator = factory()?;
            let started = Instant::now();
            estimator.fit(x_train.view(), &y_train)?;
            let fit_time = started.elapsed().as_secs_f64();

            let started = Instant::now();
            let test_score = estimator.score(x_test.view(), &y_test)?;
            let score_time = started.elapsed().as_secs_f64();
            let train_score = estimator.score(x_train.view(), &y_train)?;

            debug!(fold = fold_idx, size, train_score, test_score, "Learning curve point");
            curve.train_scores[size_idx].push(train_score);
            curve.test_scores[size_idx].push(test_score);
            curve.fit_times[size_idx].push(fit_time);
            curve.score_times[size_idx].push(score_time);
        }
    }

    info!(sizes = ?curve.train_sizes, folds = folds.len(), "Computed learning curve");
    Ok(curve)
}

/// Cross-validated train and test accuracy for each value of one parameter
pub fn validation_curve<E, F, P>(
    factory: F,
    param_name: &str,
    param_range: &[P],
    x: &Array2<f64>,
    y: &[i32],
    cv: &StratifiedKFold,
) -> EmgResult<ValidationCurve<P>>
where
    E: Estimator,
    F: Fn(&P) -> EmgResult<E>,
    P: Clone,
{
    check_xy(x, y)?;
    if param_range.is_empty() {
        return Err(EmgErrorBuilder::new("validation_curve", "validation_curve")
            .configuration("parameter range must not be empty"));
    }
    let folds = cv.split(y)?;

    let mut train_scores = vec![Vec::with_capacity(folds.len()); param_range.len()];
    let mut test_scores = vec![Vec::with_capacity(folds.len()); param_range.len()];

    for (train, test) in &folds {
        let x_train = x.select(Axis(0), train);
        let y_train = select_labels(y, train);
        let x_test = x.select(Axis(0), test);
        let y_test = select_labels(y, test);

        for (param_idx, param) in param_range.iter().enumerate() {
            let mut estimator = factory(param)?;
            estimator.fit(x_train.view(), &y_train)?;
            train_scores[param_idx].push(estimator.score(x_train.view(), &y_train)?);
            test_scores[param_idx].push(estimator.score(x_test.view(), &y_test)?);
        }
    }

    info!(param = param_name, values = param_range.len(), "Computed validation curve");
    Ok(ValidationCurve {
        param_name: param_name.to_string(),
        param_range: param_range.to_vec(),
        train_scores,
        test_scores,
    })
}

fn check_xy(x: &Array2<f64>, y: &[i32]) -> EmgResult<()> {
    if x.nrows() != y.len() {
        return Err(EmgErrorBuilder::new("cross_validation", "check_xy").mismatch(
            "labels",
            "label count differs from row count",
            x.nrows(),
            y.len(),
        ));
    }
    if y.is_empty() {
        return Err(EmgError::EmptySelection {
            stage: ProcessingStage::Diagnostics,
            what: "cross-validation rows".to_string(),
        });
    }
    Ok(())
}

fn select_labels(y: &[i32], rows: &[usize]) -> Vec<i32> {
    rows.iter().map(|&r| y[r]).collect()
}
