// src/model/trainer.rs
//! Mini-batch training with best-checkpointing and early stopping

use super::Classifier;
use crate::config::constants::training::CHECKPOINT_SUFFIX;
use crate::config::TrainingConfig;
use crate::diagnostics::{confusion_matrix, ConfusionMatrix};
use crate::error::{EmgError, EmgErrorBuilder, EmgResult, ProcessingStage};
use crate::labels::LabelEncoding;
use candle_core::{DType, Device, Tensor, D};
use candle_nn::ops::log_softmax;
use candle_nn::{AdamW, Optimizer, ParamsAdamW, VarMap};
use ndarray::{ArrayBase, Data, Dimension};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Metrics recorded after one epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub loss: f64,
    pub accuracy: f64,
    pub val_loss: f64,
    pub val_accuracy: f64,
}

/// Outcome of [`Trainer::train_model`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub history: Vec<EpochMetrics>,
    /// Epoch whose weights were checkpointed and restored
    pub best_epoch: Option<usize>,
    pub stopped_early: bool,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
    pub checkpoint: PathBuf,
}

/// Trains [`Classifier`]s with Adam on one-hot targets
pub struct Trainer {
    config: TrainingConfig,
    device: Device,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> EmgResult<Self> {
        Self::with_device(config, Device::Cpu)
    }

    /// Fails when the hyperparameters cannot drive a run, e.g. a zero batch size
    pub fn with_device(config: TrainingConfig, device: Device) -> EmgResult<Self> {
        config.validate()?;
        Ok(Self { config, device })
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Checkpoint file written for `save_to`: `<save_to>_best_model.safetensors`
    pub fn checkpoint_path(save_to: impl AsRef<Path>) -> PathBuf {
        let mut path = save_to.as_ref().as_os_str().to_owned();
        path.push(CHECKPOINT_SUFFIX);
        PathBuf::from(path)
    }

    /// Fit `model` and restore the weights with the best validation accuracy
    ///
    /// Weights are saved whenever validation accuracy strictly improves. Training stops
    /// after `patience` epochs without a lower validation loss.
    #[allow(clippy::too_many_arguments)]
    pub fn train_model<M, SX, SY, DX, DY>(
        &self,
        model: &M,
        varmap: &mut VarMap,
        x_train: &ArrayBase<SX, DX>,
        y_train: &ArrayBase<SY, DY>,
        x_test: &ArrayBase<SX, DX>,
        y_test: &ArrayBase<SY, DY>,
        save_to: impl AsRef<Path>,
    ) -> EmgResult<TrainingReport>
    where
        M: Classifier,
        SX: Data<Elem = f64>,
        SY: Data<Elem = f32>,
        DX: Dimension,
        DY: Dimension,
    {
        let x_train = self.inputs(x_train)?;
        let x_test = self.inputs(x_test)?;
        let y_train = self.targets(y_train)?;
        let y_test = self.targets(y_test)?;
        check_pair(&x_train, &y_train, "training set")?;
        check_pair(&x_test, &y_test, "test set")?;
        if y_train.dim(1)? != y_test.dim(1)? {
            return Err(EmgError::ShapeMismatch {
                context: "class count of test targets".to_string(),
                expected: vec![y_train.dim(1)?],
                actual: vec![y_test.dim(1)?],
            });
        }

        let checkpoint = Self::checkpoint_path(save_to);
        let cfg = &self.config;
        let mut optimizer = AdamW::new(
            varmap.all_vars(),
            ParamsAdamW {
                lr: cfg.learning_rate,
                beta1: cfg.beta_1,
                beta2: cfg.beta_2,
                eps: cfg.epsilon,
                weight_decay: 0.0,
            },
        )?;
        let mut rng = match cfg.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let n_train = x_train.dim(0)?;
        let mut order: Vec<u32> = (0..n_train as u32).collect();
        let mut history = Vec::new();
        let mut best_val_accuracy = f64::NEG_INFINITY;
        let mut best_val_loss = f64::INFINITY;
        let mut best_epoch = None;
        let mut epochs_without_improvement = 0;
        let mut stopped_early = false;
        let mut iterations = 0usize;

        info!(
            train = n_train,
            test = x_test.dim(0)?,
            classes = y_train.dim(1)?,
            epochs = cfg.epochs,
            "Starting training"
        );

        for epoch in 0..cfg.epochs {
            order.shuffle(&mut rng);
            let mut loss_sum = 0.0;
            let mut correct = 0.0;

            for batch in order.chunks(cfg.batch_size) {
                let index = Tensor::from_slice(batch, batch.len(), &self.device)?;
                let xs = x_train.index_select(&index, 0)?;
                let ys = y_train.index_select(&index, 0)?;

                let logits = model.forward(&xs, true)?;
                let loss = categorical_cross_entropy(&logits, &ys)?;
                optimizer.backward_step(&loss)?;

                iterations += 1;
                if cfg.decay > 0.0 {
                    optimizer.set_learning_rate(cfg.learning_rate / (1.0 + cfg.decay * iterations as f64));
                }

                loss_sum += loss.to_scalar::<f32>()? as f64 * batch.len() as f64;
                correct += count_correct(&logits, &ys)?;
            }

            let (val_loss, val_accuracy) = self.evaluate_tensors(model, &x_test, &y_test)?;
            let metrics = EpochMetrics {
                epoch,
                loss: loss_sum / n_train as f64,
                accuracy: correct / n_train as f64,
                val_loss,
                val_accuracy,
            };
            debug!(
                epoch,
                loss = metrics.loss,
                accuracy = metrics.accuracy,
                val_loss,
                val_accuracy,
                "Epoch finished"
            );
            history.push(metrics);

            if val_accuracy > best_val_accuracy {
                best_val_accuracy = val_accuracy;
                best_epoch = Some(epoch);
                varmap.save(&checkpoint)?;
                info!(epoch, val_accuracy, path = %checkpoint.display(), "Saved best model");
            }

            if val_loss < best_val_loss {
                best_val_loss = val_loss;
                epochs_without_improvement = 0;
            } else {
                epochs_without_improvement += 1;
                if epochs_without_improvement >= cfg.patience {
                    stopped_early = true;
                    info!(epoch, patience = cfg.patience, "Early stopping");
                    break;
                }
            }
        }

        if best_epoch.is_some() {
            varmap.load(&checkpoint)?;
        }

        let (_, train_accuracy) = self.evaluate_tensors(model, &x_train, &y_train)?;
        let (_, test_accuracy) = self.evaluate_tensors(model, &x_test, &y_test)?;
        info!("Train: {:.3}, Test: {:.3}", train_accuracy, test_accuracy);

        Ok(TrainingReport {
            history,
            best_epoch,
            stopped_early,
            train_accuracy,
            test_accuracy,
            checkpoint,
        })
    }

    /// Mean categorical cross-entropy and accuracy of `model` on one-hot targets
    pub fn evaluate<M, SX, SY, DX, DY>(
        &self,
        model: &M,
        x: &ArrayBase<SX, DX>,
        y: &ArrayBase<SY, DY>,
    ) -> EmgResult<(f64, f64)>
    where
        M: Classifier,
        SX: Data<Elem = f64>,
        SY: Data<Elem = f32>,
        DX: Dimension,
        DY: Dimension,
    {
        let xs = self.inputs(x)?;
        let ys = self.targets(y)?;
        check_pair(&xs, &ys, "evaluation set")?;
        self.evaluate_tensors(model, &xs, &ys)
    }

    /// Most likely class index for every row of `x`
    pub fn predict<M, S, Dim>(&self, model: &M, x: &ArrayBase<S, Dim>) -> EmgResult<Vec<usize>>
    where
        M: Classifier,
        S: Data<Elem = f64>,
        Dim: Dimension,
    {
        let xs = self.inputs(x)?;
        let n = xs.dim(0)?;
        let mut predictions = Vec::with_capacity(n);
        let mut start = 0;
        while start < n {
            let len = self.config.batch_size.min(n - start);
            let logits = model.forward(&xs.narrow(0, start, len)?, false)?;
            predictions.extend(logits.argmax(D::Minus1)?.to_vec1::<u32>()?.into_iter().map(|i| i as usize));
            start += len;
        }
        Ok(predictions)
    }

    /// Confusion matrix of the model's predictions against gesture labels
    pub fn confusion_matrix<M, S, Dim>(
        &self,
        model: &M,
        x: &ArrayBase<S, Dim>,
        labels: &[i32],
        encoding: &LabelEncoding,
    ) -> EmgResult<ConfusionMatrix>
    where
        M: Classifier,
        S: Data<Elem = f64>,
        Dim: Dimension,
    {
        let predicted = encoding.decode(&self.predict(model, x)?)?;
        confusion_matrix(labels, &predicted)
    }

    fn evaluate_tensors<M: Classifier>(&self, model: &M, xs: &Tensor, ys: &Tensor) -> EmgResult<(f64, f64)> {
        let n = xs.dim(0)?;
        if n == 0 {
            return Err(EmgError::EmptySelection {
                stage: ProcessingStage::Evaluation,
                what: "evaluation rows".to_string(),
            });
        }

        let mut loss_sum = 0.0;
        let mut correct = 0.0;
        let mut start = 0;
        while start < n {
            let len = self.config.batch_size.min(n - start);
            let x = xs.narrow(0, start, len)?;
            let y = ys.narrow(0, start, len)?;
            let logits = model.forward(&x, false)?;
            loss_sum += categorical_cross_entropy(&logits, &y)?.to_scalar::<f32>()? as f64 * len as f64;
            correct += count_correct(&logits, &y)?;
            start += len;
        }
        Ok((loss_sum / n as f64, correct / n as f64))
    }

    fn inputs<S, Dim>(&self, array: &ArrayBase<S, Dim>) -> EmgResult<Tensor>
    where
        S: Data<Elem = f64>,
        Dim: Dimension,
    {
        if array.ndim() < 2 {
            return Err(EmgErrorBuilder::new("trainer", "inputs")
                .invalid_data("inputs", "expected at least two dimensions with rows first"));
        }
        let data: Vec<f32> = array.iter().map(|&v| v as f32).collect();
        Ok(Tensor::from_vec(data, array.shape(), &self.device)?)
    }

    fn targets<S, Dim>(&self, array: &ArrayBase<S, Dim>) -> EmgResult<Tensor>
    where
        S: Data<Elem = f32>,
        Dim: Dimension,
    {
        if array.ndim() != 2 {
            return Err(EmgErrorBuilder::new("trainer", "targets")
                .invalid_data("targets", "expected one-hot rows × classes"));
        }
        let data: Vec<f32> = array.iter().copied().collect();
        Ok(Tensor::from_vec(data, array.shape(), &self.device)?)
    }
}

fn check_pair(xs: &Tensor, ys: &Tensor, context: &str) -> EmgResult<()> {
    let (rows, targets) = (xs.dim(0)?, ys.dim(0)?);
    if rows == 0 {
        return Err(EmgError::EmptySelection {
            stage: ProcessingStage::Training,
            what: context.to_string(),
        });
    }
    if rows != targets {
        return Err(EmgError::ShapeMismatch {
            context: format!("{} targets", context),
            expected: vec![rows],
            actual: vec![targets],
        });
    }
    Ok(())
}

/// Mean of `-sum(y * log_softmax(logits))` over the batch
fn categorical_cross_entropy(logits: &Tensor, targets: &Tensor) -> candle_core::Result<Tensor> {
    let log_probs = log_softmax(logits, D::Minus1)?;
    (targets * log_probs)?.sum(D::Minus1)?.neg()?.mean_all()
}

fn count_correct(logits: &Tensor, targets: &Tensor) -> candle_core::Result<f64> {
    let predicted = logits.argmax(D::Minus1)?;
    let expected = targets.argmax(D::Minus1)?;
    let hits = predicted.eq(&expected)?.to_dtype(DType::F32)?.sum_all()?;
    Ok(hits.to_scalar::<f32>()? as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{WindowMlp, WindowMlpConfig};
    use candle_nn::VarBuilder;
    use ndarray::{Array2, Array3};

    fn separable(n: usize) -> (Array3<f64>, Array2<f32>) {
        let x = Array3::from_shape_fn((n, 4, 2), |(i, _, _)| if i % 2 == 0 { 1.0 } else { -1.0 });
        let y = Array2::from_shape_fn((n, 2), |(i, c)| if i % 2 == c { 1.0 } else { 0.0 });
        (x, y)
    }

    fn config(epochs: usize) -> TrainingConfig {
        TrainingConfig {
            learning_rate: 1e-2,
            epochs,
            batch_size: 4,
            hidden_units: 8,
            dropout: 0.0,
            seed: Some(7),
            ..TrainingConfig::default()
        }
    }

    fn mlp(varmap: &VarMap, trainer: &Trainer) -> WindowMlp {
        let vb = VarBuilder::from_varmap(varmap, DType::F32, trainer.device());
        WindowMlp::new(
            WindowMlpConfig {
                input_dim: 8,
                hidden_units: 8,
                n_classes: 2,
                dropout: 0.0,
            },
            vb,
        )
        .unwrap()
    }

    #[test]
    fn test_checkpoint_path() {
        let path = Trainer::checkpoint_path("/tmp/run/s1");
        assert_eq!(path, PathBuf::from("/tmp/run/s1_best_model.safetensors"));
    }

    #[test]
    fn test_train_separable_data() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = Trainer::new(config(60)).unwrap();
        let mut varmap = VarMap::new();
        let model = mlp(&varmap, &trainer);

        let (x, y) = separable(16);
        let report = trainer
            .train_model(&model, &mut varmap, &x, &y, &x, &y, dir.path().join("subject"))
            .unwrap();

        assert!(report.checkpoint.exists());
        assert!(report.best_epoch.is_some());
        assert!(!report.history.is_empty() && report.history.len() <= 60);
        assert_eq!(report.test_accuracy, 1.0);

        let predictions = trainer.predict(&model, &x).unwrap();
        assert_eq!(predictions, (0..16).map(|i| i % 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_early_stopping() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = config(200);
        cfg.learning_rate = 0.0;
        cfg.patience = 3;
        let trainer = Trainer::new(cfg).unwrap();
        let mut varmap = VarMap::new();
        let model = mlp(&varmap, &trainer);

        // Frozen weights never lower the validation loss after the first epoch
        let (x, y) = separable(8);
        let report = trainer
            .train_model(&model, &mut varmap, &x, &y, &x, &y, dir.path().join("frozen"))
            .unwrap();
        assert!(report.stopped_early);
        assert_eq!(report.history.len(), 4);
        assert_eq!(report.best_epoch, Some(0));
    }

    #[test]
    fn test_mismatched_targets_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let trainer = Trainer::new(config(1)).unwrap();
        let mut varmap = VarMap::new();
        let model = mlp(&varmap, &trainer);

        let (x, _) = separable(8);
        let (_, y) = separable(6);
        let err = trainer
            .train_model(&model, &mut varmap, &x, &y, &x, &y, dir.path().join("bad"))
            .unwrap_err();
        assert!(matches!(err, EmgError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_invalid_batch_size_rejected() {
        let mut cfg = config(1);
        cfg.batch_size = 0;
        assert!(matches!(Trainer::new(cfg), Err(EmgError::Configuration { .. })));

        let mut cfg = config(1);
        cfg.epochs = 0;
        assert!(Trainer::with_device(cfg, Device::Cpu).is_err());
    }
}
