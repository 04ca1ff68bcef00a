// src/model/mod.rs
//! Neural-network gesture classifiers and their training loop
//!
//! Models are built with candle. Weights live in a [`candle_nn::VarMap`] owned by the
//! caller so the trainer can checkpoint and restore them.

pub mod trainer;

pub use trainer::{EpochMetrics, Trainer, TrainingReport};

use candle_core::{Module, Result, Tensor};
use candle_nn::{linear, Dropout, Linear, VarBuilder};

/// A classifier producing unnormalised class scores
pub trait Classifier {
    /// Logits of shape batch × classes; `train` enables stochastic layers
    fn forward(&self, xs: &Tensor, train: bool) -> Result<Tensor>;
}

/// Layer sizes of [`WindowMlp`]
#[derive(Debug, Clone, PartialEq)]
pub struct WindowMlpConfig {
    /// Flattened input width, e.g. win_len × channels
    pub input_dim: usize,
    pub hidden_units: usize,
    pub n_classes: usize,
    pub dropout: f32,
}

/// Flatten, one ReLU hidden layer with dropout, linear class scores
pub struct WindowMlp {
    hidden: Linear,
    dropout: Dropout,
    output: Linear,
    config: WindowMlpConfig,
}

impl WindowMlp {
    pub fn new(config: WindowMlpConfig, vb: VarBuilder) -> Result<Self> {
        let hidden = linear(config.input_dim, config.hidden_units, vb.pp("hidden"))?;
        let output = linear(config.hidden_units, config.n_classes, vb.pp("output"))?;
        Ok(Self {
            hidden,
            dropout: Dropout::new(config.dropout),
            output,
            config,
        })
    }

    pub fn config(&self) -> &WindowMlpConfig {
        &self.config
    }
}

impl Classifier for WindowMlp {
    fn forward(&self, xs: &Tensor, train: bool) -> Result<Tensor> {
        let xs = if xs.rank() > 2 { xs.flatten_from(1)? } else { xs.clone() };
        let xs = self.hidden.forward(&xs)?.relu()?;
        let xs = self.dropout.forward(&xs, train)?;
        self.output.forward(&xs)
    }
}
