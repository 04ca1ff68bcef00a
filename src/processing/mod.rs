// src/processing/mod.rs
//! Signal processing for recorded EMG data

pub mod features;
pub mod filter_bank;
pub mod filters;
pub mod normalize;
pub mod pca;
pub mod pipeline;
pub mod rectify;
pub mod windowing;

pub use features::*;
pub use filter_bank::*;
pub use normalize::*;
pub use pca::*;
pub use pipeline::*;
pub use rectify::*;
pub use windowing::*;
