//! A fully-connected sigmoid network trained with mini-batch backpropagation
//! to classify 28x28 MNIST digits.
//!
//! Activation vectors and weight matrices reserve index 0 for the bias, so
//! unit `j` of a layer lives at index `j` and feature `i` of an input lives at
//! activation index `i + 1`.

pub mod backprop;
pub mod config;
pub mod error;
pub mod mnist_loader;
pub mod network;
pub mod topology;
pub mod trainer;

pub use backprop::Nabla;
pub use error::{DatasetError, NetworkError, Result};
pub use network::{sigmoid, Activations, Example, Network};
pub use topology::Topology;
pub use trainer::{EpochReport, Trainer};
