//! Recurrent neural network engine.
//!
//! This module provides the building blocks of the engine, leaves first:
//! - [`Activation`]: stateless activation/derivative pairs
//! - [`Optimizer`]: per-parameter update rules (Adam, fixed-step)
//! - [`Neuron`]: scalar unit with a learned self-feedback weight
//! - [`Layer`]: neurons sharing one input vector, evaluated in parallel
//! - [`Network`]: a chain of layers trained by backpropagation

pub mod activation;
pub mod error;
pub mod layer;
pub mod network;
pub mod neuron;
pub mod numeric;
pub mod optimizer;

pub use activation::Activation;
pub use error::{NetworkError, NetworkResult};
pub use layer::{Layer, Schedule};
pub use network::{Network, NetworkConfig};
pub use neuron::Neuron;
pub use numeric::{dot, random_scalar, random_vector, Scalar, Vector};
pub use optimizer::{AdamOptimizer, Optimizer, OptimizerSettings, ParameterOptimizer, SgdOptimizer};
