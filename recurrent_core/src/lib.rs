//! # Recurrent Core
//!
//! A small recurrent neural network engine built from scalar neurons that
//! each feed their previous output back into themselves. Networks are trained
//! step by step on sequences of vectors and keep their recurrent state between
//! calls until [`Network::reset`] is invoked.
//!
//! ## Quick Start
//!
//! ```rust
//! use recurrent_core::{Network, NetworkConfig};
//! use recurrent_shared::encode_byte;
//!
//! let config = NetworkConfig::legacy(8, 8, 0).with_seed(42);
//! let mut network = Network::from_config(&config).unwrap();
//!
//! let input = encode_byte(b'0');
//! let error = network.train(input.view(), input.view()).unwrap();
//! assert!(error >= 0.0);
//!
//! network.reset();
//! let output = network.predict(input.view()).unwrap();
//! assert_eq!(output.len(), 8);
//! ```
//!
//! ## Core Modules
//!
//! - [`neural`] - Activations, optimizers, neurons, layers and networks
//! - [`data`] - Input/target sequence pairs
//! - [`training`] - Epoch loop, convergence and generation
//! - [`config`] - Engine configuration via TOML
//! - [`checkpoint`] - Binary network snapshots
//! - [`logging`] - JSON line-delimited training logs

pub mod checkpoint;
pub mod config;
pub mod data;
pub mod logging;
pub mod neural;
pub mod training;

pub use checkpoint::{CheckpointError, Checkpointable};
pub use config::{ConfigError, EngineConfig};
pub use data::{DatasetError, SequenceDataset, SequencePair};
pub use neural::{
    Activation, Layer, Network, NetworkConfig, NetworkError, NetworkResult, Neuron,
    Optimizer, OptimizerSettings, Scalar, Schedule, Vector,
};
pub use training::{
    generate, respond, train_epoch, train_sequence, train_until_converged, EpochMetrics,
    TrainingConfig, TrainingReport, DEFAULT_MAX_STEPS,
};
