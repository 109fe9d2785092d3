//! Recurrent network architecture: a chain of neuron layers.

use std::iter;

use ndarray::ArrayView1;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::checkpoint::{CheckpointError, Checkpointable};
use crate::neural::activation::Activation;
use crate::neural::error::{NetworkError, NetworkResult};
use crate::neural::layer::{Layer, Schedule};
use crate::neural::neuron::Neuron;
use crate::neural::numeric::{Scalar, Vector};
use crate::neural::optimizer::OptimizerSettings;

/// Shape and training setup of a [`Network`].
///
/// `hidden_layers` and `hidden_width` are independent. Leaving
/// `hidden_layers` unset selects the legacy layout where the number of hidden
/// layers equals `hidden_width`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub input_width: usize,
    pub output_width: usize,
    pub hidden_width: usize,
    pub hidden_layers: Option<usize>,
    pub activation: Activation,
    pub optimizer: OptimizerSettings,
    pub schedule: Schedule,
    /// Seed for parameter initialization; `None` draws one from the OS
    pub seed: Option<u64>,
}

impl NetworkConfig {
    /// Legacy layout: `1 + hidden_width` layers.
    pub fn legacy(input_width: usize, output_width: usize, hidden_width: usize) -> Self {
        Self {
            input_width,
            output_width,
            hidden_width,
            hidden_layers: None,
            activation: Activation::default(),
            optimizer: OptimizerSettings::default(),
            schedule: Schedule::default(),
            seed: None,
        }
    }

    pub fn with_hidden_layers(mut self, hidden_layers: usize) -> Self {
        self.hidden_layers = Some(hidden_layers);
        self
    }

    pub fn with_activation(mut self, activation: Activation) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_optimizer(mut self, optimizer: OptimizerSettings) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of hidden layers this configuration builds.
    pub fn hidden_layer_count(&self) -> usize {
        self.hidden_layers.unwrap_or(self.hidden_width)
    }

    /// Total number of layers.
    pub fn depth(&self) -> usize {
        1 + self.hidden_layer_count()
    }

    /// Width sequence `[input, hidden, ..., hidden, output]`; layer `i` maps
    /// `widths[i]` to `widths[i + 1]`.
    pub fn layer_widths(&self) -> Vec<usize> {
        iter::once(self.input_width)
            .chain(iter::repeat(self.hidden_width).take(self.hidden_layer_count()))
            .chain(iter::once(self.output_width))
            .collect()
    }

    pub fn validate(&self) -> NetworkResult<()> {
        if self.input_width < 1 {
            return Err(NetworkError::invalid_config(
                "input_width",
                self.input_width,
                "must be at least 1",
            ));
        }
        if self.output_width < 1 {
            return Err(NetworkError::invalid_config(
                "output_width",
                self.output_width,
                "must be at least 1",
            ));
        }
        if self.hidden_layer_count() > 0 && self.hidden_width == 0 {
            return Err(NetworkError::invalid_config(
                "hidden_width",
                self.hidden_width,
                "hidden layers need a width of at least 1",
            ));
        }
        self.optimizer.validate()
    }
}

/// A chain of recurrent layers trained one time step at a time.
///
/// Every call to [`predict`](Network::predict) or [`train`](Network::train)
/// advances the recurrent state of all neurons. Call
/// [`reset`](Network::reset) between independent sequences.
///
/// # Examples
///
/// ```
/// use recurrent_core::neural::Network;
/// use recurrent_shared::encode_byte;
///
/// let mut network = Network::new(8, 8, 0).expect("valid widths");
/// let sample = encode_byte(b'0');
/// let error = network.train(sample.view(), sample.view()).expect("matching widths");
/// assert!(error >= 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct Network {
    layers: Vec<Layer>,
    activation: Activation,
    optimizer: OptimizerSettings,
}

impl Network {
    /// Builds the legacy layout with `1 + hidden_width` layers and randomly
    /// seeded parameters.
    ///
    /// Fails if `input_width` or `output_width` is zero.
    pub fn new(input_width: usize, output_width: usize, hidden_width: usize) -> NetworkResult<Self> {
        Self::from_config(&NetworkConfig::legacy(
            input_width,
            output_width,
            hidden_width,
        ))
    }

    pub fn from_config(config: &NetworkConfig) -> NetworkResult<Self> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let widths = config.layer_widths();
        let layers = widths
            .windows(2)
            .map(|pair| {
                Layer::new(
                    pair[0],
                    pair[1],
                    config.activation,
                    &config.optimizer,
                    &mut rng,
                )
                .map(|layer| layer.with_schedule(config.schedule))
            })
            .collect::<NetworkResult<Vec<_>>>()?;

        tracing::debug!(
            ?widths,
            activation = config.activation.name(),
            "built recurrent network"
        );

        Ok(Self {
            layers,
            activation: config.activation,
            optimizer: config.optimizer,
        })
    }

    /// Forward pass through every layer.
    pub fn predict(&mut self, inputs: ArrayView1<'_, Scalar>) -> NetworkResult<Vector> {
        NetworkError::check_width(self.input_size(), inputs.len(), "network input")?;

        let mut current = inputs.to_owned();
        for layer in &mut self.layers {
            current = layer.predict(current.view())?;
        }
        Ok(current)
    }

    /// One training step on `(input, target)`.
    ///
    /// Runs a forward pass, then propagates `target - output` backwards
    /// through the layers, updating every parameter. Returns the mean squared
    /// error of the forward pass.
    pub fn train(
        &mut self,
        input: ArrayView1<'_, Scalar>,
        target: ArrayView1<'_, Scalar>,
    ) -> NetworkResult<Scalar> {
        NetworkError::check_width(self.input_size(), input.len(), "network input")?;
        NetworkError::check_width(self.output_size(), target.len(), "network target")?;

        // Each layer's input is kept for its backward step.
        let mut layer_inputs = Vec::with_capacity(self.layers.len());
        let mut current = input.to_owned();
        for layer in &mut self.layers {
            let next = layer.predict(current.view())?;
            layer_inputs.push(current);
            current = next;
        }

        let errors = &target - &current;
        let mse = errors.mapv(|e| e * e).mean().unwrap_or(0.0);

        let mut gradient = errors;
        for (layer, inputs) in self.layers.iter_mut().zip(layer_inputs.iter()).rev() {
            gradient = layer.update(inputs.view(), gradient.view())?;
        }

        Ok(mse)
    }

    /// Forgets the recurrent state of every neuron.
    pub fn reset(&mut self) {
        self.layers.iter_mut().for_each(Layer::reset);
    }

    /// Clears every optimizer's accumulated moments.
    pub fn reset_optimizer_state(&mut self) {
        self.layers.iter_mut().for_each(Layer::reset_optimizer_state);
    }

    pub fn set_schedule(&mut self, schedule: Schedule) {
        for layer in &mut self.layers {
            layer.set_schedule(schedule);
        }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Layer::input_size)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, Layer::output_size)
    }

    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn optimizer_settings(&self) -> OptimizerSettings {
        self.optimizer
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Mutable access to the layers; the chain's shape cannot change through it.
    pub fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }
}

#[derive(Serialize, Deserialize)]
struct NeuronSnapshot {
    weights: Vec<Scalar>,
    feedback_weight: Scalar,
    bias: Scalar,
}

#[derive(Serialize, Deserialize)]
struct LayerSnapshot {
    neurons: Vec<NeuronSnapshot>,
}

/// Persisted form of a [`Network`]: parameters only, optimizer moments are
/// rebuilt fresh on load.
#[derive(Serialize, Deserialize)]
pub struct NetworkCheckpoint {
    activation: Activation,
    optimizer: OptimizerSettings,
    schedule: Schedule,
    layers: Vec<LayerSnapshot>,
}

impl NetworkCheckpoint {
    fn from_network(network: &Network) -> Self {
        let layers = network
            .layers
            .iter()
            .map(|layer| LayerSnapshot {
                neurons: layer
                    .neurons()
                    .iter()
                    .map(|neuron| NeuronSnapshot {
                        weights: neuron.weights().to_vec(),
                        feedback_weight: neuron.feedback_weight(),
                        bias: neuron.bias(),
                    })
                    .collect(),
            })
            .collect();

        Self {
            activation: network.activation,
            optimizer: network.optimizer,
            schedule: network
                .layers
                .first()
                .map_or(Schedule::default(), Layer::schedule),
            layers,
        }
    }

    fn into_network(self) -> Result<Network, CheckpointError> {
        if self.layers.is_empty() {
            return Err(CheckpointError::InvalidFormat(
                "Network must contain at least one layer".to_string(),
            ));
        }

        let activation = self.activation;
        let optimizer = self.optimizer;
        let schedule = self.schedule;
        let layers = self
            .layers
            .into_iter()
            .map(|layer| {
                let neurons = layer
                    .neurons
                    .into_iter()
                    .map(|neuron| {
                        Neuron::from_parameters(
                            Vector::from(neuron.weights),
                            neuron.bias,
                            neuron.feedback_weight,
                            activation,
                            &optimizer,
                        )
                    })
                    .collect();
                Layer::from_neurons(neurons, schedule)
            })
            .collect::<NetworkResult<Vec<_>>>()?;

        for (index, pair) in layers.windows(2).enumerate() {
            if pair[0].output_size() != pair[1].input_size() {
                return Err(CheckpointError::InvalidFormat(format!(
                    "Layer {} outputs {} values but layer {} expects {}",
                    index,
                    pair[0].output_size(),
                    index + 1,
                    pair[1].input_size()
                )));
            }
        }

        Ok(Network {
            layers,
            activation,
            optimizer,
        })
    }
}

impl Checkpointable for Network {
    const CHECKPOINT_VERSION: u32 = 1;

    type Snapshot = NetworkCheckpoint;

    fn to_snapshot(&self) -> NetworkCheckpoint {
        NetworkCheckpoint::from_network(self)
    }

    fn from_snapshot(snapshot: NetworkCheckpoint) -> Result<Self, CheckpointError> {
        let network = snapshot.into_network()?;
        tracing::debug!(depth = network.depth(), "rebuilt network from snapshot");
        Ok(network)
    }
}
