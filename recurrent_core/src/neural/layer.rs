//! Layers of independent recurrent neurons.

use ndarray::ArrayView1;
use rand::Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::activation::Activation;
use super::error::{NetworkError, NetworkResult};
use super::neuron::Neuron;
use super::numeric::{Scalar, Vector};
use super::optimizer::OptimizerSettings;

/// How the neurons of a layer are evaluated.
///
/// Neurons never share mutable state, so both schedules produce identical
/// results; `Parallel` spreads them over the rayon thread pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    Sequential,
    #[default]
    Parallel,
}

/// A fixed-width collection of neurons sharing one input vector.
///
/// # Architecture
///
/// ```text
/// inputs ─┬─> neuron 0 ─> outputs[0]
///         ├─> neuron 1 ─> outputs[1]
///         └─> ...
/// ```
#[derive(Debug, Clone)]
pub struct Layer {
    neurons: Vec<Neuron>,
    input_size: usize,
    schedule: Schedule,
}

impl Layer {
    /// Creates a layer mapping `input_size` values to `output_size` values.
    ///
    /// Every neuron draws its own random parameters from `rng`.
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        optimizer: &OptimizerSettings,
        rng: &mut R,
    ) -> NetworkResult<Self> {
        if input_size == 0 {
            return Err(NetworkError::invalid_config(
                "layer.input_size",
                input_size,
                "a layer needs at least one input",
            ));
        }
        let neurons = (0..output_size)
            .map(|_| Neuron::new(input_size, activation, optimizer, rng))
            .collect();
        Self::from_neurons(neurons, Schedule::default())
    }

    /// Assembles a layer from existing neurons, which must share one width.
    pub fn from_neurons(neurons: Vec<Neuron>, schedule: Schedule) -> NetworkResult<Self> {
        let input_size = match neurons.first() {
            Some(first) => first.size(),
            None => {
                return Err(NetworkError::invalid_config(
                    "layer.output_size",
                    0,
                    "a layer needs at least one neuron",
                ))
            }
        };

        if input_size == 0 {
            return Err(NetworkError::invalid_config(
                "layer.input_size",
                0,
                "a layer needs at least one input",
            ));
        }

        if let Some(odd) = neurons.iter().find(|neuron| neuron.size() != input_size) {
            return Err(NetworkError::dimension_mismatch(
                input_size,
                odd.size(),
                "neuron width within layer",
            ));
        }

        Ok(Self {
            neurons,
            input_size,
            schedule,
        })
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn set_schedule(&mut self, schedule: Schedule) {
        self.schedule = schedule;
    }

    /// Evaluates every neuron on `inputs`, in neuron order.
    pub fn predict(&mut self, inputs: ArrayView1<'_, Scalar>) -> NetworkResult<Vector> {
        NetworkError::check_width(self.input_size, inputs.len(), "layer input")?;

        let outputs: Vec<Scalar> = match self.schedule {
            Schedule::Parallel => self
                .neurons
                .par_iter_mut()
                .map(|neuron| neuron.predict(inputs))
                .collect(),
            Schedule::Sequential => self
                .neurons
                .iter_mut()
                .map(|neuron| neuron.predict(inputs))
                .collect(),
        };

        Ok(Vector::from(outputs))
    }

    /// Backward pass: neuron `j` receives `gradients[j]`.
    ///
    /// Returns the sum of every neuron's propagated signal, always
    /// `inputs.len()` wide, ready to be fed to the previous layer.
    pub fn update(
        &mut self,
        inputs: ArrayView1<'_, Scalar>,
        gradients: ArrayView1<'_, Scalar>,
    ) -> NetworkResult<Vector> {
        NetworkError::check_width(self.input_size, inputs.len(), "layer input")?;
        NetworkError::check_width(self.output_size(), gradients.len(), "layer gradient")?;

        let gradients = gradients.to_vec();
        let propagated: Vec<Vector> = match self.schedule {
            Schedule::Parallel => self
                .neurons
                .par_iter_mut()
                .zip(gradients.par_iter())
                .map(|(neuron, &gradient)| neuron.update(inputs, gradient))
                .collect(),
            Schedule::Sequential => self
                .neurons
                .iter_mut()
                .zip(gradients.iter())
                .map(|(neuron, &gradient)| neuron.update(inputs, gradient))
                .collect(),
        };

        // Summed in neuron order so the result does not depend on thread timing.
        Ok(propagated
            .into_iter()
            .fold(Vector::zeros(self.input_size), |acc, signal| acc + signal))
    }

    /// Forgets the recurrent state of every neuron.
    pub fn reset(&mut self) {
        self.neurons.iter_mut().for_each(Neuron::reset);
    }

    pub fn reset_optimizer_state(&mut self) {
        self.neurons
            .iter_mut()
            .for_each(Neuron::reset_optimizer_state);
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.neurons.len()
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    /// Mutable access to the neurons; the layer's width cannot change through it.
    pub fn neurons_mut(&mut self) -> &mut [Neuron] {
        &mut self.neurons
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layer(input_size: usize, output_size: usize, seed: u64) -> Layer {
        let mut rng = StdRng::seed_from_u64(seed);
        Layer::new(
            input_size,
            output_size,
            Activation::Tanh,
            &OptimizerSettings::adam(),
            &mut rng,
        )
        .expect("valid layer")
    }

    #[test]
    fn test_layer_creation() {
        let layer = layer(8, 3, 42);
        assert_eq!(layer.input_size(), 8);
        assert_eq!(layer.output_size(), 3);
        assert_eq!(layer.schedule(), Schedule::Parallel);
    }

    #[test]
    fn test_neurons_are_initialized_independently() {
        let layer = layer(4, 2, 42);
        assert_ne!(layer.neurons()[0].weights(), layer.neurons()[1].weights());
    }

    #[test]
    fn test_forward_pass_width() {
        let mut layer = layer(4, 6, 1);
        let output = layer.predict(array![0.1, 0.2, 0.3, 0.4].view()).unwrap();
        assert_eq!(output.len(), 6);
        assert!(output.iter().all(|y| (-1.0..=1.0).contains(y)));
    }

    #[test]
    fn test_gradient_width_matches_inputs() {
        for (input_size, output_size) in [(1, 1), (3, 1), (1, 7), (8, 8), (5, 12)] {
            let mut layer = layer(input_size, output_size, 9);
            let inputs = Vector::from_elem(input_size, 0.5);
            layer.predict(inputs.view()).unwrap();
            let gradients = Vector::from_elem(output_size, 0.1);
            let propagated = layer.update(inputs.view(), gradients.view()).unwrap();
            assert_eq!(propagated.len(), input_size);
        }
    }

    #[test]
    fn test_gradient_is_sum_of_neuron_signals() {
        let mut layer = layer(3, 2, 5);
        let inputs = array![0.2, -0.4, 0.6];
        let gradients = array![0.5, -1.0];

        let mut expected_layer = layer.clone();
        let mut expected = Vector::zeros(3);
        for (neuron, &gradient) in expected_layer.neurons_mut().iter_mut().zip(gradients.iter()) {
            neuron.predict(inputs.view());
            expected = expected + neuron.update(inputs.view(), gradient);
        }

        layer.predict(inputs.view()).unwrap();
        let propagated = layer.update(inputs.view(), gradients.view()).unwrap();
        assert_eq!(propagated, expected);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let mut parallel = layer(8, 16, 3);
        let mut sequential = parallel.clone().with_schedule(Schedule::Sequential);
        let inputs = Vector::linspace(-1.0, 1.0, 8);
        let gradients = Vector::linspace(0.5, -0.5, 16);

        for _ in 0..5 {
            assert_eq!(
                parallel.predict(inputs.view()).unwrap(),
                sequential.predict(inputs.view()).unwrap()
            );
            assert_eq!(
                parallel.update(inputs.view(), gradients.view()).unwrap(),
                sequential.update(inputs.view(), gradients.view()).unwrap()
            );
        }
    }

    #[test]
    fn test_dimension_mismatch_leaves_state_untouched() {
        let mut layer = layer(4, 2, 11);
        let before = layer.neurons()[0].weights().to_owned();

        let err = layer.predict(array![1.0, 2.0].view()).unwrap_err();
        assert_eq!(err, NetworkError::dimension_mismatch(4, 2, "layer input"));

        let inputs = Vector::zeros(4);
        let err = layer
            .update(inputs.view(), array![1.0, 2.0, 3.0].view())
            .unwrap_err();
        assert_eq!(err, NetworkError::dimension_mismatch(2, 3, "layer gradient"));
        assert_eq!(layer.neurons()[0].weights(), before.view());
    }

    #[test]
    fn test_reset_clears_every_neuron() {
        let mut layer = layer(2, 3, 13);
        layer.predict(array![1.0, -1.0].view()).unwrap();
        layer.reset();
        assert!(layer.neurons().iter().all(|n| n.previous_output() == 0.0));
    }

    #[test]
    fn test_from_neurons_rejects_mixed_widths() {
        let mut rng = StdRng::seed_from_u64(0);
        let settings = OptimizerSettings::adam();
        let neurons = vec![
            Neuron::new(3, Activation::Tanh, &settings, &mut rng),
            Neuron::new(4, Activation::Tanh, &settings, &mut rng),
        ];
        assert!(matches!(
            Layer::from_neurons(neurons, Schedule::Sequential),
            Err(NetworkError::DimensionMismatch { expected: 3, got: 4, .. })
        ));
        assert!(Layer::from_neurons(Vec::new(), Schedule::Sequential).is_err());
    }
}
