//! Scalar neuron with a learned self-feedback connection.

use ndarray::{ArrayView1, ArrayViewMut1};
use rand::Rng;

use super::activation::Activation;
use super::numeric::{dot, random_scalar, random_vector, Scalar, Vector};
use super::optimizer::{Optimizer, OptimizerSettings, ParameterOptimizer};

/// A single recurrent unit.
///
/// The unit sees its own previous output as an extra input weighted by
/// `feedback_weight`:
///
/// ```text
/// sum    = inputs · weights + bias + previous_output * feedback_weight
/// output = activation(sum)
/// ```
///
/// Each learnable scalar (every weight, the bias and the feedback weight) has
/// its own optimizer.
#[derive(Debug, Clone)]
pub struct Neuron {
    weights: Vector,
    bias: Scalar,
    feedback_weight: Scalar,
    activation: Activation,
    weight_optimizers: Vec<ParameterOptimizer>,
    bias_optimizer: ParameterOptimizer,
    feedback_optimizer: ParameterOptimizer,
    /// Weighted sum from the last `predict`, consumed by `update`
    sum: Scalar,
    /// Recurrent input that entered `sum`
    feedback_input: Scalar,
    /// Output of the last `predict`; fed back on the next one
    previous_output: Scalar,
}

impl Neuron {
    /// Creates a neuron with `size` inputs and weights, bias and feedback
    /// weight drawn uniformly from `[-1, 1]`.
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        activation: Activation,
        optimizer: &OptimizerSettings,
        rng: &mut R,
    ) -> Self {
        let weights = random_vector(rng, size);
        let bias = random_scalar(rng);
        let feedback_weight = random_scalar(rng);
        Self::from_parameters(weights, bias, feedback_weight, activation, optimizer)
    }

    /// Creates a neuron from explicit parameters with fresh optimizer state.
    pub fn from_parameters(
        weights: Vector,
        bias: Scalar,
        feedback_weight: Scalar,
        activation: Activation,
        optimizer: &OptimizerSettings,
    ) -> Self {
        Self {
            weight_optimizers: (0..weights.len()).map(|_| optimizer.build()).collect(),
            bias_optimizer: optimizer.build(),
            feedback_optimizer: optimizer.build(),
            weights,
            bias,
            feedback_weight,
            activation,
            sum: 0.0,
            feedback_input: 0.0,
            previous_output: 0.0,
        }
    }

    /// Forward pass for one time step.
    ///
    /// Advances the recurrent state: the returned output becomes the
    /// feedback input of the next call.
    ///
    /// # Panics
    ///
    /// Panics if `inputs.len() != self.size()`.
    pub fn predict(&mut self, inputs: ArrayView1<'_, Scalar>) -> Scalar {
        assert_eq!(inputs.len(), self.size(), "neuron input width mismatch");

        self.feedback_input = self.previous_output;
        self.sum = dot(inputs, self.weights.view())
            + self.bias
            + self.feedback_input * self.feedback_weight;
        let output = self.activation.activate(self.sum);
        self.previous_output = output;
        output
    }

    /// Backward pass for the step computed by the last `predict`.
    ///
    /// `gradient` is the error signal arriving at this neuron's output. Returns
    /// the signal propagated to each input (`local_gradient * weights`, taken
    /// before the weights move) and updates every parameter through its
    /// optimizer.
    ///
    /// # Panics
    ///
    /// Panics if `inputs.len() != self.size()`.
    pub fn update(&mut self, inputs: ArrayView1<'_, Scalar>, gradient: Scalar) -> Vector {
        assert_eq!(inputs.len(), self.size(), "neuron input width mismatch");

        let local = gradient * self.activation.derivative(self.sum);
        let propagated = &self.weights * local;

        for ((weight, optimizer), &input) in self
            .weights
            .iter_mut()
            .zip(self.weight_optimizers.iter_mut())
            .zip(inputs.iter())
        {
            optimizer.update(weight, local * input);
        }
        self.bias_optimizer.update(&mut self.bias, local);
        self.feedback_optimizer
            .update(&mut self.feedback_weight, local * self.feedback_input);

        propagated
    }

    /// Forgets the recurrent state. Parameters and optimizer state are kept.
    ///
    /// The cached step from the last `predict` survives, so a following
    /// `update` still trains against what actually entered the sum.
    pub fn reset(&mut self) {
        self.previous_output = 0.0;
    }

    /// Clears the optimizer state of every parameter.
    pub fn reset_optimizer_state(&mut self) {
        self.weight_optimizers
            .iter_mut()
            .for_each(|optimizer| optimizer.reset());
        self.bias_optimizer.reset();
        self.feedback_optimizer.reset();
    }

    /// Input width.
    pub fn size(&self) -> usize {
        self.weights.len()
    }

    pub fn weights(&self) -> ArrayView1<'_, Scalar> {
        self.weights.view()
    }

    /// Mutable view of the weights; the width cannot change through it.
    pub fn weights_mut(&mut self) -> ArrayViewMut1<'_, Scalar> {
        self.weights.view_mut()
    }

    pub fn bias(&self) -> Scalar {
        self.bias
    }

    pub fn set_bias(&mut self, bias: Scalar) {
        self.bias = bias;
    }

    pub fn feedback_weight(&self) -> Scalar {
        self.feedback_weight
    }

    pub fn set_feedback_weight(&mut self, feedback_weight: Scalar) {
        self.feedback_weight = feedback_weight;
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn previous_output(&self) -> Scalar {
        self.previous_output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fixed_neuron() -> Neuron {
        Neuron::from_parameters(
            array![0.5, -0.25],
            0.1,
            0.3,
            Activation::Tanh,
            &OptimizerSettings::adam(),
        )
    }

    #[test]
    fn test_random_initialization_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let neuron = Neuron::new(16, Activation::Tanh, &OptimizerSettings::adam(), &mut rng);
        assert_eq!(neuron.size(), 16);
        assert!(neuron.weights().iter().all(|w| (-1.0..=1.0).contains(w)));
        assert!((-1.0..=1.0).contains(&neuron.bias()));
        assert!((-1.0..=1.0).contains(&neuron.feedback_weight()));
    }

    #[test]
    fn test_predict_feeds_back_previous_output() {
        let mut neuron = fixed_neuron();
        let inputs = array![1.0, 2.0];

        // 0.5 - 0.5 + 0.1 with no history
        let first = neuron.predict(inputs.view());
        assert!((first - 0.1f32.tanh()).abs() < 1e-6);

        let second = neuron.predict(inputs.view());
        let expected = (0.1 + first * 0.3).tanh();
        assert!((second - expected).abs() < 1e-6);
        assert_eq!(neuron.previous_output(), second);
    }

    #[test]
    fn test_update_returns_scaled_weights() {
        let mut neuron = fixed_neuron();
        let inputs = array![1.0, 2.0];
        neuron.predict(inputs.view());

        let local = 2.0 * Activation::Tanh.derivative(0.1);
        let propagated = neuron.update(inputs.view(), 2.0);
        assert_eq!(propagated.len(), 2);
        assert!((propagated[0] - local * 0.5).abs() < 1e-6);
        assert!((propagated[1] + local * 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_update_moves_parameters_along_error() {
        let mut neuron = fixed_neuron();
        let inputs = array![1.0, 2.0];
        neuron.predict(inputs.view());
        neuron.update(inputs.view(), 1.0);

        // Positive error with positive inputs pushes weights and bias up by ~speed.
        assert!((neuron.weights()[0] - 0.501).abs() < 1e-5);
        assert!((neuron.weights()[1] + 0.249).abs() < 1e-5);
        assert!((neuron.bias() - 0.101).abs() < 1e-5);
        // No recurrent input entered the sum, so the feedback weight stays put.
        assert_eq!(neuron.feedback_weight(), 0.3);
    }

    #[test]
    fn test_feedback_gradient_uses_input_that_entered_sum() {
        let mut neuron = fixed_neuron();
        let inputs = array![0.0, 0.0];
        neuron.predict(inputs.view());
        neuron.predict(inputs.view());
        neuron.update(inputs.view(), 1.0);
        assert!(neuron.feedback_weight() > 0.3);
    }

    #[test]
    fn test_update_after_reset_uses_cached_feedback_input() {
        let mut neuron = fixed_neuron();
        let zeros = array![0.0, 0.0];
        neuron.predict(zeros.view());
        neuron.predict(zeros.view());
        neuron.reset();

        neuron.update(zeros.view(), 1.0);
        assert!(neuron.feedback_weight() > 0.3);
        assert_eq!(neuron.previous_output(), 0.0);
    }

    #[test]
    fn test_reset_clears_only_recurrent_state() {
        let mut neuron = fixed_neuron();
        let zeros = array![0.0, 0.0];
        let fresh = neuron.clone().predict(zeros.view());

        neuron.predict(array![5.0, -5.0].view());
        neuron.predict(array![3.0, 1.0].view());
        neuron.reset();

        assert_eq!(neuron.previous_output(), 0.0);
        assert_eq!(neuron.predict(zeros.view()), fresh);
        assert_eq!(neuron.bias(), 0.1);
    }

    #[test]
    fn test_accessors_write_parameters() {
        let mut neuron = fixed_neuron();
        neuron.weights_mut()[1] = 0.75;
        neuron.set_bias(-0.5);
        neuron.set_feedback_weight(0.0);
        assert_eq!(neuron.weights(), array![0.5, 0.75].view());
        assert_eq!(neuron.bias(), -0.5);
        assert_eq!(neuron.feedback_weight(), 0.0);
    }
}
