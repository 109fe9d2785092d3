//! Per-parameter optimizers for training recurrent neurons.
//!
//! Every learnable scalar in a neuron owns its own optimizer instance, so the
//! state here is scalar: one first moment, one second moment and the running
//! decay powers used for bias correction.
//!
//! Updates *add* the scaled step to the parameter. The engine feeds
//! `target - output` style error signals, so adding the step moves the
//! parameter downhill on the squared error.

use serde::{Deserialize, Serialize};

use super::error::{NetworkError, NetworkResult};
use super::numeric::Scalar;

/// Capability shared by all parameter optimizers.
pub trait Optimizer {
    /// Applies one step for `gradient` to `parameter` in place.
    fn update(&mut self, parameter: &mut Scalar, gradient: Scalar);

    /// Clears accumulated state so the next update behaves like the first.
    fn reset(&mut self);
}

/// Hyperparameters selecting and configuring an optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum OptimizerSettings {
    /// Adaptive moment estimation
    Adam {
        speed: Scalar,
        beta1: Scalar,
        beta2: Scalar,
    },
    /// Fixed-step updates: `parameter += speed * gradient`
    Sgd { speed: Scalar },
}

pub(crate) fn default_adam_speed() -> Scalar {
    0.001
}

pub(crate) fn default_beta1() -> Scalar {
    0.9
}

pub(crate) fn default_beta2() -> Scalar {
    0.999
}

pub(crate) fn default_sgd_speed() -> Scalar {
    0.0001
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self::adam()
    }
}

impl OptimizerSettings {
    /// Adam with `speed = 0.001`, `beta1 = 0.9`, `beta2 = 0.999`.
    pub fn adam() -> Self {
        OptimizerSettings::Adam {
            speed: default_adam_speed(),
            beta1: default_beta1(),
            beta2: default_beta2(),
        }
    }

    /// Fixed-step optimizer with `speed = 0.0001`.
    pub fn sgd() -> Self {
        OptimizerSettings::Sgd {
            speed: default_sgd_speed(),
        }
    }

    pub fn speed(&self) -> Scalar {
        match *self {
            OptimizerSettings::Adam { speed, .. } | OptimizerSettings::Sgd { speed } => speed,
        }
    }

    /// Checks that the hyperparameters describe a usable optimizer.
    pub fn validate(&self) -> NetworkResult<()> {
        let speed = self.speed();
        if !speed.is_finite() || speed <= 0.0 {
            return Err(NetworkError::invalid_config(
                "optimizer.speed",
                speed,
                "must be a positive finite number",
            ));
        }

        if let OptimizerSettings::Adam { beta1, beta2, .. } = *self {
            for (name, beta) in [("optimizer.beta1", beta1), ("optimizer.beta2", beta2)] {
                if !(0.0..1.0).contains(&beta) {
                    return Err(NetworkError::invalid_config(name, beta, "must lie in [0, 1)"));
                }
            }
        }

        Ok(())
    }

    /// Creates a fresh optimizer with zeroed state.
    pub fn build(&self) -> ParameterOptimizer {
        match *self {
            OptimizerSettings::Adam {
                speed,
                beta1,
                beta2,
            } => ParameterOptimizer::Adam(AdamOptimizer::new(speed, beta1, beta2)),
            OptimizerSettings::Sgd { speed } => ParameterOptimizer::Sgd(SgdOptimizer::new(speed)),
        }
    }
}

/// Fixed-step optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct SgdOptimizer {
    /// Step size
    pub speed: Scalar,
}

impl SgdOptimizer {
    pub fn new(speed: Scalar) -> Self {
        Self { speed }
    }
}

impl Optimizer for SgdOptimizer {
    fn update(&mut self, parameter: &mut Scalar, gradient: Scalar) {
        *parameter += self.speed * gradient;
    }

    fn reset(&mut self) {}
}

/// Adam optimizer (Adaptive Moment Estimation) for a single scalar.
///
/// Implements:
/// ```text
/// m = b1 * m + (1 - b1) * g
/// v = b2 * v + (1 - b2) * g²
/// parameter += speed * m̂ / (sqrt(v̂) + ε)
/// ```
/// with `m̂ = m / (1 - b1^t)`, `v̂ = v / (1 - b2^t)` and `ε = f32::EPSILON`.
#[derive(Debug, Clone, PartialEq)]
pub struct AdamOptimizer {
    /// Step size
    pub speed: Scalar,
    /// Exponential decay rate for the first moment
    pub beta1: Scalar,
    /// Exponential decay rate for the second moment
    pub beta2: Scalar,
    /// First moment estimate (mean of gradients)
    m: Scalar,
    /// Second moment estimate (uncentered variance of gradients)
    v: Scalar,
    /// `beta1^t`
    beta1_pow: Scalar,
    /// `beta2^t`
    beta2_pow: Scalar,
}

impl AdamOptimizer {
    pub fn new(speed: Scalar, beta1: Scalar, beta2: Scalar) -> Self {
        Self {
            speed,
            beta1,
            beta2,
            m: 0.0,
            v: 0.0,
            beta1_pow: 1.0,
            beta2_pow: 1.0,
        }
    }

    pub fn first_moment(&self) -> Scalar {
        self.m
    }

    pub fn second_moment(&self) -> Scalar {
        self.v
    }

    /// Running powers `(beta1^t, beta2^t)`.
    pub fn decay_powers(&self) -> (Scalar, Scalar) {
        (self.beta1_pow, self.beta2_pow)
    }
}

impl Default for AdamOptimizer {
    fn default() -> Self {
        Self::new(default_adam_speed(), default_beta1(), default_beta2())
    }
}

impl Optimizer for AdamOptimizer {
    fn update(&mut self, parameter: &mut Scalar, gradient: Scalar) {
        self.m = self.beta1 * self.m + (1.0 - self.beta1) * gradient;
        self.v = self.beta2 * self.v + (1.0 - self.beta2) * gradient * gradient;

        self.beta1_pow *= self.beta1;
        self.beta2_pow *= self.beta2;

        let m_hat = self.m / (1.0 - self.beta1_pow);
        let v_hat = self.v / (1.0 - self.beta2_pow);

        *parameter += self.speed * m_hat / (v_hat.sqrt() + Scalar::EPSILON);
    }

    fn reset(&mut self) {
        self.m = 0.0;
        self.v = 0.0;
        self.beta1_pow = 1.0;
        self.beta2_pow = 1.0;
    }
}

/// Optimizer stored next to each learnable scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterOptimizer {
    Adam(AdamOptimizer),
    Sgd(SgdOptimizer),
}

impl Optimizer for ParameterOptimizer {
    fn update(&mut self, parameter: &mut Scalar, gradient: Scalar) {
        match self {
            ParameterOptimizer::Adam(adam) => adam.update(parameter, gradient),
            ParameterOptimizer::Sgd(sgd) => sgd.update(parameter, gradient),
        }
    }

    fn reset(&mut self) {
        match self {
            ParameterOptimizer::Adam(adam) => adam.reset(),
            ParameterOptimizer::Sgd(sgd) => sgd.reset(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adam_first_step_is_speed() {
        let mut adam = AdamOptimizer::default();
        let mut param = 0.0;
        adam.update(&mut param, 1.0);
        // m̂ = v̂ = 1 after one step
        assert!((param - 0.001).abs() < 1e-6);
    }

    #[test]
    fn test_adam_constant_gradient_is_deterministic_and_positive() {
        let run = || {
            let mut adam = AdamOptimizer::new(0.001, 0.9, 0.999);
            let mut param = 0.0;
            (0..50)
                .map(|_| {
                    let before = param;
                    adam.update(&mut param, 1.0);
                    param - before
                })
                .collect::<Vec<_>>()
        };

        let first = run();
        assert_eq!(first, run());
        assert!(first.iter().all(|&step| step > 0.0));
    }

    #[test]
    fn test_adam_moments_and_powers() {
        let mut adam = AdamOptimizer::default();
        let mut param = 0.0;
        adam.update(&mut param, 2.0);
        assert!((adam.first_moment() - 0.2).abs() < 1e-6);
        assert!((adam.second_moment() - 0.004).abs() < 1e-6);
        let (b1_pow, b2_pow) = adam.decay_powers();
        assert!((b1_pow - 0.9).abs() < 1e-6);
        assert!((b2_pow - 0.999).abs() < 1e-6);
    }

    #[test]
    fn test_adam_reset_restores_first_step() {
        let mut adam = AdamOptimizer::default();
        let mut param = 0.0;
        for _ in 0..10 {
            adam.update(&mut param, -3.0);
        }
        adam.reset();
        assert_eq!(adam, AdamOptimizer::default());

        let mut fresh = 0.0;
        adam.update(&mut fresh, 1.0);
        assert!((fresh - 0.001).abs() < 1e-6);
    }

    #[test]
    fn test_sgd_step() {
        let mut sgd = SgdOptimizer::new(0.5);
        let mut param = 1.0;
        sgd.update(&mut param, 2.0);
        assert_eq!(param, 2.0);
    }

    #[test]
    fn test_settings_build_matching_optimizer() {
        assert!(matches!(
            OptimizerSettings::adam().build(),
            ParameterOptimizer::Adam(_)
        ));
        assert!(matches!(
            OptimizerSettings::sgd().build(),
            ParameterOptimizer::Sgd(SgdOptimizer { speed }) if speed == 0.0001
        ));
    }

    #[test]
    fn test_settings_validation() {
        assert!(OptimizerSettings::default().validate().is_ok());
        assert!(OptimizerSettings::Sgd { speed: 0.0 }.validate().is_err());
        assert!(OptimizerSettings::Adam {
            speed: 0.01,
            beta1: 1.0,
            beta2: 0.999
        }
        .validate()
        .is_err());
    }
}
