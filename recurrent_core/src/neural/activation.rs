//! Activation functions evaluated by each neuron.

use serde::{Deserialize, Serialize};

use super::numeric::Scalar;

/// Logistic sigmoid, shared by several variants.
fn logistic(x: Scalar) -> Scalar {
    1.0 / (1.0 + (-x).exp())
}

/// Activation applied to a neuron's weighted sum.
///
/// Each variant is a stateless `(activate, derivative)` pair. Both take the
/// pre-activation sum `x`, not the activated output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    /// `1 / (1 + e^-x)`
    Sigmoid,
    /// Hyperbolic tangent
    #[default]
    Tanh,
    /// `ln(1 + e^x)`
    Softplus,
    /// `x / (1 + e^-x)`
    Swish,
}

impl Activation {
    pub fn activate(self, x: Scalar) -> Scalar {
        match self {
            Activation::Sigmoid => logistic(x),
            Activation::Tanh => x.tanh(),
            // ln(1 + e^x) rewritten so e^x never overflows.
            Activation::Softplus => x.max(0.0) + (-x.abs()).exp().ln_1p(),
            Activation::Swish => x * logistic(x),
        }
    }

    /// Slope used by backpropagation at pre-activation `x`.
    ///
    /// The swish slope is `x + σ(x)(1 - x)`, which differs from the analytic
    /// derivative `σ(x)(1 + x(1 - σ(x)))`. Trained checkpoints depend on it.
    pub fn derivative(self, x: Scalar) -> Scalar {
        match self {
            Activation::Sigmoid => {
                let y = logistic(x);
                y * (1.0 - y)
            }
            Activation::Tanh => {
                let y = x.tanh();
                1.0 - y * y
            }
            Activation::Softplus => logistic(x),
            Activation::Swish => {
                let sig = logistic(x);
                x + sig * (1.0 - x)
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Softplus => "softplus",
            Activation::Swish => "swish",
        }
    }
}

impl std::str::FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(Activation::Sigmoid),
            "tanh" => Ok(Activation::Tanh),
            "softplus" => Ok(Activation::Softplus),
            "swish" => Ok(Activation::Swish),
            other => Err(format!(
                "unknown activation '{other}' (expected sigmoid, tanh, softplus or swish)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Activation; 4] = [
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::Softplus,
        Activation::Swish,
    ];

    #[test]
    fn test_sigmoid_at_zero() {
        assert!((Activation::Sigmoid.activate(0.0) - 0.5).abs() < 1e-6);
        assert!((Activation::Sigmoid.derivative(0.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_tanh_at_zero() {
        assert_eq!(Activation::Tanh.activate(0.0), 0.0);
        assert!((Activation::Tanh.derivative(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_softplus() {
        assert!((Activation::Softplus.activate(0.0) - std::f32::consts::LN_2).abs() < 1e-6);
        // Slope is the logistic function of the input.
        assert!((Activation::Softplus.derivative(0.0) - 0.5).abs() < 1e-6);
        assert!((Activation::Softplus.derivative(2.0) - Activation::Sigmoid.activate(2.0)).abs() < 1e-6);
    }

    #[test]
    fn test_swish_keeps_legacy_slope() {
        assert_eq!(Activation::Swish.activate(0.0), 0.0);
        assert!((Activation::Swish.activate(1.0) - 0.731_058_6).abs() < 1e-5);
        // x + σ(x)(1 - x) at x = 2: 2 + 0.880797 * -1
        assert!((Activation::Swish.derivative(2.0) - 1.119_203).abs() < 1e-5);
    }

    #[test]
    fn test_finite_for_large_inputs() {
        for activation in ALL {
            for x in [-1000.0, -100.0, -80.0, -10.0, 10.0, 80.0, 100.0, 1000.0] {
                assert!(activation.activate(x).is_finite(), "{activation:?} at {x}");
                assert!(activation.derivative(x).is_finite(), "{activation:?}' at {x}");
            }
        }
    }

    #[test]
    fn test_softplus_is_linear_for_large_inputs() {
        assert_eq!(Activation::Softplus.activate(100.0), 100.0);
        assert!((Activation::Softplus.activate(89.0) - 89.0).abs() < 1e-4);
        assert!(Activation::Softplus.activate(-100.0) >= 0.0);
        assert!((Activation::Softplus.activate(-2.0) - 0.126_928).abs() < 1e-5);
    }

    #[test]
    fn test_parse_names() {
        for activation in ALL {
            assert_eq!(activation.name().parse::<Activation>(), Ok(activation));
        }
        assert_eq!(" TANH ".parse::<Activation>(), Ok(Activation::Tanh));
        assert!("relu".parse::<Activation>().is_err());
    }
}
