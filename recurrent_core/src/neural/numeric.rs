//! Scalar/vector aliases and the small numeric helpers shared by the engine.

use ndarray::{Array1, ArrayView1};
use rand::Rng;

/// Every quantity in the engine is single precision.
pub type Scalar = f32;

/// Fixed-length vector of scalars flowing between layers.
pub type Vector = Array1<Scalar>;

/// Dot product of two equal-length vectors.
///
/// # Panics
///
/// Panics if the lengths differ; callers validate widths first.
///
/// # Examples
///
/// ```
/// use ndarray::array;
/// use recurrent_core::neural::dot;
///
/// assert_eq!(dot(array![1.0, 2.0, 3.0].view(), array![4.0, 5.0, 6.0].view()), 32.0);
/// ```
pub fn dot(a: ArrayView1<'_, Scalar>, b: ArrayView1<'_, Scalar>) -> Scalar {
    a.dot(&b)
}

/// Draws a value uniformly from `[-1, 1]`.
pub fn random_scalar<R: Rng + ?Sized>(rng: &mut R) -> Scalar {
    rng.gen_range(-1.0..=1.0)
}

/// Builds a vector of `len` values drawn uniformly from `[-1, 1]`.
pub fn random_vector<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vector {
    Array1::from_shape_fn(len, |_| random_scalar(rng))
}
