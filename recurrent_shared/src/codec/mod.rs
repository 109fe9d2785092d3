//! Bit-vector codec for feeding bytes through a recurrent network.
//!
//! A byte becomes [`BYTE_WIDTH`] signed values, one per bit, least-significant
//! bit first: a set bit maps to `+1.0`, a clear bit to `-1.0`. Decoding reads a
//! bit as set when its value is strictly positive, so network outputs that only
//! lean towards the right sign still decode to the intended byte.

pub mod text;

use std::fmt;

use ndarray::{Array1, ArrayView1};

pub use text::{decode_text, encode_text, end_marker};

/// Number of vector entries produced per byte.
pub const BYTE_WIDTH: usize = 8;

/// Value written for a set bit.
pub const HIGH: f32 = 1.0;
/// Value written for a clear bit.
pub const LOW: f32 = -1.0;

/// Errors raised while decoding vectors back into bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum CodecError {
    /// The vector does not hold exactly one entry per bit.
    WidthMismatch { expected: usize, got: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::WidthMismatch { expected, got } => write!(
                f,
                "Cannot decode vector of width {} (expected {})",
                got, expected
            ),
        }
    }
}

impl std::error::Error for CodecError {}

/// Encodes one byte as a ±1 vector, least-significant bit first.
///
/// # Examples
///
/// ```
/// use recurrent_shared::codec::encode_byte;
///
/// let v = encode_byte(0b0000_0101);
/// assert_eq!(v.to_vec(), vec![1.0, -1.0, 1.0, -1.0, -1.0, -1.0, -1.0, -1.0]);
/// ```
pub fn encode_byte(value: u8) -> Array1<f32> {
    Array1::from_iter((0..BYTE_WIDTH).map(|bit| if value >> bit & 1 == 1 { HIGH } else { LOW }))
}

/// Decodes a ±1 vector back into a byte.
pub fn decode_byte(vector: ArrayView1<'_, f32>) -> Result<u8, CodecError> {
    if vector.len() != BYTE_WIDTH {
        return Err(CodecError::WidthMismatch {
            expected: BYTE_WIDTH,
            got: vector.len(),
        });
    }

    Ok(vector
        .iter()
        .enumerate()
        .filter(|(_, value)| **value > 0.0)
        .fold(0u8, |byte, (bit, _)| byte | (1 << bit)))
}
