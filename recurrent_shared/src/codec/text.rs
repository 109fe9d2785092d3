//! Text ⇄ vector-sequence helpers built on the byte codec.

use ndarray::Array1;

use super::{decode_byte, encode_byte, CodecError};

/// Vector used to pad sequences and to mark their end (the encoding of `0`).
pub fn end_marker() -> Array1<f32> {
    encode_byte(0)
}

/// Encodes each byte of `text` as one vector.
pub fn encode_text(text: &str) -> Vec<Array1<f32>> {
    text.bytes().map(encode_byte).collect()
}

/// Decodes a vector sequence back into text.
///
/// Invalid UTF-8 produced by an untrained network is replaced rather than rejected.
pub fn decode_text(vectors: &[Array1<f32>]) -> Result<String, CodecError> {
    let bytes = vectors
        .iter()
        .map(|vector| decode_byte(vector.view()))
        .collect::<Result<Vec<u8>, _>>()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
