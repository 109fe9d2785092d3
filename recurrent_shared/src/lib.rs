//! Recurrent Shared Library
//!
//! Shared types and utilities for the recurrent network workspace.
//!
//! This library provides:
//! - A byte ⇄ ±1 bit-vector codec used to turn text into training samples
//! - Text ⇄ vector-sequence helpers and the end-of-sequence marker

pub mod codec;

pub use codec::{
    decode_byte, decode_text, encode_byte, encode_text, end_marker, CodecError, BYTE_WIDTH,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
