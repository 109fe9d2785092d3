//! Training data for recurrent networks.

pub mod sequence;

pub use sequence::{DatasetError, SequenceDataset, SequencePair};
