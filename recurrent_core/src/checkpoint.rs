//! Versioned binary snapshots.
//!
//! A checkpoint file is a `u32` schema version followed by the snapshot
//! payload, both written with one bincode configuration (fixed-width integers,
//! little endian). The version is read and checked before the payload is
//! decoded, so files from another schema fail with
//! [`CheckpointError::VersionMismatch`] instead of a decoding error.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::neural::NetworkError;

#[derive(Debug)]
pub enum CheckpointError {
    Io(std::io::Error),
    /// The payload could not be encoded or decoded.
    Serialization(bincode::Error),
    /// The file was written by a different schema version.
    VersionMismatch { expected: u32, found: u32 },
    /// The payload decoded but describes an impossible structure.
    InvalidFormat(String),
    /// The stored parameters were rejected while rebuilding the network.
    Network(NetworkError),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckpointError::Io(err) => write!(f, "Checkpoint I/O failed: {err}"),
            CheckpointError::Serialization(err) => write!(f, "Checkpoint codec error: {err}"),
            CheckpointError::VersionMismatch { expected, found } => write!(
                f,
                "Checkpoint version mismatch: expected {expected}, found {found}"
            ),
            CheckpointError::InvalidFormat(msg) => write!(f, "Malformed checkpoint: {msg}"),
            CheckpointError::Network(err) => write!(f, "Failed to rebuild network: {err}"),
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CheckpointError::Io(err) => Some(err),
            CheckpointError::Serialization(err) => Some(err.as_ref()),
            CheckpointError::Network(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CheckpointError {
    fn from(err: std::io::Error) -> Self {
        CheckpointError::Io(err)
    }
}

impl From<bincode::Error> for CheckpointError {
    fn from(err: bincode::Error) -> Self {
        CheckpointError::Serialization(err)
    }
}

impl From<NetworkError> for CheckpointError {
    fn from(err: NetworkError) -> Self {
        CheckpointError::Network(err)
    }
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .with_little_endian()
}

/// Writes `version` followed by `payload` to `path`, creating parent directories.
pub(crate) fn write_versioned<T: Serialize>(
    version: u32,
    payload: &T,
    path: &Path,
) -> Result<(), CheckpointError> {
    if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    codec().serialize_into(&mut writer, &version)?;
    codec().serialize_into(&mut writer, payload)?;
    writer.flush()?;
    Ok(())
}

/// Reads a payload written by [`write_versioned`], rejecting other versions
/// before touching the payload bytes.
pub(crate) fn read_versioned<T: DeserializeOwned>(
    expected: u32,
    path: &Path,
) -> Result<T, CheckpointError> {
    let mut reader = BufReader::new(File::open(path)?);
    let found: u32 = codec().deserialize_from(&mut reader)?;
    if found != expected {
        return Err(CheckpointError::VersionMismatch { expected, found });
    }
    Ok(codec().deserialize_from(&mut reader)?)
}

/// Types persisted through a serializable snapshot.
///
/// Implementors describe the conversion to and from their snapshot; saving
/// and loading (including the version header) is shared.
pub trait Checkpointable: Sized {
    /// Schema version stored ahead of every snapshot.
    const CHECKPOINT_VERSION: u32;

    type Snapshot: Serialize + DeserializeOwned;

    fn to_snapshot(&self) -> Self::Snapshot;

    /// Rebuilds the value, validating what the codec cannot.
    fn from_snapshot(snapshot: Self::Snapshot) -> Result<Self, CheckpointError>;

    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let path = path.as_ref();
        write_versioned(Self::CHECKPOINT_VERSION, &self.to_snapshot(), path)?;
        tracing::info!(path = %path.display(), "saved checkpoint");
        Ok(())
    }

    fn load_checkpoint<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let path = path.as_ref();
        let snapshot = read_versioned(Self::CHECKPOINT_VERSION, path)?;
        let value = Self::from_snapshot(snapshot)?;
        tracing::info!(path = %path.display(), "loaded checkpoint");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("recurrent_checkpoint_{}.bin", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_header_precedes_fixed_width_payload() {
        let path = temp_path();
        write_versioned(3, &vec![1.5f32], &path).unwrap();
        let bytes = fs::read(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(&bytes[..4], &3u32.to_le_bytes());
        assert_eq!(&bytes[4..12], &1u64.to_le_bytes());
        assert_eq!(&bytes[12..], &1.5f32.to_le_bytes());
    }

    #[test]
    fn test_version_checked_before_payload() {
        let path = temp_path();
        // A payload the reader could not decode as `Vec<f32>`.
        write_versioned(9, &u8::MAX, &path).unwrap();
        let result = read_versioned::<Vec<f32>>(1, &path);
        fs::remove_file(&path).ok();

        assert!(matches!(
            result,
            Err(CheckpointError::VersionMismatch { expected: 1, found: 9 })
        ));
    }

    #[test]
    fn test_truncated_payload_is_codec_error() {
        let path = temp_path();
        write_versioned(1, &(), &path).unwrap();
        let result = read_versioned::<Vec<f32>>(1, &path);
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(CheckpointError::Serialization(_))));
    }

    #[test]
    fn test_error_display() {
        let err = CheckpointError::VersionMismatch {
            expected: 1,
            found: 7,
        };
        assert!(err.to_string().contains("expected 1, found 7"));

        let err = CheckpointError::from(NetworkError::invalid_config("input_width", 0, "bad"));
        assert!(err.to_string().contains("input_width"));
    }
}
