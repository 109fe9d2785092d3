//! Sequence training driver.
//!
//! Feeds [`SequenceDataset`] pairs through a [`Network`] one time step at a
//! time, repeating epochs until the mean error drops below a target.

use std::path::PathBuf;
use std::time::Instant;

use recurrent_shared::{decode_byte, end_marker, BYTE_WIDTH};
use serde::{Deserialize, Serialize};

use crate::data::{SequenceDataset, SequencePair};
use crate::logging;
use crate::neural::{Network, NetworkError, NetworkResult, Scalar, Vector};

/// Default cap on generated steps.
pub const DEFAULT_MAX_STEPS: usize = 32;

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Upper bound on the number of epochs
    pub max_epochs: usize,
    /// Training stops once the epoch error falls below this value
    pub target_error: Scalar,
    /// Clear recurrent state before every sequence
    pub reset_between_sequences: bool,
    /// Record (and log) every n-th epoch; `0` records only the last one
    pub log_every: usize,
    /// Shuffle pairs every epoch with this seed (offset by the epoch number)
    pub shuffle_seed: Option<u64>,
    /// Directory for JSON-lines logs; `None` disables file logging
    pub log_dir: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            max_epochs: 100_000,
            target_error: 0.01,
            reset_between_sequences: true,
            log_every: 1000,
            shuffle_seed: None,
            log_dir: None,
        }
    }
}

/// Error of a single epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    pub epoch: usize,
    pub error: Scalar,
    pub elapsed_ms: u128,
}

/// Complete training result
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    pub epochs_run: usize,
    pub final_error: Scalar,
    pub converged: bool,
    pub history: Vec<EpochMetrics>,
    pub total_elapsed_ms: u128,
}

/// Trains on every step of one pair.
///
/// Returns the summed step error divided by the target length (by one for an
/// empty target).
pub fn train_sequence(
    network: &mut Network,
    pair: &SequencePair,
    reset: bool,
) -> NetworkResult<Scalar> {
    if reset {
        network.reset();
    }

    let mut total = 0.0;
    for index in 0..pair.steps() {
        let (input, target) = pair.step(index);
        total += network.train(input.view(), target.view())?;
    }

    Ok(total / pair.target.len().max(1) as Scalar)
}

/// One pass over the dataset; returns the mean pair error.
pub fn train_epoch(
    network: &mut Network,
    dataset: &SequenceDataset,
    reset: bool,
) -> NetworkResult<Scalar> {
    if dataset.is_empty() {
        return Ok(0.0);
    }

    let mut total = 0.0;
    for pair in dataset {
        total += train_sequence(network, pair, reset)?;
    }
    Ok(total / dataset.len() as Scalar)
}

/// Repeats epochs until the error drops below `config.target_error` or
/// `config.max_epochs` have run.
pub fn train_until_converged(
    network: &mut Network,
    dataset: &SequenceDataset,
    config: &TrainingConfig,
) -> NetworkResult<TrainingReport> {
    tracing::info!(
        pairs = dataset.len(),
        max_epochs = config.max_epochs,
        target_error = config.target_error,
        "starting sequence training"
    );

    let start_time = Instant::now();
    let mut history = Vec::new();
    let mut shuffled = dataset.clone();
    let mut final_error = Scalar::INFINITY;
    let mut epochs_run = 0;
    let mut converged = false;

    for epoch in 0..config.max_epochs {
        let epoch_start = Instant::now();
        if let Some(seed) = config.shuffle_seed {
            shuffled.shuffle(seed.wrapping_add(epoch as u64));
        }

        let error = train_epoch(network, &shuffled, config.reset_between_sequences)?;
        epochs_run = epoch + 1;
        final_error = error;
        converged = error < config.target_error;

        if !error.is_finite() {
            tracing::warn!(epoch, "training error is no longer finite; stopping");
        }

        let is_last = converged || epochs_run == config.max_epochs || !error.is_finite();
        let scheduled = config.log_every > 0 && epoch % config.log_every == 0;
        if scheduled || is_last {
            let metrics = EpochMetrics {
                epoch,
                error,
                elapsed_ms: epoch_start.elapsed().as_millis(),
            };
            tracing::debug!(epoch, error, "epoch finished");
            if let Some(dir) = &config.log_dir {
                if let Err(err) = logging::log_training_epoch(dir, &metrics, converged) {
                    tracing::warn!(%err, "failed to write training log");
                }
            }
            history.push(metrics);
        }

        if is_last {
            break;
        }
    }

    let report = TrainingReport {
        epochs_run,
        final_error,
        converged,
        history,
        total_elapsed_ms: start_time.elapsed().as_millis(),
    };

    if converged {
        tracing::info!(epochs = epochs_run, error = final_error, "training converged");
    } else {
        tracing::info!(
            epochs = epochs_run,
            error = final_error,
            "training stopped without converging"
        );
    }

    if let Some(dir) = &config.log_dir {
        if let Err(err) = logging::log_training_summary(dir, &report) {
            tracing::warn!(%err, "failed to write training summary");
        }
    }

    Ok(report)
}

/// Runs the network on `prompt`, then keeps feeding the end marker, and
/// collects outputs until one decodes to byte `0` or `max_steps` outputs exist.
///
/// The end-of-answer output itself is not included. Recurrent state is left
/// as is; call [`Network::reset`] first to start a fresh sequence.
pub fn generate(
    network: &mut Network,
    prompt: &[Vector],
    max_steps: usize,
) -> NetworkResult<Vec<Vector>> {
    NetworkError::check_width(BYTE_WIDTH, network.output_size(), "generated byte width")?;

    let marker = end_marker();
    let mut outputs = Vec::new();
    for index in 0..max_steps {
        let input = prompt.get(index).unwrap_or(&marker);
        let output = network.predict(input.view())?;
        if decode_byte(output.view()) == Ok(0) {
            break;
        }
        outputs.push(output);
    }
    Ok(outputs)
}

/// Text front end for [`generate`]: resets the network, feeds `prompt`'s bytes
/// and decodes the answer.
pub fn respond(network: &mut Network, prompt: &str, max_steps: usize) -> NetworkResult<String> {
    network.reset();
    let outputs = generate(network, &recurrent_shared::encode_text(prompt), max_steps)?;
    recurrent_shared::decode_text(&outputs)
        .map_err(|_| NetworkError::dimension_mismatch(BYTE_WIDTH, network.output_size(), "generated byte width"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{NetworkConfig, Schedule};

    fn byte_network(seed: u64) -> Network {
        let config = NetworkConfig::legacy(BYTE_WIDTH, BYTE_WIDTH, 0)
            .with_schedule(Schedule::Sequential)
            .with_seed(seed);
        Network::from_config(&config).expect("valid config")
    }

    #[test]
    fn test_train_sequence_normalizes_by_target_length() {
        let pair = SequencePair::from_text("ab", "cd");
        let mut a = byte_network(1);
        let mut b = byte_network(1);

        let error = train_sequence(&mut a, &pair, true).unwrap();

        let mut total = 0.0;
        for index in 0..3 {
            let (input, target) = pair.step(index);
            total += b.train(input.view(), target.view()).unwrap();
        }
        assert!((error - total / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_dataset_has_zero_error() {
        let mut network = byte_network(2);
        assert_eq!(train_epoch(&mut network, &SequenceDataset::default(), true).unwrap(), 0.0);
    }

    #[test]
    fn test_wrong_width_is_reported() {
        let mut network = Network::from_config(&NetworkConfig::legacy(4, 4, 0).with_seed(3)).unwrap();
        let dataset = SequenceDataset::from_text_pairs([("a", "b")]);
        assert!(matches!(
            train_epoch(&mut network, &dataset, true),
            Err(NetworkError::DimensionMismatch { expected: 4, got: 8, .. })
        ));
        assert!(generate(&mut network, &[], 4).is_err());
    }

    #[test]
    fn test_stops_at_max_epochs() {
        let mut network = byte_network(4);
        let dataset = SequenceDataset::from_text_pairs([("0", "1")]);
        let config = TrainingConfig {
            max_epochs: 3,
            target_error: 0.0,
            log_every: 1,
            ..TrainingConfig::default()
        };

        let report = train_until_converged(&mut network, &dataset, &config).unwrap();
        assert_eq!(report.epochs_run, 3);
        assert!(!report.converged);
        assert_eq!(report.history.len(), 3);
        assert_eq!(report.history.last().map(|m| m.error), Some(report.final_error));
    }

    #[test]
    fn test_generate_respects_max_steps() {
        let mut network = byte_network(5);
        let outputs = generate(&mut network, &recurrent_shared::encode_text("hello"), 3).unwrap();
        assert!(outputs.len() <= 3);
        assert!(outputs.iter().all(|o| o.len() == BYTE_WIDTH));
    }
}
