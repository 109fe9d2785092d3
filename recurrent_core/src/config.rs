//! Engine configuration management via TOML files.
//!
//! Every key is optional; missing sections fall back to [`EngineConfig::default`].

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::neural::optimizer::{
    default_adam_speed, default_beta1, default_beta2, default_sgd_speed,
};
use crate::neural::{Activation, NetworkConfig, OptimizerSettings, Schedule};
use crate::training::TrainingConfig;

/// Engine configuration loaded from a TOML file.
///
/// # Examples
///
/// ```
/// use recurrent_core::EngineConfig;
///
/// let config = EngineConfig::from_str(
///     "[network]\ninput_width = 8\noutput_width = 8\nhidden_width = 4\n",
/// )
/// .unwrap();
///
/// assert_eq!(config.network.depth(), 5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub network: NetworkConfig,
    pub training: TrainingConfig,
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    pub fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawEngineConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;

        let optimizer = optimizer_from_raw(&raw.optimizer)?;
        let network = network_from_raw(&raw.network, optimizer)?;
        let training = training_from_raw(&raw.training)?;

        Ok(Self { network, training })
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::legacy(
                recurrent_shared::BYTE_WIDTH,
                recurrent_shared::BYTE_WIDTH,
                0,
            ),
            training: TrainingConfig {
                log_dir: Some(PathBuf::from(default_log_dir())),
                ..TrainingConfig::default()
            },
        }
    }
}

fn network_from_raw(
    raw: &RawNetwork,
    optimizer: OptimizerSettings,
) -> Result<NetworkConfig, ConfigError> {
    let activation: Activation = raw
        .activation
        .parse()
        .map_err(|err: String| ConfigError::Parse(format!("network.activation: {err}")))?;

    let config = NetworkConfig {
        input_width: raw.input_width,
        output_width: raw.output_width,
        hidden_width: raw.hidden_width,
        hidden_layers: raw.hidden_layers,
        activation,
        optimizer,
        schedule: if raw.parallel {
            Schedule::Parallel
        } else {
            Schedule::Sequential
        },
        seed: raw.seed,
    };

    config
        .validate()
        .map_err(|err| ConfigError::Parse(format!("network: {err}")))?;
    Ok(config)
}

fn optimizer_from_raw(raw: &RawOptimizer) -> Result<OptimizerSettings, ConfigError> {
    let settings = match raw.kind.trim().to_ascii_lowercase().as_str() {
        "adam" => OptimizerSettings::Adam {
            speed: raw.speed.unwrap_or_else(default_adam_speed),
            beta1: raw.beta1,
            beta2: raw.beta2,
        },
        "sgd" => OptimizerSettings::Sgd {
            speed: raw.speed.unwrap_or_else(default_sgd_speed),
        },
        other => {
            return Err(ConfigError::Parse(format!(
                "optimizer.kind must be 'adam' or 'sgd', got '{other}'"
            )))
        }
    };

    settings
        .validate()
        .map_err(|err| ConfigError::Parse(format!("optimizer: {err}")))?;
    Ok(settings)
}

fn training_from_raw(raw: &RawTraining) -> Result<TrainingConfig, ConfigError> {
    if raw.max_epochs == 0 {
        return Err(ConfigError::Parse(
            "training.max_epochs must be non-zero".into(),
        ));
    }
    if !raw.target_error.is_finite() || raw.target_error < 0.0 {
        return Err(ConfigError::Parse(
            "training.target_error must be ≥ 0".into(),
        ));
    }

    Ok(TrainingConfig {
        max_epochs: raw.max_epochs,
        target_error: raw.target_error,
        reset_between_sequences: raw.reset_between_sequences,
        log_every: raw.log_every,
        shuffle_seed: raw.shuffle_seed,
        log_dir: raw
            .log_dir
            .as_deref()
            .filter(|dir| !dir.is_empty())
            .map(PathBuf::from),
    })
}

#[derive(Debug, Default, Deserialize)]
struct RawEngineConfig {
    #[serde(default)]
    network: RawNetwork,
    #[serde(default)]
    optimizer: RawOptimizer,
    #[serde(default)]
    training: RawTraining,
}

#[derive(Debug, Deserialize)]
struct RawNetwork {
    #[serde(default = "default_byte_width")]
    input_width: usize,
    #[serde(default = "default_byte_width")]
    output_width: usize,
    #[serde(default)]
    hidden_width: usize,
    #[serde(default)]
    hidden_layers: Option<usize>,
    #[serde(default = "default_activation")]
    activation: String,
    #[serde(default)]
    seed: Option<u64>,
    #[serde(default = "default_parallel")]
    parallel: bool,
}

impl Default for RawNetwork {
    fn default() -> Self {
        Self {
            input_width: default_byte_width(),
            output_width: default_byte_width(),
            hidden_width: 0,
            hidden_layers: None,
            activation: default_activation(),
            seed: None,
            parallel: default_parallel(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawOptimizer {
    #[serde(default = "default_optimizer_kind")]
    kind: String,
    #[serde(default)]
    speed: Option<f32>,
    #[serde(default = "default_beta1")]
    beta1: f32,
    #[serde(default = "default_beta2")]
    beta2: f32,
}

impl Default for RawOptimizer {
    fn default() -> Self {
        Self {
            kind: default_optimizer_kind(),
            speed: None,
            beta1: default_beta1(),
            beta2: default_beta2(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTraining {
    #[serde(default = "default_max_epochs")]
    max_epochs: usize,
    #[serde(default = "default_target_error")]
    target_error: f32,
    #[serde(default = "default_reset")]
    reset_between_sequences: bool,
    #[serde(default = "default_log_every")]
    log_every: usize,
    #[serde(default)]
    shuffle_seed: Option<u64>,
    #[serde(default = "default_log_dir_option")]
    log_dir: Option<String>,
}

impl Default for RawTraining {
    fn default() -> Self {
        Self {
            max_epochs: default_max_epochs(),
            target_error: default_target_error(),
            reset_between_sequences: default_reset(),
            log_every: default_log_every(),
            shuffle_seed: None,
            log_dir: default_log_dir_option(),
        }
    }
}

fn default_byte_width() -> usize {
    recurrent_shared::BYTE_WIDTH
}

fn default_activation() -> String {
    Activation::default().name().to_string()
}

fn default_parallel() -> bool {
    true
}

fn default_optimizer_kind() -> String {
    "adam".into()
}

fn default_max_epochs() -> usize {
    TrainingConfig::default().max_epochs
}

fn default_target_error() -> f32 {
    TrainingConfig::default().target_error
}

fn default_reset() -> bool {
    true
}

fn default_log_every() -> usize {
    TrainingConfig::default().log_every
}

fn default_log_dir() -> String {
    "logs".into()
}

fn default_log_dir_option() -> Option<String> {
    Some(default_log_dir())
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}
