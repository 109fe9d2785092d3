//! Trains a byte-sized network to echo short strings, then queries it.
//!
//! Run with: cargo run --example identity_sequence

use recurrent_core::config::ConfigError;
use recurrent_core::{respond, train_until_converged, EngineConfig, Network, SequenceDataset};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config()?;
    config.training.max_epochs = config.training.max_epochs.min(20_000);
    println!(
        "Loaded config: depth={} activation={} target_error={}",
        config.network.depth(),
        config.network.activation.name(),
        config.training.target_error
    );

    let dataset = SequenceDataset::from_text_pairs([("0", "0"), ("1", "1"), ("ok", "ok")]);
    let mut network = Network::from_config(&config.network)?;

    let report = train_until_converged(&mut network, &dataset, &config.training)?;
    println!(
        "Trained {} epochs, error {:.6}, converged: {}",
        report.epochs_run, report.final_error, report.converged
    );

    for prompt in ["0", "1", "ok"] {
        println!("{prompt:>4} -> {}", respond(&mut network, prompt, 8)?);
    }
    Ok(())
}

fn load_config() -> Result<EngineConfig, ConfigError> {
    EngineConfig::load_from_file("config/engine.toml").or_else(|err| {
        eprintln!("Falling back to default config: {err}");
        Ok(EngineConfig::default())
    })
}
