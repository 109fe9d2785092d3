//! Sequence trainer CLI
//!
//! Trains a recurrent network on tab-separated text pairs and answers
//! prompts with a saved checkpoint.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use recurrent_core::{
    respond, train_until_converged, Checkpointable, EngineConfig, Network, SequenceDataset,
    TrainingReport, DEFAULT_MAX_STEPS,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "sequence-trainer")]
#[command(about = "Train and query recurrent sequence networks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log filter: a level (`debug`) or directives (`recurrent_core=trace,info`)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a network until it converges on a dataset
    Train {
        /// Engine configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Training pairs, one `input<TAB>target` per line
        #[arg(short, long)]
        data: PathBuf,

        /// Where to store the trained network
        #[arg(long, default_value = "network.ckpt")]
        checkpoint: PathBuf,
    },

    /// Answer prompts with a trained network
    Generate {
        /// Network checkpoint to load
        #[arg(long, default_value = "network.ckpt")]
        checkpoint: PathBuf,

        /// Prompt text; read line by line from stdin when omitted
        #[arg(short, long)]
        prompt: Option<String>,

        /// Maximum number of generated bytes
        #[arg(long, default_value_t = DEFAULT_MAX_STEPS)]
        max_steps: usize,
    },
}

fn log_filter(directives: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(directives).with_context(|| format!("invalid --log-level '{directives}'"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(&cli.log_level)?)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Train {
            config,
            data,
            checkpoint,
        } => {
            let report = run_train(config.as_deref(), &data, &checkpoint)?;
            print_report(&report, &checkpoint);
        }
        Commands::Generate {
            checkpoint,
            prompt,
            max_steps,
        } => {
            let mut network = Network::load_checkpoint(&checkpoint)
                .with_context(|| format!("loading checkpoint {}", checkpoint.display()))?;
            match prompt {
                Some(prompt) => println!("{}", respond(&mut network, &prompt, max_steps)?),
                None => answer_lines(&mut network, io::stdin().lock(), io::stdout(), max_steps)?,
            }
        }
    }

    Ok(())
}

fn run_train(config: Option<&Path>, data: &Path, checkpoint: &Path) -> Result<TrainingReport> {
    let config = match config {
        Some(path) => EngineConfig::load_from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let dataset = SequenceDataset::load_tsv(data)
        .with_context(|| format!("loading dataset {}", data.display()))?;
    anyhow::ensure!(!dataset.is_empty(), "dataset {} has no pairs", data.display());

    let mut network = Network::from_config(&config.network)?;
    info!(
        depth = network.depth(),
        activation = network.activation().name(),
        pairs = dataset.len(),
        "network ready"
    );

    let report = train_until_converged(&mut network, &dataset, &config.training)?;
    network.reset();
    network
        .save_checkpoint(checkpoint)
        .with_context(|| format!("saving checkpoint {}", checkpoint.display()))?;
    Ok(report)
}

fn print_report(report: &TrainingReport, checkpoint: &Path) {
    println!("Epochs run:   {}", report.epochs_run);
    println!("Final error:  {:.6}", report.final_error);
    println!("Converged:    {}", report.converged);
    println!("Elapsed:      {} ms", report.total_elapsed_ms);
    println!("Checkpoint:   {}", checkpoint.display());
}

/// One answer line per prompt line until the input ends.
fn answer_lines<R: BufRead, W: Write>(
    network: &mut Network,
    input: R,
    mut output: W,
    max_steps: usize,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        let answer = respond(network, line.trim_end_matches('\r'), max_steps)?;
        writeln!(output, "{answer}")?;
    }
    Ok(())
}
