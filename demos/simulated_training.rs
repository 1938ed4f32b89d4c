//! Simulated training run
//!
//! Drives an [`ExperimentOrchestrator`] with a toy 3-class "model" whose
//! logits sharpen over the epochs, so every bookkeeping path is exercised:
//! cadence, checkpoints, ledger, telemetry and the published summary.
//!
//! ```text
//! RUST_LOG=registro=debug cargo run --example simulated_training
//! cargo run --example simulated_training -- path/to/config.json
//! ```

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use registro::metrics::{MetricSuite, Outputs, ValidationBundle};
use registro::summary::{JsonFilePublisher, LogPublisher};
use registro::telemetry::LogSink;
use registro::{ExperimentOrchestrator, OrchestratorConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const CLASSES: usize = 3;
const EPOCHS: u64 = 12;
const TRAIN_ROWS: usize = 256;
const VAL_ROWS: usize = 64;

/// Stand-in for model weights: one confidence per class.
#[derive(Debug, Serialize)]
struct ToyModel {
    epoch: u64,
    confidence: [f64; CLASSES],
}

impl ToyModel {
    fn step(&mut self, epoch: u64, rng: &mut StdRng) {
        self.epoch = epoch;
        for c in &mut self.confidence {
            *c += rng.gen_range(-0.05..0.25);
        }
    }

    /// Append `rows` predictions with one-hot targets.
    fn predict(&self, outputs: &mut Outputs, rows: usize, rng: &mut StdRng) -> Result<()> {
        let mut predictions = Vec::with_capacity(rows * CLASSES);
        let mut targets = Vec::with_capacity(rows * CLASSES);
        for _ in 0..rows {
            let label = rng.gen_range(0..CLASSES);
            for class in 0..CLASSES {
                let signal = if class == label { self.confidence[class] } else { 0.0 };
                predictions.push(signal + rng.gen_range(-1.0..1.0));
                targets.push(if class == label { 1.0 } else { 0.0 });
            }
        }
        outputs.push_batch(&predictions, &targets)?;
        Ok(())
    }
}

fn load_config() -> Result<OrchestratorConfig> {
    if let Some(path) = std::env::args().nth(1) {
        return OrchestratorConfig::from_path(&path)
            .with_context(|| format!("loading config from {path}"));
    }
    let config = OrchestratorConfig::builder("simulated")
        .results_root(std::env::temp_dir().join("registro-results"))
        .validation_frequency(2)
        .overwrite(true)
        .checkpoint_extension("json")
        .build()?;
    Ok(config)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let mut orchestrator =
        ExperimentOrchestrator::with_sink(config, MetricSuite::classification(), LogSink)
            .context("preparing run workspace")?;

    let mut rng = StdRng::seed_from_u64(7);
    let mut model = ToyModel {
        epoch: 0,
        confidence: [0.0; CLASSES],
    };
    let mut bundle = ValidationBundle::new(CLASSES)?;

    for epoch in 0..EPOCHS {
        model.step(epoch, &mut rng);
        if !orchestrator.should_trigger(epoch) {
            continue;
        }

        bundle.clear();
        model.predict(&mut bundle.train, TRAIN_ROWS, &mut rng)?;
        model.predict(&mut bundle.val, VAL_ROWS, &mut rng)?;

        let decision = orchestrator
            .validate(&bundle, epoch)
            .with_context(|| format!("validating epoch {epoch}"))?;
        if decision.is_progress() {
            let state = serde_json::to_vec(&model)?;
            for record in orchestrator.save_checkpoint(&state)? {
                tracing::info!(
                    objective = %record.objective(),
                    path = %record.path().display(),
                    "checkpoint saved"
                );
            }
        }
    }

    let mut json = JsonFilePublisher::in_dir(orchestrator.workspace().dir());
    orchestrator.publish(&mut json)?;
    orchestrator.publish(&mut LogPublisher)?;

    println!(
        "ledger: {} ({} rows)",
        orchestrator.ledger().path().display(),
        orchestrator.ledger().read_entries()?.len()
    );
    Ok(())
}
