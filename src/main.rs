use anyhow::{Context, Result};
use clap::Parser;
use mnist_mlp::config::Config;
use mnist_mlp::mnist_loader;
use mnist_mlp::{Network, Topology, Trainer};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

const CLASSES: usize = 10;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    info!(seed, "seeding random source");
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    info!("Loading MNIST Data...");
    let mut training_data = mnist_loader::load_data(&config.data_dir, "train", config.pixel_scale())
        .context("failed to load training set")?;
    let test_data = mnist_loader::load_data(&config.data_dir, "t10k", config.pixel_scale())
        .context("failed to load test set")?;
    let inputs = training_data
        .first()
        .map(|example| example.features.len())
        .context("training set is empty")?;

    let topology = Topology::with_hidden(inputs, &config.hidden, CLASSES)?;
    let mut network = Network::new(topology, &mut rng);
    let trainer =
        Trainer::new(config.learning_rate, config.batch_size)?.with_shuffle(config.shuffle);

    let initial_accuracy = network.evaluate(&test_data)?;
    info!(test_accuracy = initial_accuracy, "before training");
    let reports = trainer.stochastic_gradient_descent(
        &mut network,
        &mut training_data,
        config.epochs,
        Some(&test_data),
        &mut rng,
    )?;

    let final_accuracy = match reports.last().and_then(|report| report.test_accuracy) {
        Some(accuracy) => accuracy,
        None => network.evaluate(&test_data)?,
    };
    println!(
        "Final Test: {:.4} ({} images)",
        final_accuracy,
        test_data.len()
    );
    Ok(())
}
