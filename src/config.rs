use std::path::PathBuf;

use clap::Parser;

use crate::mnist_loader::PixelScale;

/// Train a sigmoid multilayer perceptron on the MNIST digits.
#[derive(Parser, Debug, Clone)]
#[command(name = "mnist_mlp", version)]
pub struct Config {
    /// Hidden layer sizes, comma separated
    #[arg(long, value_delimiter = ',', default_value = "30")]
    pub hidden: Vec<usize>,

    #[arg(long, default_value_t = 0.3)]
    pub learning_rate: f64,

    #[arg(long, default_value_t = 10)]
    pub batch_size: usize,

    #[arg(long, default_value_t = 100)]
    pub epochs: usize,

    /// Directory holding the gzip-compressed IDX files
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Seed for weight initialisation and shuffling; drawn from the OS when absent
    #[arg(long)]
    pub seed: Option<u64>,

    /// Scale pixels into [0, 1] instead of feeding raw 0-255 intensities
    #[arg(long)]
    pub normalize: bool,

    /// Shuffle the training set before every epoch
    #[arg(long)]
    pub shuffle: bool,
}

impl Config {
    pub fn pixel_scale(&self) -> PixelScale {
        if self.normalize {
            PixelScale::Unit
        } else {
            PixelScale::Raw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_run() {
        let config = Config::parse_from(["mnist_mlp"]);
        assert_eq!(config.hidden, vec![30]);
        assert_eq!(config.learning_rate, 0.3);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.epochs, 100);
        assert_eq!(config.seed, None);
        assert_eq!(config.pixel_scale(), PixelScale::Raw);
    }

    #[test]
    fn parses_layer_list_and_flags() {
        let config = Config::parse_from([
            "mnist_mlp",
            "--hidden",
            "64,32",
            "--seed",
            "9",
            "--normalize",
            "--shuffle",
        ]);
        assert_eq!(config.hidden, vec![64, 32]);
        assert_eq!(config.seed, Some(9));
        assert!(config.shuffle);
        assert_eq!(config.pixel_scale(), PixelScale::Unit);
    }
}
