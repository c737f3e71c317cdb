use ndarray::s;
use rand::seq::SliceRandom;
use rand::Rng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{info, trace};

use crate::backprop::Nabla;
use crate::error::{NetworkError, Result};
use crate::network::{Example, Network};

/// Accuracy figures gathered after one epoch.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EpochReport {
    pub epoch: usize,
    pub training_accuracy: f64,
    pub test_accuracy: Option<f64>,
}

/// Mini-batch gradient descent over a fixed learning rate and batch size.
#[derive(Clone, Debug)]
pub struct Trainer {
    learning_rate: f64,
    batch_size: usize,
    shuffle: bool,
}

impl Trainer {
    pub fn new(learning_rate: f64, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(NetworkError::InvalidBatchSize(batch_size));
        }
        if !(learning_rate.is_finite() && learning_rate > 0.0) {
            return Err(NetworkError::InvalidLearningRate(learning_rate));
        }
        Ok(Trainer {
            learning_rate,
            batch_size,
            shuffle: false,
        })
    }

    /// Shuffle the training set before every epoch of
    /// [`Trainer::stochastic_gradient_descent`].
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Runs `epochs` sweeps over `training_data`, reporting accuracy after
    /// each. `rng` is only drawn from when shuffling is enabled.
    pub fn stochastic_gradient_descent<R: Rng + ?Sized>(
        &self,
        network: &mut Network,
        training_data: &mut [Example],
        epochs: usize,
        test_data: Option<&[Example]>,
        rng: &mut R,
    ) -> Result<Vec<EpochReport>> {
        let mut reports = Vec::with_capacity(epochs);
        for epoch in 0..epochs {
            if self.shuffle {
                training_data.shuffle(rng);
            }
            self.gradient_descent(network, training_data)?;

            let training_accuracy = network.evaluate(training_data)?;
            let test_accuracy = test_data.map(|test| network.evaluate(test)).transpose()?;
            match test_accuracy {
                Some(test) => info!(
                    epoch,
                    training_accuracy,
                    test_accuracy = test,
                    "epoch complete"
                ),
                None => info!(epoch, training_accuracy, "epoch complete"),
            }
            reports.push(EpochReport {
                epoch,
                training_accuracy,
                test_accuracy,
            });
        }
        Ok(reports)
    }

    /// One epoch: consecutive batches of `batch_size`, the last one holding
    /// whatever remains. On error the epoch stops; batches before the failing
    /// one stay applied.
    pub fn gradient_descent(&self, network: &mut Network, training_data: &[Example]) -> Result<()> {
        for (index, batch) in training_data.chunks(self.batch_size).enumerate() {
            self.update_mini_batch(network, batch)?;
            trace!(batch = index, size = batch.len(), "applied mini-batch");
        }
        Ok(())
    }

    /// Backpropagates every example against the current weights, then adds
    /// the averaged deltas. Any failing example leaves the weights untouched.
    pub fn update_mini_batch(&self, network: &mut Network, batch: &[Example]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let snapshot: &Network = network;
        #[cfg(feature = "parallel")]
        let batch_iter = batch.par_iter();
        #[cfg(not(feature = "parallel"))]
        let batch_iter = batch.iter();

        let nablas = batch_iter
            .map(|example| snapshot.backpropagate(example, self.learning_rate))
            .collect::<Result<Vec<Nabla>>>()?;

        let mut average = Nabla::zeros(network.topology());
        for nabla in &nablas {
            average.accumulate(nabla);
        }
        average.scale(1.0 / batch.len() as f64);
        network.apply_nabla(&average);
        Ok(())
    }
}

impl Network {
    fn apply_nabla(&mut self, nabla: &Nabla) {
        for (w, delta) in self.weights.iter_mut().zip(nabla.layers()) {
            let mut rows = w.slice_mut(s![1.., ..]);
            rows += &delta.slice(s![1.., ..]);
        }
    }
}
