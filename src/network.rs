use ndarray::{s, Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::debug;

use crate::error::{NetworkError, Result};
use crate::topology::Topology;

/*  Indexing Notation:
   Every activation vector and every weight matrix reserves index 0 for the
   bias. Activation slot 0 is always 1.0; weight column 0 holds the bias
   weight of each unit; weight row 0 is never read or written.
   l - layer, 0 is the input layer
   j - unit of layer l     (1..=U_l)
   i - unit of layer l - 1 (0..=U_{l-1}, 0 being the bias)
*/

/// Value of the bias slot in every activation vector.
pub const BIAS: f64 = 1.0;

/// One labelled sample: features in their natural range and a class label.
#[derive(Clone, Debug, PartialEq)]
pub struct Example {
    pub features: Vec<f64>,
    pub label: i64,
}

impl Example {
    pub fn new(features: Vec<f64>, label: i64) -> Self {
        Example { features, label }
    }
}

/// Activation vectors of every layer for a single input, layer 0 included.
#[derive(Clone, Debug)]
pub struct Activations {
    layers: Vec<Array1<f64>>,
}

impl Activations {
    /// Activation vector of layer `l`, bias slot at index 0.
    pub fn layer(&self, l: usize) -> &Array1<f64> {
        &self.layers[l]
    }

    pub fn output(&self) -> &Array1<f64> {
        &self.layers[self.layers.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct Network {
    topology: Topology,
    // weights[l - 1] feeds layer l, shape (U_l + 1, U_{l-1} + 1)
    pub(crate) weights: Vec<Array2<f64>>,
}

impl Network {
    /// Creates a network whose weights are independent standard-normal draws
    /// from `rng`. Row 0 of every matrix is unused and left at zero.
    pub fn new<R: Rng + ?Sized>(topology: Topology, rng: &mut R) -> Self {
        let weights = (1..topology.num_layers())
            .map(|l| {
                Array2::<f64>::from_shape_fn(topology.weight_shape(l), |(j, _)| {
                    if j == 0 {
                        0.0
                    } else {
                        StandardNormal.sample(&mut *rng)
                    }
                })
            })
            .collect();
        debug!(%topology, "initialised network with gaussian weights");

        Network { topology, weights }
    }

    /// Builds a network from explicit weight matrices, one per non-input
    /// layer, each of shape `(U_l + 1, U_{l-1} + 1)`.
    pub fn from_weights(topology: Topology, weights: Vec<Array2<f64>>) -> Result<Self> {
        let expected_matrices = topology.num_layers() - 1;
        if weights.len() != expected_matrices {
            return Err(NetworkError::Construction(format!(
                "topology {topology} needs {expected_matrices} weight matrices, got {}",
                weights.len()
            )));
        }
        for (index, matrix) in weights.iter().enumerate() {
            let expected = topology.weight_shape(index + 1);
            if matrix.dim() != expected {
                return Err(NetworkError::Construction(format!(
                    "weight matrix for layer {} has shape {:?}, expected {:?}",
                    index + 1,
                    matrix.dim(),
                    expected
                )));
            }
        }

        Ok(Network { topology, weights })
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Weight matrix feeding layer `l` (1-based, like the topology).
    pub fn layer_weights(&self, l: usize) -> &Array2<f64> {
        &self.weights[l - 1]
    }

    /// Runs the input through every layer and keeps all activations.
    pub fn feedforward(&self, features: &[f64]) -> Result<Activations> {
        if features.len() != self.topology.inputs() {
            return Err(NetworkError::InvalidInput {
                expected: self.topology.inputs(),
                actual: features.len(),
            });
        }

        let mut layers = Vec::with_capacity(self.topology.num_layers());
        let mut activation = with_bias(features.iter().copied());
        for w in &self.weights {
            let z = w.slice(s![1.., ..]).dot(&activation);
            let next = with_bias(z.iter().map(|&x| sigmoid(x)));
            layers.push(std::mem::replace(&mut activation, next));
        }
        layers.push(activation);

        Ok(Activations { layers })
    }

    /// Index of the most active output unit; the lowest index wins ties.
    pub fn predict(&self, features: &[f64]) -> Result<usize> {
        let activations = self.feedforward(features)?;
        Ok(argmax(activations.output()))
    }

    /// Half the summed squared distance between the output layer and the
    /// one-hot target of `example`.
    pub fn squared_error(&self, example: &Example) -> Result<f64> {
        let target = self.target(example.label)?;
        let activations = self.feedforward(&example.features)?;
        let output = activations.output();
        let error = (1..output.len())
            .map(|j| (target[j] - output[j]).powi(2))
            .sum::<f64>();
        Ok(0.5 * error)
    }

    /// Fraction of `examples` whose predicted class equals the label.
    pub fn evaluate(&self, examples: &[Example]) -> Result<f64> {
        if examples.is_empty() {
            return Ok(0.0);
        }
        #[cfg(feature = "parallel")]
        let examples_iter = examples.par_iter();
        #[cfg(not(feature = "parallel"))]
        let examples_iter = examples.iter();

        let correct = examples_iter
            .map(|example| -> Result<usize> {
                self.target(example.label)?;
                let predicted = self.predict(&example.features)?;
                Ok(usize::from(predicted as i64 == example.label))
            })
            .sum::<Result<usize>>()?;
        Ok(correct as f64 / examples.len() as f64)
    }

    /// Mean of [`Network::squared_error`] over `examples`.
    pub fn mean_squared_error(&self, examples: &[Example]) -> Result<f64> {
        if examples.is_empty() {
            return Ok(0.0);
        }
        #[cfg(feature = "parallel")]
        let examples_iter = examples.par_iter();
        #[cfg(not(feature = "parallel"))]
        let examples_iter = examples.iter();

        let total = examples_iter
            .map(|example| self.squared_error(example))
            .sum::<Result<f64>>()?;
        Ok(total / examples.len() as f64)
    }

    /// One-hot target for `label`, laid out like an output activation vector
    /// (slot 0 unused).
    pub(crate) fn target(&self, label: i64) -> Result<Array1<f64>> {
        let classes = self.topology.classes();
        if label < 0 || label as u64 >= classes as u64 {
            return Err(NetworkError::InvalidLabel { label, classes });
        }
        let mut target = Array1::zeros(classes + 1);
        target[label as usize + 1] = 1.0;
        Ok(target)
    }
}

/// Logistic function. Mathematically in (0, 1), but in f64 it rounds to
/// exactly 1.0 above roughly 37 and to 0.0 below roughly -710, which
/// raw 0-255 pixel sums reach easily.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Derivative of the sigmoid written in terms of its output `a = sigmoid(z)`.
pub fn sigmoid_prime(a: f64) -> f64 {
    a * (1.0 - a)
}

fn with_bias(values: impl Iterator<Item = f64>) -> Array1<f64> {
    std::iter::once(BIAS).chain(values).collect()
}

fn argmax(output: &Array1<f64>) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (j, &value) in output.iter().enumerate().skip(1) {
        if value > best_value {
            best = j - 1;
            best_value = value;
        }
    }
    best
}
