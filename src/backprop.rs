use ndarray::{s, Array1, Array2, Axis};

use crate::error::Result;
use crate::network::{sigmoid_prime, Example, Network};
use crate::topology::Topology;

/// Weight deltas for every non-input layer, shaped like the weight matrices.
///
/// Produced per example by [`Network::backpropagate`], already scaled by the
/// learning rate, and summed/averaged by the trainer.
#[derive(Clone, Debug, PartialEq)]
pub struct Nabla {
    nabla_w: Vec<Array2<f64>>,
}

impl Nabla {
    pub fn zeros(topology: &Topology) -> Self {
        let nabla_w = (1..topology.num_layers())
            .map(|l| Array2::zeros(topology.weight_shape(l)))
            .collect();
        Nabla { nabla_w }
    }

    /// Delta matrix for layer `l` (1-based).
    pub fn layer(&self, l: usize) -> &Array2<f64> {
        &self.nabla_w[l - 1]
    }

    pub fn layers(&self) -> impl Iterator<Item = &Array2<f64>> {
        self.nabla_w.iter()
    }

    pub(crate) fn accumulate(&mut self, other: &Nabla) {
        for (sum, delta) in self.nabla_w.iter_mut().zip(&other.nabla_w) {
            *sum += delta;
        }
    }

    pub(crate) fn scale(&mut self, factor: f64) {
        for delta in &mut self.nabla_w {
            *delta *= factor;
        }
    }
}

impl Network {
    /// Computes the learning-rate scaled weight deltas for one example.
    ///
    /// The label is checked before any work is done. Error terms follow the
    /// squared-error gradient through the sigmoid; every weight of a unit,
    /// bias column included, receives `learning_rate * delta_j * a_i`.
    pub fn backpropagate(&self, example: &Example, learning_rate: f64) -> Result<Nabla> {
        let target = self.target(example.label)?;
        let activations = self.feedforward(&example.features)?;
        let output_layer = activations.len() - 1;

        let output = activations.output();
        let mut delta = error_terms(output, |j| target[j] - output[j]);

        let mut nabla_w = Vec::with_capacity(output_layer);
        nabla_w.push(delta_weights(
            learning_rate,
            &delta,
            activations.layer(output_layer - 1),
        ));

        for l in (1..output_layer).rev() {
            // weights[l] feeds layer l + 1; its column j collects unit j's
            // contribution to every unit of the next layer
            let propagated = self.weights[l]
                .slice(s![1.., ..])
                .t()
                .dot(&delta.slice(s![1..]));
            let a = activations.layer(l);
            delta = error_terms(a, |j| propagated[j]);
            nabla_w.push(delta_weights(learning_rate, &delta, activations.layer(l - 1)));
        }
        nabla_w.reverse();

        Ok(Nabla { nabla_w })
    }
}

/// `delta_j = a_j (1 - a_j) * upstream(j)` for j >= 1; slot 0 stays zero.
fn error_terms(activation: &Array1<f64>, upstream: impl Fn(usize) -> f64) -> Array1<f64> {
    Array1::from_shape_fn(activation.len(), |j| {
        if j == 0 {
            0.0
        } else {
            sigmoid_prime(activation[j]) * upstream(j)
        }
    })
}

fn delta_weights(learning_rate: f64, delta: &Array1<f64>, previous: &Array1<f64>) -> Array2<f64> {
    let column = delta.view().insert_axis(Axis(1));
    let row = previous.view().insert_axis(Axis(0));
    column.dot(&row) * learning_rate
}
