use std::fmt;

use crate::error::{NetworkError, Result};

/// Layer sizes of a fully-connected network, input first and output last.
///
/// Fixed once built: a network never changes shape after construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Topology {
    layer_dims: Vec<usize>,
}

impl Topology {
    pub fn new(layer_dims: Vec<usize>) -> Result<Self> {
        if layer_dims.len() < 2 {
            return Err(NetworkError::Construction(format!(
                "a network needs at least an input and an output layer, got {} layer(s)",
                layer_dims.len()
            )));
        }
        if let Some(index) = layer_dims.iter().position(|&dim| dim == 0) {
            return Err(NetworkError::Construction(format!(
                "layer {index} has zero units"
            )));
        }
        Ok(Topology { layer_dims })
    }

    /// Builds `[inputs, hidden.., classes]`.
    pub fn with_hidden(inputs: usize, hidden: &[usize], classes: usize) -> Result<Self> {
        let mut layer_dims = Vec::with_capacity(hidden.len() + 2);
        layer_dims.push(inputs);
        layer_dims.extend_from_slice(hidden);
        layer_dims.push(classes);
        Topology::new(layer_dims)
    }

    pub fn num_layers(&self) -> usize {
        self.layer_dims.len()
    }

    /// Units in layer `l`, not counting the bias slot.
    pub fn units(&self, l: usize) -> usize {
        self.layer_dims[l]
    }

    pub fn inputs(&self) -> usize {
        self.layer_dims[0]
    }

    pub fn classes(&self) -> usize {
        self.layer_dims[self.layer_dims.len() - 1]
    }

    /// Shape `(rows, cols)` of the weight matrix feeding layer `l` (l >= 1),
    /// bias slot included on both axes.
    pub fn weight_shape(&self, l: usize) -> (usize, usize) {
        (self.layer_dims[l] + 1, self.layer_dims[l - 1] + 1)
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.layer_dims
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self.layer_dims.iter().map(|d| d.to_string()).collect();
        write!(f, "[{}]", dims.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_hidden_sizes() {
        let topology = Topology::with_hidden(784, &[30], 10).unwrap();
        assert_eq!(topology.as_slice(), &[784, 30, 10]);
        assert_eq!(topology.num_layers(), 3);
        assert_eq!(topology.inputs(), 784);
        assert_eq!(topology.classes(), 10);
        assert_eq!(topology.weight_shape(1), (31, 785));
        assert_eq!(topology.weight_shape(2), (11, 31));
        assert_eq!(topology.to_string(), "[784, 30, 10]");
    }

    #[test]
    fn rejects_single_layer() {
        assert!(matches!(
            Topology::new(vec![4]),
            Err(NetworkError::Construction(_))
        ));
    }

    #[test]
    fn rejects_empty_layer() {
        assert!(matches!(
            Topology::new(vec![4, 0, 2]),
            Err(NetworkError::Construction(_))
        ));
    }
}
