use qgrad::{Graph, Operand, Value};

use crate::{Error, Init, Module, Neuron};

// -----------------------------------------------------------------------------
// Layer
// -----------------------------------------------------------------------------
/// Independent neurons sharing the same inputs.
#[derive(Debug, Clone)]
pub struct Layer {
    n_inputs: usize,
    neurons: Vec<Neuron>,
}

//
// ctor
//
impl Layer {
    /// Create `n_outputs` neurons taking `n_inputs` inputs each.
    ///
    /// Nodes are labeled as the first layer of a network.
    #[inline]
    pub fn new<I: Init + ?Sized>(
        graph: &Graph,
        n_inputs: usize,
        n_outputs: usize,
        init: &mut I,
    ) -> Self {
        Self::_indexed(graph, n_inputs, n_outputs, 0, init)
    }

    pub(crate) fn _indexed<I: Init + ?Sized>(
        graph: &Graph,
        n_inputs: usize,
        n_outputs: usize,
        layer: usize,
        init: &mut I,
    ) -> Self {
        let neurons = (0..n_outputs)
            .map(|i| Neuron::_labeled(graph, n_inputs, format!("L{layer}|N{i}"), init))
            .collect();
        Self { n_inputs, neurons }
    }
}

//
// methods
//
impl Layer {
    #[inline]
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    #[inline]
    pub fn n_outputs(&self) -> usize {
        self.neurons.len()
    }

    #[inline]
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }
}

impl Module for Layer {
    type Output = Vec<Value>;

    fn forward<I>(&self, inputs: I) -> Result<Self::Output, Error>
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        let inputs: Vec<Operand> = inputs.into_iter().map(Into::into).collect();
        if inputs.len() != self.n_inputs {
            return Err(Error::InputArity {
                expected: self.n_inputs,
                actual: inputs.len(),
            });
        }
        self.neurons
            .iter()
            .map(|neuron| neuron.forward(inputs.iter().cloned()))
            .collect()
    }

    #[inline]
    fn parameters(&self) -> Vec<Value> {
        self.neurons.iter().flat_map(Neuron::parameters).collect()
    }
}
