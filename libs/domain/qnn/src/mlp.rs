use qgrad::{Graph, Operand, Value};

use crate::{Error, Init, Layer, Module};

// -----------------------------------------------------------------------------
// MlpConfig
// -----------------------------------------------------------------------------
/// Shape of a multi-layer perceptron.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize, schemars::JsonSchema)
)]
pub struct MlpConfig {
    pub n_inputs: usize,
    /// Output count of each layer, in order.
    pub layer_sizes: Vec<usize>,
}

// -----------------------------------------------------------------------------
// Mlp
// -----------------------------------------------------------------------------
/// Stack of layers where each layer consumes the outputs of the previous one.
#[derive(Clone)]
pub struct Mlp {
    graph: Graph,
    n_inputs: usize,
    layers: Vec<Layer>,
}

//
// ctor
//
impl Mlp {
    /// Layer `i` maps `sizes[i-1]` inputs to `sizes[i]` outputs,
    /// where `sizes` is `n_inputs` followed by `layer_sizes`.
    pub fn new<I: Init + ?Sized>(
        graph: &Graph,
        n_inputs: usize,
        layer_sizes: &[usize],
        init: &mut I,
    ) -> Self {
        let mut layers = Vec::with_capacity(layer_sizes.len());
        let mut nin = n_inputs;
        for (i, &nout) in layer_sizes.iter().enumerate() {
            layers.push(Layer::_indexed(graph, nin, nout, i, init));
            nin = nout;
        }
        let res = Self {
            graph: graph.clone(),
            n_inputs,
            layers,
        };
        log::debug!(
            "Built MLP {}->{:?} with {} parameters",
            n_inputs,
            layer_sizes,
            res.parameters().len()
        );
        res
    }

    #[inline]
    pub fn from_config<I: Init + ?Sized>(graph: &Graph, config: &MlpConfig, init: &mut I) -> Self {
        Self::new(graph, config.n_inputs, &config.layer_sizes, init)
    }
}

//
// methods
//
impl Mlp {
    #[inline]
    pub fn n_inputs(&self) -> usize {
        self.n_inputs
    }

    /// Output count of the last layer, or the input count without layers.
    #[inline]
    pub fn n_outputs(&self) -> usize {
        self.layers.last().map_or(self.n_inputs, Layer::n_outputs)
    }

    #[inline]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn config(&self) -> MlpConfig {
        MlpConfig {
            n_inputs: self.n_inputs,
            layer_sizes: self.layers.iter().map(Layer::n_outputs).collect(),
        }
    }
}

impl std::fmt::Debug for Mlp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mlp")
            .field("n_inputs", &self.n_inputs)
            .field("layers", &self.layers)
            .finish()
    }
}

impl Module for Mlp {
    type Output = Vec<Value>;

    fn forward<I>(&self, inputs: I) -> Result<Self::Output, Error>
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        let mut xs: Vec<Operand> = inputs.into_iter().map(Into::into).collect();
        if xs.len() != self.n_inputs {
            return Err(Error::InputArity {
                expected: self.n_inputs,
                actual: xs.len(),
            });
        }
        for layer in &self.layers {
            xs = layer.forward(xs)?.into_iter().map(Operand::from).collect();
        }
        Ok(xs.into_iter().map(|x| x.into_value(&self.graph)).collect())
    }

    #[inline]
    fn parameters(&self) -> Vec<Value> {
        self.layers.iter().flat_map(Layer::parameters).collect()
    }
}
