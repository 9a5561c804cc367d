use std::iter;

use qgrad::{Graph, Operand, Value};

use crate::{Error, Init, Module};

// -----------------------------------------------------------------------------
// Neuron
// -----------------------------------------------------------------------------
/// Single unit computing `tanh(b + sum_i w_i * x_i)`.
#[derive(Clone)]
pub struct Neuron {
    graph: Graph,
    weights: Vec<Value>,
    bias: Value,
    prefix: Option<String>,
}

//
// ctor
//
impl Neuron {
    /// Create a neuron with `n_inputs` weights and a bias drawn from `init`.
    ///
    /// Weights are drawn first, in input order, then the bias.
    #[inline]
    pub fn new<I: Init + ?Sized>(graph: &Graph, n_inputs: usize, init: &mut I) -> Self {
        Self::_build(graph, n_inputs, None, init)
    }

    /// Same as [`Neuron::new`] but labels the nodes it owns and creates
    /// with `{prefix}|w{i}`, `{prefix}|b`, `{prefix}|i{i}` and `{prefix}|o`.
    #[inline]
    pub(crate) fn _labeled<I: Init + ?Sized>(
        graph: &Graph,
        n_inputs: usize,
        prefix: String,
        init: &mut I,
    ) -> Self {
        Self::_build(graph, n_inputs, Some(prefix), init)
    }

    fn _build<I: Init + ?Sized>(
        graph: &Graph,
        n_inputs: usize,
        prefix: Option<String>,
        init: &mut I,
    ) -> Self {
        let weights = (0..n_inputs)
            .map(|i| {
                let w = graph.leaf(init.sample());
                if let Some(prefix) = &prefix {
                    w.set_label(format!("{prefix}|w{i}"));
                }
                w
            })
            .collect();
        let bias = graph.leaf(init.sample());
        if let Some(prefix) = &prefix {
            bias.set_label(format!("{prefix}|b"));
        }
        Self {
            graph: graph.clone(),
            weights,
            bias,
            prefix,
        }
    }
}

//
// methods
//
impl Neuron {
    #[inline]
    pub fn n_inputs(&self) -> usize {
        self.weights.len()
    }

    #[inline]
    pub fn weights(&self) -> &[Value] {
        &self.weights
    }

    #[inline]
    pub fn bias(&self) -> &Value {
        &self.bias
    }
}

impl std::fmt::Debug for Neuron {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neuron")
            .field("prefix", &self.prefix)
            .field("weights", &self.weights)
            .field("bias", &self.bias)
            .finish()
    }
}

// impls
impl Neuron {
    fn _promote(&self, slot: usize, x: Operand) -> Value {
        let is_const = matches!(x, Operand::Const(_));
        let x = x.into_value(&self.graph);
        if let (true, Some(prefix)) = (is_const, &self.prefix) {
            x.set_label(format!("{prefix}|i{slot}"));
        }
        x
    }
}

impl Module for Neuron {
    type Output = Value;

    fn forward<I>(&self, inputs: I) -> Result<Self::Output, Error>
    where
        I: IntoIterator,
        I::Item: Into<Operand>,
    {
        let inputs: Vec<Operand> = inputs.into_iter().map(Into::into).collect();
        if inputs.len() != self.weights.len() {
            return Err(Error::InputArity {
                expected: self.weights.len(),
                actual: inputs.len(),
            });
        }
        let foreign = inputs.iter().any(|x| match x {
            Operand::Value(v) => !Graph::ptr_eq(v.graph(), &self.graph),
            Operand::Const(_) => false,
        });
        if foreign {
            return Err(qgrad::Error::DifferentGraphs("forward").into());
        }

        // the sum starts from the bias so that it is part of the same expression
        let mut act = self.bias.clone();
        for (slot, (w, x)) in self.weights.iter().zip(inputs).enumerate() {
            let x = self._promote(slot, x);
            act = act.checked_add(w.checked_mul(&x)?)?;
        }
        let out = act.tanh();
        if let Some(prefix) = &self.prefix {
            out.set_label(format!("{prefix}|o"));
        }
        Ok(out)
    }

    #[inline]
    fn parameters(&self) -> Vec<Value> {
        self.weights
            .iter()
            .chain(iter::once(&self.bias))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;

    fn counting() -> impl FnMut() -> f64 {
        let mut next = 0.0;
        move || {
            next += 0.1;
            next
        }
    }

    #[test]
    fn test_new() {
        let graph = Graph::new();

        let neuron = Neuron::new(&graph, 3, &mut counting());

        assert_eq!(neuron.n_inputs(), 3);
        let weights: Vec<_> = neuron.weights().iter().map(Value::data).collect();
        assert_abs_diff_eq!(weights[0], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(weights[1], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(weights[2], 0.3, epsilon = 1e-12);
        assert_abs_diff_eq!(neuron.bias().data(), 0.4, epsilon = 1e-12);
        assert!(neuron.parameters().iter().all(Value::is_leaf));
        assert!(neuron.parameters().iter().all(|p| p.label().is_none()));
    }

    #[test]
    fn test_parameters_order() {
        let graph = Graph::new();
        let neuron = Neuron::new(&graph, 2, &mut counting());

        let params = neuron.parameters();

        assert_eq!(params.len(), 3);
        assert!(Value::ptr_eq(&params[0], &neuron.weights()[0]));
        assert!(Value::ptr_eq(&params[1], &neuron.weights()[1]));
        assert!(Value::ptr_eq(&params[2], neuron.bias()));
    }

    #[rstest]
    #[case(vec![1.0, -2.0, 0.5])]
    #[case(vec![0.0, 0.0, 0.0])]
    #[case(vec![-3.0, 4.0, 2.5])]
    fn test_forward(#[case] inputs: Vec<f64>) {
        let graph = Graph::new();
        let neuron = Neuron::new(&graph, 3, &mut counting());

        let out = neuron.forward(inputs.clone()).unwrap();
        out.backward();

        let act = 0.4 + 0.1 * inputs[0] + 0.2 * inputs[1] + 0.3 * inputs[2];
        assert_abs_diff_eq!(out.data(), act.tanh(), epsilon = 1e-12);
        let local = 1.0 - act.tanh().powi(2);
        for (w, x) in neuron.weights().iter().zip(&inputs) {
            assert_abs_diff_eq!(w.grad(), local * x, epsilon = 1e-12);
        }
        assert_abs_diff_eq!(neuron.bias().grad(), local, epsilon = 1e-12);
    }

    #[test]
    fn test_forward_with_nodes() {
        let graph = Graph::new();
        let neuron = Neuron::new(&graph, 2, &mut || 0.5);
        let x = graph.labeled_leaf(1.0, "x");

        let out = neuron.forward([Operand::from(&x), Operand::from(2.0)]).unwrap();
        out.backward();

        assert_abs_diff_eq!(out.data(), 2.0f64.tanh(), epsilon = 1e-12);
        assert_abs_diff_eq!(x.grad(), 0.5 * (1.0 - 2.0f64.tanh().powi(2)), epsilon = 1e-12);
        assert_eq!(x.label().as_deref(), Some("x"));
    }

    #[test]
    fn test_forward_rebuilds_graph() {
        let graph = Graph::new();
        let neuron = Neuron::new(&graph, 2, &mut counting());

        let out1 = neuron.forward([1.0, 2.0]).unwrap();
        let out2 = neuron.forward([1.0, 2.0]).unwrap();

        assert_eq!(out1.data(), out2.data());
        assert!(!Value::ptr_eq(&out1, &out2));
    }

    #[test]
    fn test_forward_bias_is_first_operand() {
        let graph = Graph::new();
        let neuron = Neuron::new(&graph, 1, &mut counting());

        let out = neuron.forward([1.0]).unwrap();

        let leaves = out.leaves();
        assert!(leaves.iter().any(|l| Value::ptr_eq(l, neuron.bias())));
        let act = &out.operands()[0];
        assert!(Value::ptr_eq(&act.operands()[0], neuron.bias()));
    }

    #[test]
    fn test_forward_no_inputs() {
        let graph = Graph::new();
        let neuron = Neuron::new(&graph, 0, &mut || 0.3);

        let out = neuron.forward(Vec::<f64>::new()).unwrap();

        assert_abs_diff_eq!(out.data(), 0.3f64.tanh(), epsilon = 1e-12);
    }

    #[rstest]
    #[case(vec![1.0])]
    #[case(vec![1.0, 2.0, 3.0])]
    fn test_forward_err_arity(#[case] inputs: Vec<f64>) {
        let graph = Graph::new();
        let neuron = Neuron::new(&graph, 2, &mut counting());
        let before = graph.len();

        let res = neuron.forward(inputs.clone());

        assert_eq!(
            res.unwrap_err(),
            Error::InputArity {
                expected: 2,
                actual: inputs.len()
            }
        );
        assert_eq!(graph.len(), before);
    }

    #[test]
    fn test_forward_err_different_graphs() {
        let graph = Graph::new();
        let neuron = Neuron::new(&graph, 1, &mut counting());
        let x = Graph::new().leaf(1.0);
        let before = graph.len();

        let res = neuron.forward([x]);

        assert_eq!(
            res.unwrap_err(),
            Error::Autodiff(qgrad::Error::DifferentGraphs("forward"))
        );
        assert_eq!(graph.len(), before);
    }

    #[test]
    fn test_debug_skips_graph() {
        let graph = Graph::new();
        let neuron = Neuron::new(&graph, 2, &mut counting());
        let before = format!("{:?}", neuron);

        for _ in 0..10 {
            neuron.forward([1.0, 2.0]).unwrap().backward();
        }
        neuron.zero_grad();

        assert_eq!(format!("{:?}", neuron), before);
        assert!(!before.contains("Graph"));
    }

    #[test]
    fn test_labels() {
        let graph = Graph::new();
        let neuron = Neuron::_labeled(&graph, 2, "L1|N0".to_string(), &mut counting());
        let x = graph.leaf(5.0);

        let out = neuron.forward([Operand::from(1.0), Operand::from(&x)]).unwrap();

        assert_eq!(neuron.weights()[0].label().as_deref(), Some("L1|N0|w0"));
        assert_eq!(neuron.weights()[1].label().as_deref(), Some("L1|N0|w1"));
        assert_eq!(neuron.bias().label().as_deref(), Some("L1|N0|b"));
        assert_eq!(out.label().as_deref(), Some("L1|N0|o"));
        assert_eq!(x.label(), None);
        let wrapped: Vec<_> = out
            .leaves()
            .into_iter()
            .filter_map(|l| l.label())
            .filter(|l| l.contains("|i"))
            .collect();
        assert_eq!(wrapped, vec!["L1|N0|i0".to_string()]);
    }
}
