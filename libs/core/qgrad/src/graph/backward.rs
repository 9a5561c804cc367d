use super::{tape::_Tape, topo::_TopoWorkSpace};

// -----------------------------------------------------------------------------
// _BackPropWorkSpace
// -----------------------------------------------------------------------------
/// Buffers reused across backward passes on the same graph.
#[derive(Debug, Default)]
pub(crate) struct _BackPropWorkSpace {
    pub(crate) topo: _TopoWorkSpace,
    order: Vec<usize>,
    grads_memo: Vec<f64>,
}

impl _BackPropWorkSpace {
    /// Run one backward pass from `root`.
    ///
    /// The pass works on its own gradient buffer: the root is seeded with one
    /// and every backward rule is applied exactly once, consumers before their
    /// operands. Only after the whole pass the buffer is added to the
    /// gradients stored on the tape, so gradients of consecutive passes add up
    /// until the caller zeroes them. The stored gradient of the root itself is
    /// set to one rather than accumulated.
    pub(crate) fn _back_prop(&mut self, tape: &mut _Tape, root: usize) {
        let order = &mut self.order;
        order.clear();
        self.topo._sort(tape, root, order);

        let grads_memo = &mut self.grads_memo;
        if grads_memo.len() < tape._len() {
            grads_memo.resize(tape._len(), 0.0);
        }
        grads_memo[root] = 1.0;

        log::debug!("backward pass from node {} over {} nodes", root, order.len());
        for idx in order.iter().rev() {
            tape._propagate(*idx, grads_memo);
        }

        for idx in order.iter() {
            let cell = tape._cell_mut(*idx);
            if *idx == root {
                cell.grad = 1.0;
            } else {
                cell.grad += grads_memo[*idx];
            }
            grads_memo[*idx] = 0.0;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::_Op;

    use super::*;

    #[test]
    fn test_back_prop_leaf() {
        let mut tape = _Tape::default();
        let x = tape._reg_leaf(4.2, None);
        let mut ws = _BackPropWorkSpace::default();

        ws._back_prop(&mut tape, x);

        assert_eq!(tape._cell(x).grad, 1.0);
    }

    #[test]
    fn test_back_prop_shared_node() {
        // y = x0 * x1; z = exp(y); w = y * z
        let mut tape = _Tape::default();
        let x0 = tape._reg_leaf(0.5, None);
        let x1 = tape._reg_leaf(-1.5, None);
        let y = tape._make_binary(x0, x1, |l, r| l * r, _Op::Mul { lhs: x0, rhs: x1 });
        let z = tape._make_unary(y, f64::exp, _Op::Exp { arg: y });
        let w = tape._make_binary(y, z, |l, r| l * r, _Op::Mul { lhs: y, rhs: z });
        let mut ws = _BackPropWorkSpace::default();

        ws._back_prop(&mut tape, w);

        // dw/dy = exp(y) + y * exp(y)
        let yv = 0.5 * -1.5f64;
        let dy = yv.exp() * (1.0 + yv);
        approx::assert_abs_diff_eq!(tape._cell(y).grad, dy, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(tape._cell(x0).grad, dy * -1.5, epsilon = 1e-12);
        approx::assert_abs_diff_eq!(tape._cell(x1).grad, dy * 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_back_prop_leaves_unreachable_untouched() {
        let mut tape = _Tape::default();
        let x = tape._reg_leaf(2.0, None);
        let y = tape._reg_leaf(3.0, None);
        let z = tape._make_unary(x, |v| v.powf(2.0), _Op::Pow { base: x, exp: 2.0 });
        let mut ws = _BackPropWorkSpace::default();

        ws._back_prop(&mut tape, z);

        assert_eq!(tape._cell(x).grad, 4.0);
        assert_eq!(tape._cell(y).grad, 0.0);
    }

    #[test]
    fn test_back_prop_accumulates_between_passes() {
        // w = (x + x) * x
        let mut tape = _Tape::default();
        let x = tape._reg_leaf(3.0, None);
        let y = tape._make_binary(x, x, |l, r| l + r, _Op::Add { lhs: x, rhs: x });
        let w = tape._make_binary(y, x, |l, r| l * r, _Op::Mul { lhs: y, rhs: x });
        let mut ws = _BackPropWorkSpace::default();

        ws._back_prop(&mut tape, w);
        assert_eq!(tape._cell(w).grad, 1.0);
        assert_eq!(tape._cell(y).grad, 3.0);
        assert_eq!(tape._cell(x).grad, 12.0);

        ws._back_prop(&mut tape, w);
        assert_eq!(tape._cell(w).grad, 1.0);
        assert_eq!(tape._cell(y).grad, 6.0);
        assert_eq!(tape._cell(x).grad, 24.0);
    }

    #[test]
    fn test_back_prop_root_is_seeded_not_accumulated() {
        // w = y * x, y = x + x
        let mut tape = _Tape::default();
        let x = tape._reg_leaf(3.0, None);
        let y = tape._make_binary(x, x, |l, r| l + r, _Op::Add { lhs: x, rhs: x });
        let w = tape._make_binary(y, x, |l, r| l * r, _Op::Mul { lhs: y, rhs: x });
        let mut ws = _BackPropWorkSpace::default();

        ws._back_prop(&mut tape, w);
        ws._back_prop(&mut tape, y);
        assert_eq!(tape._cell(y).grad, 1.0);
        assert_eq!(tape._cell(x).grad, 14.0);

        ws._back_prop(&mut tape, w);
        assert_eq!(tape._cell(w).grad, 1.0);
        assert_eq!(tape._cell(y).grad, 4.0);
        assert_eq!(tape._cell(x).grad, 26.0);
    }
}
