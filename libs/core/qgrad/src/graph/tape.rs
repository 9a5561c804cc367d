use std::fmt::Display;

// -----------------------------------------------------------------------------
// NodeId
// -----------------------------------------------------------------------------
/// Identifier of a node inside the graph which owns it.
///
/// Ids are stable for the lifetime of the graph and are only meaningful
/// together with that graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize, schemars::JsonSchema)
)]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node on the tape.
    #[inline]
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// -----------------------------------------------------------------------------
// Operation
// -----------------------------------------------------------------------------
/// Tag of the operation which produced a node.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize, schemars::JsonSchema)
)]
pub enum Operation {
    Leaf,
    Add,
    Mul,
    Pow(f64),
    Tanh,
    Exp,
}

impl Display for Operation {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Leaf => Ok(()),
            Operation::Add => write!(f, "+"),
            Operation::Mul => write!(f, "*"),
            Operation::Pow(exp) => write!(f, "**{}", exp),
            Operation::Tanh => write!(f, "tanh"),
            Operation::Exp => write!(f, "exp"),
        }
    }
}

// -----------------------------------------------------------------------------
// Composite
// -----------------------------------------------------------------------------
/// Operation written by the caller when it is built from primitive ones.
///
/// `a - b` is recorded as an [`Operation::Add`] node and `a / b` as an
/// [`Operation::Mul`] node; this tag tells renderers which one was meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize, schemars::JsonSchema)
)]
pub enum Composite {
    Sub,
    Div,
}

impl Display for Composite {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Composite::Sub => write!(f, "+(-)"),
            Composite::Div => write!(f, "*(/)"),
        }
    }
}

// -----------------------------------------------------------------------------
// _Op
// -----------------------------------------------------------------------------
/// Operation together with the tape indices of its operands.
///
/// Both slots of a binary operation may refer to the same node, e.g. `x * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum _Op {
    // nullary
    Leaf,

    // unary
    Pow { base: usize, exp: f64 },
    Tanh { arg: usize },
    Exp { arg: usize },

    // binary
    Add { lhs: usize, rhs: usize },
    Mul { lhs: usize, rhs: usize },
}

impl _Op {
    /// Operand stored in the given slot.
    #[inline]
    pub(crate) fn _operand(&self, slot: usize) -> Option<usize> {
        match (self, slot) {
            (_Op::Pow { base: arg, .. } | _Op::Tanh { arg } | _Op::Exp { arg }, 0) => Some(*arg),
            (_Op::Add { lhs, .. } | _Op::Mul { lhs, .. }, 0) => Some(*lhs),
            (_Op::Add { rhs, .. } | _Op::Mul { rhs, .. }, 1) => Some(*rhs),
            _ => None,
        }
    }

    #[inline]
    pub(crate) fn _operands(&self) -> impl Iterator<Item = usize> + '_ {
        (0..).map_while(|slot| self._operand(slot))
    }

    #[inline]
    pub(crate) fn _operation(&self) -> Operation {
        match self {
            _Op::Leaf => Operation::Leaf,
            _Op::Pow { exp, .. } => Operation::Pow(*exp),
            _Op::Tanh { .. } => Operation::Tanh,
            _Op::Exp { .. } => Operation::Exp,
            _Op::Add { .. } => Operation::Add,
            _Op::Mul { .. } => Operation::Mul,
        }
    }
}

// -----------------------------------------------------------------------------
// _Cell
// _Tape
// -----------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub(crate) struct _Cell {
    pub(crate) data: f64,
    pub(crate) grad: f64,
    pub(crate) label: Option<String>,
    pub(crate) op: _Op,
    pub(crate) composite: Option<Composite>,
}

/// Arena of nodes.
///
/// Nodes are only appended and never move, so an index handed out once
/// keeps referring to the same node. Operands are always registered before
/// the nodes consuming them, hence every operand index is smaller than the
/// index of its consumer and the operand relation can not form a cycle.
#[derive(Debug, Default)]
pub(crate) struct _Tape {
    cells: Vec<_Cell>,
}

impl _Tape {
    #[inline]
    pub(crate) fn _len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub(crate) fn _cell(&self, idx: usize) -> &_Cell {
        self.cells.get(idx).expect("Tape must manage this node")
    }

    #[inline]
    pub(crate) fn _cell_mut(&mut self, idx: usize) -> &mut _Cell {
        self.cells.get_mut(idx).expect("Tape must manage this node")
    }

    #[inline]
    pub(crate) fn _cells_mut(&mut self) -> impl Iterator<Item = &mut _Cell> {
        self.cells.iter_mut()
    }

    #[inline]
    pub(crate) fn _reg_leaf(&mut self, data: f64, label: Option<String>) -> usize {
        self._reg_node(_Cell {
            data,
            grad: 0.0,
            label,
            op: _Op::Leaf,
            composite: None,
        })
    }

    #[inline]
    pub(crate) fn _make_unary<F>(&mut self, arg: usize, forward: F, op: _Op) -> usize
    where
        F: FnOnce(f64) -> f64,
    {
        let data = forward(self._cell(arg).data);
        self._reg_node(_Cell {
            data,
            grad: 0.0,
            label: None,
            op,
            composite: None,
        })
    }

    #[inline]
    pub(crate) fn _make_binary<F>(&mut self, lhs: usize, rhs: usize, forward: F, op: _Op) -> usize
    where
        F: FnOnce(f64, f64) -> f64,
    {
        let data = forward(self._cell(lhs).data, self._cell(rhs).data);
        self._reg_node(_Cell {
            data,
            grad: 0.0,
            label: None,
            op,
            composite: None,
        })
    }

    #[inline]
    fn _reg_node(&mut self, cell: _Cell) -> usize {
        self.cells.push(cell);
        self.cells.len() - 1
    }

    /// Backward rule of the node at `idx`.
    ///
    /// Pushes `grads[idx]` to the operands of the node, scaled by the local
    /// derivatives. Contributions are always added so that an operand which
    /// appears in both slots, or under several consumers, receives all of them.
    pub(crate) fn _propagate(&self, idx: usize, grads: &mut [f64]) {
        let cell = self._cell(idx);
        let seed = grads[idx];
        match cell.op {
            _Op::Leaf => {}
            _Op::Pow { base, exp } => {
                let val = self._cell(base).data;
                grads[base] += exp * val.powf(exp - 1.0) * seed;
            }
            _Op::Tanh { arg } => {
                grads[arg] += (1.0 - cell.data * cell.data) * seed;
            }
            _Op::Exp { arg } => {
                grads[arg] += cell.data * seed;
            }
            _Op::Add { lhs, rhs } => {
                grads[lhs] += seed;
                grads[rhs] += seed;
            }
            _Op::Mul { lhs, rhs } => {
                let lhs_val = self._cell(lhs).data;
                let rhs_val = self._cell(rhs).data;
                grads[lhs] += rhs_val * seed;
                grads[rhs] += lhs_val * seed;
            }
        }
        log::trace!("propagated {} of node {} (grad={})", cell.op._operation(), idx, seed);
    }
}
