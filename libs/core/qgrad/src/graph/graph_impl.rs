use std::{cell::RefCell, rc::Rc};

use crate::Value;

use super::{backward::_BackPropWorkSpace, tape::_Tape};

// -----------------------------------------------------------------------------
// _Graph
// Graph
// -----------------------------------------------------------------------------
#[derive(Debug, Default)]
pub(crate) struct _Graph {
    pub(crate) tape: _Tape,
    pub(crate) workspace: _BackPropWorkSpace,
}

/// Computation graph which owns every node created on it.
///
/// This is a handle: clones share the same nodes.
/// Nodes are never removed while the graph is alive.
pub struct Graph(pub(crate) Rc<RefCell<_Graph>>);

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph").field("len", &self.len()).finish()
    }
}

impl Clone for Graph {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

//
// ctor
//
impl Default for Graph {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Graph {
    #[inline]
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(_Graph::default())))
    }
}

// methods
impl Graph {
    /// Create a new leaf node which belongs to this graph.
    #[inline]
    pub fn leaf(&self, data: f64) -> Value {
        let index = self.0.borrow_mut().tape._reg_leaf(data, None);
        Value::_new(self.clone(), index)
    }

    /// Create a new leaf node with a diagnostic label.
    #[inline]
    pub fn labeled_leaf(&self, data: f64, label: impl Into<String>) -> Value {
        let index = self.0.borrow_mut().tape._reg_leaf(data, Some(label.into()));
        Value::_new(self.clone(), index)
    }

    /// Number of nodes created on this graph so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.0.borrow().tape._len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reset the gradient of every node of this graph to zero.
    ///
    /// Backward passes never do this on their own.
    pub fn zero_grad(&self) {
        for cell in self.0.borrow_mut().tape._cells_mut() {
            cell.grad = 0.0;
        }
    }

    /// Check that two graphs are the same instance.
    ///
    /// Note that this comparison is not based on the contents of the graphs.
    #[inline]
    pub fn ptr_eq(lhs: &Self, rhs: &Self) -> bool {
        Rc::ptr_eq(&lhs.0, &rhs.0)
    }
}
