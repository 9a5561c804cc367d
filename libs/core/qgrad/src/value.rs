use std::fmt::{Debug, Display};

use crate::{
    graph::{Trace, _Op},
    Composite, Error, Graph, NodeId, Operation,
};

// -----------------------------------------------------------------------------
// Operand
// -----------------------------------------------------------------------------
/// Argument of an operation which accepts either a plain number or a node.
#[derive(Debug, Clone)]
pub enum Operand {
    Const(f64),
    Value(Value),
}

impl From<f64> for Operand {
    #[inline]
    fn from(v: f64) -> Self {
        Operand::Const(v)
    }
}

impl From<Value> for Operand {
    #[inline]
    fn from(v: Value) -> Self {
        Operand::Value(v)
    }
}

impl From<&Value> for Operand {
    #[inline]
    fn from(v: &Value) -> Self {
        Operand::Value(v.clone())
    }
}

impl Operand {
    /// Get the operand as a node.
    ///
    /// A constant is promoted to a fresh leaf on `graph`.
    /// A node is returned as is, whichever graph it belongs to.
    #[inline]
    pub fn into_value(self, graph: &Graph) -> Value {
        match self {
            Operand::Const(v) => graph.leaf(v),
            Operand::Value(v) => v,
        }
    }
}

// -----------------------------------------------------------------------------
// Value
// -----------------------------------------------------------------------------
/// Handle to a scalar node of a computation graph.
///
/// Clones refer to the same node. Every operation creates a new node on the
/// graph of its operands and leaves the operands untouched.
#[derive(Clone)]
pub struct Value {
    graph: Graph,
    index: usize,
}

impl Value {
    #[inline]
    pub(crate) fn _new(graph: Graph, index: usize) -> Self {
        Self { graph, index }
    }
}

//
// ser/de
//
impl Display for Value {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let internal = self.graph.0.borrow();
        let cell = internal.tape._cell(self.index);
        let op = match cell.composite {
            Some(composite) => composite.to_string(),
            None => cell.op._operation().to_string(),
        };
        write!(
            f,
            "Value(data={}, grad={}, op={}, label={})",
            cell.data,
            cell.grad,
            op,
            cell.label.as_deref().unwrap_or("?")
        )
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let internal = self.graph.0.borrow();
        let cell = internal.tape._cell(self.index);
        f.debug_struct("Value")
            .field("id", &NodeId(self.index))
            .field("data", &cell.data)
            .field("grad", &cell.grad)
            .field("op", &cell.op._operation())
            .field("composite", &cell.composite)
            .field("label", &cell.label)
            .finish()
    }
}

//
// accessors
//
impl Value {
    #[inline]
    pub fn id(&self) -> NodeId {
        NodeId(self.index)
    }

    #[inline]
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    #[inline]
    pub fn data(&self) -> f64 {
        self.graph.0.borrow().tape._cell(self.index).data
    }

    /// Overwrite the data of the node, e.g. for a parameter update.
    ///
    /// Nodes computed from this one keep their data until they are rebuilt.
    #[inline]
    pub fn set_data(&self, data: f64) {
        self.graph.0.borrow_mut().tape._cell_mut(self.index).data = data;
    }

    /// Gradient accumulated by the backward passes run so far.
    #[inline]
    pub fn grad(&self) -> f64 {
        self.graph.0.borrow().tape._cell(self.index).grad
    }

    #[inline]
    pub fn zero_grad(&self) {
        self.graph.0.borrow_mut().tape._cell_mut(self.index).grad = 0.0;
    }

    #[inline]
    pub fn label(&self) -> Option<String> {
        self.graph.0.borrow().tape._cell(self.index).label.clone()
    }

    #[inline]
    pub fn set_label(&self, label: impl Into<String>) {
        self.graph.0.borrow_mut().tape._cell_mut(self.index).label = Some(label.into());
    }

    /// Set the label and return the same handle.
    #[inline]
    pub fn with_label(self, label: impl Into<String>) -> Self {
        self.set_label(label);
        self
    }

    #[inline]
    pub fn operation(&self) -> Operation {
        self.graph.0.borrow().tape._cell(self.index).op._operation()
    }

    /// Subtraction or division this node was written as, if any.
    #[inline]
    pub fn composite(&self) -> Option<Composite> {
        self.graph.0.borrow().tape._cell(self.index).composite
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.operation() == Operation::Leaf
    }

    /// Operands of the node in slot order.
    ///
    /// A node used twice by the same operation is listed twice.
    pub fn operands(&self) -> Vec<Value> {
        let op = self.graph.0.borrow().tape._cell(self.index).op;
        op._operands()
            .map(|idx| Value::_new(self.graph.clone(), idx))
            .collect()
    }

    /// Check that two handles refer to the same node.
    #[inline]
    pub fn ptr_eq(lhs: &Self, rhs: &Self) -> bool {
        lhs.index == rhs.index && Graph::ptr_eq(&lhs.graph, &rhs.graph)
    }
}

//
// graph traversal
//
impl Value {
    /// Every node this one depends on, including itself, operands first.
    ///
    /// Each node is listed once, however many paths lead to it.
    pub fn topological_order(&self) -> Vec<Value> {
        let mut order = Vec::new();
        {
            let mut internal = self.graph.0.borrow_mut();
            let internal = &mut *internal;
            internal
                .workspace
                .topo
                ._sort(&internal.tape, self.index, &mut order);
        }
        order
            .into_iter()
            .map(|idx| Value::_new(self.graph.clone(), idx))
            .collect()
    }

    /// Leaf nodes this one depends on, in reverse topological order.
    pub fn leaves(&self) -> Vec<Value> {
        let mut leaves = self.topological_order();
        leaves.retain(Value::is_leaf);
        leaves.reverse();
        leaves
    }

    /// Run a backward pass from this node.
    ///
    /// Adds the gradient of this node with respect to every node it depends
    /// on to their `grad`. Gradients of previous passes are kept, so call
    /// [`Value::zero_grad`] or [`Graph::zero_grad`] before reusing the graph.
    pub fn backward(&self) {
        let mut internal = self.graph.0.borrow_mut();
        let internal = &mut *internal;
        internal.workspace._back_prop(&mut internal.tape, self.index);
    }

    /// Snapshot of every node this one depends on and the edges between them.
    pub fn trace(&self) -> Trace {
        let mut internal = self.graph.0.borrow_mut();
        let internal = &mut *internal;
        Trace::_collect(&mut internal.workspace.topo, &internal.tape, self.index)
    }
}

//
// operations
//
impl Value {
    /// `self + rhs`
    #[inline]
    pub fn checked_add(&self, rhs: impl Into<Operand>) -> Result<Value, Error> {
        let rhs = self._promote(rhs.into(), "add")?;
        Ok(self._add(&rhs))
    }

    /// `self * rhs`
    #[inline]
    pub fn checked_mul(&self, rhs: impl Into<Operand>) -> Result<Value, Error> {
        let rhs = self._promote(rhs.into(), "mul")?;
        Ok(self._mul(&rhs))
    }

    /// `self - rhs`, built as `self + (-rhs)`.
    #[inline]
    pub fn checked_sub(&self, rhs: impl Into<Operand>) -> Result<Value, Error> {
        let rhs = self._promote(rhs.into(), "sub")?;
        Ok(self._add(&rhs._neg())._composed(Composite::Sub))
    }

    /// `self / rhs`, built as `self * rhs^(-1)`.
    ///
    /// Dividing by a node whose data is zero is not an error;
    /// the result follows IEEE-754 and is not finite.
    #[inline]
    pub fn checked_div(&self, rhs: impl Into<Operand>) -> Result<Value, Error> {
        let rhs = self._promote(rhs.into(), "div")?;
        Ok(self._mul(&rhs._powf(-1.0))._composed(Composite::Div))
    }

    /// `self^exp` for a constant exponent.
    ///
    /// Raising to the power of a node is not supported and fails with
    /// [`Error::InvalidOperand`] without touching the graph.
    #[inline]
    pub fn pow(&self, exp: impl Into<Operand>) -> Result<Value, Error> {
        match exp.into() {
            Operand::Const(exp) => Ok(self._powf(exp)),
            Operand::Value(_) => Err(Error::InvalidOperand("pow")),
        }
    }

    #[inline]
    pub fn tanh(&self) -> Value {
        self._unary(f64::tanh, _Op::Tanh { arg: self.index })
    }

    #[inline]
    pub fn exp(&self) -> Value {
        self._unary(f64::exp, _Op::Exp { arg: self.index })
    }
}

// impls
impl Value {
    #[inline]
    fn _promote(&self, operand: Operand, op: &'static str) -> Result<Value, Error> {
        let value = operand.into_value(&self.graph);
        if !Graph::ptr_eq(&self.graph, &value.graph) {
            return Err(Error::DifferentGraphs(op));
        }
        Ok(value)
    }

    #[inline]
    fn _unary<F>(&self, forward: F, op: _Op) -> Value
    where
        F: FnOnce(f64) -> f64,
    {
        let index = self
            .graph
            .0
            .borrow_mut()
            .tape
            ._make_unary(self.index, forward, op);
        Value::_new(self.graph.clone(), index)
    }

    #[inline]
    fn _binary<F>(&self, rhs: &Value, forward: F, op: _Op) -> Value
    where
        F: FnOnce(f64, f64) -> f64,
    {
        let index = self
            .graph
            .0
            .borrow_mut()
            .tape
            ._make_binary(self.index, rhs.index, forward, op);
        Value::_new(self.graph.clone(), index)
    }

    #[inline]
    fn _add(&self, rhs: &Value) -> Value {
        let op = _Op::Add {
            lhs: self.index,
            rhs: rhs.index,
        };
        self._binary(rhs, |l, r| l + r, op)
    }

    #[inline]
    fn _mul(&self, rhs: &Value) -> Value {
        let op = _Op::Mul {
            lhs: self.index,
            rhs: rhs.index,
        };
        self._binary(rhs, |l, r| l * r, op)
    }

    #[inline]
    fn _composed(self, composite: Composite) -> Value {
        self.graph.0.borrow_mut().tape._cell_mut(self.index).composite = Some(composite);
        self
    }

    #[inline]
    fn _neg(&self) -> Value {
        self._mul(&self.graph.leaf(-1.0))
    }

    #[inline]
    fn _powf(&self, exp: f64) -> Value {
        let op = _Op::Pow {
            base: self.index,
            exp,
        };
        self._unary(|v| v.powf(exp), op)
    }
}

//
// arithmetic operators
//
impl std::ops::Neg for &Value {
    type Output = Value;

    #[inline]
    fn neg(self) -> Self::Output {
        self._neg()
    }
}

impl std::ops::Neg for Value {
    type Output = Value;

    #[inline]
    fn neg(self) -> Self::Output {
        self._neg()
    }
}

macro_rules! _define_arithmetic_binary {
    ($tr:ident, $fn:ident, $checked:ident, $ass_tr:ident, $ass_fn:ident) => {
        impl std::ops::$tr<&Value> for &Value {
            type Output = Value;

            #[inline]
            fn $fn(self, rhs: &Value) -> Self::Output {
                self.$checked(rhs).unwrap_or_else(|err| {
                    panic!(
                        "Cannot {} nodes: {} (lhs={:?}, rhs={:?})",
                        stringify!($fn),
                        err,
                        self.id(),
                        rhs.id()
                    )
                })
            }
        }
        impl std::ops::$tr<Value> for &Value {
            type Output = Value;

            #[inline]
            fn $fn(self, rhs: Value) -> Self::Output {
                std::ops::$tr::$fn(self, &rhs)
            }
        }
        impl std::ops::$tr<&Value> for Value {
            type Output = Value;

            #[inline]
            fn $fn(self, rhs: &Value) -> Self::Output {
                std::ops::$tr::$fn(&self, rhs)
            }
        }
        impl std::ops::$tr<Value> for Value {
            type Output = Value;

            #[inline]
            fn $fn(self, rhs: Value) -> Self::Output {
                std::ops::$tr::$fn(&self, &rhs)
            }
        }
        impl std::ops::$tr<f64> for &Value {
            type Output = Value;

            #[inline]
            fn $fn(self, rhs: f64) -> Self::Output {
                let rhs = self.graph.leaf(rhs);
                std::ops::$tr::$fn(self, &rhs)
            }
        }
        impl std::ops::$tr<f64> for Value {
            type Output = Value;

            #[inline]
            fn $fn(self, rhs: f64) -> Self::Output {
                std::ops::$tr::$fn(&self, rhs)
            }
        }
        impl std::ops::$tr<&Value> for f64 {
            type Output = Value;

            #[inline]
            fn $fn(self, rhs: &Value) -> Self::Output {
                let lhs = rhs.graph.leaf(self);
                std::ops::$tr::$fn(&lhs, rhs)
            }
        }
        impl std::ops::$tr<Value> for f64 {
            type Output = Value;

            #[inline]
            fn $fn(self, rhs: Value) -> Self::Output {
                std::ops::$tr::$fn(self, &rhs)
            }
        }
        impl std::ops::$ass_tr<&Value> for Value {
            #[inline]
            fn $ass_fn(&mut self, rhs: &Value) {
                *self = std::ops::$tr::$fn(&*self, rhs);
            }
        }
        impl std::ops::$ass_tr<Value> for Value {
            #[inline]
            fn $ass_fn(&mut self, rhs: Value) {
                *self = std::ops::$tr::$fn(&*self, &rhs);
            }
        }
        impl std::ops::$ass_tr<f64> for Value {
            #[inline]
            fn $ass_fn(&mut self, rhs: f64) {
                *self = std::ops::$tr::$fn(&*self, rhs);
            }
        }
    };
}

_define_arithmetic_binary!(Add, add, checked_add, AddAssign, add_assign);
_define_arithmetic_binary!(Sub, sub, checked_sub, SubAssign, sub_assign);
_define_arithmetic_binary!(Mul, mul, checked_mul, MulAssign, mul_assign);
_define_arithmetic_binary!(Div, div, checked_div, DivAssign, div_assign);
