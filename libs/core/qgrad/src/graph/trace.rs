use std::collections::BTreeSet;

use super::{
    tape::{Composite, NodeId, Operation, _Tape},
    topo::_TopoWorkSpace,
};

// -----------------------------------------------------------------------------
// TraceNode
// Trace
// -----------------------------------------------------------------------------
/// Read-only copy of a node at the time of tracing.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize, schemars::JsonSchema)
)]
pub struct TraceNode {
    pub id: NodeId,
    pub data: f64,
    pub grad: f64,
    pub operation: Operation,
    /// Set when the node was written as a subtraction or a division.
    pub composite: Option<Composite>,
    pub label: Option<String>,
}

/// Snapshot of the sub-graph reachable from a root.
///
/// This is what graph renderers consume. Nodes are listed operands first and
/// each edge is `(operand, consumer)`. An operand used twice by the same
/// consumer yields a single edge.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize, schemars::JsonSchema)
)]
pub struct Trace {
    pub nodes: Vec<TraceNode>,
    pub edges: Vec<(NodeId, NodeId)>,
}

impl Trace {
    pub(crate) fn _collect(ws: &mut _TopoWorkSpace, tape: &_Tape, root: usize) -> Self {
        let mut order = Vec::new();
        ws._sort(tape, root, &mut order);

        let mut edges = BTreeSet::new();
        let nodes = order
            .into_iter()
            .map(|idx| {
                let cell = tape._cell(idx);
                for operand in cell.op._operands() {
                    edges.insert((NodeId(operand), NodeId(idx)));
                }
                TraceNode {
                    id: NodeId(idx),
                    data: cell.data,
                    grad: cell.grad,
                    operation: cell.op._operation(),
                    composite: cell.composite,
                    label: cell.label.clone(),
                }
            })
            .collect();

        Trace {
            nodes,
            edges: edges.into_iter().collect(),
        }
    }

    /// Look up a node of the snapshot by its id.
    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&TraceNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}
