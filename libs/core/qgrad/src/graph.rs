mod backward;
mod graph_impl;
mod tape;
mod topo;
mod trace;

pub(crate) use tape::_Op;

pub use graph_impl::Graph;
pub use tape::{Composite, NodeId, Operation};
pub use trace::{Trace, TraceNode};
