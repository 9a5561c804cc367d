mod error;
mod graph;
mod value;

pub use error::Error;
pub use graph::{Composite, Graph, NodeId, Operation, Trace, TraceNode};
pub use value::{Operand, Value};
