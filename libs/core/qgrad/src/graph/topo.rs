use super::tape::_Tape;

// -----------------------------------------------------------------------------
// _TopoWorkSpace
// -----------------------------------------------------------------------------
/// Reusable buffers for topological sorting.
///
/// `visited` grows with the tape and is cleared only for the nodes touched by
/// the last sort, so the cost of a sort is bounded by the size of the
/// reachable sub-graph rather than by the size of the whole tape.
#[derive(Debug, Default)]
pub(crate) struct _TopoWorkSpace {
    visited: Vec<bool>,
    stack: Vec<(usize, usize)>,
}

impl _TopoWorkSpace {
    /// Append every node reachable from `root` to `order`, operands first.
    ///
    /// Each node appears exactly once even if it is reachable through
    /// several paths. The traversal is an iterative depth-first post-order:
    /// a node is emitted only after all of its operand slots were processed,
    /// and operands are visited in slot order, so the result is the same as
    /// the recursive formulation without its depth limit.
    pub(crate) fn _sort(&mut self, tape: &_Tape, root: usize, order: &mut Vec<usize>) {
        let begin = order.len();
        if self.visited.len() < tape._len() {
            self.visited.resize(tape._len(), false);
        }
        let visited = &mut self.visited;
        let stack = &mut self.stack;
        stack.clear();

        visited[root] = true;
        stack.push((root, 0));
        while let Some((idx, slot)) = stack.last_mut() {
            match tape._cell(*idx).op._operand(*slot) {
                Some(operand) => {
                    *slot += 1;
                    // operands always precede their consumers on the tape,
                    // so a visited operand is either finished or shared
                    if !visited[operand] {
                        visited[operand] = true;
                        stack.push((operand, 0));
                    }
                }
                None => {
                    order.push(*idx);
                    stack.pop();
                }
            }
        }

        for idx in &order[begin..] {
            visited[*idx] = false;
        }
    }
}
