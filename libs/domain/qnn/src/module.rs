use qgrad::{Operand, Value};

use crate::Error;

// -----------------------------------------------------------------------------
// Module
// -----------------------------------------------------------------------------
/// Building block of a network.
pub trait Module {
    type Output;

    /// Build the expression of this module on the given inputs.
    ///
    /// Raw numbers are promoted to fresh leaves. Every call creates new nodes.
    fn forward<I>(&self, inputs: I) -> Result<Self::Output, Error>
    where
        I: IntoIterator,
        I::Item: Into<Operand>;

    /// Trainable leaves owned by this module, in a stable order.
    fn parameters(&self) -> Vec<Value>;

    /// Reset the gradient of every parameter.
    fn zero_grad(&self) {
        for p in self.parameters() {
            p.zero_grad();
        }
    }
}
