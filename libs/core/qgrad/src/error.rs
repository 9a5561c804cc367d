// -----------------------------------------------------------------------------
// Error
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    #[error("Only real-number constants are supported as the operand of '{0}'")]
    InvalidOperand(&'static str),
    #[error("Different graphs are used for an operation '{0}'")]
    DifferentGraphs(&'static str),
}
