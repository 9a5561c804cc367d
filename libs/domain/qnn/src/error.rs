// -----------------------------------------------------------------------------
// Error
// -----------------------------------------------------------------------------
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("Expected {expected} inputs but {actual} are given")]
    InputArity { expected: usize, actual: usize },
    #[error("Invalid range for initialization: [{low}, {high})")]
    InitRange { low: f64, high: f64 },
    #[error(transparent)]
    Autodiff(#[from] qgrad::Error),
}
