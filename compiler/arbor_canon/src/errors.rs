//! Compile-time errors.

use thiserror::Error;

/// Error produced while reducing or lowering a tree. Unsupported shapes
/// fail here, at compile time, never at call time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// The node shape has no lowering (e.g. a nested lambda body).
    #[error("unsupported node shape: {kind}")]
    UnsupportedNode { kind: &'static str },

    /// The node cannot be resolved as an assignable location.
    #[error("expression is not assignable: {kind}")]
    NotAssignable { kind: &'static str },

    /// An extension node kept reducing to a reducible shape.
    #[error("extension reduction did not terminate after {steps} steps")]
    ReductionDidNotTerminate { steps: u32 },
}
