//! Runtime faults raised by compiled callables.

use thiserror::Error;

use crate::expr::BinaryOp;

/// Fault raised while a compiled callable runs.
///
/// `CheckNullReferences` mode converts only owner-is-null dereference
/// outcomes into default-value short-circuits; every other fault
/// propagates to the caller untouched, in both modes. No fault is
/// retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Fault {
    /// Dereferenced a null owner (mode `NONE` only; guards suppress this
    /// under `CHECK_NULL_REFERENCES`).
    #[error("null reference")]
    NullReference,

    /// Integer division or remainder by zero. Never suppressed by null
    /// guarding; floating-point division follows IEEE 754 instead.
    #[error("division by zero")]
    DivideByZero,

    /// Array or indexer bounds violation. Never suppressed by null
    /// guarding.
    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    /// Wrong number of arguments (invoke-time, or index rank mismatch).
    #[error("expected {expected} arguments, got {got}")]
    Arity { expected: usize, got: usize },

    /// Operator applied to operand types it does not support.
    #[error("operator {op} not supported between {lhs} and {rhs}")]
    UnsupportedOperands {
        op: BinaryOp,
        lhs: &'static str,
        rhs: &'static str,
    },

    /// A value had the wrong runtime shape for the operation.
    #[error("expected {expected}, got {got}")]
    TypeMismatch {
        expected: &'static str,
        got: &'static str,
    },
}
