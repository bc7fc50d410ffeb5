//! Arbor Canon - reduction and lowering passes.
//!
//! Transforms a caller-built `ExprArena` into the primitive `CanArena`
//! the codegen backend consumes:
//!
//! 1. **Extension reduction**: pluggable composite nodes are rewritten
//!    into primitive nodes until a fixed point, with a bounded step
//!    count per node position.
//! 2. **Lowering**: assignable targets are resolved into
//!    single-evaluation locations; access chains get null guards under
//!    `CHECK_NULL_REFERENCES`; compound assignment and
//!    increment/decrement become explicit read-modify-write sequences
//!    over slot-cached owners and indices.
//!
//! The input arena is never mutated by callers of `compile`; the engine
//! hands this crate a clone.

mod errors;
mod lower;
mod reduce;

pub use errors::CompileError;
pub use lower::{lower, LowerResult};
pub use reduce::reduce;
