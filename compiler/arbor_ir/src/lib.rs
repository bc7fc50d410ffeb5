//! Arbor IR - expression tree and lowered IR types for the arbor compiler.
//!
//! This crate is the shared data model for the whole pipeline:
//!
//! - `ExprArena` / `ExprId` / `ExprKind`: the caller-built, immutable
//!   expression tree (the compiler's input).
//! - `CanArena` / `CanId` / `CanExpr`: the primitive lowered form produced
//!   by `arbor_canon`. Compound assignment, increment/decrement, and
//!   extension nodes cannot be represented here - enforced at the type
//!   level.
//! - `Ty` / `Value`: static types and runtime values.
//! - `Member`: member/indexer metadata with embedder-supplied accessors.
//! - `Fault`: runtime faults raised by compiled callables.
//! - `CompilerOptions`: additive compilation flags.

mod canon;
mod expr;
mod expr_id;
mod fault;
mod member;
mod options;
mod ty;
mod value;

pub use canon::{CanArena, CanExpr, CanId, SlotId};
pub use expr::{BinaryOp, ExprArena, ExprKind, ExprTree, Param, Reduce, StepOp};
pub use expr_id::ExprId;
pub use fault::Fault;
pub use member::{Member, MemberAccessor};
pub use options::CompilerOptions;
pub use ty::Ty;
pub use value::{ArrayValue, ObjRef, Value};
