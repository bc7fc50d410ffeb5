//! Arbor Eval - codegen backend and entry point for the arbor compiler.
//!
//! `compile` drives the full pipeline: clone the caller's arena, reduce
//! extension nodes to a fixed point, lower to primitive form
//! (`arbor_canon`), then fold the lowered arena into a closure graph.
//! The result is a [`CompiledFn`] that binds its parameters 1:1 to
//! positional arguments and is safe for unbounded repeated invocation,
//! including concurrently - each call gets its own frame and the
//! callable holds no internal mutable shared state.
//!
//! # Re-exports
//!
//! The input-side types (`ExprTree`, `ExprArena`, `Value`, `Ty`,
//! `Member`, `CompilerOptions`, `Fault`) are re-exported from
//! `arbor_ir`, and `CompileError` from `arbor_canon`, so embedders can
//! depend on this crate alone.

mod cache;
mod codegen;
mod compiled;
mod operators;
#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests;

use tracing::debug;

pub use arbor_canon::CompileError;
pub use arbor_ir::{
    ArrayValue, BinaryOp, CompilerOptions, ExprArena, ExprId, ExprKind, ExprTree, Fault, Member,
    MemberAccessor, Param, Reduce, StepOp, Ty, Value,
};

pub use cache::CompileCache;
pub use compiled::CompiledFn;
pub use operators::eval_binary;

/// Compile an expression tree into a directly invocable callable.
///
/// Deterministic for identical inputs and never mutates `tree` (the
/// reduction pass works on a clone of the arena). Unsupported node
/// shapes fail here, at compile time, never at call time.
pub fn compile(tree: &ExprTree, options: CompilerOptions) -> Result<CompiledFn, CompileError> {
    let mut arena = tree.arena.clone();
    arbor_canon::reduce(&mut arena, tree.root)?;

    let arity = tree.params.len() as u32;
    let lowered = arbor_canon::lower(&arena, tree.root, arity, options)?;
    let result_ty = lowered.arena.ty(lowered.root).clone();
    let root = codegen::emit(&lowered.arena, lowered.root);
    debug!(
        arity,
        slots = lowered.slot_count,
        ?options,
        "compiled expression tree"
    );

    Ok(CompiledFn::new(
        arity as usize,
        lowered.slot_count as usize,
        result_ty,
        root,
    ))
}
