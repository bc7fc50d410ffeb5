//! Extension reduction to a fixed point.
//!
//! Walks the arena depth-first, replacing every extension node with its
//! reduction until no reducible node remains. Replacement happens by
//! overwriting the node's own arena slot, so parent links never need
//! rewiring. A reduction may itself contain extension nodes; those are
//! handled when the walk descends into the replacement's children.

use arbor_ir::{ExprArena, ExprId, ExprKind};
use tracing::trace;

use crate::errors::CompileError;

/// Rewrite steps allowed per node position before reduction is declared
/// non-terminating.
const MAX_REDUCE_STEPS: u32 = 64;

/// Reduce every extension node reachable from `root`, in place.
///
/// Reducing an already-irreducible tree is the identity. A node whose
/// reduction is itself still reducible to an equivalent shape exhausts
/// the step bound and fails with
/// [`CompileError::ReductionDidNotTerminate`].
pub fn reduce(arena: &mut ExprArena, root: ExprId) -> Result<(), CompileError> {
    reduce_at(arena, root)
}

fn reduce_at(arena: &mut ExprArena, id: ExprId) -> Result<(), CompileError> {
    let mut steps = 0u32;
    loop {
        let node = match arena.kind(id) {
            ExprKind::Extension(node) => node.clone(),
            _ => break,
        };
        steps += 1;
        if steps > MAX_REDUCE_STEPS {
            return Err(CompileError::ReductionDidNotTerminate { steps });
        }
        let replacement = node.reduce(arena);
        if replacement == id {
            // The reduction handed back the node itself; it can never
            // make progress.
            return Err(CompileError::ReductionDidNotTerminate { steps });
        }
        let kind = arena.kind(replacement).clone();
        let ty = arena.ty(replacement).clone();
        arena.replace(id, kind, ty);
        trace!(node = ?id, steps, "reduced extension node");
    }

    for child in arena.kind(id).children() {
        reduce_at(arena, child)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests {
    use std::sync::Arc;

    use arbor_ir::{BinaryOp, ExprArena, ExprId, Reduce, Ty, Value};
    use pretty_assertions::assert_eq;

    use super::*;

    /// Reduces to `lhs + rhs` over two constants.
    struct AddExt {
        lhs: i32,
        rhs: i32,
    }

    impl Reduce for AddExt {
        fn reduce(&self, arena: &mut ExprArena) -> ExprId {
            let lhs = arena.constant(Value::I32(self.lhs));
            let rhs = arena.constant(Value::I32(self.rhs));
            arena.binary(BinaryOp::Add, lhs, rhs)
        }

        fn result_ty(&self) -> Ty {
            Ty::I32
        }
    }

    /// Reduces to another copy of itself, forever.
    struct LoopExt;

    impl Reduce for LoopExt {
        fn reduce(&self, arena: &mut ExprArena) -> ExprId {
            arena.extension(Arc::new(LoopExt))
        }

        fn result_ty(&self) -> Ty {
            Ty::Unit
        }
    }

    #[test]
    fn reduces_to_primitive_nodes() {
        let mut arena = ExprArena::new();
        let root = arena.extension(Arc::new(AddExt { lhs: 2, rhs: 3 }));
        reduce(&mut arena, root).unwrap();
        assert!(matches!(arena.kind(root), ExprKind::Binary { .. }));
        assert_eq!(arena.ty(root), &Ty::I32);
    }

    #[test]
    fn irreducible_tree_is_unchanged() {
        let mut arena = ExprArena::new();
        let a = arena.param(0, Ty::I32);
        let b = arena.constant(Value::I32(1));
        let root = arena.binary(BinaryOp::Add, a, b);
        let before = arena.len();
        reduce(&mut arena, root).unwrap();
        assert_eq!(arena.len(), before);
        assert!(matches!(arena.kind(root), ExprKind::Binary { .. }));
    }

    #[test]
    fn nested_extensions_reduce_through_children() {
        let mut arena = ExprArena::new();
        let inner = arena.extension(Arc::new(AddExt { lhs: 1, rhs: 1 }));
        let outer = arena.block(vec![inner]);
        reduce(&mut arena, outer).unwrap();
        assert!(matches!(arena.kind(inner), ExprKind::Binary { .. }));
    }

    #[test]
    fn non_terminating_reduction_is_detected() {
        let mut arena = ExprArena::new();
        let root = arena.extension(Arc::new(LoopExt));
        let err = reduce(&mut arena, root).unwrap_err();
        assert!(matches!(
            err,
            CompileError::ReductionDidNotTerminate { steps } if steps > 0
        ));
    }
}
