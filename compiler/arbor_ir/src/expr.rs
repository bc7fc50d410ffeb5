//! The caller-built expression tree.
//!
//! Trees are arena-based: `ExprArena` holds parallel `kinds`/`tys`
//! arrays indexed by `ExprId`. A complete callable shape is an
//! `ExprTree` (arena + parameter list + root). Trees are immutable once
//! handed to the compiler; `compile` clones the arena before the
//! reduction pass touches it.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::expr_id::ExprId;
use crate::member::Member;
use crate::ty::Ty;
use crate::value::Value;

/// Binary operator. Covers the arithmetic and bitwise set the
/// compound-assignment lowering targets.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    BitAnd,
    BitOr,
    BitXor,
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
        };
        write!(f, "{symbol}")
    }
}

/// Increment/decrement form.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StepOp {
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl StepOp {
    /// Whether the form yields the *new* value (pre) or the value read
    /// before mutation (post).
    #[inline]
    pub fn yields_new(self) -> bool {
        matches!(self, StepOp::PreInc | StepOp::PreDec)
    }

    /// The underlying binary operator (`+ 1` or `- 1`).
    #[inline]
    pub fn binary_op(self) -> BinaryOp {
        match self {
            StepOp::PreInc | StepOp::PostInc => BinaryOp::Add,
            StepOp::PreDec | StepOp::PostDec => BinaryOp::Sub,
        }
    }
}

/// A callable parameter. Parameters bind 1:1 to the compiled callable's
/// positional arguments as simple slots requiring no guard.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: Ty,
}

impl Param {
    pub fn new(name: &str, ty: Ty) -> Self {
        Self {
            name: name.to_string(),
            ty,
        }
    }
}

/// A pluggable composite node that rewrites itself into primitive nodes.
///
/// `reduce` may push new nodes into the arena and returns the root of
/// the replacement. The reducer re-examines the result, so a reduction
/// may itself contain further extension nodes; rewriting is bounded per
/// node position to detect non-termination.
pub trait Reduce: Send + Sync {
    fn reduce(&self, arena: &mut ExprArena) -> ExprId;
    /// Static type of the reduced expression.
    fn result_ty(&self) -> Ty;
}

/// Expression node kind.
#[derive(Clone)]
pub enum ExprKind {
    /// Parameter slot read.
    Param(u32),
    /// Literal constant.
    Const(Value),
    /// Member access; `owner: None` is a static member.
    Member {
        owner: Option<ExprId>,
        member: Member,
    },
    /// Custom indexer access (`owner[args...]` through a member's
    /// accessor pair).
    Index {
        owner: ExprId,
        member: Member,
        args: SmallVec<[ExprId; 2]>,
    },
    /// Built-in N-dimensional array element access, row-major.
    ArrayIndex {
        array: ExprId,
        indices: SmallVec<[ExprId; 2]>,
    },
    /// Plain assignment; yields the assigned value.
    Assign { target: ExprId, value: ExprId },
    /// Compound assignment `target op= value`; yields the new value.
    Compound {
        op: BinaryOp,
        target: ExprId,
        value: ExprId,
    },
    /// Increment/decrement.
    Step { op: StepOp, target: ExprId },
    /// Binary operator application.
    Binary {
        op: BinaryOp,
        lhs: ExprId,
        rhs: ExprId,
    },
    /// Expression sequence; yields the last expression's value.
    Block { exprs: Vec<ExprId> },
    /// Nested lambda. Not a lowering target; the engine rejects it with
    /// `UnsupportedNode` at compile time.
    Lambda(Arc<ExprTree>),
    /// Opaque reducible carrier for caller-supplied composite nodes.
    Extension(Arc<dyn Reduce>),
}

impl ExprKind {
    /// Kind name for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            ExprKind::Param(_) => "parameter",
            ExprKind::Const(_) => "constant",
            ExprKind::Member { .. } => "member access",
            ExprKind::Index { .. } => "indexer access",
            ExprKind::ArrayIndex { .. } => "array access",
            ExprKind::Assign { .. } => "assignment",
            ExprKind::Compound { .. } => "compound assignment",
            ExprKind::Step { .. } => "increment/decrement",
            ExprKind::Binary { .. } => "binary operator",
            ExprKind::Block { .. } => "block",
            ExprKind::Lambda(_) => "lambda",
            ExprKind::Extension(_) => "extension",
        }
    }

    /// Direct child expression IDs, in evaluation order.
    pub fn children(&self) -> SmallVec<[ExprId; 4]> {
        let mut out = SmallVec::new();
        match self {
            ExprKind::Param(_)
            | ExprKind::Const(_)
            | ExprKind::Lambda(_)
            | ExprKind::Extension(_) => {}
            ExprKind::Member { owner, .. } => out.extend(owner.iter().copied()),
            ExprKind::Index { owner, args, .. } => {
                out.push(*owner);
                out.extend(args.iter().copied());
            }
            ExprKind::ArrayIndex { array, indices } => {
                out.push(*array);
                out.extend(indices.iter().copied());
            }
            ExprKind::Assign { target, value } | ExprKind::Compound { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            ExprKind::Step { target, .. } => out.push(*target),
            ExprKind::Binary { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            ExprKind::Block { exprs } => out.extend(exprs.iter().copied()),
        }
        out
    }
}

// Manual Debug: `Extension` holds a non-Debug trait object.
impl fmt::Debug for ExprKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprKind::Param(slot) => write!(f, "Param({slot})"),
            ExprKind::Const(v) => write!(f, "Const({v:?})"),
            ExprKind::Member { owner, member } => {
                write!(f, "Member({owner:?}.{})", member.name())
            }
            ExprKind::Index {
                owner,
                member,
                args,
            } => {
                write!(f, "Index({owner:?}.{}{args:?})", member.name())
            }
            ExprKind::ArrayIndex { array, indices } => {
                write!(f, "ArrayIndex({array:?}{indices:?})")
            }
            ExprKind::Assign { target, value } => write!(f, "Assign({target:?} = {value:?})"),
            ExprKind::Compound { op, target, value } => {
                write!(f, "Compound({target:?} {op}= {value:?})")
            }
            ExprKind::Step { op, target } => write!(f, "Step({op:?} {target:?})"),
            ExprKind::Binary { op, lhs, rhs } => write!(f, "Binary({lhs:?} {op} {rhs:?})"),
            ExprKind::Block { exprs } => write!(f, "Block({exprs:?})"),
            ExprKind::Lambda(_) => write!(f, "Lambda(..)"),
            ExprKind::Extension(_) => write!(f, "Extension(..)"),
        }
    }
}

/// Arena of expression nodes. `kinds` and `tys` are parallel arrays
/// indexed by `ExprId`.
#[derive(Clone, Debug, Default)]
pub struct ExprArena {
    kinds: Vec<ExprKind>,
    tys: Vec<Ty>,
}

impl ExprArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Push a node with an explicit static type.
    pub fn push(&mut self, kind: ExprKind, ty: Ty) -> ExprId {
        debug_assert!(self.kinds.len() < u32::MAX as usize);
        let id = ExprId::new(self.kinds.len() as u32);
        self.kinds.push(kind);
        self.tys.push(ty);
        id
    }

    pub fn kind(&self, id: ExprId) -> &ExprKind {
        &self.kinds[id.index()]
    }

    pub fn ty(&self, id: ExprId) -> &Ty {
        &self.tys[id.index()]
    }

    /// Overwrite a node in place. Used by the extension reducer so
    /// parent links stay valid; the input tree itself is never mutated
    /// (the compiler works on a clone).
    pub fn replace(&mut self, id: ExprId, kind: ExprKind, ty: Ty) {
        self.kinds[id.index()] = kind;
        self.tys[id.index()] = ty;
    }

    // Convenience builders. Types are derived where the node shape
    // determines them; use `push` for anything these do not cover
    // (e.g. typed no-value constants).

    pub fn param(&mut self, slot: u32, ty: Ty) -> ExprId {
        self.push(ExprKind::Param(slot), ty)
    }

    pub fn constant(&mut self, value: Value) -> ExprId {
        let ty = value.ty();
        self.push(ExprKind::Const(value), ty)
    }

    pub fn member(&mut self, owner: Option<ExprId>, member: &Member) -> ExprId {
        let ty = member.ty().clone();
        self.push(
            ExprKind::Member {
                owner,
                member: member.clone(),
            },
            ty,
        )
    }

    pub fn index(
        &mut self,
        owner: ExprId,
        member: &Member,
        args: impl IntoIterator<Item = ExprId>,
    ) -> ExprId {
        let ty = member.ty().clone();
        self.push(
            ExprKind::Index {
                owner,
                member: member.clone(),
                args: args.into_iter().collect(),
            },
            ty,
        )
    }

    pub fn array_index(
        &mut self,
        array: ExprId,
        indices: impl IntoIterator<Item = ExprId>,
    ) -> ExprId {
        let elem = match self.ty(array) {
            Ty::Array(elem) => (**elem).clone(),
            other => other.clone(),
        };
        self.push(
            ExprKind::ArrayIndex {
                array,
                indices: indices.into_iter().collect(),
            },
            elem,
        )
    }

    pub fn assign(&mut self, target: ExprId, value: ExprId) -> ExprId {
        let ty = self.ty(target).clone();
        self.push(ExprKind::Assign { target, value }, ty)
    }

    pub fn compound(&mut self, op: BinaryOp, target: ExprId, value: ExprId) -> ExprId {
        let ty = self.ty(target).clone();
        self.push(ExprKind::Compound { op, target, value }, ty)
    }

    pub fn step(&mut self, op: StepOp, target: ExprId) -> ExprId {
        let ty = self.ty(target).clone();
        self.push(ExprKind::Step { op, target }, ty)
    }

    pub fn binary(&mut self, op: BinaryOp, lhs: ExprId, rhs: ExprId) -> ExprId {
        // Result type: an optional operand lifts the whole operation.
        let ty = if self.ty(rhs).is_optional() && !self.ty(lhs).is_optional() {
            self.ty(rhs).clone()
        } else {
            self.ty(lhs).clone()
        };
        self.push(ExprKind::Binary { op, lhs, rhs }, ty)
    }

    pub fn block(&mut self, exprs: Vec<ExprId>) -> ExprId {
        let ty = exprs.last().map_or(Ty::Unit, |last| self.ty(*last).clone());
        self.push(ExprKind::Block { exprs }, ty)
    }

    pub fn extension(&mut self, node: Arc<dyn Reduce>) -> ExprId {
        let ty = node.result_ty();
        self.push(ExprKind::Extension(node), ty)
    }
}

/// A complete callable shape: arena, parameter list, and root
/// expression. Caller-owned and immutable; `compile` never mutates it.
#[derive(Clone, Debug)]
pub struct ExprTree {
    pub arena: ExprArena,
    pub params: Vec<Param>,
    pub root: ExprId,
}

impl ExprTree {
    pub fn new(arena: ExprArena, params: Vec<Param>, root: ExprId) -> Self {
        Self {
            arena,
            params,
            root,
        }
    }

    /// Static result type of the callable.
    pub fn result_ty(&self) -> &Ty {
        self.arena.ty(self.root)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builder_derives_types() {
        let mut arena = ExprArena::new();
        let a = arena.param(0, Ty::I32);
        let b = arena.constant(Value::I32(5));
        let and = arena.compound(BinaryOp::BitAnd, a, b);
        assert_eq!(arena.ty(and), &Ty::I32);
        assert_eq!(arena.kind(and).name(), "compound assignment");
    }

    #[test]
    fn binary_result_lifts_over_optional() {
        let mut arena = ExprArena::new();
        let lhs = arena.param(0, Ty::Opt(Box::new(Ty::I32)));
        let rhs = arena.constant(Value::I32(1));
        let add = arena.binary(BinaryOp::Add, lhs, rhs);
        assert_eq!(arena.ty(add), &Ty::Opt(Box::new(Ty::I32)));

        let flipped = arena.binary(BinaryOp::Add, rhs, lhs);
        assert_eq!(arena.ty(flipped), &Ty::Opt(Box::new(Ty::I32)));
    }

    #[test]
    fn children_follow_evaluation_order() {
        let mut arena = ExprArena::new();
        let arr = arena.param(0, Ty::Array(Box::new(Ty::I32)));
        let i = arena.param(1, Ty::I32);
        let j = arena.param(2, Ty::I32);
        let access = arena.array_index(arr, [i, j]);
        assert_eq!(arena.ty(access), &Ty::I32);
        assert_eq!(arena.kind(access).children().to_vec(), vec![arr, i, j]);
    }
}
