//! Expression tree → primitive IR lowering.
//!
//! Drives per-node lowering into a fresh `CanArena`:
//!
//! - plain reads map directly (child references remapped from `ExprId`
//!   to `CanId`);
//! - access chains are decomposed into owner links that are materialized
//!   into slots and, under `CHECK_NULL_REFERENCES`, null-guarded
//!   (`lower/guard.rs`);
//! - assignment targets resolve to single-evaluation locations
//!   (`lower/location.rs`);
//! - compound assignment and increment/decrement become explicit
//!   read-modify-write sequences (`lower/rmw.rs`).

use arbor_ir::{
    CanArena, CanExpr, CanId, CompilerOptions, ExprArena, ExprId, ExprKind, SlotId, Ty,
};
use smallvec::SmallVec;
use tracing::debug;

use crate::errors::CompileError;

mod guard;
mod location;
mod rmw;
#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]

/// Output of the lowering pass.
#[derive(Debug)]
pub struct LowerResult {
    pub arena: CanArena,
    pub root: CanId,
    /// Total frame slots the compiled callable needs (parameters plus
    /// lowering-introduced temporaries).
    pub slot_count: u32,
}

/// Lower a reduced expression tree to primitive form.
///
/// `arity` is the callable's parameter count; parameters occupy slots
/// `0..arity` and lowering allocates temporaries after them. The source
/// arena is read-only; all output goes into a fresh `CanArena`.
pub fn lower(
    src: &ExprArena,
    root: ExprId,
    arity: u32,
    options: CompilerOptions,
) -> Result<LowerResult, CompileError> {
    let mut lowerer = Lowerer {
        src,
        out: CanArena::new(),
        next_slot: arity,
        options,
    };
    let can_root = lowerer.lower_expr(root)?;
    debug!(
        nodes = lowerer.out.len(),
        slots = lowerer.next_slot,
        "lowered expression tree"
    );
    Ok(LowerResult {
        arena: lowerer.out,
        root: can_root,
        slot_count: lowerer.next_slot,
    })
}

pub(crate) struct Lowerer<'a> {
    pub(crate) src: &'a ExprArena,
    pub(crate) out: CanArena,
    pub(crate) next_slot: u32,
    pub(crate) options: CompilerOptions,
}

impl<'a> Lowerer<'a> {
    #[inline]
    pub(crate) fn guarding(&self) -> bool {
        self.options.check_null_references()
    }

    #[inline]
    pub(crate) fn push(&mut self, kind: CanExpr, ty: Ty) -> CanId {
        self.out.push(kind, ty)
    }

    #[inline]
    pub(crate) fn slot_read(&mut self, slot: SlotId, ty: Ty) -> CanId {
        self.push(CanExpr::Slot(slot), ty)
    }

    pub(crate) fn fresh_slot(&mut self) -> SlotId {
        let slot = SlotId::new(self.next_slot);
        self.next_slot += 1;
        slot
    }

    /// Sequence node; yields the last expression's value.
    pub(crate) fn seq(&mut self, ids: Vec<CanId>) -> CanId {
        let ty = ids.last().map_or(Ty::Unit, |last| self.out.ty(*last).clone());
        self.push(CanExpr::Seq(ids), ty)
    }

    pub(crate) fn lower_expr(&mut self, id: ExprId) -> Result<CanId, CompileError> {
        let ty = self.src.ty(id).clone();
        match self.src.kind(id).clone() {
            ExprKind::Param(slot) => Ok(self.slot_read(SlotId::new(slot), ty)),
            ExprKind::Const(value) => Ok(self.push(CanExpr::Const(value), ty)),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs = self.lower_expr(lhs)?;
                let rhs = self.lower_expr(rhs)?;
                Ok(self.push(CanExpr::Binary { op, lhs, rhs }, ty))
            }
            ExprKind::Block { exprs } => {
                let mut lowered = Vec::with_capacity(exprs.len());
                for expr in exprs {
                    lowered.push(self.lower_expr(expr)?);
                }
                Ok(self.seq(lowered))
            }
            ExprKind::Member {
                owner: None,
                member,
            } => Ok(self.push(CanExpr::MemberGet { owner: None, member }, ty)),
            ExprKind::Member {
                owner: Some(owner),
                member,
            } => {
                if self.guarding() {
                    self.lower_owner(owner, &ty, &mut |this, o_slot, o_ty| {
                        let o_read = this.slot_read(o_slot, o_ty.clone());
                        Ok(this.push(
                            CanExpr::MemberGet {
                                owner: Some(o_read),
                                member: member.clone(),
                            },
                            ty.clone(),
                        ))
                    })
                } else {
                    let o_read = self.lower_expr(owner)?;
                    Ok(self.push(
                        CanExpr::MemberGet {
                            owner: Some(o_read),
                            member,
                        },
                        ty,
                    ))
                }
            }
            ExprKind::Index {
                owner,
                member,
                args,
            } => {
                if self.guarding() {
                    self.lower_owner(owner, &ty, &mut |this, o_slot, o_ty| {
                        let o_read = this.slot_read(o_slot, o_ty.clone());
                        let can_args = this.lower_all(&args)?;
                        Ok(this.push(
                            CanExpr::IndexGet {
                                owner: o_read,
                                member: member.clone(),
                                args: can_args,
                            },
                            ty.clone(),
                        ))
                    })
                } else {
                    let o_read = self.lower_expr(owner)?;
                    let can_args = self.lower_all(&args)?;
                    Ok(self.push(
                        CanExpr::IndexGet {
                            owner: o_read,
                            member,
                            args: can_args,
                        },
                        ty,
                    ))
                }
            }
            ExprKind::ArrayIndex { array, indices } => {
                if self.guarding() {
                    self.lower_owner(array, &ty, &mut |this, a_slot, a_ty| {
                        let a_read = this.slot_read(a_slot, a_ty.clone());
                        let can_idx = this.lower_all(&indices)?;
                        Ok(this.push(
                            CanExpr::ArrayGet {
                                array: a_read,
                                indices: can_idx,
                            },
                            ty.clone(),
                        ))
                    })
                } else {
                    let a_read = self.lower_expr(array)?;
                    let can_idx = self.lower_all(&indices)?;
                    Ok(self.push(
                        CanExpr::ArrayGet {
                            array: a_read,
                            indices: can_idx,
                        },
                        ty,
                    ))
                }
            }
            ExprKind::Assign { target, value } => self.lower_assign(target, value),
            ExprKind::Compound { op, target, value } => {
                self.lower_rmw(target, op, Some(value), true)
            }
            ExprKind::Step { op, target } => {
                self.lower_rmw(target, op.binary_op(), None, op.yields_new())
            }
            ExprKind::Lambda(_) => Err(CompileError::UnsupportedNode { kind: "lambda" }),
            // Reduction runs before lowering; a surviving extension node
            // means the caller skipped it.
            ExprKind::Extension(_) => Err(CompileError::UnsupportedNode { kind: "extension" }),
        }
    }

    fn lower_all(&mut self, ids: &[ExprId]) -> Result<SmallVec<[CanId; 2]>, CompileError> {
        let mut out = SmallVec::new();
        for id in ids {
            out.push(self.lower_expr(*id)?);
        }
        Ok(out)
    }
}
