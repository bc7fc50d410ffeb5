//! Null-guard planning for access chains.
//!
//! An access chain (`o.A.B[i].C`) is lowered link by link. Every link
//! value that acts as an owner is materialized into a slot, so
//! downstream reads and writes never re-evaluate it. Under
//! `CHECK_NULL_REFERENCES` each reference-typed link additionally gets a
//! guard: `if isnull(slot) { default(outer) } else { ...rest... }`,
//! nested so the first null anywhere short-circuits the *entire*
//! enclosing expression - index evaluation, the right-hand side of a
//! compound assignment, and the pending write all live inside the else
//! branch.

use arbor_ir::{CanExpr, CanId, ExprId, ExprKind, SlotId, Ty};

use super::Lowerer;
use crate::errors::CompileError;

/// Continuation invoked with the materialized owner slot and its type.
pub(crate) type OwnerCont<'a, 'b> =
    &'b mut dyn FnMut(&mut Lowerer<'a>, SlotId, &Ty) -> Result<CanId, CompileError>;

impl<'a> Lowerer<'a> {
    /// Lower `expr` in owner position and hand its slot to `k`.
    ///
    /// Chain links recurse, so a guard emitted for an inner link wraps
    /// everything `k` emits for the outer links.
    pub(crate) fn lower_owner(
        &mut self,
        expr: ExprId,
        outer: &Ty,
        k: OwnerCont<'a, '_>,
    ) -> Result<CanId, CompileError> {
        let ty = self.src.ty(expr).clone();
        match self.src.kind(expr).clone() {
            ExprKind::Member {
                owner: Some(owner),
                member,
            } if self.guarding() => self.lower_owner(owner, outer, &mut |this, o_slot, o_ty| {
                let o_read = this.slot_read(o_slot, o_ty.clone());
                let value = this.push(
                    CanExpr::MemberGet {
                        owner: Some(o_read),
                        member: member.clone(),
                    },
                    member.ty().clone(),
                );
                this.bind_and_guard(value, member.ty().clone(), outer, k)
            }),
            ExprKind::Index {
                owner,
                member,
                args,
            } if self.guarding() => self.lower_owner(owner, outer, &mut |this, o_slot, o_ty| {
                let o_read = this.slot_read(o_slot, o_ty.clone());
                let can_args = this.lower_all(&args)?;
                let value = this.push(
                    CanExpr::IndexGet {
                        owner: o_read,
                        member: member.clone(),
                        args: can_args,
                    },
                    member.ty().clone(),
                );
                this.bind_and_guard(value, member.ty().clone(), outer, k)
            }),
            ExprKind::ArrayIndex { array, indices } if self.guarding() => {
                self.lower_owner(array, outer, &mut |this, a_slot, a_ty| {
                    let a_read = this.slot_read(a_slot, a_ty.clone());
                    let can_idx = this.lower_all(&indices)?;
                    let value = this.push(
                        CanExpr::ArrayGet {
                            array: a_read,
                            indices: can_idx,
                        },
                        ty.clone(),
                    );
                    this.bind_and_guard(value, ty.clone(), outer, k)
                })
            }
            // Parameters are already single-evaluation slots; guard them
            // in place without a copy.
            ExprKind::Param(slot) => self.guard_slot(SlotId::new(slot), &ty, outer, k),
            _ => {
                let value = self.lower_expr(expr)?;
                self.bind_and_guard(value, ty, outer, k)
            }
        }
    }

    /// Store `value` into a fresh slot, then guard it.
    fn bind_and_guard(
        &mut self,
        value: CanId,
        ty: Ty,
        outer: &Ty,
        k: OwnerCont<'a, '_>,
    ) -> Result<CanId, CompileError> {
        let slot = self.fresh_slot();
        let store = self.push(CanExpr::StoreSlot { slot, value }, Ty::Unit);
        let body = self.guard_slot(slot, &ty, outer, k)?;
        Ok(self.seq(vec![store, body]))
    }

    /// Run the continuation against `slot`, wrapping it in a null guard
    /// when the mode asks for one and the slot holds a reference.
    fn guard_slot(
        &mut self,
        slot: SlotId,
        ty: &Ty,
        outer: &Ty,
        k: OwnerCont<'a, '_>,
    ) -> Result<CanId, CompileError> {
        let cont = k(self, slot, ty)?;
        if self.guarding() && ty.is_reference() {
            let read = self.slot_read(slot, ty.clone());
            let cond = self.push(CanExpr::IsNull(read), Ty::Bool);
            let default = self.push(CanExpr::DefaultOf(outer.clone()), outer.clone());
            Ok(self.push(
                CanExpr::If {
                    cond,
                    then: default,
                    els: cont,
                },
                outer.clone(),
            ))
        } else {
            Ok(cont)
        }
    }
}
