//! Compound-assignment and increment/decrement lowering.
//!
//! `target op= value` and the four step forms become explicit
//! read-modify-write sequences over a resolved location:
//!
//! 1. owner/indices are materialized once (location resolution);
//! 2. the current value is read into a slot;
//! 3. the right-hand side is evaluated (steps use a constant `1` of the
//!    operand's type);
//! 4. the combined value is computed with nullable lifting and native
//!    wraparound semantics, stored, and written back;
//! 5. the sequence yields the new value (compound, pre) or the value
//!    read in step 2 (post).
//!
//! Under `CHECK_NULL_REFERENCES` the whole sequence sits inside the
//! owner-chain guard, so a null owner skips steps 2-4 entirely and the
//! expression yields the default of its static type.

use arbor_ir::{BinaryOp, CanExpr, CanId, ExprId, Ty};

use super::Lowerer;
use crate::errors::CompileError;

impl Lowerer<'_> {
    /// Lower plain assignment; yields the assigned value.
    pub(crate) fn lower_assign(
        &mut self,
        target: ExprId,
        value: ExprId,
    ) -> Result<CanId, CompileError> {
        let ty = self.src.ty(target).clone();
        self.lower_location(target, &ty, &mut |this, loc| {
            let v_can = this.lower_expr(value)?;
            let v_slot = this.fresh_slot();
            let store = this.push(
                CanExpr::StoreSlot {
                    slot: v_slot,
                    value: v_can,
                },
                Ty::Unit,
            );
            let write = loc.emit_write(this, v_slot, &ty);
            let result = this.slot_read(v_slot, ty.clone());
            Ok(this.seq(vec![store, write, result]))
        })
    }

    /// Lower a read-modify-write form. `rhs: None` means a step form:
    /// the right-hand side is the constant `1` of the target's type.
    pub(crate) fn lower_rmw(
        &mut self,
        target: ExprId,
        op: BinaryOp,
        rhs: Option<ExprId>,
        yields_new: bool,
    ) -> Result<CanId, CompileError> {
        let ty = self.src.ty(target).clone();
        self.lower_location(target, &ty, &mut |this, loc| {
            // Read current value; exactly one read per logical operation.
            let cur_slot = this.fresh_slot();
            let read = loc.emit_read(this, &ty);
            let store_cur = this.push(
                CanExpr::StoreSlot {
                    slot: cur_slot,
                    value: read,
                },
                Ty::Unit,
            );

            // Right-hand side evaluates after the read.
            let rhs_can = match rhs {
                Some(rhs) => this.lower_expr(rhs)?,
                None => {
                    let one = ty.one();
                    let one_ty = one.ty();
                    this.push(CanExpr::Const(one), one_ty)
                }
            };

            let cur_read = this.slot_read(cur_slot, ty.clone());
            let combined = this.push(
                CanExpr::Binary {
                    op,
                    lhs: cur_read,
                    rhs: rhs_can,
                },
                ty.clone(),
            );
            let new_slot = this.fresh_slot();
            let store_new = this.push(
                CanExpr::StoreSlot {
                    slot: new_slot,
                    value: combined,
                },
                Ty::Unit,
            );
            let write = loc.emit_write(this, new_slot, &ty);

            let result_slot = if yields_new { new_slot } else { cur_slot };
            let result = this.slot_read(result_slot, ty.clone());
            Ok(this.seq(vec![store_cur, store_new, write, result]))
        })
    }
}
