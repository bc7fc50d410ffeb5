//! Location resolution.
//!
//! An assignment target is classified into a closed set of resolved,
//! single-evaluation storage targets. Resolution *emits* the slot
//! initializations that evaluate the owner and every index expression
//! exactly once (left to right, before any bounds check), then hands
//! the continuation a [`Location`] whose reads and writes touch only
//! those slots. Any other node shape fails with
//! [`CompileError::NotAssignable`].

use arbor_ir::{CanExpr, CanId, ExprId, ExprKind, Member, SlotId, Ty};
use smallvec::SmallVec;

use super::Lowerer;
use crate::errors::CompileError;

/// A resolved assignable storage target. Owner and index slots are
/// initialized before the continuation runs; `emit_read` and
/// `emit_write` only ever read them, so repeated access never
/// re-evaluates the underlying expressions.
pub(crate) enum Location {
    /// Parameter or local slot.
    Slot { slot: SlotId, ty: Ty },
    /// Static member; no owner, never null-guarded.
    StaticMember { member: Member },
    /// Instance member on a cached owner.
    InstanceMember {
        owner: SlotId,
        owner_ty: Ty,
        member: Member,
    },
    /// N-dimensional array element with cached indices (row-major).
    ArrayElement {
        array: SlotId,
        array_ty: Ty,
        indices: SmallVec<[(SlotId, Ty); 2]>,
    },
    /// Custom indexer element; get/set delegate to the member's own
    /// accessor contract.
    Indexer {
        owner: SlotId,
        owner_ty: Ty,
        member: Member,
        args: SmallVec<[(SlotId, Ty); 2]>,
    },
}

/// Continuation invoked with the resolved location.
pub(crate) type LocationCont<'a, 'b> =
    &'b mut dyn FnMut(&mut Lowerer<'a>, &Location) -> Result<CanId, CompileError>;

impl<'a> Lowerer<'a> {
    /// Resolve `target` into a [`Location`] and run `k` inside any
    /// guards its owner chain requires.
    pub(crate) fn lower_location(
        &mut self,
        target: ExprId,
        outer: &Ty,
        k: LocationCont<'a, '_>,
    ) -> Result<CanId, CompileError> {
        match self.src.kind(target).clone() {
            ExprKind::Param(slot) => {
                let ty = self.src.ty(target).clone();
                let loc = Location::Slot {
                    slot: SlotId::new(slot),
                    ty,
                };
                k(self, &loc)
            }
            ExprKind::Member {
                owner: None,
                member,
            } => {
                let loc = Location::StaticMember { member };
                k(self, &loc)
            }
            ExprKind::Member {
                owner: Some(owner),
                member,
            } => self.lower_owner(owner, outer, &mut |this, o_slot, o_ty| {
                let loc = Location::InstanceMember {
                    owner: o_slot,
                    owner_ty: o_ty.clone(),
                    member: member.clone(),
                };
                k(this, &loc)
            }),
            ExprKind::ArrayIndex { array, indices } => {
                let array_ty = self.src.ty(array).clone();
                self.lower_owner(array, outer, &mut |this, a_slot, _| {
                    let (mut stores, idx_slots) = this.cache_args(&indices)?;
                    let loc = Location::ArrayElement {
                        array: a_slot,
                        array_ty: array_ty.clone(),
                        indices: idx_slots,
                    };
                    let body = k(this, &loc)?;
                    stores.push(body);
                    Ok(this.seq(stores))
                })
            }
            ExprKind::Index {
                owner,
                member,
                args,
            } => self.lower_owner(owner, outer, &mut |this, o_slot, o_ty| {
                let (mut stores, arg_slots) = this.cache_args(&args)?;
                let loc = Location::Indexer {
                    owner: o_slot,
                    owner_ty: o_ty.clone(),
                    member: member.clone(),
                    args: arg_slots,
                };
                let body = k(this, &loc)?;
                stores.push(body);
                Ok(this.seq(stores))
            }),
            other => Err(CompileError::NotAssignable { kind: other.name() }),
        }
    }

    /// Evaluate index arguments left to right, each exactly once, into
    /// fresh slots. Returns the store nodes plus the slot/type pairs.
    #[allow(clippy::type_complexity)]
    fn cache_args(
        &mut self,
        args: &[ExprId],
    ) -> Result<(Vec<CanId>, SmallVec<[(SlotId, Ty); 2]>), CompileError> {
        let mut stores = Vec::with_capacity(args.len() + 1);
        let mut slots = SmallVec::new();
        for arg in args {
            let value = self.lower_expr(*arg)?;
            let slot = self.fresh_slot();
            stores.push(self.push(CanExpr::StoreSlot { slot, value }, Ty::Unit));
            slots.push((slot, self.src.ty(*arg).clone()));
        }
        Ok((stores, slots))
    }
}

impl Location {
    /// Emit a read of the location's current value.
    pub(crate) fn emit_read(&self, lw: &mut Lowerer<'_>, value_ty: &Ty) -> CanId {
        match self {
            Location::Slot { slot, ty } => lw.slot_read(*slot, ty.clone()),
            Location::StaticMember { member } => lw.push(
                CanExpr::MemberGet {
                    owner: None,
                    member: member.clone(),
                },
                value_ty.clone(),
            ),
            Location::InstanceMember {
                owner,
                owner_ty,
                member,
            } => {
                let o_read = lw.slot_read(*owner, owner_ty.clone());
                lw.push(
                    CanExpr::MemberGet {
                        owner: Some(o_read),
                        member: member.clone(),
                    },
                    value_ty.clone(),
                )
            }
            Location::ArrayElement {
                array,
                array_ty,
                indices,
            } => {
                let a_read = lw.slot_read(*array, array_ty.clone());
                let idx = indices
                    .iter()
                    .map(|(slot, ty)| lw.slot_read(*slot, ty.clone()))
                    .collect();
                lw.push(
                    CanExpr::ArrayGet {
                        array: a_read,
                        indices: idx,
                    },
                    value_ty.clone(),
                )
            }
            Location::Indexer {
                owner,
                owner_ty,
                member,
                args,
            } => {
                let o_read = lw.slot_read(*owner, owner_ty.clone());
                let can_args = args
                    .iter()
                    .map(|(slot, ty)| lw.slot_read(*slot, ty.clone()))
                    .collect();
                lw.push(
                    CanExpr::IndexGet {
                        owner: o_read,
                        member: member.clone(),
                        args: can_args,
                    },
                    value_ty.clone(),
                )
            }
        }
    }

    /// Emit a write of `value_slot` into the location; yields unit.
    pub(crate) fn emit_write(
        &self,
        lw: &mut Lowerer<'_>,
        value_slot: SlotId,
        value_ty: &Ty,
    ) -> CanId {
        let value = lw.slot_read(value_slot, value_ty.clone());
        match self {
            Location::Slot { slot, .. } => {
                lw.push(CanExpr::StoreSlot { slot: *slot, value }, Ty::Unit)
            }
            Location::StaticMember { member } => lw.push(
                CanExpr::MemberSet {
                    owner: None,
                    member: member.clone(),
                    value,
                },
                Ty::Unit,
            ),
            Location::InstanceMember {
                owner,
                owner_ty,
                member,
            } => {
                let o_read = lw.slot_read(*owner, owner_ty.clone());
                lw.push(
                    CanExpr::MemberSet {
                        owner: Some(o_read),
                        member: member.clone(),
                        value,
                    },
                    Ty::Unit,
                )
            }
            Location::ArrayElement {
                array,
                array_ty,
                indices,
            } => {
                let a_read = lw.slot_read(*array, array_ty.clone());
                let idx = indices
                    .iter()
                    .map(|(slot, ty)| lw.slot_read(*slot, ty.clone()))
                    .collect();
                lw.push(
                    CanExpr::ArraySet {
                        array: a_read,
                        indices: idx,
                        value,
                    },
                    Ty::Unit,
                )
            }
            Location::Indexer {
                owner,
                owner_ty,
                member,
                args,
            } => {
                let o_read = lw.slot_read(*owner, owner_ty.clone());
                let can_args = args
                    .iter()
                    .map(|(slot, ty)| lw.slot_read(*slot, ty.clone()))
                    .collect();
                lw.push(
                    CanExpr::IndexSet {
                        owner: o_read,
                        member: member.clone(),
                        args: can_args,
                        value,
                    },
                    Ty::Unit,
                )
            }
        }
    }
}
