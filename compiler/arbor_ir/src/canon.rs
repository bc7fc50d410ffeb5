//! Lowered (canonical) IR.
//!
//! `CanExpr` is the primitive form the codegen backend consumes. It is a
//! distinct type from `ExprKind` with its own index space: compound
//! assignment, increment/decrement, lambdas, and extension nodes cannot
//! be represented, enforced at the type level. After lowering, every
//! owner and index feeding a read-modify-write sequence is a slot read,
//! never a re-evaluation.

use std::fmt;

use smallvec::SmallVec;

use crate::expr::BinaryOp;
use crate::member::Member;
use crate::ty::Ty;
use crate::value::Value;

/// Index into a [`CanArena`].
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct CanId(u32);

impl CanId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        CanId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for CanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CanId({})", self.0)
    }
}

/// Frame slot index. Slots `0..arity` are the callable's parameters;
/// the rest are lowering-introduced temporaries.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct SlotId(u32);

impl SlotId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        SlotId(index)
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SlotId({})", self.0)
    }
}

/// Primitive lowered expression.
#[derive(Clone, Debug)]
pub enum CanExpr {
    /// Read a frame slot.
    Slot(SlotId),
    /// Evaluate `value` and store it into `slot`; yields unit.
    StoreSlot { slot: SlotId, value: CanId },
    /// Literal constant.
    Const(Value),
    /// The default value of a static type (null-guard short-circuit
    /// result).
    DefaultOf(Ty),
    /// True when the operand is a null reference (`Opt(None)` is not).
    IsNull(CanId),
    /// Two-way conditional.
    If { cond: CanId, then: CanId, els: CanId },
    /// Evaluate in order; yields the last value (unit when empty).
    Seq(Vec<CanId>),
    /// Binary operator application with nullable lifting.
    Binary {
        op: BinaryOp,
        lhs: CanId,
        rhs: CanId,
    },
    /// Member read; `owner: None` is a static member.
    MemberGet {
        owner: Option<CanId>,
        member: Member,
    },
    /// Member write; yields unit.
    MemberSet {
        owner: Option<CanId>,
        member: Member,
        value: CanId,
    },
    /// Array element read.
    ArrayGet {
        array: CanId,
        indices: SmallVec<[CanId; 2]>,
    },
    /// Array element write; yields unit.
    ArraySet {
        array: CanId,
        indices: SmallVec<[CanId; 2]>,
        value: CanId,
    },
    /// Indexer read through a member accessor.
    IndexGet {
        owner: CanId,
        member: Member,
        args: SmallVec<[CanId; 2]>,
    },
    /// Indexer write through a member accessor; yields unit.
    IndexSet {
        owner: CanId,
        member: Member,
        args: SmallVec<[CanId; 2]>,
        value: CanId,
    },
}

/// Arena of lowered expressions; parallel `kinds`/`tys` arrays indexed
/// by [`CanId`], mirroring [`ExprArena`](crate::ExprArena).
#[derive(Clone, Debug, Default)]
pub struct CanArena {
    kinds: Vec<CanExpr>,
    tys: Vec<Ty>,
}

impl CanArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    pub fn push(&mut self, kind: CanExpr, ty: Ty) -> CanId {
        debug_assert!(self.kinds.len() < u32::MAX as usize);
        let id = CanId::new(self.kinds.len() as u32);
        self.kinds.push(kind);
        self.tys.push(ty);
        id
    }

    pub fn kind(&self, id: CanId) -> &CanExpr {
        &self.kinds[id.index()]
    }

    pub fn ty(&self, id: CanId) -> &Ty {
        &self.tys[id.index()]
    }
}
