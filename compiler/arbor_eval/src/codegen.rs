//! Lowered IR → closure graph.
//!
//! Each `CanExpr` node folds into one thunk; the whole arena becomes a
//! tree of nested closures invoked against a per-call [`Frame`]. This is
//! the engine's lowering target; a bytecode or native backend could
//! consume the same `CanArena` instead.
//!
//! Null handling: get/set thunks fault with `Fault::NullReference` on a
//! null owner. Under `CHECK_NULL_REFERENCES` the lowering has already
//! guarded every reference-typed owner, so these checks are unreachable
//! there; in mode `NONE` they are exactly the point-of-dereference
//! fault the contract requires.

use arbor_ir::{CanArena, CanExpr, CanId, Fault, Value};

use crate::operators::eval_binary;

/// Per-invocation state: parameter slots followed by lowering
/// temporaries.
pub(crate) struct Frame {
    pub(crate) slots: Vec<Value>,
}

pub(crate) type Thunk = Box<dyn Fn(&mut Frame) -> Result<Value, Fault> + Send + Sync>;

/// Fold the lowered node `id` into a thunk.
pub(crate) fn emit(arena: &CanArena, id: CanId) -> Thunk {
    match arena.kind(id).clone() {
        CanExpr::Slot(slot) => {
            let index = slot.index();
            Box::new(move |frame| Ok(frame.slots[index].clone()))
        }
        CanExpr::StoreSlot { slot, value } => {
            let value = emit(arena, value);
            let index = slot.index();
            Box::new(move |frame| {
                let stored = value(frame)?;
                frame.slots[index] = stored;
                Ok(Value::Unit)
            })
        }
        CanExpr::Const(value) => Box::new(move |_| Ok(value.clone())),
        CanExpr::DefaultOf(ty) => {
            let value = ty.default_value();
            Box::new(move |_| Ok(value.clone()))
        }
        CanExpr::IsNull(expr) => {
            let expr = emit(arena, expr);
            Box::new(move |frame| Ok(Value::Bool(expr(frame)?.is_null_ref())))
        }
        CanExpr::If { cond, then, els } => {
            let cond = emit(arena, cond);
            let then = emit(arena, then);
            let els = emit(arena, els);
            Box::new(move |frame| match cond(frame)? {
                Value::Bool(true) => then(frame),
                Value::Bool(false) => els(frame),
                other => Err(Fault::TypeMismatch {
                    expected: "bool",
                    got: other.type_name(),
                }),
            })
        }
        CanExpr::Seq(ids) => {
            let thunks: Vec<Thunk> = ids.iter().map(|id| emit(arena, *id)).collect();
            Box::new(move |frame| {
                let mut last = Value::Unit;
                for thunk in &thunks {
                    last = thunk(frame)?;
                }
                Ok(last)
            })
        }
        CanExpr::Binary { op, lhs, rhs } => {
            let lhs = emit(arena, lhs);
            let rhs = emit(arena, rhs);
            Box::new(move |frame| {
                let a = lhs(frame)?;
                let b = rhs(frame)?;
                eval_binary(op, &a, &b)
            })
        }
        CanExpr::MemberGet { owner, member } => {
            let owner = owner.map(|owner| emit(arena, owner));
            Box::new(move |frame| match &owner {
                Some(owner) => {
                    let value = owner(frame)?;
                    if value.is_null_ref() {
                        return Err(Fault::NullReference);
                    }
                    member.get(Some(&value), &[])
                }
                None => member.get(None, &[]),
            })
        }
        CanExpr::MemberSet {
            owner,
            member,
            value,
        } => {
            let owner = owner.map(|owner| emit(arena, owner));
            let value = emit(arena, value);
            Box::new(move |frame| {
                let new = value(frame)?;
                match &owner {
                    Some(owner) => {
                        let owner = owner(frame)?;
                        if owner.is_null_ref() {
                            return Err(Fault::NullReference);
                        }
                        member.set(Some(&owner), &[], new)?;
                    }
                    None => member.set(None, &[], new)?,
                }
                Ok(Value::Unit)
            })
        }
        CanExpr::ArrayGet { array, indices } => {
            let array = emit(arena, array);
            let indices = emit_all(arena, &indices);
            Box::new(move |frame| {
                let array_val = array(frame)?;
                let idx = eval_all(&indices, frame)?;
                array_val.as_array()?.get(&idx)
            })
        }
        CanExpr::ArraySet {
            array,
            indices,
            value,
        } => {
            let array = emit(arena, array);
            let indices = emit_all(arena, &indices);
            let value = emit(arena, value);
            Box::new(move |frame| {
                let array_val = array(frame)?;
                let idx = eval_all(&indices, frame)?;
                let new = value(frame)?;
                array_val.as_array()?.set(&idx, new)?;
                Ok(Value::Unit)
            })
        }
        CanExpr::IndexGet {
            owner,
            member,
            args,
        } => {
            let owner = emit(arena, owner);
            let args = emit_all(arena, &args);
            Box::new(move |frame| {
                let owner_val = owner(frame)?;
                if owner_val.is_null_ref() {
                    return Err(Fault::NullReference);
                }
                let arg_vals = eval_all(&args, frame)?;
                member.get(Some(&owner_val), &arg_vals)
            })
        }
        CanExpr::IndexSet {
            owner,
            member,
            args,
            value,
        } => {
            let owner = emit(arena, owner);
            let args = emit_all(arena, &args);
            let value = emit(arena, value);
            Box::new(move |frame| {
                let owner_val = owner(frame)?;
                if owner_val.is_null_ref() {
                    return Err(Fault::NullReference);
                }
                let arg_vals = eval_all(&args, frame)?;
                let new = value(frame)?;
                member.set(Some(&owner_val), &arg_vals, new)?;
                Ok(Value::Unit)
            })
        }
    }
}

fn emit_all(arena: &CanArena, ids: &[CanId]) -> Vec<Thunk> {
    ids.iter().map(|id| emit(arena, *id)).collect()
}

fn eval_all(thunks: &[Thunk], frame: &mut Frame) -> Result<Vec<Value>, Fault> {
    let mut out = Vec::with_capacity(thunks.len());
    for thunk in thunks {
        out.push(thunk(frame)?);
    }
    Ok(out)
}
