//! End-to-end compound assignment and increment/decrement behaviour
//! through the full compile pipeline.

use std::sync::Arc;

use pretty_assertions::assert_eq;

use arbor_ir::{
    BinaryOp, CompilerOptions, ExprArena, ExprId, ExprTree, Fault, Param, Reduce, StepOp, Ty,
    Value,
};

use super::helpers::{cell_member, static_member, Cell};
use crate::compile;

#[test]
fn compound_on_parameter() {
    let mut arena = ExprArena::new();
    let a = arena.param(0, Ty::I32);
    let b = arena.param(1, Ty::I32);
    let root = arena.compound(BinaryOp::BitAnd, a, b);
    let tree = ExprTree::new(
        arena,
        vec![Param::new("a", Ty::I32), Param::new("b", Ty::I32)],
        root,
    );

    let compiled = compile(&tree, CompilerOptions::NONE).unwrap();
    assert_eq!(compiled.arity(), 2);
    assert_eq!(compiled.result_ty(), &Ty::I32);
    assert_eq!(
        compiled.invoke(&[Value::I32(3), Value::I32(5)]).unwrap(),
        Value::I32(1)
    );
}

#[test]
fn compound_on_parameter_updates_local_slot() {
    // `{ a &= b; a }`: the mutated parameter slot is visible to a later
    // read within the same invocation.
    let mut arena = ExprArena::new();
    let a = arena.param(0, Ty::I32);
    let b = arena.param(1, Ty::I32);
    let and = arena.compound(BinaryOp::BitAnd, a, b);
    let a_again = arena.param(0, Ty::I32);
    let root = arena.block(vec![and, a_again]);
    let tree = ExprTree::new(
        arena,
        vec![Param::new("a", Ty::I32), Param::new("b", Ty::I32)],
        root,
    );

    let compiled = compile(&tree, CompilerOptions::NONE).unwrap();
    assert_eq!(
        compiled.invoke(&[Value::I32(3), Value::I32(5)]).unwrap(),
        Value::I32(1)
    );
}

#[test]
fn compound_divide_on_unsigned_member() {
    let (member, accessor) = cell_member("Total", Ty::U32);
    let mut arena = ExprArena::new();
    let owner = arena.param(0, Ty::Obj);
    let target = arena.member(Some(owner), &member);
    let two = arena.constant(Value::U32(2));
    let root = arena.compound(BinaryOp::Div, target, two);
    let tree = ExprTree::new(arena, vec![Param::new("o", Ty::Obj)], root);

    let cell = Value::obj(Cell::new(Value::U32(4_294_967_292)));
    let compiled = compile(&tree, CompilerOptions::NONE).unwrap();
    assert_eq!(
        compiled.invoke(&[cell.clone()]).unwrap(),
        Value::U32(2_147_483_646)
    );
    // Exactly one read and one write per invocation.
    assert_eq!((accessor.gets(), accessor.sets()), (1, 1));
    assert_eq!(member.get(Some(&cell), &[]).unwrap(), Value::U32(2_147_483_646));
}

#[test]
fn post_decrement_yields_pre_mutation_value_and_wraps() {
    let (member, _) = cell_member("Count", Ty::I32);
    let mut arena = ExprArena::new();
    let owner = arena.param(0, Ty::Obj);
    let target = arena.member(Some(owner), &member);
    let root = arena.step(StepOp::PostDec, target);
    let tree = ExprTree::new(arena, vec![Param::new("o", Ty::Obj)], root);

    let cell = Value::obj(Cell::new(Value::I32(i32::MIN)));
    let compiled = compile(&tree, CompilerOptions::NONE).unwrap();
    // Post form yields the value read before mutating.
    assert_eq!(compiled.invoke(&[cell.clone()]).unwrap(), Value::I32(i32::MIN));
    // The stored value wrapped below MIN.
    assert_eq!(member.get(Some(&cell), &[]).unwrap(), Value::I32(i32::MAX));
}

#[test]
fn pre_increment_yields_new_value() {
    let (member, _) = cell_member("Count", Ty::I32);
    let mut arena = ExprArena::new();
    let owner = arena.param(0, Ty::Obj);
    let target = arena.member(Some(owner), &member);
    let root = arena.step(StepOp::PreInc, target);
    let tree = ExprTree::new(arena, vec![Param::new("o", Ty::Obj)], root);

    let cell = Value::obj(Cell::new(Value::I32(5)));
    let compiled = compile(&tree, CompilerOptions::NONE).unwrap();
    assert_eq!(compiled.invoke(&[cell.clone()]).unwrap(), Value::I32(6));
    assert_eq!(member.get(Some(&cell), &[]).unwrap(), Value::I32(6));
}

#[test]
fn post_increment_mutation_visible_to_later_read() {
    // `{ o.Count++; o.Count }` yields the incremented value.
    let (member, _) = cell_member("Count", Ty::I32);
    let mut arena = ExprArena::new();
    let owner = arena.param(0, Ty::Obj);
    let target = arena.member(Some(owner), &member);
    let step = arena.step(StepOp::PostInc, target);
    let owner_again = arena.param(0, Ty::Obj);
    let read = arena.member(Some(owner_again), &member);
    let root = arena.block(vec![step, read]);
    let tree = ExprTree::new(arena, vec![Param::new("o", Ty::Obj)], root);

    let cell = Value::obj(Cell::new(Value::I32(5)));
    let compiled = compile(&tree, CompilerOptions::NONE).unwrap();
    assert_eq!(compiled.invoke(&[cell]).unwrap(), Value::I32(6));
}

#[test]
fn plain_assignment_writes_and_yields_value() {
    let (member, accessor) = cell_member("Count", Ty::I32);
    let mut arena = ExprArena::new();
    let owner = arena.param(0, Ty::Obj);
    let target = arena.member(Some(owner), &member);
    let seven = arena.constant(Value::I32(7));
    let root = arena.assign(target, seven);
    let tree = ExprTree::new(arena, vec![Param::new("o", Ty::Obj)], root);

    let cell = Value::obj(Cell::new(Value::I32(0)));
    let compiled = compile(&tree, CompilerOptions::NONE).unwrap();
    assert_eq!(compiled.invoke(&[cell.clone()]).unwrap(), Value::I32(7));
    // Plain assignment never reads the old value.
    assert_eq!((accessor.gets(), accessor.sets()), (0, 1));
    assert_eq!(member.get(Some(&cell), &[]).unwrap(), Value::I32(7));
}

#[test]
fn compound_on_static_member() {
    let (member, accessor) = static_member("Counter", Ty::I64, Value::I64(10));
    let mut arena = ExprArena::new();
    let target = arena.member(None, &member);
    let three = arena.constant(Value::I64(3));
    let root = arena.compound(BinaryOp::Add, target, three);
    let tree = ExprTree::new(arena, vec![], root);

    // Static members have no owner to guard; both modes behave alike.
    let compiled = compile(&tree, CompilerOptions::ALL).unwrap();
    assert_eq!(compiled.invoke(&[]).unwrap(), Value::I64(13));
    assert_eq!(*accessor.value.read(), Value::I64(13));
}

#[test]
fn invoke_checks_arity() {
    let mut arena = ExprArena::new();
    let a = arena.param(0, Ty::I32);
    let one = arena.constant(Value::I32(1));
    let root = arena.compound(BinaryOp::Add, a, one);
    let tree = ExprTree::new(arena, vec![Param::new("a", Ty::I32)], root);

    let compiled = compile(&tree, CompilerOptions::NONE).unwrap();
    assert_eq!(
        compiled.invoke(&[]).unwrap_err(),
        Fault::Arity {
            expected: 1,
            got: 0
        }
    );
}

#[test]
fn compile_is_deterministic_and_leaves_input_untouched() {
    let mut arena = ExprArena::new();
    let a = arena.param(0, Ty::I32);
    let five = arena.constant(Value::I32(5));
    let root = arena.compound(BinaryOp::BitXor, a, five);
    let tree = ExprTree::new(arena, vec![Param::new("a", Ty::I32)], root);

    let first = compile(&tree, CompilerOptions::NONE).unwrap();
    let second = compile(&tree, CompilerOptions::ALL).unwrap();
    assert_eq!(first.invoke(&[Value::I32(3)]).unwrap(), Value::I32(6));
    assert_eq!(second.invoke(&[Value::I32(3)]).unwrap(), Value::I32(6));
}

/// Composite node that rewrites `target` into `target op= value`.
struct CompoundNode {
    op: BinaryOp,
    target: ExprId,
    value: ExprId,
    ty: Ty,
}

impl Reduce for CompoundNode {
    fn reduce(&self, arena: &mut ExprArena) -> ExprId {
        arena.compound(self.op, self.target, self.value)
    }

    fn result_ty(&self) -> Ty {
        self.ty.clone()
    }
}

#[test]
fn extension_node_reduces_through_pipeline() {
    let mut arena = ExprArena::new();
    let a = arena.param(0, Ty::I32);
    let b = arena.param(1, Ty::I32);
    let root = arena.extension(Arc::new(CompoundNode {
        op: BinaryOp::BitAnd,
        target: a,
        value: b,
        ty: Ty::I32,
    }));
    let tree = ExprTree::new(
        arena,
        vec![Param::new("a", Ty::I32), Param::new("b", Ty::I32)],
        root,
    );

    let compiled = compile(&tree, CompilerOptions::NONE).unwrap();
    assert_eq!(
        compiled.invoke(&[Value::I32(3), Value::I32(5)]).unwrap(),
        Value::I32(1)
    );
    // The input tree still carries the unreduced extension node.
    assert_eq!(tree.arena.kind(tree.root).name(), "extension");
}

#[test]
fn lambda_nodes_are_rejected_at_compile_time() {
    let mut inner_arena = ExprArena::new();
    let inner_root = inner_arena.constant(Value::I32(1));
    let inner = ExprTree::new(inner_arena, vec![], inner_root);

    let mut arena = ExprArena::new();
    let root = arena.push(arbor_ir::ExprKind::Lambda(Arc::new(inner)), Ty::I32);
    let tree = ExprTree::new(arena, vec![], root);

    let err = compile(&tree, CompilerOptions::NONE).unwrap_err();
    assert_eq!(
        err,
        crate::CompileError::UnsupportedNode { kind: "lambda" }
    );
}
