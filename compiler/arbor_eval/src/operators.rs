//! Binary operator kernels.
//!
//! Direct enum-based dispatch by operand type pair; the type set is
//! fixed, so pattern matching is preferred over trait objects for
//! exhaustiveness checking.
//!
//! Arithmetic follows the operand type's native semantics: fixed-width
//! wraparound for integers (`i32::MIN - 1` is `i32::MAX`, unsigned
//! subtraction below zero wraps modulo 2^width, `MIN / -1` wraps), and
//! IEEE 754 for floats (division by zero is infinity or NaN, never a
//! fault). Integer division or remainder by zero raises
//! [`Fault::DivideByZero`] regardless of null-safety mode.
//!
//! Nullable lifting: if either operand is optional, a missing value on
//! either side yields "no value" without applying the operator;
//! otherwise both sides are unwrapped, the scalar kernel applies, and
//! the result is rewrapped.

use arbor_ir::{BinaryOp, Fault, Value};

/// Evaluate a binary operation with nullable lifting.
pub fn eval_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, Fault> {
    match (lhs, rhs) {
        (Value::I32(a), Value::I32(b)) => eval_i32(*a, *b, op),
        (Value::U32(a), Value::U32(b)) => eval_u32(*a, *b, op),
        (Value::I64(a), Value::I64(b)) => eval_i64(*a, *b, op),
        (Value::U64(a), Value::U64(b)) => eval_u64(*a, *b, op),
        (Value::F64(a), Value::F64(b)) => eval_f64(*a, *b, op),
        (Value::Bool(a), Value::Bool(b)) => eval_bool(*a, *b, op),
        (Value::Opt(_), _) | (_, Value::Opt(_)) => eval_lifted(op, lhs, rhs),
        _ => Err(Fault::UnsupportedOperands {
            op,
            lhs: lhs.type_name(),
            rhs: rhs.type_name(),
        }),
    }
}

/// Lifted evaluation: either side lacking a value short-circuits to
/// "no value"; the operator is never applied, so it cannot fault.
fn eval_lifted(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<Value, Fault> {
    let a = match lhs {
        Value::Opt(Some(inner)) => &**inner,
        Value::Opt(None) => return Ok(Value::Opt(None)),
        scalar => scalar,
    };
    let b = match rhs {
        Value::Opt(Some(inner)) => &**inner,
        Value::Opt(None) => return Ok(Value::Opt(None)),
        scalar => scalar,
    };
    Ok(Value::some(eval_binary(op, a, b)?))
}

macro_rules! int_kernel {
    ($name:ident, $ty:ty, $variant:ident) => {
        fn $name(a: $ty, b: $ty, op: BinaryOp) -> Result<Value, Fault> {
            let result = match op {
                BinaryOp::Add => a.wrapping_add(b),
                BinaryOp::Sub => a.wrapping_sub(b),
                BinaryOp::Mul => a.wrapping_mul(b),
                BinaryOp::Div => {
                    if b == 0 {
                        return Err(Fault::DivideByZero);
                    }
                    a.wrapping_div(b)
                }
                BinaryOp::Rem => {
                    if b == 0 {
                        return Err(Fault::DivideByZero);
                    }
                    a.wrapping_rem(b)
                }
                BinaryOp::BitAnd => a & b,
                BinaryOp::BitOr => a | b,
                BinaryOp::BitXor => a ^ b,
            };
            Ok(Value::$variant(result))
        }
    };
}

int_kernel!(eval_i32, i32, I32);
int_kernel!(eval_u32, u32, U32);
int_kernel!(eval_i64, i64, I64);
int_kernel!(eval_u64, u64, U64);

/// Floats follow IEEE 754 throughout; no operation faults.
fn eval_f64(a: f64, b: f64, op: BinaryOp) -> Result<Value, Fault> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => a / b,
        BinaryOp::Rem => a % b,
        BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor => {
            return Err(Fault::UnsupportedOperands {
                op,
                lhs: "f64",
                rhs: "f64",
            })
        }
    };
    Ok(Value::F64(result))
}

fn eval_bool(a: bool, b: bool, op: BinaryOp) -> Result<Value, Fault> {
    let result = match op {
        BinaryOp::BitAnd => a & b,
        BinaryOp::BitOr => a | b,
        BinaryOp::BitXor => a ^ b,
        _ => {
            return Err(Fault::UnsupportedOperands {
                op,
                lhs: "bool",
                rhs: "bool",
            })
        }
    };
    Ok(Value::Bool(result))
}
