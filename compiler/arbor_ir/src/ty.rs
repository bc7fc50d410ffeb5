//! Static types for expression nodes.

use std::fmt;

use crate::value::Value;

/// Static type of an expression node or member.
///
/// The set is closed: the compiler's operator kernels and default-value
/// rules dispatch on it exhaustively.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Ty {
    /// No value (statement position, `set` results).
    Unit,
    Bool,
    I32,
    U32,
    I64,
    U64,
    F64,
    /// Optional-valued scalar (value-nullity, orthogonal to reference
    /// nullity).
    Opt(Box<Ty>),
    /// Reference to an embedder object; may be null.
    Obj,
    /// N-dimensional array of the element type; the reference may be null.
    Array(Box<Ty>),
}

impl Ty {
    /// The default value a null-guard short-circuit produces for this type.
    pub fn default_value(&self) -> Value {
        match self {
            Ty::Unit => Value::Unit,
            Ty::Bool => Value::Bool(false),
            Ty::I32 => Value::I32(0),
            Ty::U32 => Value::U32(0),
            Ty::I64 => Value::I64(0),
            Ty::U64 => Value::U64(0),
            Ty::F64 => Value::F64(0.0),
            Ty::Opt(_) => Value::Opt(None),
            Ty::Obj => Value::Obj(None),
            Ty::Array(_) => Value::Array(None),
        }
    }

    /// The constant `1` in this type, used when lowering increment and
    /// decrement. For optional types this is the scalar one of the inner
    /// type; nullable lifting handles the rest.
    pub fn one(&self) -> Value {
        match self {
            Ty::I32 => Value::I32(1),
            Ty::U32 => Value::U32(1),
            Ty::I64 => Value::I64(1),
            Ty::U64 => Value::U64(1),
            Ty::F64 => Value::F64(1.0),
            Ty::Opt(inner) => inner.one(),
            // Non-numeric targets are rejected at resolve time; Unit keeps
            // this total.
            Ty::Unit | Ty::Bool | Ty::Obj | Ty::Array(_) => Value::Unit,
        }
    }

    /// Whether values of this type can hold a null *reference* (owner
    /// nullity). `Opt` is value-nullity and deliberately excluded.
    #[inline]
    pub fn is_reference(&self) -> bool {
        matches!(self, Ty::Obj | Ty::Array(_))
    }

    /// Whether this is an optional (lifted) type.
    #[inline]
    pub fn is_optional(&self) -> bool {
        matches!(self, Ty::Opt(_))
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Unit => write!(f, "unit"),
            Ty::Bool => write!(f, "bool"),
            Ty::I32 => write!(f, "i32"),
            Ty::U32 => write!(f, "u32"),
            Ty::I64 => write!(f, "i64"),
            Ty::U64 => write!(f, "u64"),
            Ty::F64 => write!(f, "f64"),
            Ty::Opt(inner) => write!(f, "{inner}?"),
            Ty::Obj => write!(f, "obj"),
            Ty::Array(elem) => write!(f, "{elem}[]"),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    reason = "tests use unwrap to panic on unexpected state"
)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_zero_like() {
        assert_eq!(Ty::I32.default_value(), Value::I32(0));
        assert_eq!(Ty::F64.default_value(), Value::F64(0.0));
        assert_eq!(Ty::Opt(Box::new(Ty::I32)).default_value(), Value::Opt(None));
        assert_eq!(Ty::Obj.default_value(), Value::Obj(None));
    }

    #[test]
    fn opt_is_not_a_reference() {
        assert!(Ty::Obj.is_reference());
        assert!(Ty::Array(Box::new(Ty::I32)).is_reference());
        assert!(!Ty::Opt(Box::new(Ty::I32)).is_reference());
        assert!(!Ty::I32.is_reference());
    }
}
