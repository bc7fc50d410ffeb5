//! Runtime values for compiled callables.
//!
//! # Thread safety
//!
//! All heap-backed values use `Arc` for reference counting and
//! `parking_lot::RwLock` for interior mutability, so compiled callables
//! can be invoked concurrently. Synchronizing the *contents* of shared
//! objects and arrays across threads remains the caller's job; the
//! engine imposes no locking on data it does not own.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use smallvec::SmallVec;

use crate::fault::Fault;
use crate::ty::Ty;

/// Reference to an embedder-owned object. Member accessors downcast this
/// to the concrete type they were written for.
pub type ObjRef = Arc<dyn Any + Send + Sync>;

/// Runtime value.
///
/// Reference nullity (`Obj(None)`, `Array(None)`) and value nullity
/// (`Opt(None)`) are distinct and checked independently: null guards act
/// on the former, nullable lifting on the latter.
#[derive(Clone)]
pub enum Value {
    Unit,
    Bool(bool),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F64(f64),
    /// Optional scalar; `None` means "no value".
    Opt(Option<Box<Value>>),
    /// Object reference; `None` is the null reference.
    Obj(Option<ObjRef>),
    /// Array reference; `None` is the null reference.
    Array(Option<Arc<ArrayValue>>),
}

impl Value {
    /// Wrap an embedder object.
    pub fn obj<T: Any + Send + Sync>(value: T) -> Self {
        Value::Obj(Some(Arc::new(value)))
    }

    /// Share an existing object reference.
    pub fn obj_ref(value: ObjRef) -> Self {
        Value::Obj(Some(value))
    }

    /// The null object reference.
    pub const fn null_obj() -> Self {
        Value::Obj(None)
    }

    /// Wrap an array.
    pub fn array(value: ArrayValue) -> Self {
        Value::Array(Some(Arc::new(value)))
    }

    /// The null array reference.
    pub const fn null_array() -> Self {
        Value::Array(None)
    }

    /// An optional holding `value`.
    pub fn some(value: Value) -> Self {
        Value::Opt(Some(Box::new(value)))
    }

    /// An optional holding no value.
    pub const fn none() -> Self {
        Value::Opt(None)
    }

    /// Whether this value is a null *reference*. `Opt(None)` is not a
    /// null reference.
    #[inline]
    pub fn is_null_ref(&self) -> bool {
        matches!(self, Value::Obj(None) | Value::Array(None))
    }

    /// Best-effort static type of this value. `Opt(None)` carries no
    /// element type; nodes holding typed no-value constants should be
    /// pushed with an explicit `Ty` instead.
    pub fn ty(&self) -> Ty {
        match self {
            Value::Unit => Ty::Unit,
            Value::Bool(_) => Ty::Bool,
            Value::I32(_) => Ty::I32,
            Value::U32(_) => Ty::U32,
            Value::I64(_) => Ty::I64,
            Value::U64(_) => Ty::U64,
            Value::F64(_) => Ty::F64,
            Value::Opt(Some(inner)) => Ty::Opt(Box::new(inner.ty())),
            Value::Opt(None) => Ty::Opt(Box::new(Ty::Unit)),
            Value::Obj(_) => Ty::Obj,
            Value::Array(Some(arr)) => Ty::Array(Box::new(arr.elem_ty().clone())),
            Value::Array(None) => Ty::Array(Box::new(Ty::Unit)),
        }
    }

    /// Short type name for fault messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::F64(_) => "f64",
            Value::Opt(_) => "optional",
            Value::Obj(_) => "obj",
            Value::Array(_) => "array",
        }
    }

    /// View this value as an array reference, faulting on null or
    /// non-array values.
    pub fn as_array(&self) -> Result<&Arc<ArrayValue>, Fault> {
        match self {
            Value::Array(Some(arr)) => Ok(arr),
            Value::Array(None) => Err(Fault::NullReference),
            other => Err(Fault::TypeMismatch {
                expected: "array",
                got: other.type_name(),
            }),
        }
    }

    /// View this value as an array index.
    pub fn as_index(&self) -> Result<i64, Fault> {
        match self {
            Value::I32(v) => Ok(i64::from(*v)),
            Value::U32(v) => Ok(i64::from(*v)),
            Value::I64(v) => Ok(*v),
            // Indices past i64::MAX cannot address real storage; treat as
            // out of range rather than silently truncating.
            Value::U64(v) => i64::try_from(*v).map_err(|_| Fault::IndexOutOfRange {
                index: i64::MAX,
                len: 0,
            }),
            other => Err(Fault::TypeMismatch {
                expected: "integer index",
                got: other.type_name(),
            }),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Unit, Value::Unit) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::I32(a), Value::I32(b)) => a == b,
            (Value::U32(a), Value::U32(b)) => a == b,
            (Value::I64(a), Value::I64(b)) => a == b,
            (Value::U64(a), Value::U64(b)) => a == b,
            (Value::F64(a), Value::F64(b)) => a == b,
            (Value::Opt(a), Value::Opt(b)) => a == b,
            (Value::Obj(a), Value::Obj(b)) => match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            },
            (Value::Array(a), Value::Array(b)) => match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => write!(f, "unit"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::I32(v) => write!(f, "{v}i32"),
            Value::U32(v) => write!(f, "{v}u32"),
            Value::I64(v) => write!(f, "{v}i64"),
            Value::U64(v) => write!(f, "{v}u64"),
            Value::F64(v) => write!(f, "{v}f64"),
            Value::Opt(Some(inner)) => write!(f, "some({inner:?})"),
            Value::Opt(None) => write!(f, "none"),
            Value::Obj(Some(_)) => write!(f, "<obj>"),
            Value::Obj(None) => write!(f, "null"),
            Value::Array(Some(arr)) => write!(f, "<array {:?}>", arr.dims()),
            Value::Array(None) => write!(f, "null"),
        }
    }
}

/// N-dimensional array with row-major element storage.
///
/// Cells sit behind a `RwLock` so a shared array reference can be
/// mutated through compiled writes; cross-thread coordination of the
/// *logical* contents is the caller's responsibility.
pub struct ArrayValue {
    elem: Ty,
    dims: SmallVec<[usize; 2]>,
    cells: RwLock<Vec<Value>>,
}

impl ArrayValue {
    /// Create an array with every cell set to the element type's default.
    pub fn new(elem: Ty, dims: &[usize]) -> Self {
        let len = dims.iter().product();
        let cells = vec![elem.default_value(); len];
        Self {
            elem,
            dims: SmallVec::from_slice(dims),
            cells: RwLock::new(cells),
        }
    }

    /// Element type.
    pub fn elem_ty(&self) -> &Ty {
        &self.elem
    }

    /// Dimension lengths.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Row-major flat offset for `indices`, bounds-checking every
    /// dimension. All indices are inspected left to right; the first
    /// violation faults.
    fn offset(&self, indices: &[Value]) -> Result<usize, Fault> {
        if indices.len() != self.dims.len() {
            return Err(Fault::Arity {
                expected: self.dims.len(),
                got: indices.len(),
            });
        }
        let mut offset = 0usize;
        for (value, &len) in indices.iter().zip(self.dims.iter()) {
            let index = value.as_index()?;
            if index < 0 || index as u64 >= len as u64 {
                return Err(Fault::IndexOutOfRange { index, len });
            }
            // Cell count fits in memory, so this cannot overflow usize.
            offset = offset * len + index as usize;
        }
        Ok(offset)
    }

    /// Read the element at `indices`.
    pub fn get(&self, indices: &[Value]) -> Result<Value, Fault> {
        let offset = self.offset(indices)?;
        Ok(self.cells.read()[offset].clone())
    }

    /// Write the element at `indices`.
    pub fn set(&self, indices: &[Value], value: Value) -> Result<(), Fault> {
        let offset = self.offset(indices)?;
        self.cells.write()[offset] = value;
        Ok(())
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
    fn array_row_major_addressing() {
        let arr = ArrayValue::new(Ty::I32, &[2, 3]);
        arr.set(&[Value::I32(1), Value::I32(2)], Value::I32(42)).unwrap();
        assert_eq!(arr.get(&[Value::I32(1), Value::I32(2)]).unwrap(), Value::I32(42));
        // Flat cell 1*3+2 == 5 is the one written; neighbours untouched.
        assert_eq!(arr.get(&[Value::I32(1), Value::I32(1)]).unwrap(), Value::I32(0));
    }

    #[test]
    fn array_bounds_fault() {
        let arr = ArrayValue::new(Ty::I32, &[2]);
        let err = arr.get(&[Value::I32(2)]).unwrap_err();
        assert_eq!(err, Fault::IndexOutOfRange { index: 2, len: 2 });
        let err = arr.get(&[Value::I32(-1)]).unwrap_err();
        assert_eq!(err, Fault::IndexOutOfRange { index: -1, len: 2 });
    }

    #[test]
    fn null_ref_is_not_optional_none() {
        assert!(Value::null_obj().is_null_ref());
        assert!(Value::null_array().is_null_ref());
        assert!(!Value::none().is_null_ref());
    }
}
