//! The compiled callable.

use arbor_ir::{Fault, Ty, Value};

use crate::codegen::{Frame, Thunk};

/// A directly invocable compiled expression.
///
/// Parameters bind 1:1 to positional arguments. Every invocation gets a
/// fresh frame, so a `CompiledFn` can be invoked repeatedly and from
/// multiple threads at once; synchronizing the external data it mutates
/// (fields, arrays, indexer backing stores reachable from the
/// arguments) is the caller's responsibility.
pub struct CompiledFn {
    arity: usize,
    slot_count: usize,
    result_ty: Ty,
    root: Thunk,
}

impl std::fmt::Debug for CompiledFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledFn")
            .field("arity", &self.arity)
            .field("slot_count", &self.slot_count)
            .field("result_ty", &self.result_ty)
            .finish_non_exhaustive()
    }
}

impl CompiledFn {
    pub(crate) fn new(arity: usize, slot_count: usize, result_ty: Ty, root: Thunk) -> Self {
        Self {
            arity,
            slot_count,
            result_ty,
            root,
        }
    }

    /// Number of positional arguments the callable expects.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Static result type of the callable.
    pub fn result_ty(&self) -> &Ty {
        &self.result_ty
    }

    /// Invoke with positional arguments.
    pub fn invoke(&self, args: &[Value]) -> Result<Value, Fault> {
        if args.len() != self.arity {
            return Err(Fault::Arity {
                expected: self.arity,
                got: args.len(),
            });
        }
        let mut slots = Vec::with_capacity(self.slot_count);
        slots.extend_from_slice(args);
        slots.resize(self.slot_count, Value::Unit);
        let mut frame = Frame { slots };
        (self.root)(&mut frame)
    }
}
