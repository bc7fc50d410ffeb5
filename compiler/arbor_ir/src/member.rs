//! Member and indexer metadata.
//!
//! The compiler never inspects embedder types; it binds to `Member`
//! handles whose accessors carry the actual get/set logic. Accessors are
//! arbitrary user code (a field load, a lazily-growing keyed store, ...);
//! the only assumption made is determinism for a fixed owner/argument
//! set within one logical operation.

use std::fmt;
use std::sync::Arc;

use crate::fault::Fault;
use crate::ty::Ty;
use crate::value::Value;

/// Accessor contract for a member or indexer.
///
/// `owner` is `None` for static members. `args` is empty for plain
/// members and holds the index arguments for indexers, in declaration
/// order.
pub trait MemberAccessor: Send + Sync {
    fn get(&self, owner: Option<&Value>, args: &[Value]) -> Result<Value, Fault>;
    fn set(&self, owner: Option<&Value>, args: &[Value], value: Value) -> Result<(), Fault>;
}

/// Resolved member metadata handle. Cheap to clone; two clones of the
/// same handle denote the same member.
#[derive(Clone)]
pub struct Member {
    name: Arc<str>,
    ty: Ty,
    is_static: bool,
    accessor: Arc<dyn MemberAccessor>,
}

impl Member {
    /// An instance member (requires an owner at access time).
    pub fn instance(name: &str, ty: Ty, accessor: Arc<dyn MemberAccessor>) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            is_static: false,
            accessor,
        }
    }

    /// A static member (no owner; never participates in null guarding).
    pub fn statik(name: &str, ty: Ty, accessor: Arc<dyn MemberAccessor>) -> Self {
        Self {
            name: Arc::from(name),
            ty,
            is_static: true,
            accessor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static type of the member's value (for an indexer, the element
    /// type).
    pub fn ty(&self) -> &Ty {
        &self.ty
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Read through the accessor.
    pub fn get(&self, owner: Option<&Value>, args: &[Value]) -> Result<Value, Fault> {
        self.accessor.get(owner, args)
    }

    /// Write through the accessor.
    pub fn set(&self, owner: Option<&Value>, args: &[Value], value: Value) -> Result<(), Fault> {
        self.accessor.set(owner, args, value)
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("is_static", &self.is_static)
            .finish_non_exhaustive()
    }
}
