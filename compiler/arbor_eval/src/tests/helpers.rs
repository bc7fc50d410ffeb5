//! Embedder-side fixtures shared across the eval test suite.
//!
//! Real embedders supply `MemberAccessor` implementations over their own
//! object model; these fixtures stand in for that side of the contract
//! and additionally count accessor calls so tests can pin down how often
//! (and whether) compiled code touches a member.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use arbor_ir::{Fault, Member, MemberAccessor, Ty, Value};

/// Downcast an instance owner to the concrete fixture type.
pub(crate) fn downcast_owner<T: Send + Sync + 'static>(
    owner: Option<&Value>,
) -> Result<&T, Fault> {
    match owner {
        Some(Value::Obj(Some(obj))) => obj.downcast_ref::<T>().ok_or(Fault::TypeMismatch {
            expected: "test fixture object",
            got: "foreign object",
        }),
        Some(other) => Err(Fault::TypeMismatch {
            expected: "object owner",
            got: other.type_name(),
        }),
        None => Err(Fault::TypeMismatch {
            expected: "instance owner",
            got: "static access",
        }),
    }
}

/// A one-field object. The field holds any `Value`.
pub(crate) struct Cell {
    pub value: RwLock<Value>,
}

impl Cell {
    pub(crate) fn new(value: Value) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }
}

/// Accessor for `Cell`'s single field, counting every get and set.
pub(crate) struct CellField {
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
}

impl CellField {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
        })
    }

    pub(crate) fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

impl MemberAccessor for CellField {
    fn get(&self, owner: Option<&Value>, _args: &[Value]) -> Result<Value, Fault> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let cell: &Cell = downcast_owner(owner)?;
        Ok(cell.value.read().clone())
    }

    fn set(&self, owner: Option<&Value>, _args: &[Value], value: Value) -> Result<(), Fault> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        let cell: &Cell = downcast_owner(owner)?;
        *cell.value.write() = value;
        Ok(())
    }
}

/// Member handle paired with its counting accessor.
pub(crate) type CellHandles = (Member, Arc<CellField>);

/// Instance member over a `Cell` field, returning the counting accessor
/// alongside the member handle.
pub(crate) fn cell_member(name: &str, ty: Ty) -> CellHandles {
    let accessor = CellField::new();
    let member = Member::instance(name, ty, accessor.clone());
    (member, accessor)
}

/// Accessor holding its own storage; used for static members, which have
/// no owner to hang state off.
pub(crate) struct StaticCell {
    pub value: RwLock<Value>,
}

impl MemberAccessor for StaticCell {
    fn get(&self, _owner: Option<&Value>, _args: &[Value]) -> Result<Value, Fault> {
        Ok(self.value.read().clone())
    }

    fn set(&self, _owner: Option<&Value>, _args: &[Value], value: Value) -> Result<(), Fault> {
        *self.value.write() = value;
        Ok(())
    }
}

/// Static member backed by a `StaticCell`.
pub(crate) fn static_member(name: &str, ty: Ty, initial: Value) -> (Member, Arc<StaticCell>) {
    let accessor = Arc::new(StaticCell {
        value: RwLock::new(initial),
    });
    let member = Member::statik(name, ty, accessor.clone());
    (member, accessor)
}

/// Two-key indexer storage that grows lazily: reading an absent key
/// materializes the default value first, so a read-modify-write on a
/// never-written key starts from the default rather than faulting.
pub(crate) struct KeyedStore {
    cells: RwLock<FxHashMap<(i64, i64), Value>>,
    default: Value,
}

impl KeyedStore {
    pub(crate) fn new(default: Value) -> Self {
        Self {
            cells: RwLock::new(FxHashMap::default()),
            default,
        }
    }

    pub(crate) fn get(&self, key: (i64, i64)) -> Value {
        self.cells
            .write()
            .entry(key)
            .or_insert_with(|| self.default.clone())
            .clone()
    }

    pub(crate) fn set(&self, key: (i64, i64), value: Value) {
        self.cells.write().insert(key, value);
    }

    pub(crate) fn len(&self) -> usize {
        self.cells.read().len()
    }
}

/// Indexer accessor over a `KeyedStore`, counting gets and sets.
pub(crate) struct KeyedIndexer {
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
}

impl KeyedIndexer {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            gets: AtomicUsize::new(0),
            sets: AtomicUsize::new(0),
        })
    }

    pub(crate) fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    fn key(args: &[Value]) -> Result<(i64, i64), Fault> {
        if args.len() != 2 {
            return Err(Fault::Arity {
                expected: 2,
                got: args.len(),
            });
        }
        Ok((args[0].as_index()?, args[1].as_index()?))
    }
}

impl MemberAccessor for KeyedIndexer {
    fn get(&self, owner: Option<&Value>, args: &[Value]) -> Result<Value, Fault> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        let store: &KeyedStore = downcast_owner(owner)?;
        Ok(store.get(Self::key(args)?))
    }

    fn set(&self, owner: Option<&Value>, args: &[Value], value: Value) -> Result<(), Fault> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        let store: &KeyedStore = downcast_owner(owner)?;
        store.set(Self::key(args)?, value);
        Ok(())
    }
}
