//! Caller-owned compile-result cache.
//!
//! An explicit cache object, not ambient global state. Keys are
//! (tree identity, options): tree identity is the `Arc` pointer, so two
//! structurally equal trees built separately compile separately, while
//! recompiling the *same* tree with the same options is a hit. The map
//! lock is held across compilation, guaranteeing at most one
//! compilation per distinct pair even under concurrent callers.

use std::sync::Arc;

use arbor_canon::CompileError;
use arbor_ir::{CompilerOptions, ExprTree};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::compiled::CompiledFn;
use crate::compile;

type CacheKey = (usize, u8);

#[derive(Default)]
pub struct CompileCache {
    entries: Mutex<FxHashMap<CacheKey, Arc<CompiledFn>>>,
}

impl CompileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached callable for `(tree, options)`, compiling at
    /// most once per distinct pair.
    pub fn get_or_compile(
        &self,
        tree: &Arc<ExprTree>,
        options: CompilerOptions,
    ) -> Result<Arc<CompiledFn>, CompileError> {
        let key = (Arc::as_ptr(tree) as usize, options.bits());
        let mut entries = self.entries.lock();
        if let Some(hit) = entries.get(&key) {
            trace!(?options, "compile cache hit");
            return Ok(Arc::clone(hit));
        }
        let compiled = Arc::new(compile(tree, options)?);
        entries.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    /// Number of cached callables.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
