//! Deferred resolution handles.

use std::fmt;
use std::sync::Mutex;

use crate::binding::BindingKey;
use crate::error::GraphError;
use crate::graph::ObjectGraph;

enum LazyState<V> {
    Unresolved {
        graph: ObjectGraph<V>,
        key: BindingKey,
    },
    Resolved(V),
}

/// A transient accessor that captures a graph handle and a key until first
/// dereference, then caches the resolved value and releases both.
///
/// The two situations are kept apart structurally, as a tagged state rather
/// than a sentinel value, so a payload that happens to equal its type's
/// default still counts as resolved.
///
/// A singleton provider that legitimately needs a cyclic partner should store
/// a handle for it instead of resolving eagerly: the partner is then obtained
/// only after the provider's own construction has completed, which is what
/// makes the cycle workable.
pub struct LazyRef<V> {
    state: Mutex<LazyState<V>>,
}

impl<V: Clone + Send + Sync + 'static> LazyRef<V> {
    pub(crate) fn new(graph: ObjectGraph<V>, key: BindingKey) -> Self {
        Self {
            state: Mutex::new(LazyState::Unresolved { graph, key }),
        }
    }

    /// Resolves through the captured graph on first call; cached thereafter.
    ///
    /// A failed resolution leaves the handle unresolved and surfaces the
    /// underlying fault, so a later call reports it again.
    pub fn get(&self) -> Result<V, GraphError> {
        let mut state = self.state.lock().unwrap();
        match &*state {
            LazyState::Resolved(value) => Ok(value.clone()),
            LazyState::Unresolved { graph, key } => {
                let value = graph.get(key)?;
                *state = LazyState::Resolved(value.clone());
                Ok(value)
            }
        }
    }

    /// Whether the handle has already resolved to a value.
    pub fn resolved(&self) -> bool {
        matches!(&*self.state.lock().unwrap(), LazyState::Resolved(_))
    }
}

impl<V: fmt::Debug> fmt::Debug for LazyRef<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.state.lock().unwrap() {
            LazyState::Resolved(value) => f.debug_tuple("LazyRef").field(value).finish(),
            LazyState::Unresolved { key, .. } => {
                f.debug_struct("LazyRef").field("unresolved", key).finish()
            }
        }
    }
}
