//! Builder accumulation and the built, read-only object graph.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::binding::{
    Binding, BindingKey, FactoryBinding, InstanceBinding, KeyRef, SingletonBinding,
};
use crate::error::GraphError;
use crate::lazy::LazyRef;
use crate::table::ProbeTable;

struct GraphInner<V> {
    table: ProbeTable<V>,
    /// Accumulation-ordered bindings, retained only so a child builder can
    /// import them through [`Builder::extend`].
    bindings: Vec<Arc<dyn Binding<V>>>,
}

/// Immutable, read-only facade over a built probe table.
///
/// A graph is built at most once per [`Builder`] and never mutated
/// afterwards, so any number of threads may resolve against it concurrently;
/// the only suspension point is a lazy singleton's first construction.
/// Cloning produces another handle to the same graph, which is how a deferred
/// handle or a provider keeps the graph alive past the borrow it was given.
pub struct ObjectGraph<V> {
    inner: Arc<GraphInner<V>>,
}

impl<V> Clone for ObjectGraph<V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<V> fmt::Debug for ObjectGraph<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectGraph")
            .field("bindings", &self.inner.bindings.len())
            .field("capacity", &self.inner.table.capacity())
            .finish()
    }
}

impl<V: Clone + Send + Sync + 'static> ObjectGraph<V> {
    pub fn builder() -> Builder<V> {
        Builder::new()
    }

    /// Resolves a key through the probe table and delegates to its binding.
    ///
    /// Accepts anything key-shaped: `"TypeId"`, `("TypeId", "tag")`, or a
    /// borrowed [`BindingKey`]. Fails with
    /// [`GraphError::BindingNotFound`] when no binding was registered for the
    /// key.
    pub fn get<'k>(&self, key: impl Into<KeyRef<'k>>) -> Result<V, GraphError> {
        let key = key.into();
        match self.inner.table.get(key.type_id, key.tag) {
            Some(binding) => binding.provide(self),
            None => Err(GraphError::BindingNotFound {
                key: key.into_key(),
            }),
        }
    }

    /// Returns a deferred handle that performs the resolution of [`get`] only
    /// on first dereference.
    ///
    /// [`get`]: ObjectGraph::get
    pub fn lazy<'k>(&self, key: impl Into<KeyRef<'k>>) -> LazyRef<V> {
        LazyRef::new(self.clone(), key.into().into_key())
    }

    pub(crate) fn bindings(&self) -> &[Arc<dyn Binding<V>>] {
        &self.inner.bindings
    }
}

/// Accumulates typed bindings and materializes them into an [`ObjectGraph`].
///
/// Registration methods consume and return the builder, and [`build`] takes
/// it by value, so a builder cannot be reused after building.
///
/// [`build`]: Builder::build
pub struct Builder<V> {
    bindings: Vec<Arc<dyn Binding<V>>>,
}

impl<V: Clone + Send + Sync + 'static> Builder<V> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Registers a pre-built value under the key.
    pub fn instance(self, key: impl Into<BindingKey>, value: V) -> Self {
        self.push(Arc::new(InstanceBinding::new(key.into(), false, value)))
    }

    /// Registers a pre-built value that takes precedence over a normal
    /// binding with the same key.
    pub fn override_instance(self, key: impl Into<BindingKey>, value: V) -> Self {
        self.push(Arc::new(InstanceBinding::new(key.into(), true, value)))
    }

    /// Registers a lazy singleton: the provider runs at most once, on first
    /// resolution, and the result is shared by every subsequent caller.
    pub fn singleton<F>(self, key: impl Into<BindingKey>, provider: F) -> Self
    where
        F: Fn(&ObjectGraph<V>) -> Result<V, GraphError> + Send + Sync + 'static,
    {
        self.push(Arc::new(SingletonBinding::new(
            key.into(),
            false,
            Box::new(provider),
        )))
    }

    /// Registers a lazy singleton marked as an override.
    pub fn override_singleton<F>(self, key: impl Into<BindingKey>, provider: F) -> Self
    where
        F: Fn(&ObjectGraph<V>) -> Result<V, GraphError> + Send + Sync + 'static,
    {
        self.push(Arc::new(SingletonBinding::new(
            key.into(),
            true,
            Box::new(provider),
        )))
    }

    /// Registers a factory: the provider runs on every resolution and nothing
    /// is cached.
    pub fn factory<F>(self, key: impl Into<BindingKey>, provider: F) -> Self
    where
        F: Fn(&ObjectGraph<V>) -> Result<V, GraphError> + Send + Sync + 'static,
    {
        self.push(Arc::new(FactoryBinding::new(
            key.into(),
            false,
            Box::new(provider),
        )))
    }

    /// Registers a factory marked as an override.
    pub fn override_factory<F>(self, key: impl Into<BindingKey>, provider: F) -> Self
    where
        F: Fn(&ObjectGraph<V>) -> Result<V, GraphError> + Send + Sync + 'static,
    {
        self.push(Arc::new(FactoryBinding::new(
            key.into(),
            true,
            Box::new(provider),
        )))
    }

    /// Imports every binding of an already-built graph at the current
    /// insertion point: bindings accumulated so far stay before the imported
    /// ones, later registrations come after, and multiple `extend` calls
    /// compose in call order.
    ///
    /// Imported bindings are shared with the parent, so a lazy singleton
    /// resolved through either graph caches one instance for both.
    pub fn extend(mut self, parent: &ObjectGraph<V>) -> Self {
        self.bindings.extend(parent.bindings().iter().cloned());
        self
    }

    /// Materializes the accumulated bindings into a probe table sized once
    /// from their final count.
    ///
    /// Non-override bindings are inserted first, in accumulation order; two
    /// of them colliding on one key is a [`GraphError::DuplicateBinding`]
    /// fault reported here rather than at first lookup. Override bindings are
    /// then applied in accumulation order, unconditionally replacing any
    /// occupant, so an override always wins over a normal binding and the
    /// last-registered override wins among themselves.
    pub fn build(self) -> Result<ObjectGraph<V>, GraphError> {
        let mut table = ProbeTable::with_binding_count(self.bindings.len());
        let mut overrides = Vec::new();
        for binding in &self.bindings {
            if binding.is_override() {
                overrides.push(Arc::clone(binding));
            } else {
                table.put(Arc::clone(binding), false)?;
            }
        }
        let override_count = overrides.len();
        for binding in overrides {
            table.put(binding, true)?;
        }
        debug!(
            bindings = self.bindings.len(),
            overrides = override_count,
            capacity = table.capacity(),
            "materialized object graph"
        );
        Ok(ObjectGraph {
            inner: Arc::new(GraphInner {
                table,
                bindings: self.bindings,
            }),
        })
    }

    fn push(mut self, binding: Arc<dyn Binding<V>>) -> Self {
        self.bindings.push(binding);
        self
    }
}

impl<V: Clone + Send + Sync + 'static> Default for Builder<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds an [`ObjectGraph`] from a declarative registration block.
///
/// Each statement is a [`Builder`] method call; the block evaluates to the
/// result of [`Builder::build`].
///
/// ```
/// use ikebana::{object_graph, GraphError, ObjectGraph};
///
/// # fn main() -> Result<(), GraphError> {
/// let graph: ObjectGraph<i64> = object_graph! {
///     instance("Two", 2);
///     singleton("Four", |g: &ObjectGraph<i64>| Ok(g.get("Two")? * 2));
/// }?;
/// assert_eq!(graph.get("Four")?, 4);
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! object_graph {
    ($( $method:ident ( $($arg:expr),* $(,)? ) );* $(;)?) => {{
        let builder = $crate::ObjectGraph::builder();
        $( let builder = builder.$method($($arg),*); )*
        builder.build()
    }};
}
