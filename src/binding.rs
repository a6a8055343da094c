//! Binding keys and the supply strategies registered under them.
//!
//! A binding associates one `(type identifier, optional tag)` key with a way
//! of producing a payload: a pre-built value, a lazily constructed shared
//! singleton, or a factory invoked on every resolution. Bindings are immutable
//! after registration except for the singleton's internal cached state.

use std::fmt;
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use once_cell::sync::OnceCell;
use tracing::trace;

use crate::error::GraphError;
use crate::graph::ObjectGraph;

/// Identifies one registration: a stable nominal type identifier plus an
/// optional tag discriminating multiple bindings of the same type.
///
/// Keys compare componentwise; the absence of a tag is distinct from every
/// non-empty tag. The identifier is caller-supplied and must be reproduced
/// consistently at lookup time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BindingKey {
    type_id: String,
    tag: Option<String>,
}

impl BindingKey {
    pub fn new(type_id: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            tag: None,
        }
    }

    pub fn tagged(type_id: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            tag: Some(tag.into()),
        }
    }

    pub fn type_id(&self) -> &str {
        &self.type_id
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    pub(crate) fn matches(&self, type_id: &str, tag: Option<&str>) -> bool {
        self.type_id == type_id && self.tag.as_deref() == tag
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.type_id)?;
        if let Some(tag) = &self.tag {
            write!(f, " with tag '{}'", tag)?;
        }
        Ok(())
    }
}

impl From<&str> for BindingKey {
    fn from(type_id: &str) -> Self {
        BindingKey::new(type_id)
    }
}

impl From<String> for BindingKey {
    fn from(type_id: String) -> Self {
        BindingKey::new(type_id)
    }
}

impl<T: Into<String>, U: Into<String>> From<(T, U)> for BindingKey {
    fn from((type_id, tag): (T, U)) -> Self {
        BindingKey::tagged(type_id, tag)
    }
}

/// Borrowed form of [`BindingKey`] accepted on the lookup path, which must
/// not allocate.
#[derive(Clone, Copy, Debug)]
pub struct KeyRef<'a> {
    pub(crate) type_id: &'a str,
    pub(crate) tag: Option<&'a str>,
}

impl<'a> KeyRef<'a> {
    pub fn new(type_id: &'a str) -> Self {
        Self { type_id, tag: None }
    }

    pub fn tagged(type_id: &'a str, tag: &'a str) -> Self {
        Self {
            type_id,
            tag: Some(tag),
        }
    }

    pub(crate) fn into_key(self) -> BindingKey {
        BindingKey {
            type_id: self.type_id.to_string(),
            tag: self.tag.map(str::to_string),
        }
    }
}

impl<'a> From<&'a str> for KeyRef<'a> {
    fn from(type_id: &'a str) -> Self {
        KeyRef::new(type_id)
    }
}

impl<'a> From<(&'a str, &'a str)> for KeyRef<'a> {
    fn from((type_id, tag): (&'a str, &'a str)) -> Self {
        KeyRef::tagged(type_id, tag)
    }
}

impl<'a> From<&'a BindingKey> for KeyRef<'a> {
    fn from(key: &'a BindingKey) -> Self {
        Self {
            type_id: &key.type_id,
            tag: key.tag.as_deref(),
        }
    }
}

/// Zero-argument supply closure. It receives the built graph so it can
/// resolve its own dependencies and propagate wiring faults with `?`.
pub type ProviderFn<V> = dyn Fn(&ObjectGraph<V>) -> Result<V, GraphError> + Send + Sync;

/// One registered supply strategy, occupying exactly one probe-table slot.
pub(crate) trait Binding<V>: Send + Sync {
    fn key(&self) -> &BindingKey;

    fn is_override(&self) -> bool;

    fn provide(&self, graph: &ObjectGraph<V>) -> Result<V, GraphError>;
}

/// Wraps a value that was already built by the caller.
pub(crate) struct InstanceBinding<V> {
    key: BindingKey,
    is_override: bool,
    value: V,
}

impl<V> InstanceBinding<V> {
    pub(crate) fn new(key: BindingKey, is_override: bool, value: V) -> Self {
        Self {
            key,
            is_override,
            value,
        }
    }
}

impl<V: Clone + Send + Sync> Binding<V> for InstanceBinding<V> {
    fn key(&self) -> &BindingKey {
        &self.key
    }

    fn is_override(&self) -> bool {
        self.is_override
    }

    fn provide(&self, _graph: &ObjectGraph<V>) -> Result<V, GraphError> {
        Ok(self.value.clone())
    }
}

enum SingletonState<V> {
    /// Construction has not happened yet; the provider is still held.
    Pending(Box<ProviderFn<V>>),
    /// Construction completed; the provider has been dropped.
    Ready(V),
}

/// Constructs its value at most once, on first resolution, and serves the
/// cached value thereafter.
///
/// The cached value is mirrored into a [`OnceCell`] so that post-construction
/// reads take a lock-free fast path. Construction itself is serialized by the
/// state lock: concurrent callers block until the first one finishes, then
/// observe the cached value. Re-entry by the constructing thread is detected
/// through the `creating` marker, which is checked before the state lock is
/// touched, and surfaces a cyclic-dependency fault instead of deadlocking.
pub(crate) struct SingletonBinding<V> {
    key: BindingKey,
    is_override: bool,
    cache: OnceCell<V>,
    state: Mutex<SingletonState<V>>,
    creating: Mutex<Option<ThreadId>>,
}

impl<V> SingletonBinding<V> {
    pub(crate) fn new(key: BindingKey, is_override: bool, provider: Box<ProviderFn<V>>) -> Self {
        Self {
            key,
            is_override,
            cache: OnceCell::new(),
            state: Mutex::new(SingletonState::Pending(provider)),
            creating: Mutex::new(None),
        }
    }
}

impl<V: Clone + Send + Sync> Binding<V> for SingletonBinding<V> {
    fn key(&self) -> &BindingKey {
        &self.key
    }

    fn is_override(&self) -> bool {
        self.is_override
    }

    fn provide(&self, graph: &ObjectGraph<V>) -> Result<V, GraphError> {
        if let Some(value) = self.cache.get() {
            return Ok(value.clone());
        }
        if *self.creating.lock().unwrap() == Some(thread::current().id()) {
            return Err(GraphError::CyclicDependency {
                key: self.key.clone(),
            });
        }
        let mut state = self.state.lock().unwrap();
        match &*state {
            SingletonState::Ready(value) => Ok(value.clone()),
            SingletonState::Pending(provider) => {
                trace!(key = %self.key, "constructing lazy singleton");
                *self.creating.lock().unwrap() = Some(thread::current().id());
                let built = provider(graph);
                *self.creating.lock().unwrap() = None;
                // A failed construction keeps the provider, so a retry
                // reports the same underlying fault again.
                let value = built?;
                let _ = self.cache.set(value.clone());
                *state = SingletonState::Ready(value.clone());
                Ok(value)
            }
        }
    }
}

/// Invokes its provider on every resolution; nothing is cached.
///
/// Unlike the singleton variant there is no re-entry detection: a factory
/// whose provider requests its own key recurses until stack exhaustion.
pub(crate) struct FactoryBinding<V> {
    key: BindingKey,
    is_override: bool,
    provider: Box<ProviderFn<V>>,
}

impl<V> FactoryBinding<V> {
    pub(crate) fn new(key: BindingKey, is_override: bool, provider: Box<ProviderFn<V>>) -> Self {
        Self {
            key,
            is_override,
            provider,
        }
    }
}

impl<V: Clone + Send + Sync> Binding<V> for FactoryBinding<V> {
    fn key(&self) -> &BindingKey {
        &self.key
    }

    fn is_override(&self) -> bool {
        self.is_override
    }

    fn provide(&self, graph: &ObjectGraph<V>) -> Result<V, GraphError> {
        (self.provider)(graph)
    }
}
