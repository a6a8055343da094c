use thiserror::Error;

use crate::binding::BindingKey;

/// Faults surfaced while building or resolving an object graph.
///
/// Every variant is a deterministic configuration or usage error: nothing is
/// retried internally and there is no partial-failure mode. The offending key
/// is carried so the caller can pinpoint the registration without inspecting
/// container internals.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// A `get` call or lazy dereference named a key nobody registered.
    #[error("no binding found for {key}")]
    BindingNotFound { key: BindingKey },

    /// Two non-override registrations collided on the same key. Reported by
    /// [`Builder::build`](crate::Builder::build), not at first lookup.
    #[error("multiple bindings for {key}")]
    DuplicateBinding { key: BindingKey },

    /// A lazy singleton requested its own binding, directly or transitively,
    /// on the thread that is still constructing it. Requesting the partner
    /// through [`ObjectGraph::lazy`](crate::ObjectGraph::lazy) defers that
    /// resolution until after construction completes and breaks the cycle.
    #[error("cyclic dependency detected for {key}; resolving one side through a lazy handle breaks the cycle")]
    CyclicDependency { key: BindingKey },
}
