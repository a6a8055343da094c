//! Runtime dependency-injection container built around an immutable object
//! graph with tagged bindings and bounded-time lookup.
//!
//! # Simple use case
//!
//! ```
//! use std::sync::Arc;
//! use ikebana::{GraphError, ObjectGraph};
//!
//! # fn main() -> Result<(), GraphError> {
//! // Payloads are whatever the caller picks; an Arc keeps clones cheap and
//! // makes singleton sharing observable.
//! let graph: ObjectGraph<Arc<String>> = ObjectGraph::builder()
//!     .instance("Greeting", Arc::new("hello".to_string()))
//!     .singleton("Shout", |g: &ObjectGraph<Arc<String>>| {
//!         Ok(Arc::new(g.get("Greeting")?.to_uppercase()))
//!     })
//!     .build()?;
//!
//! assert_eq!(*graph.get("Shout")?, "HELLO");
//! let a = graph.get("Shout")?;
//! let b = graph.get("Shout")?;
//! assert!(Arc::ptr_eq(&a, &b));
//! # Ok(())
//! # }
//! ```
//!
//! # Mechanism
//!
//! A [`Builder`] accumulates bindings, each registered under a
//! [`BindingKey`]: a caller-supplied nominal type identifier plus an optional
//! tag that allows several bindings of one type. Three supply strategies
//! exist: a pre-built instance, a lazy singleton constructed at most once,
//! and a factory invoked on every resolution.
//!
//! [`Builder::build`] partitions the accumulated bindings into normal and
//! override sequences and materializes them into a fixed-capacity,
//! prime-sized open-addressing table; two normal bindings sharing a key are
//! rejected there, while override bindings silently replace whatever occupies
//! their slot. The resulting [`ObjectGraph`] is immutable: concurrent lookups
//! need no synchronization, and resolution either returns the binding's value
//! or fails with a [`GraphError`] naming the offending key.
//!
//! [`ObjectGraph::lazy`] returns a [`LazyRef`], a deferred handle that
//! resolves on first dereference; it is also the recommended escape valve
//! when two singletons legitimately need each other.

mod binding;
mod error;
mod graph;
mod lazy;
mod table;

pub use binding::{BindingKey, KeyRef, ProviderFn};
pub use error::GraphError;
pub use graph::{Builder, ObjectGraph};
pub use lazy::LazyRef;
