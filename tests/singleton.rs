//! Lazy-singleton lifecycle: at-most-once construction under contention and
//! cycle detection on the constructing thread.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use ikebana::{BindingKey, GraphError, LazyRef, ObjectGraph};

#[test]
fn provider_runs_once_under_concurrent_stress() {
    const THREADS: usize = 16;

    let runs = Arc::new(AtomicUsize::new(0));
    let provider_runs = runs.clone();
    let graph: ObjectGraph<Arc<String>> = ObjectGraph::builder()
        .singleton("Service", move |_| {
            provider_runs.fetch_add(1, Ordering::SeqCst);
            // Widen the construction window so racing callers pile up on it.
            thread::sleep(Duration::from_millis(20));
            Ok(Arc::new("service".to_string()))
        })
        .build()
        .unwrap();

    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let graph = graph.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                graph.get("Service").unwrap()
            })
        })
        .collect();

    let values: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    for value in &values[1..] {
        assert!(Arc::ptr_eq(&values[0], value));
    }
}

#[test]
fn direct_self_reference_faults_instead_of_deadlocking() {
    let graph: ObjectGraph<Arc<String>> = ObjectGraph::builder()
        .singleton("Selfish", |g: &ObjectGraph<Arc<String>>| g.get("Selfish"))
        .build()
        .unwrap();

    match graph.get("Selfish") {
        Err(GraphError::CyclicDependency { key }) => {
            assert_eq!(key, BindingKey::new("Selfish"));
        }
        _ => panic!("expected a cyclic-dependency fault"),
    }
}

#[test]
fn transitive_cycle_names_the_reentered_binding() {
    let graph: ObjectGraph<Arc<String>> = ObjectGraph::builder()
        .singleton("A", |g: &ObjectGraph<Arc<String>>| g.get("B"))
        .singleton("B", |g: &ObjectGraph<Arc<String>>| g.get("A"))
        .build()
        .unwrap();

    match graph.get("A") {
        Err(GraphError::CyclicDependency { key }) => {
            assert_eq!(key, BindingKey::new("A"));
        }
        _ => panic!("expected a cyclic-dependency fault"),
    }
}

#[test]
fn cyclic_fault_reports_the_same_key_on_retry() {
    let graph: ObjectGraph<Arc<String>> = ObjectGraph::builder()
        .singleton("Selfish", |g: &ObjectGraph<Arc<String>>| g.get("Selfish"))
        .build()
        .unwrap();

    let first = graph.get("Selfish").unwrap_err();
    let second = graph.get("Selfish").unwrap_err();
    assert_eq!(first, second);
}

type Payload = Arc<dyn Any + Send + Sync>;

struct Chicken {
    egg: LazyRef<Payload>,
}

#[test]
fn lazy_handle_breaks_a_legitimate_cycle() {
    let graph: ObjectGraph<Payload> = ObjectGraph::builder()
        .singleton("Chicken", |g: &ObjectGraph<Payload>| {
            // Deferring the partner is what makes the cycle workable: the
            // handle is dereferenced only after construction completes.
            Ok(Arc::new(Chicken {
                egg: g.lazy("Egg"),
            }) as Payload)
        })
        .singleton("Egg", |g: &ObjectGraph<Payload>| {
            g.get("Chicken")?;
            Ok(Arc::new("egg".to_string()) as Payload)
        })
        .build()
        .unwrap();

    let egg = graph.get("Egg").unwrap();
    let chicken = graph
        .get("Chicken")
        .unwrap()
        .downcast::<Chicken>()
        .unwrap();
    let hatched = chicken.egg.get().unwrap();
    assert!(Arc::ptr_eq(&egg, &hatched));
}

// Preserved asymmetry with the singleton variant: factories carry no
// re-entry detection at all.
#[test]
#[ignore = "a self-referential factory recurses until stack exhaustion; run manually"]
fn self_referential_factory_recurses_unprotected() {
    let graph: ObjectGraph<Arc<String>> = ObjectGraph::builder()
        .factory("Loop", |g: &ObjectGraph<Arc<String>>| g.get("Loop"))
        .build()
        .unwrap();
    let _ = graph.get("Loop");
}
