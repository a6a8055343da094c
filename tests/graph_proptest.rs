//! Property sweeps over the registration surface: arbitrary distinct key
//! sets resolve through every binding kind, absent keys fault, duplicates
//! always fault, and overrides always win.

use proptest::prelude::*;

use ikebana::{BindingKey, GraphError, ObjectGraph};

fn key_strategy() -> impl Strategy<Value = (String, Option<String>)> {
    ("[A-Z][A-Za-z]{0,7}", proptest::option::of("[a-z]{1,4}"))
}

fn binding_key(type_id: &str, tag: &Option<String>) -> BindingKey {
    match tag {
        Some(tag) => BindingKey::tagged(type_id, tag.clone()),
        None => BindingKey::new(type_id),
    }
}

fn resolve(
    graph: &ObjectGraph<usize>,
    type_id: &str,
    tag: &Option<String>,
) -> Result<usize, GraphError> {
    match tag {
        Some(tag) => graph.get((type_id, tag.as_str())),
        None => graph.get(type_id),
    }
}

proptest! {
    #[test]
    fn prop_registered_keys_resolve_and_absent_keys_fault(
        keys in proptest::collection::hash_set(key_strategy(), 0..24),
        probe in key_strategy(),
    ) {
        let keys: Vec<_> = keys.into_iter().collect();
        let mut builder = ObjectGraph::<usize>::builder();
        for (i, (type_id, tag)) in keys.iter().enumerate() {
            let key = binding_key(type_id, tag);
            builder = match i % 3 {
                0 => builder.instance(key, i),
                1 => builder.singleton(key, move |_| Ok(i)),
                _ => builder.factory(key, move |_| Ok(i)),
            };
        }
        let graph = builder.build().unwrap();

        for (i, (type_id, tag)) in keys.iter().enumerate() {
            prop_assert_eq!(resolve(&graph, type_id, tag).unwrap(), i);
        }
        if !keys.contains(&probe) {
            let is_not_found = matches!(
                resolve(&graph, &probe.0, &probe.1),
                Err(GraphError::BindingNotFound { .. })
            );
            prop_assert!(is_not_found);
        }
    }

    #[test]
    fn prop_duplicate_non_override_always_faults(
        keys in proptest::collection::hash_set(key_strategy(), 1..12),
        dup in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<_> = keys.into_iter().collect();
        let (dup_type, dup_tag) = dup.get(&keys).clone();

        let mut builder = ObjectGraph::<usize>::builder();
        for (i, (type_id, tag)) in keys.iter().enumerate() {
            builder = builder.instance(binding_key(type_id, tag), i);
        }
        builder = builder.instance(binding_key(&dup_type, &dup_tag), usize::MAX);

        let err = builder.build().unwrap_err();
        prop_assert_eq!(err, GraphError::DuplicateBinding {
            key: binding_key(&dup_type, &dup_tag),
        });
    }

    #[test]
    fn prop_an_override_always_shadows_the_normal_binding(
        keys in proptest::collection::hash_set(key_strategy(), 1..12),
        chosen in any::<prop::sample::Index>(),
    ) {
        let keys: Vec<_> = keys.into_iter().collect();
        let (over_type, over_tag) = chosen.get(&keys).clone();

        let mut builder = ObjectGraph::<usize>::builder();
        for (i, (type_id, tag)) in keys.iter().enumerate() {
            builder = builder.instance(binding_key(type_id, tag), i);
        }
        builder = builder.override_instance(binding_key(&over_type, &over_tag), usize::MAX);
        let graph = builder.build().unwrap();

        for (i, (type_id, tag)) in keys.iter().enumerate() {
            let expected = if (type_id, tag) == (&over_type, &over_tag) {
                usize::MAX
            } else {
                i
            };
            prop_assert_eq!(resolve(&graph, type_id, tag).unwrap(), expected);
        }
    }
}
