//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the cache contract over generated keys and values.

use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::backend::{KvStore, MemoryStore};
use crate::cache::{fingerprint, Cache, CacheValue, CallArgs};

// == Strategies ==
/// Generates cache keys
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_:]{1,64}"
}

/// Generates arbitrary JSON documents, including any finite float
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("JSON has no NaN or infinity", |f| f.is_finite())
            .prop_map(Value::from),
        ".{0,16}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Any JSON value read back before expiry is deep-equal to what was stored.
    #[test]
    fn prop_json_round_trip(key in key_strategy(), value in json_strategy()) {
        let rt = runtime();
        let cache = Cache::new(Arc::new(MemoryStore::new()), "prop");

        let got = rt.block_on(async {
            cache.set(&key, value.clone(), Some(300)).await;
            cache.get(&key).await
        });
        prop_assert_eq!(got, Some(CacheValue::Json(value)));
    }

    // Text is returned verbatim, even when it would parse as JSON.
    #[test]
    fn prop_text_round_trip(key in key_strategy(), text in ".{0,64}") {
        let rt = runtime();
        let cache = Cache::new(Arc::new(MemoryStore::new()), "prop");

        let got = rt.block_on(async {
            cache.set(&key, text.as_str(), None).await;
            cache.get(&key).await
        });
        prop_assert_eq!(got, Some(CacheValue::Text(text)));
    }

    // A key written under one namespace is never visible under another.
    #[test]
    fn prop_namespace_isolation(
        key in key_strategy(),
        ns_a in "[a-z]{1,8}",
        ns_b in "[a-z]{1,8}",
        value in json_strategy(),
    ) {
        prop_assume!(ns_a != ns_b);
        let rt = runtime();
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let a = Cache::new(store.clone(), ns_a);
        let b = Cache::new(store, ns_b);

        let got = rt.block_on(async {
            a.set(&key, value, None).await;
            b.get_or(&key, "default").await
        });
        prop_assert_eq!(got, CacheValue::Text("default".to_string()));
    }

    // Supplying keyword arguments in any order yields one fingerprint.
    #[test]
    fn prop_kwarg_order_independence(
        kwargs in prop::collection::btree_map("[a-z]{1,6}", any::<i64>(), 1..6),
    ) {
        let forward = kwargs
            .iter()
            .fold(CallArgs::new(), |call, (k, v)| call.kwarg(k.clone(), *v));
        let reverse = kwargs
            .iter()
            .rev()
            .fold(CallArgs::new(), |call, (k, v)| call.kwarg(k.clone(), *v));

        prop_assert_eq!(
            fingerprint("p", "f", &forward),
            fingerprint("p", "f", &reverse)
        );
    }

    // Distinct positional arguments give distinct fingerprints.
    #[test]
    fn prop_distinct_args_distinct_keys(a in any::<i64>(), b in any::<i64>()) {
        prop_assume!(a != b);
        prop_assert_ne!(
            fingerprint("p", "f", &CallArgs::new().arg(a)),
            fingerprint("p", "f", &CallArgs::new().arg(b))
        );
    }

    // Calling a memoized function twice with the same inputs computes once.
    #[test]
    fn prop_memoize_computes_once(
        args in prop::collection::vec(any::<i64>(), 0..4),
        kwargs in prop::collection::btree_map("[a-z]{1,4}", ".{0,8}", 0..3),
    ) {
        let rt = runtime();
        let cache = Cache::new(Arc::new(MemoryStore::new()), "prop");
        let memo = cache.memoize("prop", Some(300));
        let calls = AtomicUsize::new(0);

        let mut call = args.iter().fold(CallArgs::new(), |call, a| call.arg(*a));
        for (k, v) in &kwargs {
            call = call.kwarg(k.clone(), v.clone());
        }
        let expected: BTreeMap<String, String> = kwargs.clone();

        for _ in 0..2 {
            let got: BTreeMap<String, String> = rt.block_on(memo.call("echo", &call, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                kwargs.clone()
            }));
            prop_assert_eq!(&got, &expected);
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
