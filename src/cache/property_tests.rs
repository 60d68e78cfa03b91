//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the coalescing, key and error-format guarantees.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::cache::{cache_key, Memoizer};
use crate::store::{MemoryStore, StoreClient};

// == Test Configuration ==
const TEST_TTL: u64 = 60;

// == Strategies ==
/// Operation names, including the separator character
fn operation_strategy() -> impl Strategy<Value = String> {
    "[a-z:0-9]{0,6}".prop_map(|s| s)
}

/// Argument lists, including empty and separator-laden values
fn parts_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec("[a-z:0-9]{0,4}", 0..4)
}

/// Keys drawn from a small alphabet so calls collide often
fn contested_key_strategy() -> impl Strategy<Value = String> {
    "[a-d]".prop_map(|s| s)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // Distinct (operation, arguments) tuples never share a key.
    #[test]
    fn prop_cache_key_injective(
        op_a in operation_strategy(),
        parts_a in parts_strategy(),
        op_b in operation_strategy(),
        parts_b in parts_strategy(),
    ) {
        let refs_a: Vec<&str> = parts_a.iter().map(String::as_str).collect();
        let refs_b: Vec<&str> = parts_b.iter().map(String::as_str).collect();

        let key_a = cache_key(&op_a, &refs_a);
        let key_b = cache_key(&op_b, &refs_b);

        if (op_a, parts_a) == (op_b, parts_b) {
            prop_assert_eq!(key_a, key_b);
        } else {
            prop_assert_ne!(key_a, key_b, "Distinct inputs produced the same key");
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(20))]

    // For any burst of concurrent calls over a set of keys, each key is
    // computed exactly once and every caller of a key sees the same value.
    #[test]
    fn prop_single_flight_per_key(
        keys in prop::collection::vec(contested_key_strategy(), 1..40)
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let store = Arc::new(MemoryStore::new());
            let memoizer = Memoizer::new(store.clone());
            let next_id = Arc::new(AtomicUsize::new(0));
            let calls: Arc<std::sync::Mutex<HashMap<String, usize>>> = Arc::default();

            let mut handles = vec![];
            for key in &keys {
                let calls = calls.clone();
                let next_id = next_id.clone();
                let owned_key = key.clone();
                let cached = memoizer
                    .wrap(key.clone(), TEST_TTL, move |_: ()| {
                        let calls = calls.clone();
                        let next_id = next_id.clone();
                        let key = owned_key.clone();
                        async move {
                            *calls.lock().unwrap().entry(key).or_insert(0) += 1;
                            tokio::time::sleep(Duration::from_millis(30)).await;
                            let id = next_id.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, anyhow::Error>(Bytes::from(id.to_string()))
                        }
                    })
                    .unwrap();

                let key = key.clone();
                handles.push(tokio::spawn(async move {
                    (key, cached.call(()).await)
                }));
            }

            let mut seen: HashMap<String, Bytes> = HashMap::new();
            for handle in handles {
                let (key, result) = handle.await.expect("Task should not panic");
                let value = result.expect("Call should succeed");
                let first = seen.entry(key.clone()).or_insert_with(|| value.clone());
                prop_assert_eq!(&*first, &value, "Callers of '{}' saw different values", key);
            }

            let distinct: HashSet<&String> = keys.iter().collect();
            let calls = calls.lock().unwrap().clone();
            prop_assert_eq!(calls.len(), distinct.len());
            for (key, count) in calls.iter() {
                prop_assert_eq!(*count, 1, "Key '{}' computed more than once", key);
            }
            prop_assert_eq!(memoizer.flights().in_flight(), 0);

            for key in distinct {
                prop_assert_eq!(store.get(key).await.unwrap(), seen.get(key).cloned());
            }
            Ok(())
        })?;
    }

    // Concurrent increments never lose an update.
    #[test]
    fn prop_concurrent_increments(n in 1usize..60) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let store = Arc::new(MemoryStore::new());

            let handles: Vec<_> = (0..n)
                .map(|_| {
                    let store = store.clone();
                    tokio::spawn(async move { store.increment("counter").await })
                })
                .collect();

            let mut values = vec![];
            for handle in handles {
                values.push(handle.await.expect("Task should not panic").unwrap());
            }
            values.sort_unstable();

            prop_assert_eq!(values, (1..=n as i64).collect::<Vec<_>>());
            Ok(())
        })?;
    }
}

// == Property Test for Error Response Format ==
// This tests the CacheError -> HTTP response conversion

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Every error renders as JSON with a string "error" field carrying the message.
    #[test]
    fn prop_error_response_format(
        error_msg in "[a-zA-Z0-9 _-]{1,100}"
    ) {
        use crate::error::CacheError;
        use axum::response::IntoResponse;
        use axum::body::to_bytes;

        let error_variants = vec![
            CacheError::StoreUnavailable(error_msg.clone()),
            CacheError::StoreTimeout(error_msg.clone()),
            CacheError::StoreRejected(error_msg.clone()),
            CacheError::ComputationFailed(error_msg.clone()),
            CacheError::Cancelled(error_msg.clone()),
            CacheError::InvalidConfiguration(error_msg.clone()),
        ];

        for error in error_variants {
            let expected_msg = error.to_string();
            let response = error.into_response();

            let content_type = response.headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let body = response.into_body();
            let rt = tokio::runtime::Runtime::new().unwrap();
            let bytes = rt.block_on(async {
                to_bytes(body, usize::MAX).await.unwrap()
            });

            let json: serde_json::Value = serde_json::from_slice(&bytes)
                .expect("Response body should be valid JSON");

            let error_value = json.get("error");
            prop_assert!(
                error_value.map(|v| v.is_string()).unwrap_or(false),
                "JSON response should contain a string 'error' field"
            );
            prop_assert_eq!(error_value.and_then(|v| v.as_str()), Some(expected_msg.as_str()));
        }
    }
}
