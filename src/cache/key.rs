//! Cache Key Module
//!
//! Builds store keys from an operation name and its argument values.

// == Cache Key ==
/// Composes a key that is unique per `(operation, parts)` tuple.
///
/// Every component is length-prefixed, so separators inside argument values
/// cannot make two different tuples produce the same key:
/// `cache_key("user", &["a:b"])` is `4:user:3:a:b`, while
/// `cache_key("user", &["a", "b"])` is `4:user:1:a:1:b`.
pub fn cache_key(operation: &str, parts: &[&str]) -> String {
    let capacity = operation.len() + parts.iter().map(|p| p.len() + 8).sum::<usize>() + 8;
    let mut key = String::with_capacity(capacity);

    key.push_str(&operation.len().to_string());
    key.push(':');
    key.push_str(operation);
    for part in parts {
        key.push(':');
        key.push_str(&part.len().to_string());
        key.push(':');
        key.push_str(part);
    }
    key
}
