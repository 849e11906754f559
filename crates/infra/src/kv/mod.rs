//! Process-local key/value state shared by the demo endpoints.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// String-keyed store abstraction; injected, never global.
pub trait KeyValueStore<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;
    /// Insert or replace, returning the previous value.
    fn put(&self, key: &str, value: V) -> Option<V>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V, S> KeyValueStore<V> for Arc<S>
where
    S: KeyValueStore<V> + ?Sized,
{
    fn get(&self, key: &str) -> Option<V> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: V) -> Option<V> {
        (**self).put(key, value)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}

#[derive(Debug)]
pub struct InMemoryKeyValueStore<V> {
    inner: RwLock<HashMap<String, V>>,
}

impl<V> InMemoryKeyValueStore<V> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }
}

impl<V> Default for InMemoryKeyValueStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> KeyValueStore<V> for InMemoryKeyValueStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Option<V> {
        let map = self.inner.read().ok()?;
        map.get(key).cloned()
    }

    fn put(&self, key: &str, value: V) -> Option<V> {
        match self.inner.write() {
            Ok(mut map) => map.insert(key.to_string(), value),
            Err(_) => {
                tracing::warn!(key, "key/value store lock poisoned; write dropped");
                None
            }
        }
    }

    fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }
}
