//! Ordered map type for map and markup attribute values.
//!
//! [`ValueMap`] wraps an [`IndexMap`] so that a value built from events and
//! emitted again produces its entries in the order they were received.
//!
//! ## Examples
//!
//! ```rust
//! use concise_encoding::{Key, Value, ValueMap};
//!
//! let mut map = ValueMap::new();
//! map.insert(Key::from("name"), Value::from("Alice"));
//! map.insert(Key::from(1u64), Value::from(30));
//!
//! assert_eq!(map.len(), 2);
//! assert_eq!(map.get(&Key::from("name")).and_then(|v| v.as_str()), Some("Alice"));
//! ```

use crate::{Key, Value};
use indexmap::IndexMap;

/// An insertion-ordered map of keyable values to values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValueMap(IndexMap<Key, Value>);

impl ValueMap {
    #[must_use]
    pub fn new() -> Self {
        ValueMap(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        ValueMap(IndexMap::with_capacity(capacity))
    }

    /// Inserts a key-value pair, returning the previous value for the key.
    ///
    /// A replaced key keeps its original position.
    pub fn insert(&mut self, key: Key, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &Key) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        self.0.contains_key(key)
    }

    /// Removes a key, shifting later entries down to preserve order.
    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the keys of the map, in insertion order.
    pub fn keys(&self) -> indexmap::map::Keys<'_, Key, Value> {
        self.0.keys()
    }

    /// Returns an iterator over the values of the map, in insertion order.
    pub fn values(&self) -> indexmap::map::Values<'_, Key, Value> {
        self.0.values()
    }

    /// Returns an iterator over the key-value pairs of the map, in insertion order.
    pub fn iter(&self) -> indexmap::map::Iter<'_, Key, Value> {
        self.0.iter()
    }
}

impl IntoIterator for ValueMap {
    type Item = (Key, Value);
    type IntoIter = indexmap::map::IntoIter<Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValueMap {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Key, Value)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (Key, Value)>>(iter: T) -> Self {
        ValueMap(IndexMap::from_iter(iter))
    }
}

impl<const N: usize> From<[(Key, Value); N]> for ValueMap {
    fn from(entries: [(Key, Value); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insertion_order_preserved() {
        let mut map = ValueMap::new();
        map.insert(Key::from("z"), Value::from(1));
        map.insert(Key::from("a"), Value::from(2));
        map.insert(Key::from(5u64), Value::from(3));
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![Key::from("z"), Key::from("a"), Key::from(5u64)]);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut map = ValueMap::from([
            (Key::from("a"), Value::from(1)),
            (Key::from("b"), Value::from(2)),
        ]);
        assert_eq!(map.insert(Key::from("a"), Value::from(9)), Some(Value::from(1)));
        assert_eq!(map.iter().next(), Some((&Key::from("a"), &Value::from(9))));
    }

    #[test]
    fn test_remove_shifts() {
        let mut map: ValueMap = (0..4u64).map(|i| (Key::from(i), Value::from(i))).collect();
        map.remove(&Key::from(1u64));
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec![Key::from(0u64), Key::from(2u64), Key::from(3u64)]);
    }
}
