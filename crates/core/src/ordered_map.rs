//! Insertion-ordered associative container.
//!
//! Keys map to a dense index into a backing vector. Inserting an existing
//! key overwrites its slot in place; erasing shifts every later entry down
//! by one and re-indexes it, so iteration always follows insertion order.

use crate::error::DeckError;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct OrderedMap<K, V> {
    index: HashMap<K, usize>,
    entries: Vec<(K, V)>,
}

impl<K, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        OrderedMap {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }
}

impl<K: Hash + Eq + Clone, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite. An existing key keeps its position; the old
    /// value is returned.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, value)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key) {
            Some(&pos) => Some(&mut self.entries[pos].1),
            None => None,
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Position of `key` in insertion order.
    pub fn position<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(key).copied()
    }

    /// Remove `key`, returning the number of removed entries (0 or 1).
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(pos) = self.index.remove(key) else {
            return 0;
        };
        self.entries.remove(pos);
        for slot in self.index.values_mut() {
            if *slot > pos {
                *slot -= 1;
            }
        }
        1
    }

    /// Positional access in insertion order.
    pub fn iget(&self, index: usize) -> Result<(&K, &V), DeckError> {
        self.entries
            .get(index)
            .map(|(k, v)| (k, v))
            .ok_or(DeckError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
    }

    pub fn at_index(&self, index: usize) -> Result<&V, DeckError> {
        self.iget(index).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&K, &mut V)> {
        self.entries.iter_mut().map(|(k, v)| (&*k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries.iter().map(|(_, v)| v)
    }
}

impl<V> OrderedMap<String, V> {
    /// Lookup that fails with a "did you mean" hint computed by a
    /// case-insensitive substring match over the existing keys.
    pub fn at(&self, key: &str) -> Result<&V, DeckError> {
        self.get(key).ok_or_else(|| DeckError::KeyNotFound {
            key: key.to_owned(),
            suggestion: self.suggest(key),
        })
    }

    fn suggest(&self, key: &str) -> Option<String> {
        let needle = key.to_ascii_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.keys()
            .find(|k| {
                let hay = k.to_ascii_lowercase();
                hay.contains(&needle) || needle.contains(&hay)
            })
            .cloned()
    }
}

impl<K: Hash + Eq, V: PartialEq> PartialEq for OrderedMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.entries == other.entries
    }
}

impl<K: Hash + Eq + Clone, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K: Serialize, V: Serialize> Serialize for OrderedMap<K, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(map: &OrderedMap<String, i32>) -> Vec<&str> {
        map.keys().map(String::as_str).collect()
    }

    #[test]
    fn insert_keeps_first_position_on_overwrite() {
        let mut map = OrderedMap::new();
        map.insert("C".to_string(), 1);
        map.insert("A".to_string(), 2);
        map.insert("B".to_string(), 3);
        assert_eq!(map.insert("A".to_string(), 20), Some(2));
        assert_eq!(keys(&map), vec!["C", "A", "B"]);
        assert_eq!(map.get("A"), Some(&20));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn erase_reindexes_later_entries() {
        let mut map: OrderedMap<String, i32> =
            [("A", 1), ("B", 2), ("C", 3), ("D", 4)]
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect();
        assert_eq!(map.erase("B"), 1);
        assert_eq!(map.erase("B"), 0);
        assert_eq!(keys(&map), vec!["A", "C", "D"]);
        assert_eq!(map.position("C"), Some(1));
        assert_eq!(map.position("D"), Some(2));
        assert_eq!(map.iget(2).unwrap(), (&"D".to_string(), &4));
        assert_eq!(map.get("D"), Some(&4));
    }

    #[test]
    fn reinsert_after_erase_goes_to_the_end() {
        let mut map = OrderedMap::new();
        map.insert("A".to_string(), 1);
        map.insert("B".to_string(), 2);
        map.erase("A");
        map.insert("A".to_string(), 3);
        assert_eq!(keys(&map), vec!["B", "A"]);
    }

    #[test]
    fn positional_access_out_of_range() {
        let mut map = OrderedMap::new();
        map.insert("A".to_string(), 1);
        assert_eq!(
            map.iget(1).unwrap_err(),
            DeckError::IndexOutOfRange { index: 1, len: 1 }
        );
        assert_eq!(map.at_index(0).unwrap(), &1);
    }

    #[test]
    fn missing_key_suggests_case_insensitive_substring() {
        let mut map = OrderedMap::new();
        map.insert("WCONPROD".to_string(), 1);
        map.insert("WELSPECS".to_string(), 2);
        match map.at("conprod") {
            Err(DeckError::KeyNotFound { key, suggestion }) => {
                assert_eq!(key, "conprod");
                assert_eq!(suggestion.as_deref(), Some("WCONPROD"));
            }
            other => panic!("expected KeyNotFound, got {:?}", other),
        }
        match map.at("GRUPTREE") {
            Err(DeckError::KeyNotFound { suggestion, .. }) => assert!(suggestion.is_none()),
            other => panic!("expected KeyNotFound, got {:?}", other),
        }
    }

    #[test]
    fn equality_is_order_sensitive() {
        let mut a = OrderedMap::new();
        a.insert("X".to_string(), 1);
        a.insert("Y".to_string(), 2);
        let mut b = OrderedMap::new();
        b.insert("Y".to_string(), 2);
        b.insert("X".to_string(), 1);
        assert_ne!(a, b);
        b.erase("Y");
        b.insert("Y".to_string(), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn serializes_in_insertion_order() {
        let mut map = OrderedMap::new();
        map.insert("Z".to_string(), 1);
        map.insert("A".to_string(), 2);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"Z":1,"A":2}"#);
    }
}
