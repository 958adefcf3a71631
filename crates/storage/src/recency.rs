//! Ordered map whose iteration order is recency order.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Hash map threaded with a doubly linked list, oldest entry first.
///
/// Inserting an existing key or calling [`RecencyMap::touch`] moves the entry
/// to the most recent end, so `most_recent` is always the last entry touched.
/// Lookups, inserts, removals and both ends are O(1).
#[derive(Debug, Clone)]
pub struct RecencyMap<K, V> {
    index: HashMap<K, usize>,
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    oldest: Option<usize>,
    newest: Option<usize>,
}

impl<K, V> Default for RecencyMap<K, V> {
    fn default() -> Self {
        Self {
            index: HashMap::new(),
            slots: Vec::new(),
            free: Vec::new(),
            oldest: None,
            newest: None,
        }
    }
}

impl<K: Eq + Hash + Clone, V> RecencyMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        Some(&self.node(slot).value)
    }

    /// Upserts `key` and makes it the most recent entry. Returns the value it
    /// replaced, if any.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&slot) = self.index.get(&key) {
            let old = std::mem::replace(&mut self.node_mut(slot).value, value);
            self.move_to_newest(slot);
            return Some(old);
        }

        let node = Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.index.insert(key, slot);
        self.link_newest(slot);
        None
    }

    /// Marks `key` as most recently used. Returns false for unknown keys.
    pub fn touch<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index.get(key) {
            Some(&slot) => {
                self.move_to_newest(slot);
                true
            }
            None => false,
        }
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.index.remove(key)?;
        self.unlink(slot);
        let node = self.slots[slot].take()?;
        self.free.push(slot);
        Some(node.value)
    }

    pub fn most_recent(&self) -> Option<(&K, &V)> {
        self.newest.map(|slot| {
            let node = self.node(slot);
            (&node.key, &node.value)
        })
    }

    pub fn least_recent(&self) -> Option<(&K, &V)> {
        self.oldest.map(|slot| {
            let node = self.node(slot);
            (&node.key, &node.value)
        })
    }

    /// Oldest to newest; `.rev()` walks newest first.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            map: self,
            front: self.oldest,
            back: self.newest,
            remaining: self.len(),
        }
    }

    fn node(&self, slot: usize) -> &Node<K, V> {
        match self.slots[slot].as_ref() {
            Some(node) => node,
            None => unreachable!("recency slot {slot} is vacant"),
        }
    }

    fn node_mut(&mut self, slot: usize) -> &mut Node<K, V> {
        match self.slots[slot].as_mut() {
            Some(node) => node,
            None => unreachable!("recency slot {slot} is vacant"),
        }
    }

    fn move_to_newest(&mut self, slot: usize) {
        if self.newest == Some(slot) {
            return;
        }
        self.unlink(slot);
        self.link_newest(slot);
    }

    fn link_newest(&mut self, slot: usize) {
        let prev = self.newest;
        {
            let node = self.node_mut(slot);
            node.prev = prev;
            node.next = None;
        }
        match prev {
            Some(prev) => self.node_mut(prev).next = Some(slot),
            None => self.oldest = Some(slot),
        }
        self.newest = Some(slot);
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = {
            let node = self.node(slot);
            (node.prev, node.next)
        };
        match prev {
            Some(prev) => self.node_mut(prev).next = next,
            None => self.oldest = next,
        }
        match next {
            Some(next) => self.node_mut(next).prev = prev,
            None => self.newest = prev,
        }
        let node = self.node_mut(slot);
        node.prev = None;
        node.next = None;
    }
}

pub struct Iter<'a, K, V> {
    map: &'a RecencyMap<K, V>,
    front: Option<usize>,
    back: Option<usize>,
    remaining: usize,
}

impl<'a, K: Eq + Hash + Clone, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.map.node(self.front?);
        self.front = node.next;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Eq + Hash + Clone, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let node = self.map.node(self.back?);
        self.back = node.prev;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }
}

impl<K: Eq + Hash + Clone, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<'a, K: Eq + Hash + Clone, V> IntoIterator for &'a RecencyMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Eq + Hash + Clone, V> FromIterator<(K, V)> for RecencyMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Eq + Hash + Clone, V> Extend<(K, V)> for RecencyMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

/// Equal when both hold the same entries in the same order.
impl<K: Eq + Hash + Clone, V: PartialEq> PartialEq for RecencyMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq + Hash + Clone, V: Eq> Eq for RecencyMap<K, V> {}

impl<K, V> Serialize for RecencyMap<K, V>
where
    K: Eq + Hash + Clone + Serialize,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

// Entries are replayed through `insert`, so a repeated key ends up with its
// last value in the most recent position.
impl<'de, K, V> Deserialize<'de> for RecencyMap<K, V>
where
    K: Eq + Hash + Clone + Deserialize<'de>,
    V: Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecencyVisitor<K, V>(PhantomData<(K, V)>);

        impl<'de, K, V> Visitor<'de> for RecencyVisitor<K, V>
        where
            K: Eq + Hash + Clone + Deserialize<'de>,
            V: Deserialize<'de>,
        {
            type Value = RecencyMap<K, V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = RecencyMap::new();
                while let Some((key, value)) = access.next_entry()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(RecencyVisitor(PhantomData))
    }
}
