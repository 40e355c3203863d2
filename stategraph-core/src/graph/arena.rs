//! Typed handles and the slot arena that owns node and edge records.
//!
//! Producer/consumer links are stored as handles into these arenas rather
//! than as references, so the whole graph is a single owned value.

use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;

/// Conversion between a typed handle and its slot index.
pub trait Handle: Copy {
    fn from_index(index: usize) -> Self;
    fn index(self) -> usize;
}

/// Identifier of a node in a [`Graph`](super::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NodeId(u32);

/// Identifier of an edge in a [`Graph`](super::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct EdgeId(u32);

macro_rules! impl_handle {
    ($ty:ident, $prefix:literal) => {
        impl $ty {
            /// Get the raw index value.
            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl Handle for $ty {
            fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).expect("arena exceeded u32::MAX slots"))
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

impl_handle!(NodeId, "n");
impl_handle!(EdgeId, "e");

/// A vector of optional slots addressed by typed handles.
///
/// Removed slots stay empty; handles are never reused, so a stale handle
/// can be detected instead of silently aliasing a newer record.
pub(crate) struct Arena<K, V> {
    slots: Vec<Option<V>>,
    live: usize,
    key_type: PhantomData<K>,
}

impl<K, V> Default for Arena<K, V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            key_type: PhantomData,
        }
    }
}

impl<K: Handle, V> Arena<K, V> {
    pub fn push(&mut self, val: V) -> K {
        let id = K::from_index(self.slots.len());
        self.slots.push(Some(val));
        self.live += 1;
        id
    }

    pub fn get(&self, k: K) -> Option<&V> {
        self.slots.get(k.index()).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, k: K) -> Option<&mut V> {
        self.slots.get_mut(k.index()).and_then(Option::as_mut)
    }

    pub fn remove(&mut self, k: K) -> Option<V> {
        let removed = self.slots.get_mut(k.index()).and_then(Option::take);
        if removed.is_some() {
            self.live -= 1;
        }
        removed
    }

    pub fn contains(&self, k: K) -> bool {
        self.get(k).is_some()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &V)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (K::from_index(i), v)))
    }
}

impl<K: Handle + fmt::Display, V> std::ops::Index<K> for Arena<K, V> {
    type Output = V;

    fn index(&self, k: K) -> &V {
        match self.get(k) {
            Some(v) => v,
            None => panic!("use of removed or foreign handle {}", k),
        }
    }
}

impl<K: Handle + fmt::Display, V> std::ops::IndexMut<K> for Arena<K, V> {
    fn index_mut(&mut self, k: K) -> &mut V {
        match self.get_mut(k) {
            Some(v) => v,
            None => panic!("use of removed or foreign handle {}", k),
        }
    }
}
