//! Edge Traits
//!
//! An edge's traits decide how pushed values accumulate between two
//! recomputations of its consumer, and when the accumulated payload is
//! cleared. Each hook receives the edge's payload slot.
//!
//! The default hooks overwrite on `update` and clear on `reset`;
//! `attached` and `consumed` both reset. [`Replace`] is exactly the
//! default. [`Append`] concatenates list payloads so that a producer may
//! push several times in one scheduling pass without losing anything, and
//! [`Merge`] folds incoming values with a closure.

use super::arena::NodeId;

/// Hooks controlling how an edge's payload evolves.
pub trait EdgeTraits<V> {
    /// Clear the payload.
    fn reset(&mut self, slot: &mut Option<V>) {
        *slot = None;
    }

    /// Fold an incoming value into the payload.
    fn update(&mut self, slot: &mut Option<V>, incoming: V) {
        *slot = Some(incoming);
    }

    /// The edge was created, optionally fed by `producer`.
    fn attached(&mut self, slot: &mut Option<V>, producer: Option<NodeId>) {
        let _ = producer;
        self.reset(slot);
    }

    /// The edge lost its producer.
    fn detached(&mut self, slot: &mut Option<V>) {
        let _ = slot;
    }

    /// The consumer finished with the payload.
    fn consumed(&mut self, slot: &mut Option<V>) {
        self.reset(slot);
    }
}

/// Keeps only the most recent value.
#[derive(Debug, Clone, Copy, Default)]
pub struct Replace;

impl<V> EdgeTraits<V> for Replace {}

/// Appends every pushed list to an accumulator.
#[derive(Debug, Clone, Copy, Default)]
pub struct Append;

impl<T> EdgeTraits<Vec<T>> for Append {
    fn update(&mut self, slot: &mut Option<Vec<T>>, incoming: Vec<T>) {
        match slot {
            Some(acc) => acc.extend(incoming),
            None => *slot = Some(incoming),
        }
    }
}

/// Folds incoming values into the payload with a closure.
///
/// The first value after a reset is stored as-is.
pub struct Merge<F> {
    fold: F,
}

impl<F> Merge<F> {
    pub fn new(fold: F) -> Self {
        Self { fold }
    }
}

impl<V, F> EdgeTraits<V> for Merge<F>
where
    F: FnMut(&mut V, V),
{
    fn update(&mut self, slot: &mut Option<V>, incoming: V) {
        match slot {
            Some(acc) => (self.fold)(acc, incoming),
            None => *slot = Some(incoming),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replace_overwrites_and_resets() {
        let mut traits = Replace;
        let mut slot = None;
        EdgeTraits::<i32>::update(&mut traits, &mut slot, 1);
        EdgeTraits::<i32>::update(&mut traits, &mut slot, 2);
        assert_eq!(slot, Some(2));
        EdgeTraits::<i32>::consumed(&mut traits, &mut slot);
        assert_eq!(slot, None);
    }

    #[test]
    fn append_accumulates_until_consumed() {
        let mut traits = Append;
        let mut slot = None;
        traits.update(&mut slot, vec![1, 2]);
        traits.update(&mut slot, vec![3]);
        assert_eq!(slot, Some(vec![1, 2, 3]));

        traits.consumed(&mut slot);
        assert_eq!(slot, None);
    }

    #[test]
    fn merge_folds_with_closure() {
        let mut traits = Merge::new(|acc: &mut u32, x: u32| *acc = (*acc).max(x));
        let mut slot = None;
        for x in [3, 9, 4] {
            traits.update(&mut slot, x);
        }
        assert_eq!(slot, Some(9));
    }

    #[test]
    fn detached_keeps_payload() {
        let mut traits = Append;
        let mut slot = Some(vec!['a']);
        traits.detached(&mut slot);
        assert_eq!(slot, Some(vec!['a']));
    }
}
