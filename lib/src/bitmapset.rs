use bitvec::vec::BitVec;

/// An insertion-ordered set of (`usize`, T) pairs where keys are unique.
///
/// Each key can appear only once in the set. When a pair is inserted with a
/// key that already exists the insertion is a no-op, and the value that was
/// inserted first is kept. Iterating the set returns the pairs in insertion
/// order, which is how thread priority is tracked by the search engines.
///
/// Membership is checked with a bitmap that has one bit per possible key,
/// so keys should be small and dense (node identifiers or code locations).
/// The bitmap grows when needed.
#[derive(Debug, Default)]
pub(crate) struct BitmapSet<T>
where
    T: Copy,
{
    // Vector that contains the (key,value) pairs in the set, in insertion
    // order.
    items: Vec<(usize, T)>,
    // The N-th bit is set if the key N is in the set.
    bitmap: BitVec<usize>,
}

impl<T> BitmapSet<T>
where
    T: Copy,
{
    /// Creates a new set where keys are expected to be lower than
    /// `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self { items: Vec::new(), bitmap: BitVec::repeat(false, capacity) }
    }

    /// Adds a (key,value) pair to the set.
    ///
    /// Returns `true` if the key didn't exist in the set and the pair was
    /// added, and `false` if the key already existed.
    #[inline]
    pub fn insert(&mut self, key: usize, value: T) -> bool {
        if self.bitmap.len() <= key {
            self.bitmap.resize(key + 1, false);
        }
        if self.bitmap[key] {
            return false;
        }
        self.bitmap.set(key, true);
        self.items.push((key, value));
        true
    }

    /// Returns the value associated to `key`, if the key is in the set.
    pub fn get(&self, key: usize) -> Option<&T> {
        if !self.bitmap.get(key).is_some_and(|bit| *bit) {
            return None;
        }
        self.items.iter().find(|(k, _)| *k == key).map(|(_, value)| value)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Removes all values in the set.
    ///
    /// Only the bits corresponding to keys in the set are cleared, so the
    /// cost is proportional to the number of items, not to the size of the
    /// bitmap.
    #[inline]
    pub fn clear(&mut self) {
        for (key, _) in self.items.drain(0..) {
            self.bitmap.set(key, false);
        }
    }

    /// Returns an iterator for the items in the set.
    ///
    /// Items are returned in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &(usize, T)> {
        self.items.iter()
    }
}
