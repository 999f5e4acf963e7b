//! The [`InstanceSet`] bitset, used to track sealed instances.

/// A set of instance indices backed by a growable bitset.
///
/// Instances whose const attributes have been sealed are recorded here.
/// Iteration yields indices in ascending order.
#[derive(Clone, Debug, Default)]
pub struct InstanceSet {
    bits: Vec<u64>,
}

impl InstanceSet {
    const BITS_PER_WORD: usize = 64;

    /// Create an empty set.
    pub fn empty() -> Self {
        Self { bits: Vec::new() }
    }

    /// Insert an index. Returns `true` if it was not already present.
    pub fn insert(&mut self, index: usize) -> bool {
        let word = index / Self::BITS_PER_WORD;
        let bit = 1u64 << (index % Self::BITS_PER_WORD);
        if word >= self.bits.len() {
            self.bits.resize(word + 1, 0);
        }
        let fresh = self.bits[word] & bit == 0;
        self.bits[word] |= bit;
        fresh
    }

    /// Insert every index in `0..count`.
    pub fn insert_all(&mut self, count: usize) {
        let full = count / Self::BITS_PER_WORD;
        let rem = count % Self::BITS_PER_WORD;
        let words = full + usize::from(rem > 0);
        if words > self.bits.len() {
            self.bits.resize(words, 0);
        }
        for word in &mut self.bits[..full] {
            *word = u64::MAX;
        }
        if rem > 0 {
            self.bits[full] |= (1u64 << rem) - 1;
        }
    }

    /// Whether the set contains `index`.
    pub fn contains(&self, index: usize) -> bool {
        let word = index / Self::BITS_PER_WORD;
        let bit = index % Self::BITS_PER_WORD;
        word < self.bits.len() && (self.bits[word] & (1u64 << bit)) != 0
    }

    /// Remove every index.
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Number of indices in the set.
    pub fn len(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Iterate over indices in ascending order.
    pub fn iter(&self) -> InstanceSetIter<'_> {
        InstanceSetIter {
            bits: &self.bits,
            word_idx: 0,
            current: self.bits.first().copied().unwrap_or(0),
        }
    }
}

impl PartialEq for InstanceSet {
    fn eq(&self, other: &Self) -> bool {
        let max_len = self.bits.len().max(other.bits.len());
        (0..max_len).all(|i| {
            self.bits.get(i).copied().unwrap_or(0) == other.bits.get(i).copied().unwrap_or(0)
        })
    }
}

impl Eq for InstanceSet {}

impl FromIterator<usize> for InstanceSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = Self::empty();
        for index in iter {
            set.insert(index);
        }
        set
    }
}

impl<'a> IntoIterator for &'a InstanceSet {
    type Item = usize;
    type IntoIter = InstanceSetIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the indices of an [`InstanceSet`].
pub struct InstanceSetIter<'a> {
    bits: &'a [u64],
    word_idx: usize,
    current: u64,
}

impl Iterator for InstanceSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1;
                return Some(self.word_idx * InstanceSet::BITS_PER_WORD + bit);
            }
            self.word_idx += 1;
            self.current = *self.bits.get(self.word_idx)?;
        }
    }
}
