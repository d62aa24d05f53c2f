use crate::shared_types::Address;

const WORD_BITS: u32 = u64::BITS;
/// 2^32 bits, one per address.
pub(crate) const WORD_COUNT: usize = 1 << 26;

/// Dense membership set over the whole IPv4 space.
///
/// Bits are only ever set, so any interleaving of inserts yields the same set.
/// The set has a single owner (the aggregator) and needs no locking.
pub(crate) struct AddressSet {
    words: Box<[u64]>,
}

impl AddressSet {
    pub(crate) fn new() -> Self {
        Self {
            words: vec![0u64; WORD_COUNT].into_boxed_slice(),
        }
    }

    #[inline(always)]
    pub(crate) fn insert(&mut self, address: Address) {
        let word = (address >> 6) as usize;
        let bit = address & (WORD_BITS - 1);
        self.words[word] |= 1u64 << bit;
    }

    pub(crate) fn extend(&mut self, batch: &[Address]) {
        for &address in batch {
            self.insert(address);
        }
    }

    pub(crate) fn contains(&self, address: Address) -> bool {
        let word = (address >> 6) as usize;
        let bit = address & (WORD_BITS - 1);
        self.words[word] & (1u64 << bit) != 0
    }

    pub(crate) fn count(&self) -> u64 {
        self.words.iter().map(|w| w.count_ones() as u64).sum()
    }
}

#[cfg(test)]
mod tests {
    use rand::seq::SliceRandom;
    use rand::Rng;

    use super::*;

    #[test]
    fn starts_empty() {
        let set = AddressSet::new();
        assert_eq!(set.count(), 0);
        assert!(!set.contains(0));
        assert!(!set.contains(u32::MAX));
    }

    #[test]
    fn repeated_inserts_count_once() {
        let mut set = AddressSet::new();
        for _ in 0..1000 {
            set.insert(0x0101_0101);
        }
        assert_eq!(set.count(), 1);
        assert!(set.contains(0x0101_0101));
    }

    #[test]
    fn both_ends_of_the_space() {
        let mut set = AddressSet::new();
        set.insert(0);
        set.insert(u32::MAX);
        assert_eq!(set.count(), 2);
        assert!(set.contains(0));
        assert!(set.contains(u32::MAX));
        assert!(!set.contains(1));
    }

    #[test]
    fn contiguous_range_counts_its_length() {
        let mut set = AddressSet::new();
        let (lo, hi) = (0x0A00_0000u32 - 17, 0x0A00_0000u32 + 100_003);
        for address in lo..hi {
            set.insert(address);
        }
        assert_eq!(set.count(), (hi - lo) as u64);
        assert!(!set.contains(lo - 1));
        assert!(!set.contains(hi));
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let mut rng = rand::rng();
        let mut addresses: Vec<u32> = (0..50_000).map(|_| rng.random_range(0..4096)).collect();

        let mut forward = AddressSet::new();
        forward.extend(&addresses);
        addresses.shuffle(&mut rng);
        let mut shuffled = AddressSet::new();
        shuffled.extend(&addresses);

        addresses.sort_unstable();
        addresses.dedup();
        assert_eq!(forward.count(), addresses.len() as u64);
        assert_eq!(shuffled.count(), forward.count());
    }
}
