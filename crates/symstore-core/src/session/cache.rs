//! Bounded address-to-symbol cache.
//!
//! Stepping asks "which function contains this address" for nearly every
//! instruction, and the answer rarely changes. The cache keeps recent answers
//! in a fixed number of buckets. When it is full, a pseudo-random bucket
//! loses its last entry: eviction has no recency ordering, and a miss only
//! costs a lookup in the store.

use tracing::trace;

use crate::types::SymbolHeapId;

/// Default total number of cached lookups.
pub const DEFAULT_ADDRESS_CACHE_CAPACITY: usize = 16384;
/// Default number of buckets the entries are spread over.
pub const DEFAULT_ADDRESS_CACHE_BUCKETS: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey
{
    heap: SymbolHeapId,
    segment: u16,
    offset: u32,
}

impl CacheKey
{
    fn bucket(&self, buckets: usize) -> usize
    {
        let mixed = ((u64::from(self.segment) << 32) | u64::from(self.offset)) ^ ((self.heap.index() as u64) << 48);
        (mixed.wrapping_mul(0x9e37_79b9_7f4a_7c15) >> 32) as usize % buckets
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<H>
{
    key: CacheKey,
    handle: H,
    symbol_offset: u32,
}

/// Cache of `(heap, segment, offset)` to `(symbol, offset within symbol)`.
#[derive(Debug)]
pub struct AddressCache<H>
{
    buckets: Vec<Vec<CacheEntry<H>>>,
    capacity: usize,
    len: usize,
    rng: u64,
}

impl<H: Copy> AddressCache<H>
{
    pub fn new(capacity: usize, buckets: usize) -> Self
    {
        let buckets = buckets.max(1);
        Self {
            buckets: (0..buckets).map(|_| Vec::new()).collect(),
            capacity: capacity.max(1),
            len: 0,
            rng: 0x2545_f491_4f6c_dd1d,
        }
    }

    pub fn len(&self) -> usize
    {
        self.len
    }

    pub fn is_empty(&self) -> bool
    {
        self.len == 0
    }

    pub fn get(&self, heap: SymbolHeapId, segment: u16, offset: u32) -> Option<(H, u32)>
    {
        let key = CacheKey { heap, segment, offset };
        let found = self.buckets[key.bucket(self.buckets.len())]
            .iter()
            .find(|entry| entry.key == key)
            .map(|entry| (entry.handle, entry.symbol_offset));

        match found {
            Some(_) => trace!(%heap, segment, offset, "address cache hit"),
            None => trace!(%heap, segment, offset, "address cache miss"),
        }
        found
    }

    pub fn insert(&mut self, heap: SymbolHeapId, segment: u16, offset: u32, handle: H, symbol_offset: u32)
    {
        let key = CacheKey { heap, segment, offset };
        let z = key.bucket(self.buckets.len());

        if let Some(entry) = self.buckets[z].iter_mut().find(|entry| entry.key == key) {
            entry.handle = handle;
            entry.symbol_offset = symbol_offset;
            return;
        }

        if self.len >= self.capacity {
            self.evict();
        }

        self.buckets[z].push(CacheEntry {
            key,
            handle,
            symbol_offset,
        });
        self.len += 1;
    }

    pub fn clear(&mut self)
    {
        self.buckets.iter_mut().for_each(Vec::clear);
        self.len = 0;
    }

    /// Drop the last entry of a pseudo-random non-empty bucket.
    fn evict(&mut self)
    {
        let count = self.buckets.len();
        let start = (self.next_random() % count as u64) as usize;

        for step in 0..count {
            let z = (start + step) % count;
            if self.buckets[z].pop().is_some() {
                self.len -= 1;
                trace!(bucket = z, "address cache eviction");
                return;
            }
        }
    }

    fn next_random(&mut self) -> u64
    {
        // xorshift64
        let mut x = self.rng;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.rng = x;
        x
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_hit_after_insert()
    {
        let mut cache = AddressCache::new(8, 4);
        cache.insert(SymbolHeapId::Global, 1, 0x110, 7u32, 0x10);

        assert_eq!(cache.get(SymbolHeapId::Global, 1, 0x110), Some((7, 0x10)));
        assert_eq!(cache.get(SymbolHeapId::Static, 1, 0x110), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_capacity_is_never_exceeded()
    {
        let mut cache = AddressCache::new(16, 4);
        for offset in 0..200u32 {
            cache.insert(SymbolHeapId::Global, 1, offset, offset, 0);
            assert!(cache.len() <= 16);
        }
        assert_eq!(cache.len(), 16);
    }

    #[test]
    fn test_eviction_keeps_other_entries_intact()
    {
        let mut cache = AddressCache::new(4, 2);
        for offset in 0..10u32 {
            cache.insert(SymbolHeapId::Public, 2, offset, offset + 100, offset);
        }

        // whatever survived still maps to its own answer
        for offset in 0..10u32 {
            if let Some((handle, symbol_offset)) = cache.get(SymbolHeapId::Public, 2, offset) {
                assert_eq!(handle, offset + 100);
                assert_eq!(symbol_offset, offset);
            }
        }
    }

    #[test]
    fn test_reinsert_updates_in_place()
    {
        let mut cache = AddressCache::new(4, 2);
        cache.insert(SymbolHeapId::Global, 1, 0, 1u32, 0);
        cache.insert(SymbolHeapId::Global, 1, 0, 2u32, 4);

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(SymbolHeapId::Global, 1, 0), Some((2, 4)));
    }
}
