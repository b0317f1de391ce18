use cozy_chess::Move;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    Exact,
    Lower,
    Upper,
}

#[derive(Clone, Copy, Debug)]
pub struct Entry {
    pub key: u64,
    pub depth: u32,
    pub score: i32,
    pub best: Option<Move>,
    pub bound: Bound,
    pub gen: u32,
}

const WAYS: usize = 4;
const BYTES_PER_ENTRY: usize = 64;

#[derive(Default)]
struct Bucket {
    slots: [Option<Entry>; WAYS],
}

/// Bucketed transposition table shared by every search worker.
///
/// Each bucket has its own lock; workers never hold more than one at a time.
pub struct Tt {
    buckets: Vec<Mutex<Bucket>>,
    gen: AtomicU32,
}

impl Default for Tt {
    fn default() -> Self { Self::with_capacity_mb(16) }
}

impl Tt {
    pub fn with_capacity_entries(cap: usize) -> Self {
        let entries = cap.max(WAYS);
        let n = (entries + WAYS - 1) / WAYS;
        let mut buckets = Vec::with_capacity(n);
        buckets.resize_with(n, || Mutex::new(Bucket::default()));
        Self { buckets, gen: AtomicU32::new(0) }
    }

    pub fn with_capacity_mb(mb: usize) -> Self {
        Self::with_capacity_entries(mb.max(1).saturating_mul(1024 * 1024) / BYTES_PER_ENTRY)
    }

    /// Forget everything; invoked on `ucinewgame` and when cached scores go stale.
    pub fn clear(&self) {
        for b in &self.buckets { *b.lock() = Bucket::default(); }
        self.gen.store(0, Ordering::Relaxed);
    }

    pub fn capacity(&self) -> usize { self.buckets.len() * WAYS }

    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.lock().slots.iter().filter(|s| s.is_some()).count()).sum()
    }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    fn bucket(&self, key: u64) -> &Mutex<Bucket> {
        let mixed = key ^ (key >> 32);
        &self.buckets[(mixed as usize) % self.buckets.len()]
    }

    pub fn get(&self, key: u64) -> Option<Entry> {
        let g = self.bucket(key).lock();
        g.slots.iter().flatten().find(|e| e.key == key).copied()
    }

    pub fn put(&self, mut e: Entry) {
        e.gen = self.gen.load(Ordering::Relaxed);
        let mut g = self.bucket(e.key).lock();
        for slot in g.slots.iter_mut() {
            if let Some(cur) = *slot {
                if cur.key == e.key {
                    if e.depth >= cur.depth || e.bound == Bound::Exact { *slot = Some(e); }
                    return;
                }
            }
        }
        if let Some(slot) = g.slots.iter_mut().find(|s| s.is_none()) {
            *slot = Some(e);
            return;
        }
        // Evict the shallowest entry, oldest generation first on ties.
        let victim = g
            .slots
            .iter()
            .enumerate()
            .min_by_key(|(_, s)| s.map(|c| (c.depth, c.gen)).unwrap_or((0, 0)))
            .map(|(i, _)| i)
            .unwrap_or(0);
        g.slots[victim] = Some(e);
    }

    pub fn bump_generation(&self) { self.gen.fetch_add(1, Ordering::Relaxed); }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: u64, depth: u32) -> Entry {
        Entry { key, depth, score: 0, best: None, bound: Bound::Lower, gen: 0 }
    }

    #[test]
    fn deep_entry_survives_eviction() {
        let tt = Tt::with_capacity_entries(4);
        tt.put(entry(1, 6));
        for k in 2..10 { tt.put(entry(k, 1)); }
        assert!(tt.get(1).is_some(), "deep entry evicted unexpectedly");
        assert!(tt.len() <= tt.capacity());
    }

    #[test]
    fn clear_empties_table() {
        let tt = Tt::with_capacity_entries(64);
        for k in 0..16 { tt.put(entry(k, 2)); }
        assert!(!tt.is_empty());
        tt.clear();
        assert!(tt.is_empty());
    }
}
