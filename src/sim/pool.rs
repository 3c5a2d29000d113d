//! Fixed-capacity object pool
//!
//! Slots are allocated once at construction. `acquire` takes a free slot or
//! recycles the oldest active one, so a warmed-up pool never rejects a request
//! and never grows.

use std::collections::VecDeque;

/// An entry that lives in a [`Pool`] and expires on its own timer
pub trait Pooled: Default {
    /// Advance the entry by `dt` seconds. Returns `false` once expired.
    fn advance(&mut self, dt: f32) -> bool;
}

/// Borrowed handle to a pool slot (stable slot index)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PoolHandle(usize);

impl PoolHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct Pool<T> {
    slots: Vec<T>,
    /// Active slot indices, oldest first
    active: VecDeque<usize>,
    free: Vec<usize>,
}

impl<T: Pooled> Pool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| T::default()).collect(),
            active: VecDeque::with_capacity(capacity),
            // Reversed so slot 0 is handed out first
            free: (0..capacity).rev().collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Place `item` in a slot, evicting the oldest active entry if none are free.
    ///
    /// Only returns `None` for a zero-capacity pool.
    pub fn acquire(&mut self, item: T) -> Option<PoolHandle> {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => self.active.pop_front()?,
        };
        self.slots[slot] = item;
        self.active.push_back(slot);
        Some(PoolHandle(slot))
    }

    /// Entry behind `handle`, if that slot is still active
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.active
            .contains(&handle.0)
            .then(|| &self.slots[handle.0])
    }

    pub fn is_active(&self, handle: PoolHandle) -> bool {
        self.active.contains(&handle.0)
    }

    /// Advance every active entry and return expired ones to the free list
    pub fn update(&mut self, dt: f32) {
        let slots = &mut self.slots;
        let free = &mut self.free;
        self.active.retain(|&slot| {
            let alive = slots[slot].advance(dt);
            if !alive {
                free.push(slot);
            }
            alive
        });
    }

    /// Force-expire every active entry without finishing its animation
    pub fn reset(&mut self) {
        self.free.extend(self.active.drain(..));
    }

    /// Active entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.active
            .iter()
            .map(move |&slot| (PoolHandle(slot), &self.slots[slot]))
    }

    /// Mutate every active entry in place (used by world re-centering)
    pub fn for_each_active_mut(&mut self, mut f: impl FnMut(&mut T)) {
        for &slot in &self.active {
            f(&mut self.slots[slot]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Default, Clone)]
    struct Blip {
        tag: u32,
        ttl: f32,
    }

    impl Pooled for Blip {
        fn advance(&mut self, dt: f32) -> bool {
            self.ttl -= dt;
            self.ttl > 0.0
        }
    }

    #[test]
    fn test_acquire_recycles_oldest() {
        let mut pool = Pool::new(2);
        let a = pool.acquire(Blip { tag: 1, ttl: 1.0 }).unwrap();
        let _b = pool.acquire(Blip { tag: 2, ttl: 1.0 }).unwrap();
        let c = pool.acquire(Blip { tag: 3, ttl: 1.0 }).unwrap();

        // The third request reuses the first slot
        assert_eq!(a, c);
        assert_eq!(pool.get(c).unwrap().tag, 3);
        assert_eq!(pool.active_len(), 2);
        assert_eq!(pool.free_len(), 0);
    }

    #[test]
    fn test_update_expires_entries() {
        let mut pool = Pool::new(4);
        let short = pool.acquire(Blip { tag: 1, ttl: 0.1 }).unwrap();
        let long = pool.acquire(Blip { tag: 2, ttl: 1.0 }).unwrap();
        pool.update(0.2);

        assert!(!pool.is_active(short));
        assert!(pool.is_active(long));
        assert_eq!(pool.active_len() + pool.free_len(), 4);
    }

    #[test]
    fn test_reset_returns_all_slots() {
        let mut pool = Pool::new(3);
        for i in 0..5 {
            pool.acquire(Blip { tag: i, ttl: 10.0 });
        }
        pool.reset();
        assert_eq!(pool.active_len(), 0);
        assert_eq!(pool.free_len(), 3);
    }

    #[test]
    fn test_zero_capacity_rejects() {
        let mut pool: Pool<Blip> = Pool::new(0);
        assert!(pool.acquire(Blip::default()).is_none());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Acquire(f32),
        Update(f32),
        Reset,
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0.01f32..2.0).prop_map(Op::Acquire),
            2 => (0.0f32..1.0).prop_map(Op::Update),
            1 => Just(Op::Reset),
        ]
    }

    proptest! {
        #[test]
        fn prop_capacity_invariant(
            capacity in 1usize..16,
            ops in prop::collection::vec(op_strategy(), 0..64),
        ) {
            let mut pool = Pool::new(capacity);
            for (i, op) in ops.into_iter().enumerate() {
                match op {
                    Op::Acquire(ttl) => {
                        let before: Vec<_> = pool.iter().map(|(h, _)| h).collect();
                        let handle = pool.acquire(Blip { tag: i as u32, ttl }).unwrap();
                        // A fresh handle is never one still held by another live entry
                        if before.len() < capacity {
                            prop_assert!(!before.contains(&handle));
                        }
                        let held = pool.iter().filter(|(h, _)| *h == handle).count();
                        prop_assert_eq!(held, 1);
                    }
                    Op::Update(dt) => pool.update(dt),
                    Op::Reset => pool.reset(),
                }
                prop_assert_eq!(pool.active_len() + pool.free_len(), capacity);
            }
        }
    }
}
