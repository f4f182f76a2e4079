use super::*;

// ============================================================================
// Basic allocation tests
// ============================================================================

#[test]
fn test_new_is_empty() {
    let pool: Pool<u32> = Pool::new();
    assert!(pool.is_empty());
    assert_eq!(pool.len(), 0);
    assert_eq!(pool.capacity(), 0);
}

#[test]
fn test_get_after_malloc_succeeds() {
    let mut pool = Pool::new();
    let h = pool.malloc(42u32);
    assert_eq!(pool.get(h), Some(&42));
    assert!(pool.contains(h));
}

#[test]
fn test_fresh_slots_start_at_generation_one() {
    let mut pool = Pool::new();
    let a = pool.malloc("a");
    let b = pool.malloc("b");
    assert_eq!(a.generation(), 1);
    assert_eq!(b.generation(), 1);
    assert_eq!(a.index(), 0);
    assert_eq!(b.index(), 1);
}

#[test]
fn test_get_mut_mutates_in_place() {
    let mut pool = Pool::new();
    let h = pool.malloc(10u32);
    *pool.get_mut(h).unwrap() += 5;
    assert_eq!(pool.get(h), Some(&15));
}

// ============================================================================
// Free and generation tests
// ============================================================================

#[test]
fn test_get_after_free_fails() {
    let mut pool = Pool::new();
    let h = pool.malloc(7u32);
    assert!(pool.free(h));
    assert_eq!(pool.get(h), None);
    assert!(!pool.contains(h));
}

#[test]
fn test_free_is_idempotent_on_stale_handles() {
    let mut pool = Pool::new();
    let h = pool.malloc(7u32);
    assert!(pool.free(h));
    // Second free of the same handle is a no-op
    assert!(!pool.free(h));
    assert_eq!(pool.len(), 0);
}

#[test]
fn test_stale_handle_misses_after_index_reuse() {
    let mut pool = Pool::new();
    let old = pool.malloc(1u32);
    pool.free(old);

    // Reuses index 0 with a bumped generation
    let new = pool.malloc(2u32);
    assert_eq!(new.index(), old.index());
    assert!(new.generation() > old.generation());

    // The old handle must keep missing even though the slot is live again
    assert_eq!(pool.get(old), None);
    assert_eq!(pool.get(new), Some(&2));
}

#[test]
fn test_generation_strictly_increases_across_free_cycles() {
    let mut pool = Pool::new();
    let mut prev = pool.malloc(0u32);
    for i in 1..10u32 {
        pool.free(prev);
        let next = pool.malloc(i);
        assert_eq!(next.index(), prev.index());
        assert!(next.generation() > prev.generation());
        prev = next;
    }
}

#[test]
fn test_out_of_bounds_index_misses() {
    let pool: Pool<u32> = Pool::new();
    let bogus = Handle::from_packed((1u32 << 24) | 12345);
    assert_eq!(pool.get(bogus), None);
}

// ============================================================================
// Recycling and iteration tests
// ============================================================================

#[test]
fn test_free_list_is_lifo() {
    let mut pool = Pool::new();
    let a = pool.malloc(0u32); // index 0
    let _b = pool.malloc(1u32); // index 1
    let c = pool.malloc(2u32); // index 2
    pool.free(a); // free list: [0]
    pool.free(c); // free list: [0, 2]

    // Next malloc pops from the end → index 2 first, then 0
    assert_eq!(pool.malloc(20u32).index(), 2);
    assert_eq!(pool.malloc(10u32).index(), 0);
    // Free list exhausted, next is fresh
    assert_eq!(pool.malloc(30u32).index(), 3);
}

#[test]
fn test_capacity_never_decreases() {
    let mut pool = Pool::new();
    let handles: Vec<Handle> = (0..100u32).map(|i| pool.malloc(i)).collect();
    assert_eq!(pool.capacity(), 100);

    for &h in &handles {
        pool.free(h);
    }
    assert_eq!(pool.capacity(), 100);
    assert_eq!(pool.len(), 0);

    // Recycled allocations don't grow the backing storage
    for i in 0..100u32 {
        pool.malloc(i);
    }
    assert_eq!(pool.capacity(), 100);
}

#[test]
fn test_iter_yields_only_active_slots() {
    let mut pool = Pool::new();
    let a = pool.malloc(1u32);
    let b = pool.malloc(2u32);
    let c = pool.malloc(3u32);
    pool.free(b);

    let mut items: Vec<u32> = pool.iter().map(|(_, item)| *item).collect();
    items.sort();
    assert_eq!(items, vec![1, 3]);

    let handles: Vec<Handle> = pool.handles().collect();
    assert!(handles.contains(&a));
    assert!(!handles.contains(&b));
    assert!(handles.contains(&c));
}

#[test]
fn test_clear_invalidates_all_handles() {
    let mut pool = Pool::new();
    let handles: Vec<Handle> = (0..10u32).map(|i| pool.malloc(i)).collect();
    pool.clear();
    assert!(pool.is_empty());
    for h in handles {
        assert_eq!(pool.get(h), None);
    }
}

// ============================================================================
// Handle packing tests
// ============================================================================

#[test]
fn test_handle_packs_and_unpacks() {
    let mut pool = Pool::new();
    pool.malloc(0u32);
    let h = {
        let first = pool.handles().next().unwrap();
        pool.free(first);
        pool.malloc(1u32)
    };
    let roundtrip = Handle::from_packed(h.packed());
    assert_eq!(roundtrip, h);
    assert_eq!(pool.get(roundtrip), Some(&1));
}
