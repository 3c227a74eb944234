// Integration tests for the cuckoo cache with the real evaluation entry
// types.

use tamarin_core::{CacheEntry, EtEntry, HashTable, NodeType, PtEntry};

#[test]
fn evaluation_entries_round_trip() {
    let cache: HashTable<EtEntry> = HashTable::new(1 << 16).unwrap();
    let entry = EtEntry {
        key: 0xABCD_EF01_2345_6789,
        score: -321,
        node_type: NodeType::Exact,
        generation: 3,
    };
    assert!(cache.insert(entry));
    assert_eq!(cache.look_up(entry.key), Some(entry));
}

#[test]
fn newer_generation_replaces_same_key() {
    let cache: HashTable<EtEntry> = HashTable::new(1 << 16).unwrap();
    let old = EtEntry {
        key: 99,
        score: 10,
        node_type: NodeType::Exact,
        generation: 1,
    };
    let new = EtEntry {
        score: 20,
        generation: 2,
        ..old
    };
    assert!(cache.insert(old));
    assert!(cache.insert(new));
    assert_eq!(cache.look_up(99).unwrap().score, 20);

    // A stale write-back loses.
    assert!(!cache.insert(old));
    assert_eq!(cache.look_up(99).unwrap().score, 20);
}

#[test]
fn exact_bound_preferred_within_a_generation() {
    let cache: HashTable<EtEntry> = HashTable::new(1 << 16).unwrap();
    let bound = EtEntry {
        key: 7,
        score: 50,
        node_type: NodeType::LowerBound,
        generation: 0,
    };
    let exact = EtEntry {
        node_type: NodeType::Exact,
        score: 60,
        ..bound
    };
    assert!(cache.insert(bound));
    assert!(cache.insert(exact));
    assert_eq!(cache.look_up(7).unwrap().node_type, NodeType::Exact);
    // The reverse direction is refused.
    assert!(!cache.insert(bound));
}

#[test]
fn pawn_entries_use_generation_order() {
    let cache: HashTable<PtEntry> = HashTable::new(1 << 14).unwrap();
    let first = PtEntry {
        key: 11,
        score: 25,
        generation: 5,
    };
    assert!(cache.insert(first));
    assert!(!cache.insert(PtEntry {
        score: 30,
        generation: 5,
        ..first
    }));
    assert!(cache.insert(PtEntry {
        score: 30,
        generation: 6,
        ..first
    }));
    assert_eq!(cache.look_up(11).unwrap().score, 30);
}

#[test]
fn capacity_is_two_distinct_primes_within_budget() {
    fn is_prime(n: usize) -> bool {
        n >= 2 && (2..n).take_while(|d| d * d <= n).all(|d| n % d != 0)
    }

    for budget in [1 << 12, 1 << 16, 1 << 20] {
        let cache: HashTable<EtEntry> = HashTable::new(budget).unwrap();
        let (t1, t2) = cache.table_sizes();
        assert!(is_prime(t1));
        assert!(is_prime(t2));
        assert_ne!(t1, t2);
        assert!(t1 + t2 <= budget / EtEntry::BYTES);
        assert_eq!(cache.capacity(), t1 + t2);
    }
}

#[test]
fn size_estimate_tracks_load() {
    let cache: HashTable<PtEntry> = HashTable::new(1 << 14).unwrap();
    let empty = cache.size_bytes();
    for key in 0..128u64 {
        cache.insert(PtEntry {
            key,
            score: 0,
            generation: 0,
        });
    }
    assert!(cache.size_bytes() > empty);
    assert_eq!(cache.size_bytes() % 8, 0);
    cache.clear();
    assert_eq!(cache.size_bytes(), empty);
}
