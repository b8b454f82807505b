//! Testes do Buffer Cache

use super::*;
use crate::drivers::block::RamDisk;
use crate::fs::config::{BSIZE, ROOTDEV};
use spin::relax::Yield;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtOrd};
use std::sync::Barrier;
use std::thread;
use std::time::Duration;

type Cache = BlockCache<Yield>;

fn setup(capacity: u32) -> (Arc<RamDisk>, Cache) {
    let disk = Arc::new(RamDisk::new(capacity));
    let cache = Cache::with_relax(disk.clone());
    (disk, cache)
}

fn stamp(blockno: u32) -> [u8; BSIZE] {
    let mut data = [0u8; BSIZE];
    data[..4].copy_from_slice(&blockno.to_le_bytes());
    data
}

/// Auditoria das listas: todo slot exatamente uma vez, no bucket certo,
/// e nenhuma identidade repetida.
fn audit(cache: &Cache) -> Vec<Resident> {
    let all = cache.residents();
    assert_eq!(all.len(), NBUF);

    let ids: HashSet<_> = all.iter().map(|r| r.id).collect();
    assert_eq!(ids.len(), NBUF);

    let mut seen = HashSet::new();
    for r in &all {
        assert_eq!(r.bucket, bucket_of(r.blockno), "slot {} no bucket errado", r.id);
        assert!(seen.insert((r.dev, r.blockno)), "identidade duplicada {:?}", r);
    }
    all
}

/// Trava NBUF blocos a partir de `first`, ocupando todos os slots.
fn hold_all(cache: &Cache, first: u32) -> Vec<BufGuard<'_, Yield>> {
    (first..first + NBUF as u32)
        .map(|n| cache.acquire(ROOTDEV, n))
        .collect()
}

// =============================================================================
// READ / HIT / MISS
// =============================================================================

#[test]
fn fresh_cache_is_well_formed() {
    let (_disk, cache) = setup(64);
    let all = audit(&cache);
    assert!(all.iter().all(|r| r.dev == NO_DEV && r.refcnt == 0));
    assert_eq!(cache.stats(), CacheStats::default());
}

#[test]
fn read_miss_then_hit_transfers_once() {
    let (disk, cache) = setup(64);

    let b = cache.read(ROOTDEV, 10);
    assert!(b.is_valid());
    assert_eq!((b.dev(), b.blockno()), (ROOTDEV, 10));
    assert_eq!(disk.reads(), 1);
    drop(b);

    let b = cache.read(ROOTDEV, 10);
    assert!(b.is_valid());
    assert_eq!(disk.reads(), 1);
    cache.release(b);

    let s = cache.stats();
    assert_eq!((s.hits, s.misses, s.disk_reads), (1, 1, 1));
}

#[test]
fn read_returns_disk_content() {
    let (disk, cache) = setup(64);
    disk.poke(ROOTDEV, 3, &stamp(3));
    let b = cache.read(ROOTDEV, 3);
    assert_eq!(*b.data(), stamp(3));
}

#[test]
fn acquire_alone_does_not_touch_disk() {
    let (disk, cache) = setup(64);
    let b = cache.acquire(ROOTDEV, 3);
    assert!(!b.is_valid());
    assert_eq!(disk.reads(), 0);
}

#[test]
fn devices_are_distinct_identities() {
    let (disk, cache) = setup(64);
    disk.poke(1, 5, &[1; BSIZE]);
    disk.poke(2, 5, &[2; BSIZE]);
    let a = cache.read(1, 5);
    let b = cache.read(2, 5);
    assert_ne!(a.id(), b.id());
    assert_eq!(a[0], 1);
    assert_eq!(b[0], 2);
}

#[test]
fn second_reader_waits_for_release() {
    let (disk, cache) = setup(64);
    let entered = AtomicBool::new(false);

    let b = cache.read(ROOTDEV, 10);
    let first = b.id();

    thread::scope(|s| {
        let h = s.spawn(|| {
            let b2 = cache.read(ROOTDEV, 10);
            entered.store(true, AtOrd::SeqCst);
            b2.id()
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!entered.load(AtOrd::SeqCst));
        drop(b);
        assert_eq!(h.join().unwrap(), first);
    });

    assert!(entered.load(AtOrd::SeqCst));
    assert_eq!(disk.reads(), 1);
}

// =============================================================================
// WRITE / RELEASE
// =============================================================================

#[test]
fn write_persists_across_eviction() {
    let (disk, cache) = setup(256);

    let mut b = cache.read(ROOTDEV, 5);
    b.data_mut().copy_from_slice(&stamp(0xBEEF));
    cache.write(&mut b);
    drop(b);
    assert_eq!(disk.writes(), 1);
    assert_eq!(disk.peek(ROOTDEV, 5), stamp(0xBEEF));

    // NBUF blocos novos travados ao mesmo tempo: o slot do bloco 5 é reciclado
    let held = hold_all(&cache, 100);
    assert!(!cache.contains(ROOTDEV, 5));
    drop(held);

    let reads = disk.reads();
    let b = cache.read(ROOTDEV, 5);
    assert_eq!(disk.reads(), reads + 1);
    assert_eq!(*b.data(), stamp(0xBEEF));
}

#[test]
fn unwritten_changes_are_lost_on_eviction() {
    let (_disk, cache) = setup(256);
    {
        let mut b = cache.read(ROOTDEV, 5);
        b[0] = 0x77;
    }
    // ainda em cache: a alteração é visível
    assert_eq!(cache.read(ROOTDEV, 5)[0], 0x77);

    drop(hold_all(&cache, 100));
    assert_eq!(cache.read(ROOTDEV, 5)[0], 0);
}

#[test]
fn release_keeps_block_cached_with_zero_refs() {
    let (_disk, cache) = setup(64);
    let b = cache.read(ROOTDEV, 9);
    let id = b.id();
    cache.release(b);

    assert!(cache.contains(ROOTDEV, 9));
    let r = audit(&cache).into_iter().find(|r| r.id == id).unwrap();
    assert_eq!((r.dev, r.blockno, r.refcnt), (ROOTDEV, 9, 0));
    assert!(r.flags.contains(BufFlags::VALID));
}

#[test]
#[should_panic(expected = "bwrite")]
fn write_through_foreign_cache_is_fatal() {
    let (_d1, a) = setup(64);
    let (_d2, b) = setup(64);
    let mut buf = b.read(ROOTDEV, 1);
    a.write(&mut buf);
}

#[test]
#[should_panic(expected = "disk read failed")]
fn disk_failure_is_fatal() {
    let (disk, cache) = setup(64);
    disk.fail_next(3);
    let _ = cache.read(ROOTDEV, 3);
}

#[test]
#[should_panic(expected = "disk write failed")]
fn write_to_read_only_disk_is_fatal() {
    let (disk, cache) = setup(64);
    let mut b = cache.read(ROOTDEV, 3);
    disk.set_read_only(true);
    cache.write(&mut b);
}

// =============================================================================
// EVICTION
// =============================================================================

#[test]
#[should_panic(expected = "bget: no buffers")]
fn exhaustion_is_fatal() {
    let (_disk, cache) = setup(256);
    let held: Vec<_> = (0..NBUF as u32).map(|n| cache.acquire(ROOTDEV, n)).collect();
    assert_eq!(held.len(), NBUF);
    let _ = cache.acquire(ROOTDEV, NBUF as u32);
}

#[test]
fn held_buffers_are_never_evicted() {
    let (_disk, cache) = setup(512);

    // NBUF-1 travados, com conteúdo próprio
    let mut held: Vec<_> = (0..NBUF as u32 - 1).map(|n| cache.read(ROOTDEV, n)).collect();
    for b in held.iter_mut() {
        let n = b.blockno();
        b.data_mut().copy_from_slice(&stamp(n));
    }

    // o único slot livre gira por muitos blocos
    for blockno in 200..400 {
        let b = cache.read(ROOTDEV, blockno);
        assert!(b.id() != held[0].id());
    }

    for b in &held {
        assert!(cache.contains(ROOTDEV, b.blockno()));
        assert_eq!(*b.data(), stamp(b.blockno()));
    }
    audit(&cache);
}

#[test]
fn evictions_counted_only_for_valid_victims() {
    let (_disk, cache) = setup(256);
    // cada slot recebe o seu primeiro bloco
    let held: Vec<_> = (0..NBUF as u32).map(|n| cache.read(ROOTDEV, n)).collect();
    assert_eq!(cache.stats().evictions, 0);
    drop(held);

    drop(cache.read(ROOTDEV, 200));
    let s = cache.stats();
    assert_eq!(s.misses, NBUF as u64 + 1);
    assert_eq!(s.evictions, 1);
}

#[test]
fn same_bucket_blocks_coexist() {
    let (_disk, cache) = setup(256);
    let a = cache.read(ROOTDEV, 3);
    let b = cache.read(ROOTDEV, 3 + NBUCKET as u32);
    let c = cache.read(ROOTDEV, 3 + 2 * NBUCKET as u32);
    assert_eq!(bucket_of(a.blockno()), bucket_of(c.blockno()));
    assert_ne!(a.id(), b.id());
    assert_ne!(b.id(), c.id());
    drop((a, b, c));
    audit(&cache);
}

// =============================================================================
// PIN
// =============================================================================

#[test]
fn pinned_buffer_survives_eviction_until_unpinned() {
    let (_disk, cache) = setup(512);

    let b = cache.read(ROOTDEV, 7);
    let pin = cache.pin(&b);
    assert_eq!((pin.dev(), pin.blockno()), (ROOTDEV, 7));
    drop(b);

    // todos os outros slots travados por blocos novos
    let held: Vec<_> = (100..100 + NBUF as u32 - 1)
        .map(|n| cache.acquire(ROOTDEV, n))
        .collect();
    assert!(cache.contains(ROOTDEV, 7));
    let r = cache
        .residents()
        .into_iter()
        .find(|r| r.dev == ROOTDEV && r.blockno == 7)
        .unwrap();
    assert_eq!(r.refcnt, 1);

    cache.unpin(pin);
    let extra = cache.acquire(ROOTDEV, 999);
    assert!(!cache.contains(ROOTDEV, 7));
    drop(extra);
    drop(held);
    audit(&cache);
}

#[test]
#[should_panic(expected = "bget: no buffers")]
fn pins_count_against_capacity() {
    let (_disk, cache) = setup(256);
    let mut pins = Vec::new();
    for n in 0..NBUF as u32 {
        let b = cache.read(ROOTDEV, n);
        pins.push(cache.pin(&b));
    }
    let _ = cache.acquire(ROOTDEV, 500);
}

#[test]
#[should_panic(expected = "bpin")]
fn pin_of_foreign_buffer_is_fatal() {
    let (_da, a) = setup(64);
    let (_db, b) = setup(64);
    let guard = b.read(ROOTDEV, 7);
    let _pin = a.pin(&guard);
}

#[test]
#[should_panic(expected = "bunpin")]
fn unpin_through_foreign_cache_is_fatal() {
    let (_da, a) = setup(64);
    let (_db, b) = setup(64);

    // mesmo bloco, mesmo slot nos dois caches
    let ga = a.read(ROOTDEV, 7);
    let gb = b.read(ROOTDEV, 7);
    assert_eq!(ga.id(), gb.id());
    let pa = a.pin(&ga);
    let _pb = b.pin(&gb);
    drop((ga, gb));

    b.unpin(pa);
}

#[test]
fn foreign_unpin_leaves_pin_in_place() {
    let (_da, a) = setup(64);
    let (_db, b) = setup(64);
    let pa = {
        let g = a.read(ROOTDEV, 7);
        a.pin(&g)
    };
    let pb = {
        let g = b.read(ROOTDEV, 7);
        b.pin(&g)
    };

    let foreign = thread::scope(|s| s.spawn(|| b.unpin(pa)).join());
    assert!(foreign.is_err());

    let r = b
        .residents()
        .into_iter()
        .find(|r| r.dev == ROOTDEV && r.blockno == 7)
        .unwrap();
    assert_eq!(r.refcnt, 1);
    b.unpin(pb);
}

#[test]
#[should_panic(expected = "bunpin")]
fn unpin_with_stale_identity_is_fatal() {
    let (_disk, cache) = setup(64);
    let g = cache.read(ROOTDEV, 7);
    let pin = cache.pin(&g);
    drop(g);

    let stale = PinnedBuf {
        cache: pin.cache,
        id: pin.id,
        dev: ROOTDEV,
        blockno: 8,
    };
    cache.unpin(stale);
}

#[test]
#[should_panic(expected = "refcnt underflow")]
fn release_below_zero_is_fatal() {
    let (_disk, cache) = setup(64);
    let b = cache.acquire(ROOTDEV, 5);
    let id = b.id();
    drop(b);
    cache.unref(id, ROOTDEV, 5, "brelse");
}

// =============================================================================
// CONCORRÊNCIA
// =============================================================================

#[test]
fn concurrent_misses_of_one_block_share_a_slot() {
    const THREADS: usize = 8;
    let (disk, cache) = setup(64);
    let barrier = Barrier::new(THREADS);
    let ids: Vec<usize> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    let b = cache.read(ROOTDEV, 42);
                    b.id()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(ids.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(disk.reads(), 1);
    let copies = audit(&cache)
        .iter()
        .filter(|r| r.dev == ROOTDEV && r.blockno == 42)
        .count();
    assert_eq!(copies, 1);
}

#[test]
fn exclusive_access_serializes_updates() {
    const THREADS: usize = 6;
    const ITERS: u64 = 200;
    let (disk, cache) = setup(64);

    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..ITERS {
                    let mut b = cache.read(ROOTDEV, 1);
                    let mut n = [0u8; 8];
                    n.copy_from_slice(&b[..8]);
                    let v = u64::from_le_bytes(n) + 1;
                    thread::yield_now();
                    b[..8].copy_from_slice(&v.to_le_bytes());
                    cache.write(&mut b);
                }
            });
        }
    });

    let mut n = [0u8; 8];
    n.copy_from_slice(&disk.peek(ROOTDEV, 1)[..8]);
    assert_eq!(u64::from_le_bytes(n), THREADS as u64 * ITERS);
    assert_eq!(disk.reads(), 1);
}

#[test]
fn stress_many_blocks_keeps_identities_straight() {
    const THREADS: u32 = 8;
    const ITERS: u32 = 400;
    const BLOCKS: u32 = 97;
    let (disk, cache) = setup(BLOCKS);
    for n in 0..BLOCKS {
        disk.poke(ROOTDEV, n, &stamp(n));
    }
    let updates = AtomicUsize::new(0);

    thread::scope(|s| {
        for t in 0..THREADS {
            let cache = &cache;
            let updates = &updates;
            s.spawn(move || {
                for i in 0..ITERS {
                    let blockno = (t * 31 + i * 13) % BLOCKS;
                    let mut b = cache.read(ROOTDEV, blockno);
                    assert_eq!(b[..4], blockno.to_le_bytes());
                    let mut c = [0u8; 4];
                    c.copy_from_slice(&b[4..8]);
                    let v = u32::from_le_bytes(c) + 1;
                    b[4..8].copy_from_slice(&v.to_le_bytes());
                    cache.write(&mut b);
                    updates.fetch_add(1, AtOrd::Relaxed);
                }
            });
        }
    });

    let total: u64 = (0..BLOCKS)
        .map(|n| {
            let data = disk.peek(ROOTDEV, n);
            let mut c = [0u8; 4];
            c.copy_from_slice(&data[4..8]);
            u32::from_le_bytes(c) as u64
        })
        .sum();
    assert_eq!(total, (THREADS * ITERS) as u64);
    assert_eq!(updates.load(AtOrd::Relaxed), (THREADS * ITERS) as usize);

    let all = audit(&cache);
    assert!(all.iter().all(|r| r.refcnt == 0));
    let s = cache.stats();
    assert_eq!(s.hits + s.misses, (THREADS * ITERS) as u64);
    assert_eq!(s.disk_writes, (THREADS * ITERS) as u64);
}
