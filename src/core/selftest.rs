//! Self-test de Boot
//!
//! Suites curtas, sem threads, rodadas pelo `KernelResources::boot` quando a
//! feature `self_test` está ligada. Cada caso monta instâncias próprias
//! (RamDisk, janela de frames) e nunca toca nos serviços reais do kernel.

use crate::drivers::block::RamDisk;
use crate::fs::bcache::BlockCache;
use crate::fs::config::{NBUF, ROOTDEV};
use crate::klib::test_framework::{run_test_suite, SuiteReport, TestCase, TestResult};
use crate::mm::config::{MemoryLayout, ALLOC_FILL, FREE_FILL, PAGE_SIZE};
use crate::mm::{DirectMap, Frame, MmError, PageAllocator, PhysAddr};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::ops::Deref;
use core::ptr::NonNull;

const ARENA_START: u64 = 0x8800_0000;

/// Executa todas as suites e soma os resultados.
pub fn run_all() -> SuiteReport {
    crate::kinfo!("╔════════════════════════════════════════╗");
    crate::kinfo!("║     🧪 SELF-TEST DO NÚCLEO             ║");
    crate::kinfo!("╚════════════════════════════════════════╝");

    let mut total = SuiteReport::default();
    total.merge(run_test_suite("pfm", PFM_TESTS));
    total.merge(run_test_suite("bcache", BCACHE_TESTS));

    if total.failed == 0 {
        crate::kok!("(SelfTest) Todas as suites passaram");
    } else {
        crate::kerror!("(SelfTest) Falhas=", total.failed);
    }
    total
}

// =============================================================================
// PFM
// =============================================================================

const PFM_TESTS: &[TestCase] = &[
    TestCase {
        name: "pfm: alloc preenche e free envenena",
        func: pfm_fill_patterns,
    },
    TestCase {
        name: "pfm: página volta só no último dono",
        func: pfm_refcount_release,
    },
    TestCase {
        name: "pfm: OOM recuperável",
        func: pfm_oom,
    },
];

/// Alocador sobre frames que pertencem ao próprio caso de teste.
struct Arena {
    pfm: PageAllocator,
    _frames: Vec<Frame>,
}

impl Deref for Arena {
    type Target = PageAllocator;

    fn deref(&self) -> &PageAllocator {
        &self.pfm
    }
}

fn small_allocator(pages: usize) -> Option<Arena> {
    let mut frames: Vec<Frame> = (0..pages).map(|_| Frame::ZERO).collect();
    let start = PhysAddr::new(ARENA_START);
    let end = start.add((pages * PAGE_SIZE) as u64);
    let base = NonNull::from(&mut frames[..]).cast::<u8>();
    // SAFETY: o heap de `frames` não se move e vive tanto quanto o `Arena`;
    // só o alocador toca nele
    let map = unsafe { DirectMap::new(start, end, base) };
    let pfm = PageAllocator::new(MemoryLayout::new(start, end), map).ok()?;
    Some(Arena {
        pfm,
        _frames: frames,
    })
}

fn first_byte(pfm: &PageAllocator, pa: PhysAddr) -> Option<u8> {
    // SAFETY: leitura de um byte de página que o chamador possui ou que está livre
    unsafe { pfm.page_mut(pa).ok().map(|p| p[0]) }
}

fn pfm_fill_patterns() -> TestResult {
    let Some(pfm) = small_allocator(2) else {
        return TestResult::Failed;
    };
    let Ok(pa) = pfm.alloc() else {
        return TestResult::Failed;
    };
    let filled = first_byte(&pfm, pa) == Some(ALLOC_FILL);
    pfm.free(pa);
    TestResult::check(filled && first_byte(&pfm, pa) == Some(FREE_FILL))
}

fn pfm_refcount_release() -> TestResult {
    let Some(pfm) = small_allocator(2) else {
        return TestResult::Failed;
    };
    let Ok(pa) = pfm.alloc() else {
        return TestResult::Failed;
    };
    pfm.add_ref(pa);
    pfm.add_ref(pa);
    pfm.free(pa);
    pfm.free(pa);
    let still_owned = pfm.free_pages() == 1 && pfm.refcount(pa) == Ok(1);
    pfm.free(pa);
    TestResult::check(still_owned && pfm.free_pages() == 2)
}

fn pfm_oom() -> TestResult {
    let Some(pfm) = small_allocator(1) else {
        return TestResult::Failed;
    };
    let Ok(pa) = pfm.alloc() else {
        return TestResult::Failed;
    };
    let oom = pfm.alloc() == Err(MmError::OutOfMemory);
    pfm.free(pa);
    TestResult::check(oom && pfm.alloc().is_ok())
}

// =============================================================================
// BCACHE
// =============================================================================

const BCACHE_TESTS: &[TestCase] = &[
    TestCase {
        name: "bcache: miss lê do disco, hit não",
        func: bcache_hit_after_miss,
    },
    TestCase {
        name: "bcache: bwrite persiste",
        func: bcache_write_through,
    },
    TestCase {
        name: "bcache: pin segura o bloco",
        func: bcache_pin_survives,
    },
];

fn bcache_hit_after_miss() -> TestResult {
    let disk = Arc::new(RamDisk::new(64));
    let cache = BlockCache::new(disk.clone());
    drop(cache.read(ROOTDEV, 10));
    let first = disk.reads();
    let b = cache.read(ROOTDEV, 10);
    let valid = b.is_valid();
    drop(b);
    TestResult::check(first == 1 && disk.reads() == 1 && valid)
}

fn bcache_write_through() -> TestResult {
    let disk = Arc::new(RamDisk::new(64));
    let cache = BlockCache::new(disk.clone());
    let mut b = cache.read(ROOTDEV, 4);
    b[0] = 0xA5;
    cache.write(&mut b);
    cache.release(b);
    TestResult::check(disk.peek(ROOTDEV, 4)[0] == 0xA5 && disk.writes() == 1)
}

fn bcache_pin_survives() -> TestResult {
    let disk = Arc::new(RamDisk::new(256));
    let cache = BlockCache::new(disk.clone());
    let b = cache.read(ROOTDEV, 7);
    let pin = cache.pin(&b);
    cache.release(b);

    // ocupa todos os outros slots
    let held: Vec<_> = (100..100 + NBUF as u32 - 1)
        .map(|n| cache.acquire(ROOTDEV, n))
        .collect();
    let kept = cache.contains(ROOTDEV, 7);
    drop(held);
    cache.unpin(pin);
    TestResult::check(kept)
}
