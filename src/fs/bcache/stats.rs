//! # Estatísticas do Buffer Cache

use core::sync::atomic::{AtomicU64, Ordering};

/// Snapshot das estatísticas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// acquire resolvido no bucket (inclui a re-checagem sob o lock global)
    pub hits: u64,
    /// acquire que precisou reciclar um slot
    pub misses: u64,
    /// misses cujo slot reciclado tinha conteúdo válido de outro bloco
    pub evictions: u64,
    pub disk_reads: u64,
    pub disk_writes: u64,
}

#[derive(Default)]
pub(super) struct Counters {
    pub(super) hits: AtomicU64,
    pub(super) misses: AtomicU64,
    pub(super) evictions: AtomicU64,
    pub(super) disk_reads: AtomicU64,
    pub(super) disk_writes: AtomicU64,
}

impl Counters {
    #[inline]
    pub(super) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            disk_reads: self.disk_reads.load(Ordering::Relaxed),
            disk_writes: self.disk_writes.load(Ordering::Relaxed),
        }
    }
}
