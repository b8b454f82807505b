//! # Estatísticas do Alocador de Páginas

use core::sync::atomic::{AtomicU64, Ordering};

/// Snapshot das estatísticas
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
    pub total_pages: u64,
    pub free_pages: u64,
    /// Páginas entregues por `alloc`
    pub allocations: u64,
    /// Páginas que voltaram para a lista livre
    pub frees: u64,
    /// `alloc` com lista livre vazia
    pub oom_failures: u64,
}

impl PageStats {
    pub fn used_pages(&self) -> u64 {
        self.total_pages - self.free_pages
    }
}

/// Contadores vivos (atômicos, fora do lock)
#[derive(Default)]
pub(super) struct Counters {
    pub(super) allocations: AtomicU64,
    pub(super) frees: AtomicU64,
    pub(super) oom_failures: AtomicU64,
}

impl Counters {
    #[inline]
    pub(super) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self, total_pages: u64, free_pages: u64) -> PageStats {
        PageStats {
            total_pages,
            free_pages,
            allocations: self.allocations.load(Ordering::Relaxed),
            frees: self.frees.load(Ordering::Relaxed),
            oom_failures: self.oom_failures.load(Ordering::Relaxed),
        }
    }
}
