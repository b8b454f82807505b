//! Inicialização do Núcleo de Recursos
//!
//! Constrói, uma única vez, os objetos de serviço que o resto do kernel
//! recebe por referência. Não existe estado global mutável: quem precisa
//! do cache ou do alocador recebe um `&KernelResources`.
//!
//! # Ordem de Inicialização
//! 1. Memória (PageAllocator sobre a faixa livre)
//! 2. Buffer cache (slots e buckets; disco já pronto)
//! 3. Self-test (feature `self_test`), em instâncias próprias

use crate::drivers::block::BlockDevice;
use crate::fs::bcache::BlockCache;
use crate::mm::config::MemoryLayout;
use crate::mm::{DirectMap, MmResult, PageAllocator};
use alloc::sync::Arc;

/// Fases de inicialização
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum InitPhase {
    /// Fase 1: PageAllocator
    Memory = 1,
    /// Fase 2: BlockCache
    BufferCache = 2,
    /// Fase 3: suites de boot
    SelfTest = 3,
}

impl InitPhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "(Init) Fase 1: memória",
            Self::BufferCache => "(Init) Fase 2: buffer cache",
            Self::SelfTest => "(Init) Fase 3: self-test",
        }
    }
}

/// Serviços do núcleo, prontos para uso concorrente.
pub struct KernelResources {
    pages: PageAllocator,
    bcache: BlockCache,
}

impl KernelResources {
    /// Boot do núcleo: alocador de páginas, depois buffer cache.
    ///
    /// Falha apenas se o `DirectMap` não cobrir a faixa de `layout`.
    pub fn boot(
        layout: MemoryLayout,
        map: DirectMap,
        disk: Arc<dyn BlockDevice>,
    ) -> MmResult<Self> {
        crate::kinfo!(InitPhase::Memory.name());
        let pages = PageAllocator::new(layout, map)?;

        crate::kinfo!(InitPhase::BufferCache.name());
        let bcache = BlockCache::new(disk);

        #[cfg(feature = "self_test")]
        {
            crate::kinfo!(InitPhase::SelfTest.name());
            let report = crate::core::selftest::run_all();
            if report.failed > 0 {
                crate::kwarn!("(Init) Self-test com falhas=", report.failed);
            }
        }

        crate::kok!("(Init) Núcleo de recursos pronto");
        Ok(Self { pages, bcache })
    }

    pub fn pages(&self) -> &PageAllocator {
        &self.pages
    }

    pub fn bcache(&self) -> &BlockCache {
        &self.bcache
    }
}
