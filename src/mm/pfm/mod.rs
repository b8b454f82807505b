//! # Page Frame Manager (PFM)
//!
//! Alocador de páginas físicas com contagem de referências.
//!
//! ## Modelo
//!
//! - Faixa gerenciada: do fim do kernel (arredondado para página) até o topo
//!   da memória física. Cada página tem um refcount na `FrameTable`.
//! - Livre ⇔ refcount 0 ⇔ está na lista livre.
//! - `alloc` entrega com refcount 1; `add_ref` registra mais um dono (COW);
//!   `free` remove um dono e só devolve a página quando o último sai.
//! - Um único `spin::Mutex` guarda lista livre e refcounts. Preenchimento de
//!   página acontece fora dele.
//!
//! ## Falhas
//!
//! | Situação                               | Resultado                    |
//! |----------------------------------------|------------------------------|
//! | `alloc` com lista vazia                | `Err(MmError::OutOfMemory)`  |
//! | `free` desalinhado                     | fatal `PageMisaligned`       |
//! | `free` fora da faixa                   | fatal `PageOutOfRange`       |
//! | `free` com refcount 0                  | fatal `PageDoubleFree`       |
//! | `add_ref` em página livre/fora da faixa| fatal `PageNotOwned`         |

mod frame;
pub mod stats;


use crate::core::fatal::{kpanic, Fatal};
use crate::mm::config::{MemoryLayout, ALLOC_FILL, FREE_FILL, PAGE_SHIFT, PAGE_SIZE};
use crate::mm::{DirectMap, MmError, MmResult, PhysAddr};
use core::ptr;
use frame::{FrameTable, NIL};
use spin::Mutex;
use stats::Counters;

pub use stats::PageStats;

/// Por que um endereço não é um operando válido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddrFault {
    Misaligned,
    OutOfRange,
}

pub struct PageAllocator {
    map: DirectMap,
    /// Fim da imagem do kernel; nada abaixo é gerenciado
    kernel_end: PhysAddr,
    /// Primeira página gerenciada
    base: PhysAddr,
    /// Fim (exclusivo) da última página inteira gerenciada
    limit: PhysAddr,
    table: Mutex<FrameTable>,
    counters: Counters,
}

impl PageAllocator {
    /// Constrói o alocador e libera toda a faixa de `layout`.
    ///
    /// Toda página começa com refcount 1 e passa por `free`, terminando
    /// livre, com refcount 0 e preenchida com `FREE_FILL`.
    pub fn new(layout: MemoryLayout, map: DirectMap) -> MmResult<Self> {
        let base = layout.first_page();
        let count = layout.page_count();
        if count >= NIL as usize {
            return Err(MmError::InvalidAddress);
        }
        let limit = base.add((count as u64) << PAGE_SHIFT);

        if count > 0 && !map.covers(base, limit.as_u64() - base.as_u64()) {
            crate::kerror!("(PFM) Direct map não cobre a faixa gerenciada base=", base.as_u64());
            return Err(MmError::InvalidAddress);
        }

        crate::kinfo!("(PFM) Inicializando faixa base=", base.as_u64());
        crate::kdebug!("(PFM) Limite=", limit.as_u64());

        let allocator = Self {
            map,
            kernel_end: layout.kernel_end,
            base,
            limit,
            table: Mutex::new(FrameTable::new(count)),
            counters: Counters::default(),
        };
        allocator.free_range();

        crate::kinfo!("(PFM) Páginas livres=", allocator.free_pages());
        Ok(allocator)
    }

    fn free_range(&self) {
        for idx in 0..self.total_pages() {
            self.table.lock().set_refcount(idx, 1);
            self.free(self.page_addr(idx));
        }
    }

    // =========================================================================
    // OPERAÇÕES
    // =========================================================================

    /// Aloca uma página com refcount 1, preenchida com `ALLOC_FILL`.
    pub fn alloc(&self) -> MmResult<PhysAddr> {
        let popped = {
            let mut table = self.table.lock();
            let idx = table.pop_free();
            if let Some(idx) = idx {
                table.set_refcount(idx, 1);
            }
            idx
        };

        let Some(idx) = popped else {
            Counters::bump(&self.counters.oom_failures);
            crate::kwarn!("(PFM) OOM: lista livre vazia");
            return Err(MmError::OutOfMemory);
        };

        let pa = self.page_addr(idx);
        self.fill(pa, ALLOC_FILL);
        Counters::bump(&self.counters.allocations);
        crate::ktrace!("(PFM) alloc pa=", pa.as_u64());
        Ok(pa)
    }

    /// Remove um dono de `pa`; no último, envenena e devolve a página.
    pub fn free(&self, pa: PhysAddr) {
        let idx = match self.index_of(pa) {
            Ok(idx) => idx,
            Err(AddrFault::Misaligned) => kpanic(Fatal::PageMisaligned(pa)),
            Err(AddrFault::OutOfRange) => kpanic(Fatal::PageOutOfRange(pa)),
        };

        let remaining = {
            let mut table = self.table.lock();
            if table.refcount(idx) < 1 {
                drop(table);
                kpanic(Fatal::PageDoubleFree(pa));
            }
            table.dec_ref(idx)
        };
        if remaining > 0 {
            return;
        }

        // refcount 0 e fora da lista: ninguém mais toca nesta página
        self.fill(pa, FREE_FILL);
        self.table.lock().push_free(idx);
        Counters::bump(&self.counters.frees);
        crate::ktrace!("(PFM) free pa=", pa.as_u64());
    }

    /// Registra mais um dono de uma página alocada.
    pub fn add_ref(&self, pa: PhysAddr) {
        let Ok(idx) = self.index_of(pa) else {
            kpanic(Fatal::PageNotOwned(pa));
        };
        let mut table = self.table.lock();
        if table.refcount(idx) < 1 {
            drop(table);
            kpanic(Fatal::PageNotOwned(pa));
        }
        table.inc_ref(idx);
    }

    /// Refcount atual de `pa` (0 = livre).
    pub fn refcount(&self, pa: PhysAddr) -> MmResult<u32> {
        let idx = self.index_of(pa).map_err(AddrFault::into_error)?;
        Ok(self.table.lock().refcount(idx))
    }

    /// Resolve uma escrita em página COW.
    ///
    /// Dono único: a página continua a mesma. Compartilhada: aloca uma cópia
    /// privada, solta a referência do chamador à original e devolve a cópia.
    pub fn break_cow(&self, pa: PhysAddr) -> MmResult<PhysAddr> {
        let Ok(idx) = self.index_of(pa) else {
            kpanic(Fatal::PageNotOwned(pa));
        };
        let refs = self.table.lock().refcount(idx);
        if refs < 1 {
            kpanic(Fatal::PageNotOwned(pa));
        }
        if refs == 1 {
            return Ok(pa);
        }

        let copy = self.alloc()?;
        match (self.map.phys_to_virt(pa), self.map.phys_to_virt(copy)) {
            (Some(src), Some(dst)) => {
                // SAFETY: páginas distintas dentro da janela; o chamador
                // ainda detém uma referência a `pa`
                unsafe { ptr::copy_nonoverlapping(src.as_ptr(), dst.as_ptr(), PAGE_SIZE) };
            }
            _ => {
                self.free(copy);
                return Err(MmError::InvalidAddress);
            }
        }
        self.free(pa);
        crate::kdebug!("(PFM) COW quebrado, cópia=", copy.as_u64());
        Ok(copy)
    }

    /// Acesso ao conteúdo de uma página.
    ///
    /// # Safety
    ///
    /// O chamador deve ser dono de `pa` e não pode haver outra referência
    /// viva ao mesmo conteúdo.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn page_mut(&self, pa: PhysAddr) -> MmResult<&mut [u8; PAGE_SIZE]> {
        self.index_of(pa).map_err(AddrFault::into_error)?;
        let p = self.map.phys_to_virt(pa).ok_or(MmError::InvalidAddress)?;
        Ok(&mut *(p.as_ptr() as *mut [u8; PAGE_SIZE]))
    }

    // =========================================================================
    // CONSULTAS
    // =========================================================================

    pub fn total_pages(&self) -> usize {
        ((self.limit.as_u64() - self.base.as_u64()) >> PAGE_SHIFT) as usize
    }

    pub fn free_pages(&self) -> usize {
        self.table.lock().free_len()
    }

    /// `[base, limit)` gerenciado.
    pub fn managed_range(&self) -> (PhysAddr, PhysAddr) {
        (self.base, self.limit)
    }

    pub fn stats(&self) -> PageStats {
        let free = self.free_pages() as u64;
        self.counters.snapshot(self.total_pages() as u64, free)
    }

    // =========================================================================
    // AUXILIARES
    // =========================================================================

    #[inline]
    fn page_addr(&self, idx: usize) -> PhysAddr {
        self.base.add((idx as u64) << PAGE_SHIFT)
    }

    fn index_of(&self, pa: PhysAddr) -> Result<usize, AddrFault> {
        if !pa.is_page_aligned() {
            return Err(AddrFault::Misaligned);
        }
        if pa < self.kernel_end || pa < self.base || pa >= self.limit {
            return Err(AddrFault::OutOfRange);
        }
        Ok(((pa.as_u64() - self.base.as_u64()) >> PAGE_SHIFT) as usize)
    }

    fn fill(&self, pa: PhysAddr, byte: u8) {
        if let Some(p) = self.map.phys_to_virt(pa) {
            // SAFETY: página inteira dentro da janela, com dono exclusivo
            unsafe { ptr::write_bytes(p.as_ptr(), byte, PAGE_SIZE) };
        }
    }
}

impl AddrFault {
    fn into_error(self) -> MmError {
        match self {
            Self::Misaligned => MmError::NotAligned,
            Self::OutOfRange => MmError::InvalidAddress,
        }
    }
}
