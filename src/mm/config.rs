//! # Configuração do Módulo de Memória
//!
//! Constantes do layout físico e o layout efetivo recebido no boot.

use crate::mm::PhysAddr;

// =============================================================================
// CONSTANTES DE TAMANHO
// =============================================================================

/// Tamanho de uma página (4 KiB)
pub const PAGE_SIZE: usize = 4096;

/// Bits de offset dentro de uma página
pub const PAGE_SHIFT: usize = 12;

// =============================================================================
// LAYOUT DE MEMÓRIA FÍSICA
// =============================================================================

/// Início da RAM do kernel
pub const KERNBASE: u64 = 0x8000_0000;

/// Topo da memória física utilizável (128 MiB acima de KERNBASE)
pub const PHYSTOP: u64 = KERNBASE + 128 * 1024 * 1024;

// =============================================================================
// PADRÕES DE PREENCHIMENTO
// =============================================================================

/// Conteúdo de uma página recém alocada (lixo reconhecível)
pub const ALLOC_FILL: u8 = 5;

/// Conteúdo de uma página devolvida à lista livre (pega dangling refs)
pub const FREE_FILL: u8 = 1;

// =============================================================================
// LAYOUT EFETIVO
// =============================================================================

/// Faixa física entregue ao alocador de páginas.
///
/// Tudo abaixo de `kernel_end` é imagem do kernel (reservado); tudo a partir
/// de `phys_top` não existe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryLayout {
    pub kernel_end: PhysAddr,
    pub phys_top: PhysAddr,
}

impl MemoryLayout {
    pub const fn new(kernel_end: PhysAddr, phys_top: PhysAddr) -> Self {
        Self {
            kernel_end,
            phys_top,
        }
    }

    /// Layout padrão da máquina: kernel carregado em KERNBASE, RAM até PHYSTOP.
    pub const fn standard(kernel_end: PhysAddr) -> Self {
        Self::new(kernel_end, PhysAddr::new(PHYSTOP))
    }

    /// Primeira página gerenciada (kernel_end arredondado para cima).
    pub const fn first_page(&self) -> PhysAddr {
        self.kernel_end.align_up(PAGE_SIZE as u64)
    }

    /// Número de páginas inteiras entre `first_page` e `phys_top`.
    pub const fn page_count(&self) -> usize {
        let start = self.first_page().as_u64();
        let top = self.phys_top.as_u64();
        if top <= start {
            0
        } else {
            ((top - start) >> PAGE_SHIFT) as usize
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_rounds_kernel_end_up() {
        let l = MemoryLayout::standard(PhysAddr::new(KERNBASE + 0x2_3456));
        assert_eq!(l.first_page(), PhysAddr::new(KERNBASE + 0x2_4000));
        assert_eq!(l.page_count(), (PHYSTOP - (KERNBASE + 0x2_4000)) as usize / PAGE_SIZE);
    }

    #[test]
    fn empty_layout() {
        let l = MemoryLayout::new(PhysAddr::new(0x9000), PhysAddr::new(0x9000));
        assert_eq!(l.page_count(), 0);
    }
}
