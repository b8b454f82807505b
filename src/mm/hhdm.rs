//! # Direct Map
//!
//! Janela física → virtual sobre a faixa que o alocador de páginas gerencia.
//!
//! O kernel precisa escrever nas páginas que entrega (preenchimento na
//! alocação, poison na liberação, cópia no COW). Em vez de um offset global,
//! cada `PageAllocator` recebe a sua janela no boot:
//!
//! ```text
//!   phys: start ─────────────── end
//!           │                    │
//!   virt: base ──── base + (pa - start)
//! ```
//!
//! - Bare metal: `with_offset(start, end, HHDM_BASE)` (ou offset 0 em
//!   identity map)
//! - Testes/hosted: `from_frames` sobre um arranjo de `Frame` alinhados

use crate::mm::config::PAGE_SIZE;
use crate::mm::PhysAddr;
use core::ptr::NonNull;

/// Uma página física crua, alinhada a página.
#[repr(C, align(4096))]
pub struct Frame(pub [u8; PAGE_SIZE]);

impl Frame {
    pub const ZERO: Frame = Frame([0; PAGE_SIZE]);
}

/// Janela de acesso direto `[start, end)`.
#[derive(Debug)]
pub struct DirectMap {
    start: PhysAddr,
    end: PhysAddr,
    base: NonNull<u8>,
}

// SAFETY: a janela só descreve memória; quem escreve nela sincroniza
// (o alocador entrega cada página a um único dono por vez)
unsafe impl Send for DirectMap {}
unsafe impl Sync for DirectMap {}

impl DirectMap {
    /// # Safety
    ///
    /// `base .. base + (end - start)` deve ser memória válida, gravável e
    /// exclusiva deste mapa durante toda a vida do kernel.
    pub unsafe fn new(start: PhysAddr, end: PhysAddr, base: NonNull<u8>) -> Self {
        Self { start, end, base }
    }

    /// Janela estilo HHDM: `virt = phys + offset`.
    ///
    /// Retorna `None` se a base virtual calculada for nula.
    ///
    /// # Safety
    ///
    /// Mesmas condições de `new` para a faixa resultante.
    pub unsafe fn with_offset(start: PhysAddr, end: PhysAddr, offset: u64) -> Option<Self> {
        let base = NonNull::new(start.as_u64().wrapping_add(offset) as usize as *mut u8)?;
        Some(Self::new(start, end, base))
    }

    /// Janela sobre frames emprestados para sempre, fingindo começar em `start`.
    pub fn from_frames(start: PhysAddr, frames: &'static mut [Frame]) -> Self {
        let len = (frames.len() * PAGE_SIZE) as u64;
        let base = NonNull::from(&mut frames[..]).cast::<u8>();
        Self {
            start,
            end: start.add(len),
            base,
        }
    }

    #[inline]
    pub fn start(&self) -> PhysAddr {
        self.start
    }

    #[inline]
    pub fn end(&self) -> PhysAddr {
        self.end
    }

    /// Verifica se `[pa, pa + len)` está dentro da janela.
    #[inline]
    pub fn covers(&self, pa: PhysAddr, len: u64) -> bool {
        pa >= self.start
            && pa
                .as_u64()
                .checked_add(len)
                .is_some_and(|last| last <= self.end.as_u64())
    }

    /// Converte endereço físico para ponteiro dentro da janela.
    #[inline]
    pub fn phys_to_virt(&self, pa: PhysAddr) -> Option<NonNull<u8>> {
        if !self.covers(pa, 1) {
            return None;
        }
        let off = (pa.as_u64() - self.start.as_u64()) as usize;
        // SAFETY: off < end - start, dentro da região descrita em `new`
        Some(unsafe { NonNull::new_unchecked(self.base.as_ptr().add(off)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leak_frames(n: usize) -> &'static mut [Frame] {
        (0..n).map(|_| Frame::ZERO).collect::<Vec<_>>().leak()
    }

    #[test]
    fn translates_inside_window_only() {
        let start = PhysAddr::new(0x8010_0000);
        let map = DirectMap::from_frames(start, leak_frames(2));
        assert_eq!(map.end(), start.add(2 * PAGE_SIZE as u64));

        let p0 = map.phys_to_virt(start).unwrap();
        let p1 = map.phys_to_virt(start.add(PAGE_SIZE as u64)).unwrap();
        assert_eq!(p1.as_ptr() as usize - p0.as_ptr() as usize, PAGE_SIZE);
        assert_eq!(p0.as_ptr() as usize % PAGE_SIZE, 0);

        assert!(map.phys_to_virt(map.end()).is_none());
        assert!(map.phys_to_virt(PhysAddr::new(0x8000_0000)).is_none());
    }

    #[test]
    fn offset_window_matches_pointer_math() {
        let frames = leak_frames(1);
        let base = frames.as_mut_ptr() as u64;
        let start = PhysAddr::new(0x8010_0000);
        let end = start.add(PAGE_SIZE as u64);

        // SAFETY: a janela cobre exatamente o frame vazado acima
        let map = unsafe { DirectMap::with_offset(start, end, base.wrapping_sub(start.as_u64())) }
            .unwrap();
        assert_eq!(map.phys_to_virt(start).unwrap().as_ptr() as u64, base);
        assert_eq!(map.phys_to_virt(start.add(8)).unwrap().as_ptr() as u64, base + 8);

        // offset que leva a base virtual a zero
        let zero = unsafe { DirectMap::with_offset(start, end, 0u64.wrapping_sub(start.as_u64())) };
        assert!(zero.is_none());
    }

    #[test]
    fn borrowed_window_reads_and_writes_frames() {
        let mut frames: Vec<Frame> = (0..2).map(|_| Frame::ZERO).collect();
        let start = PhysAddr::new(0x8020_0000);
        let base = NonNull::from(&mut frames[..]).cast::<u8>();
        // SAFETY: `frames` vive até o fim do teste e só é tocado via `map`
        let map = unsafe { DirectMap::new(start, start.add(2 * PAGE_SIZE as u64), base) };

        let p = map.phys_to_virt(start.add(PAGE_SIZE as u64 + 3)).unwrap();
        unsafe { p.as_ptr().write(0x7E) };
        drop(map);
        assert_eq!(frames[1].0[3], 0x7E);
    }

    #[test]
    fn covers_checks_whole_span() {
        let start = PhysAddr::new(0x8010_0000);
        let map = DirectMap::from_frames(start, leak_frames(1));
        assert!(map.covers(start, PAGE_SIZE as u64));
        assert!(!map.covers(start, PAGE_SIZE as u64 + 1));
        assert!(!map.covers(PhysAddr::new(u64::MAX), 2));
    }
}
