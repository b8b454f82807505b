//! # Buffers
//!
//! `Slot` é a célula fixa do arena (criada uma vez, reciclada para sempre).
//! `BufGuard` é a posse exclusiva de um slot entregue por `acquire`/`read`;
//! o `Drop` dele é o brelse. `PinnedBuf` é uma referência extra que mantém o
//! slot fora da eviction sem segurar o sleeplock.
//!
//! ## Quem protege o quê
//!
//! | Campo                     | Protegido por                          |
//! |---------------------------|----------------------------------------|
//! | `dev`, `blockno`, `refcnt`| lock do bucket que contém o slot       |
//! | `next`                    | lock do bucket que contém o slot       |
//! | `flags` (VALID)           | sleeplock do slot                      |
//! | `data`                    | sleeplock do slot                      |

use super::BlockCache;
use crate::core::fatal::{kpanic, Fatal};
use crate::fs::config::BSIZE;
use crate::sync::{SleepLock, SleepLockGuard};
use bitflags::bitflags;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};
use spin::relax::{RelaxStrategy, Spin};

/// Dispositivo inexistente; identidade dos slots nunca usados
pub const NO_DEV: u32 = u32::MAX;

bitflags! {
    /// Estado de um buffer
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BufFlags: u8 {
        /// Conteúdo reflete o disco
        const VALID = 1 << 0;
        /// Transferência de disco em andamento
        const DISK  = 1 << 1;
    }
}

pub(super) struct Slot<R> {
    pub(super) dev: AtomicU32,
    pub(super) blockno: AtomicU32,
    pub(super) refcnt: AtomicU32,
    pub(super) next: AtomicU32,
    flags: AtomicU8,
    pub(super) data: SleepLock<[u8; BSIZE], R>,
}

impl<R> Slot<R> {
    /// Slot vazio com identidade `(NO_DEV, blockno)`.
    pub(super) fn new(blockno: u32) -> Self {
        Self {
            dev: AtomicU32::new(NO_DEV),
            blockno: AtomicU32::new(blockno),
            refcnt: AtomicU32::new(0),
            next: AtomicU32::new(super::bucket::NIL),
            flags: AtomicU8::new(0),
            data: SleepLock::new([0; BSIZE]),
        }
    }

    #[inline]
    pub(super) fn is(&self, dev: u32, blockno: u32) -> bool {
        self.dev.load(Ordering::Relaxed) == dev && self.blockno.load(Ordering::Relaxed) == blockno
    }

    #[inline]
    pub(super) fn flags(&self) -> BufFlags {
        BufFlags::from_bits_truncate(self.flags.load(Ordering::Acquire))
    }

    #[inline]
    pub(super) fn set(&self, f: BufFlags) {
        self.flags.fetch_or(f.bits(), Ordering::Release);
    }

    #[inline]
    pub(super) fn clear(&self, f: BufFlags) {
        self.flags.fetch_and(!f.bits(), Ordering::Release);
    }

    /// Pode ser reciclado? (refcount zero, sleeplock livre, sem I/O)
    #[inline]
    pub(super) fn evictable(&self) -> bool {
        self.refcnt.load(Ordering::Relaxed) == 0
            && !self.data.is_locked()
            && !self.flags().contains(BufFlags::DISK)
    }

    /// Assume a nova identidade: inválido, um dono.
    pub(super) fn claim(&self, dev: u32, blockno: u32) {
        self.dev.store(dev, Ordering::Relaxed);
        self.blockno.store(blockno, Ordering::Relaxed);
        self.flags.store(0, Ordering::Release);
        self.refcnt.store(1, Ordering::Relaxed);
    }
}

// =============================================================================
// BUF GUARD
// =============================================================================

/// Buffer travado, devolvido por `BlockCache::acquire` e `BlockCache::read`.
///
/// Soltar o guard é o brelse: libera o sleeplock e depois decrementa o
/// refcount sob o lock do bucket. O bloco continua em cache.
pub struct BufGuard<'a, R: RelaxStrategy = Spin> {
    pub(super) cache: &'a BlockCache<R>,
    id: usize,
    dev: u32,
    blockno: u32,
    data: Option<SleepLockGuard<'a, [u8; BSIZE], R>>,
}

impl<'a, R: RelaxStrategy> BufGuard<'a, R> {
    pub(super) fn new(
        cache: &'a BlockCache<R>,
        id: usize,
        dev: u32,
        blockno: u32,
        data: SleepLockGuard<'a, [u8; BSIZE], R>,
    ) -> Self {
        Self {
            cache,
            id,
            dev,
            blockno,
            data: Some(data),
        }
    }

    pub fn dev(&self) -> u32 {
        self.dev
    }

    pub fn blockno(&self) -> u32 {
        self.blockno
    }

    /// Índice do slot no arena
    pub fn id(&self) -> usize {
        self.id
    }

    /// Conteúdo reflete o disco?
    pub fn is_valid(&self) -> bool {
        self.cache.slot(self.id).flags().contains(BufFlags::VALID)
    }

    /// O chamador ainda é o dono do sleeplock?
    pub fn is_held(&self) -> bool {
        self.data.as_ref().is_some_and(|g| g.is_held())
    }

    pub fn data(&self) -> &[u8; BSIZE] {
        match self.data.as_deref() {
            Some(d) => d,
            None => kpanic(Fatal::BufferNotHeld { op: "bdata" }),
        }
    }

    pub fn data_mut(&mut self) -> &mut [u8; BSIZE] {
        match self.data.as_deref_mut() {
            Some(d) => d,
            None => kpanic(Fatal::BufferNotHeld { op: "bdata" }),
        }
    }
}

impl<R: RelaxStrategy> Deref for BufGuard<'_, R> {
    type Target = [u8; BSIZE];

    fn deref(&self) -> &Self::Target {
        self.data()
    }
}

impl<R: RelaxStrategy> DerefMut for BufGuard<'_, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.data_mut()
    }
}

impl<R: RelaxStrategy> Drop for BufGuard<'_, R> {
    fn drop(&mut self) {
        match self.data.take() {
            Some(guard) if guard.is_held() => drop(guard),
            _ => kpanic(Fatal::BufferNotHeld { op: "brelse" }),
        }
        self.cache.unref(self.id, self.dev, self.blockno, "brelse");
    }
}

// =============================================================================
// PIN
// =============================================================================

/// Referência extra a um buffer (bpin). Só `BlockCache::unpin` a consome.
#[must_use = "um pin esquecido mantém o buffer fora da eviction para sempre"]
#[derive(Debug, PartialEq, Eq)]
pub struct PinnedBuf {
    /// Endereço do `BlockCache` que emitiu o pin
    pub(super) cache: usize,
    pub(super) id: usize,
    pub(super) dev: u32,
    pub(super) blockno: u32,
}

impl PinnedBuf {
    pub fn dev(&self) -> u32 {
        self.dev
    }

    pub fn blockno(&self) -> u32 {
        self.blockno
    }
}
