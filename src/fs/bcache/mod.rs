//! # Buffer Cache
//!
//! Cache de blocos de disco com `NBUF` slots fixos e tabela hash de
//! `NBUCKET` buckets, cada um com seu próprio `spin::Mutex`.
//!
//! ## Caminhos
//!
//! ```text
//! acquire(dev, blockno)
//!   │  bucket = blockno % NBUCKET
//!   ├─ HIT:  lock bucket → refcnt++ → unlock → sleeplock
//!   └─ MISS: unlock bucket → lock global
//!            → re-checa o bucket alvo (outro miss pode ter inserido)
//!            → varre buckets 0..NBUCKET atrás de slot com refcnt 0
//!            → move para o bucket alvo (destino travado junto da origem)
//!            → identidade nova, inválido, refcnt 1
//!            → unlock tudo → sleeplock
//! ```
//!
//! ## Ordem de locks
//!
//! `global` → bucket origem → bucket destino. Dois locks de bucket só são
//! mantidos juntos por quem tem o `global`. O sleeplock de um buffer nunca
//! é pedido com qualquer `spin::Mutex` na mão.
//!
//! ## Fatal
//!
//! - nenhum slot reciclável: `bget: no buffers`
//! - bwrite/brelse sem posse do sleeplock
//! - falha de transferência do dispositivo

mod buf;
mod bucket;
pub mod stats;

#[cfg(test)]
mod test;

use crate::core::fatal::{kpanic, Fatal};
use crate::drivers::block::BlockDevice;
use crate::fs::config::{bucket_of, NBUCKET, NBUF};
use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec::Vec;
use bucket::Chain;
use buf::Slot;
use core::sync::atomic::Ordering;
use spin::relax::{RelaxStrategy, Spin};
use spin::Mutex;
use stats::Counters;

pub use buf::{BufFlags, BufGuard, PinnedBuf, NO_DEV};
pub use stats::CacheStats;

/// Foto de um slot (para auditoria das listas)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resident {
    pub id: usize,
    pub dev: u32,
    pub blockno: u32,
    pub refcnt: u32,
    pub bucket: usize,
    pub flags: BufFlags,
}

pub struct BlockCache<R = Spin> {
    disk: Arc<dyn BlockDevice>,
    /// Serializa misses (scan + eviction) e pin/unpin
    global: Mutex<()>,
    buckets: Box<[Mutex<Chain>]>,
    slots: Box<[Slot<R>]>,
    counters: Counters,
}

impl BlockCache {
    /// Cache com espera em spin (bare metal).
    pub fn new(disk: Arc<dyn BlockDevice>) -> Self {
        Self::with_relax(disk)
    }
}

impl<R: RelaxStrategy> BlockCache<R> {
    /// Cache cuja espera pelo sleeplock de um buffer usa `R`.
    ///
    /// Os slots começam com identidade `(NO_DEV, id)` e ficam no bucket
    /// `id % NBUCKET`, o mesmo que `bucket_of(id)` calcularia.
    pub fn with_relax(disk: Arc<dyn BlockDevice>) -> Self {
        crate::kinfo!("(BIO) Inicializando buffer cache, slots=", NBUF);

        let slots: Box<[Slot<R>]> = (0..NBUF as u32).map(Slot::new).collect();
        let mut chains: Vec<Chain> = (0..NBUCKET).map(|_| Chain::new()).collect();
        for id in 0..NBUF {
            chains[bucket_of(id as u32)].push_front(id, &slots);
        }
        let buckets: Box<[Mutex<Chain>]> = chains.into_iter().map(Mutex::new).collect();

        crate::kdebug!("(BIO) Buckets=", NBUCKET);
        Self {
            disk,
            global: Mutex::new(()),
            buckets,
            slots,
            counters: Counters::default(),
        }
    }

    // =========================================================================
    // ACQUIRE / READ / WRITE / RELEASE
    // =========================================================================

    /// bget: devolve o buffer de `(dev, blockno)` travado, válido ou não.
    pub fn acquire(&self, dev: u32, blockno: u32) -> BufGuard<'_, R> {
        let target = bucket_of(blockno);

        if let Some(id) = self.try_hit(target, dev, blockno) {
            return self.lock_slot(id, dev, blockno);
        }

        let global = self.global.lock();

        // Outro miss do mesmo bloco pode ter terminado entre o unlock do
        // bucket e o lock global.
        if let Some(id) = self.try_hit(target, dev, blockno) {
            drop(global);
            return self.lock_slot(id, dev, blockno);
        }

        for i in 0..NBUCKET {
            let mut src = self.buckets[i].lock();
            let Some(victim) = src
                .iter(&self.slots)
                .find(|&id| self.slots[id].evictable())
            else {
                continue;
            };

            let slot = &self.slots[victim];
            let had_data = slot.flags().contains(BufFlags::VALID);

            if i == target {
                // mesmo bucket: só vai para a cabeça
                src.unlink(victim, &self.slots);
                src.push_front(victim, &self.slots);
                slot.claim(dev, blockno);
            } else {
                let mut dst = self.buckets[target].lock();
                src.unlink(victim, &self.slots);
                dst.push_front(victim, &self.slots);
                slot.claim(dev, blockno);
                drop(dst);
                crate::ktrace!("(BIO) Slot migrado do bucket=", i);
            }
            drop(src);
            drop(global);

            Counters::bump(&self.counters.misses);
            if had_data {
                Counters::bump(&self.counters.evictions);
            }
            crate::ktrace!("(BIO) Miss, bloco=", blockno);
            return self.lock_slot(victim, dev, blockno);
        }

        drop(global);
        crate::kerror!("(BIO) Nenhum slot reciclável, bloco=", blockno);
        kpanic(Fatal::CacheExhausted)
    }

    /// bread: buffer travado com o conteúdo do disco.
    pub fn read(&self, dev: u32, blockno: u32) -> BufGuard<'_, R> {
        let mut b = self.acquire(dev, blockno);
        if !b.is_valid() {
            self.transfer(&mut b, false);
            self.slots[b.id()].set(BufFlags::VALID);
        }
        b
    }

    /// bwrite: grava o conteúdo do buffer no disco. Exige posse.
    pub fn write(&self, b: &mut BufGuard<'_, R>) {
        if !core::ptr::eq(b.cache, self) || !b.is_held() {
            kpanic(Fatal::BufferNotHeld { op: "bwrite" });
        }
        self.transfer(b, true);
    }

    /// brelse explícito. Equivale a soltar o guard.
    pub fn release(&self, b: BufGuard<'_, R>) {
        if !core::ptr::eq(b.cache, self) {
            kpanic(Fatal::BufferNotHeld { op: "brelse" });
        }
        drop(b);
    }

    // =========================================================================
    // PIN / UNPIN
    // =========================================================================

    /// bpin: referência extra que mantém o bloco em cache.
    pub fn pin(&self, b: &BufGuard<'_, R>) -> PinnedBuf {
        if !core::ptr::eq(b.cache, self) || !b.is_held() {
            kpanic(Fatal::BufferNotHeld { op: "bpin" });
        }
        let _global = self.global.lock();
        let _chain = self.buckets[bucket_of(b.blockno())].lock();
        self.slots[b.id()].refcnt.fetch_add(1, Ordering::Relaxed);
        PinnedBuf {
            cache: self.addr(),
            id: b.id(),
            dev: b.dev(),
            blockno: b.blockno(),
        }
    }

    /// bunpin: devolve a referência de `pin`. O pin precisa ser deste cache.
    pub fn unpin(&self, pin: PinnedBuf) {
        if pin.cache != self.addr() {
            kpanic(Fatal::BufferNotHeld { op: "bunpin" });
        }
        let _global = self.global.lock();
        self.unref(pin.id, pin.dev, pin.blockno, "bunpin");
    }

    // =========================================================================
    // CONSULTAS
    // =========================================================================

    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// O bloco tem um slot no cache (válido ou não)?
    pub fn contains(&self, dev: u32, blockno: u32) -> bool {
        let chain = self.buckets[bucket_of(blockno)].lock();
        let found = chain.iter(&self.slots).any(|id| self.slots[id].is(dev, blockno));
        found
    }

    /// Percorre todas as listas, um bucket por vez.
    pub fn residents(&self) -> Vec<Resident> {
        let mut out = Vec::with_capacity(NBUF);
        for (bucket, lock) in self.buckets.iter().enumerate() {
            let chain = lock.lock();
            for id in chain.iter(&self.slots) {
                let s = &self.slots[id];
                out.push(Resident {
                    id,
                    dev: s.dev.load(Ordering::Relaxed),
                    blockno: s.blockno.load(Ordering::Relaxed),
                    refcnt: s.refcnt.load(Ordering::Relaxed),
                    bucket,
                    flags: s.flags(),
                });
            }
            debug_assert_eq!(chain.len(), out.iter().filter(|r| r.bucket == bucket).count());
        }
        out
    }

    // =========================================================================
    // AUXILIARES
    // =========================================================================

    #[inline]
    fn slot(&self, id: usize) -> &Slot<R> {
        &self.slots[id]
    }

    /// Identidade do cache gravada nos pins
    #[inline]
    fn addr(&self) -> usize {
        self as *const Self as usize
    }

    /// Procura no bucket e, achando, registra mais um dono.
    fn try_hit(&self, bucket: usize, dev: u32, blockno: u32) -> Option<usize> {
        let chain = self.buckets[bucket].lock();
        let id = chain.iter(&self.slots).find(|&id| self.slots[id].is(dev, blockno))?;
        self.slots[id].refcnt.fetch_add(1, Ordering::Relaxed);
        drop(chain);
        Counters::bump(&self.counters.hits);
        Some(id)
    }

    fn lock_slot(&self, id: usize, dev: u32, blockno: u32) -> BufGuard<'_, R> {
        let data = self.slots[id].data.lock();
        BufGuard::new(self, id, dev, blockno, data)
    }

    /// Decrementa o refcount sob o lock do bucket do bloco.
    ///
    /// O slot precisa ainda ter a identidade `(dev, blockno)`; `op` nomeia
    /// quem devolve a referência no sinal fatal.
    fn unref(&self, id: usize, dev: u32, blockno: u32, op: &'static str) {
        let chain = self.buckets[bucket_of(blockno)].lock();
        let slot = &self.slots[id];
        if !slot.is(dev, blockno) {
            drop(chain);
            kpanic(Fatal::BufferNotHeld { op });
        }
        let refcnt = &slot.refcnt;
        if refcnt.load(Ordering::Relaxed) == 0 {
            drop(chain);
            kpanic(Fatal::BufferRefUnderflow { dev, blockno });
        }
        refcnt.fetch_sub(1, Ordering::Relaxed);
    }

    fn transfer(&self, b: &mut BufGuard<'_, R>, write: bool) {
        let (id, dev, blockno) = (b.id(), b.dev(), b.blockno());
        let slot = &self.slots[id];

        slot.set(BufFlags::DISK);
        let result = self.disk.transfer(dev, blockno, &mut b.data_mut()[..], write);
        slot.clear(BufFlags::DISK);

        if let Err(error) = result {
            kpanic(Fatal::DiskTransfer {
                dev,
                blockno,
                write,
                error,
            });
        }

        if write {
            Counters::bump(&self.counters.disk_writes);
            crate::ktrace!("(BIO) Disco <- bloco=", blockno);
        } else {
            Counters::bump(&self.counters.disk_reads);
            crate::ktrace!("(BIO) Disco -> bloco=", blockno);
        }
    }
}
