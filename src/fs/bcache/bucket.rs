//! # Buckets
//!
//! Cada bucket é uma lista simplesmente encadeada por índice de slot. O
//! encadeamento mora no próprio slot (`Slot::next`); o `Chain` guarda só a
//! cabeça. Quem tem o `MutexGuard<Chain>` tem direito de mexer no `next`
//! dos membros daquele bucket.

use super::buf::Slot;
use core::sync::atomic::Ordering;

/// Fim de lista
pub(super) const NIL: u32 = u32::MAX;

pub(super) struct Chain {
    head: u32,
    len: usize,
}

impl Chain {
    pub(super) const fn new() -> Self {
        Self { head: NIL, len: 0 }
    }

    pub(super) fn len(&self) -> usize {
        self.len
    }

    /// Insere `id` na cabeça.
    pub(super) fn push_front<R>(&mut self, id: usize, slots: &[Slot<R>]) {
        slots[id].next.store(self.head, Ordering::Relaxed);
        self.head = id as u32;
        self.len += 1;
    }

    /// Remove `id` da lista. Retorna `false` se não era membro.
    pub(super) fn unlink<R>(&mut self, id: usize, slots: &[Slot<R>]) -> bool {
        let target = id as u32;
        let after = slots[id].next.load(Ordering::Relaxed);

        if self.head == target {
            self.head = after;
        } else {
            let mut cur = self.head;
            loop {
                if cur == NIL {
                    return false;
                }
                let next = slots[cur as usize].next.load(Ordering::Relaxed);
                if next == target {
                    slots[cur as usize].next.store(after, Ordering::Relaxed);
                    break;
                }
                cur = next;
            }
        }

        slots[id].next.store(NIL, Ordering::Relaxed);
        self.len -= 1;
        true
    }

    /// Percorre os índices dos slots na ordem da lista.
    pub(super) fn iter<'s, R>(&self, slots: &'s [Slot<R>]) -> ChainIter<'s, R> {
        ChainIter {
            cur: self.head,
            slots,
        }
    }
}

pub(super) struct ChainIter<'s, R> {
    cur: u32,
    slots: &'s [Slot<R>],
}

impl<R> Iterator for ChainIter<'_, R> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.cur == NIL {
            return None;
        }
        let id = self.cur as usize;
        self.cur = self.slots[id].next.load(Ordering::Relaxed);
        Some(id)
    }
}
