//! # Frame Table
//!
//! Metadados de todas as páginas gerenciadas: refcount por página e a lista
//! livre encadeada por índice (`next[i]` aponta para a próxima livre).
//!
//! Nada aqui é sincronizado; a tabela inteira vive atrás do lock do
//! `PageAllocator`.

use alloc::boxed::Box;
use alloc::vec;

/// Fim de lista
pub(super) const NIL: u32 = u32::MAX;

pub(super) struct FrameTable {
    refs: Box<[u32]>,
    next: Box<[u32]>,
    free_head: u32,
    free_len: usize,
}

impl FrameTable {
    /// Tabela com `count` páginas, todas fora da lista livre e com refcount 0.
    pub(super) fn new(count: usize) -> Self {
        Self {
            refs: vec![0; count].into_boxed_slice(),
            next: vec![NIL; count].into_boxed_slice(),
            free_head: NIL,
            free_len: 0,
        }
    }

    #[inline]
    pub(super) fn free_len(&self) -> usize {
        self.free_len
    }

    #[inline]
    pub(super) fn refcount(&self, idx: usize) -> u32 {
        self.refs[idx]
    }

    #[inline]
    pub(super) fn set_refcount(&mut self, idx: usize, value: u32) {
        self.refs[idx] = value;
    }

    /// Incrementa e retorna o novo valor.
    #[inline]
    pub(super) fn inc_ref(&mut self, idx: usize) -> u32 {
        self.refs[idx] += 1;
        self.refs[idx]
    }

    /// Decrementa e retorna o novo valor. O chamador garante refcount >= 1.
    #[inline]
    pub(super) fn dec_ref(&mut self, idx: usize) -> u32 {
        self.refs[idx] -= 1;
        self.refs[idx]
    }

    /// Empilha `idx` na lista livre.
    pub(super) fn push_free(&mut self, idx: usize) {
        debug_assert_eq!(self.refs[idx], 0);
        self.next[idx] = self.free_head;
        self.free_head = idx as u32;
        self.free_len += 1;
    }

    /// Desempilha a página livre do topo.
    pub(super) fn pop_free(&mut self) -> Option<usize> {
        if self.free_head == NIL {
            return None;
        }
        let idx = self.free_head as usize;
        self.free_head = self.next[idx];
        self.next[idx] = NIL;
        self.free_len -= 1;
        Some(idx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_list_is_lifo() {
        let mut t = FrameTable::new(3);
        assert_eq!(t.pop_free(), None);
        t.push_free(0);
        t.push_free(2);
        assert_eq!(t.free_len(), 2);
        assert_eq!(t.pop_free(), Some(2));
        assert_eq!(t.pop_free(), Some(0));
        assert_eq!(t.pop_free(), None);
        assert_eq!(t.free_len(), 0);
    }

    #[test]
    fn refcounts() {
        let mut t = FrameTable::new(1);
        t.set_refcount(0, 1);
        assert_eq!(t.inc_ref(0), 2);
        assert_eq!(t.dec_ref(0), 1);
        assert_eq!(t.refcount(0), 1);
    }
}
