//! # RamDisk
//!
//! Disco em memória. Blocos nunca escritos são lidos como zero; o
//! armazenamento é esparso (só blocos escritos ocupam memória).
//!
//! Conta cada transferência, o que permite verificar quantas vezes o
//! buffer cache realmente foi ao disco.

use super::traits::{BlockDevice, BlockError};
use crate::fs::config::BSIZE;
use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use spin::Mutex;

/// Nenhuma falha programada
const NO_FAULT: u32 = u32::MAX;

pub struct RamDisk {
    blocks: Mutex<BTreeMap<(u32, u32), Box<[u8; BSIZE]>>>,
    /// Blocos por dispositivo
    capacity: u32,
    read_only: AtomicBool,
    reads: AtomicU64,
    writes: AtomicU64,
    /// Bloco cuja próxima transferência falha com `BlockError::Io`
    fault_at: AtomicU32,
}

impl RamDisk {
    /// Disco com `capacity` blocos por dispositivo.
    pub fn new(capacity: u32) -> Self {
        Self {
            blocks: Mutex::new(BTreeMap::new()),
            capacity,
            read_only: AtomicBool::new(false),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            fault_at: AtomicU32::new(NO_FAULT),
        }
    }

    /// Leituras completadas com sucesso
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Escritas completadas com sucesso
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    pub fn set_read_only(&self, ro: bool) {
        self.read_only.store(ro, Ordering::Relaxed);
    }

    /// Faz a próxima transferência de `blockno` falhar com `BlockError::Io`.
    pub fn fail_next(&self, blockno: u32) {
        self.fault_at.store(blockno, Ordering::Relaxed);
    }

    /// Conteúdo atual de um bloco, sem passar pelos contadores.
    pub fn peek(&self, dev: u32, blockno: u32) -> [u8; BSIZE] {
        match self.blocks.lock().get(&(dev, blockno)) {
            Some(b) => **b,
            None => [0; BSIZE],
        }
    }

    /// Grava um bloco diretamente, sem passar pelos contadores.
    pub fn poke(&self, dev: u32, blockno: u32, data: &[u8; BSIZE]) {
        self.blocks.lock().insert((dev, blockno), Box::new(*data));
    }

    fn check(&self, blockno: u32, len: usize) -> Result<(), BlockError> {
        if blockno >= self.capacity {
            return Err(BlockError::OutOfRange);
        }
        if len != BSIZE {
            return Err(BlockError::BadLength);
        }
        if self
            .fault_at
            .compare_exchange(blockno, NO_FAULT, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            return Err(BlockError::Io);
        }
        Ok(())
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&self, dev: u32, blockno: u32, buf: &mut [u8]) -> Result<(), BlockError> {
        self.check(blockno, buf.len())?;
        match self.blocks.lock().get(&(dev, blockno)) {
            Some(b) => buf.copy_from_slice(&b[..]),
            None => buf.fill(0),
        }
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn write_block(&self, dev: u32, blockno: u32, buf: &[u8]) -> Result<(), BlockError> {
        if self.is_read_only() {
            return Err(BlockError::ReadOnly);
        }
        self.check(blockno, buf.len())?;
        let mut block = Box::new([0u8; BSIZE]);
        block.copy_from_slice(buf);
        self.blocks.lock().insert((dev, blockno), block);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Relaxed)
    }
}
