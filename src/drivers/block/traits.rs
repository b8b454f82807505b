//! # Camada de Abstração de Dispositivos de Bloco
//!
//! ## Arquitetura
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              fs::bcache (BlockCache)                │
//! └─────────────────────────────────────────────────────┘
//!                          ↓ transfer(dev, blockno, buf, write)
//! ┌─────────────────────────────────────────────────────┐
//! │              BlockDevice Trait                      │
//! │   read_block() write_block() block_size()           │
//! └─────────────────────────────────────────────────────┘
//!                          ↓
//! ┌─────────────────────────────────────────────────────┐
//! │              DRIVERS (VirtIO, ATA, RamDisk)         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Transferências são síncronas: quando `read_block` retorna `Ok`, o buffer
//! inteiro foi preenchido; quando `write_block` retorna `Ok`, o bloco está
//! persistido.

use crate::fs::config::BSIZE;
use core::fmt;

/// Por que uma transferência não aconteceu.
///
/// Para o buffer cache qualquer um destes é fatal; a distinção serve ao log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockError {
    /// `blockno` além da capacidade do dispositivo
    OutOfRange,
    /// Buffer com tamanho diferente de `block_size()`
    BadLength,
    /// Escrita em dispositivo somente leitura
    ReadOnly,
    /// O dispositivo reportou falha
    Io,
}

impl fmt::Display for BlockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Self::OutOfRange => "bloco fora do dispositivo",
            Self::BadLength => "buffer não tem o tamanho de um bloco",
            Self::ReadOnly => "dispositivo somente leitura",
            Self::Io => "falha de I/O",
        };
        f.write_str(msg)
    }
}

/// Trait para dispositivos de bloco (DiskIO do buffer cache)
///
/// # Exemplo
///
/// ```ignore
/// let mut buf = [0u8; BSIZE];
/// disk.read_block(ROOTDEV, 10, &mut buf)?;
/// ```
pub trait BlockDevice: Send + Sync {
    /// Lê um bloco inteiro de `dev` para `buf` (exatamente `block_size` bytes)
    fn read_block(&self, dev: u32, blockno: u32, buf: &mut [u8]) -> Result<(), BlockError>;

    /// Escreve `buf` (exatamente `block_size` bytes) no bloco de `dev`
    fn write_block(&self, dev: u32, blockno: u32, buf: &[u8]) -> Result<(), BlockError>;

    /// Tamanho do bloco em bytes
    fn block_size(&self) -> usize {
        BSIZE
    }

    /// Verifica se o dispositivo é somente leitura
    fn is_read_only(&self) -> bool {
        false
    }

    /// Transferência no formato do buffer cache: um bloco, numa direção.
    fn transfer(&self, dev: u32, blockno: u32, buf: &mut [u8], write: bool) -> Result<(), BlockError> {
        if buf.len() != self.block_size() {
            return Err(BlockError::BadLength);
        }
        if write {
            if self.is_read_only() {
                return Err(BlockError::ReadOnly);
            }
            self.write_block(dev, blockno, buf)
        } else {
            self.read_block(dev, blockno, buf)
        }
    }
}
