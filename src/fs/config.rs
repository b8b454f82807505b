//! # Configuração do Buffer Cache
//!
//! Tamanhos fixos; não há ajuste em runtime.

/// Tamanho de um bloco de disco (bytes)
pub const BSIZE: usize = 1024;

/// Máximo de blocos que uma operação do FS escreve
pub const MAXOPBLOCKS: usize = 10;

/// Slots de buffer no cache
pub const NBUF: usize = MAXOPBLOCKS * 3;

/// Buckets da tabela hash (primo, espalha blocos sequenciais)
pub const NBUCKET: usize = 17;

/// Dispositivo do sistema de arquivos raiz
pub const ROOTDEV: u32 = 1;

/// Bucket de um bloco
#[inline(always)]
pub const fn bucket_of(blockno: u32) -> usize {
    blockno as usize % NBUCKET
}
