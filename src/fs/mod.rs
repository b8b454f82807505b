//! Camada de blocos do sistema de arquivos.
//!
//! Submódulos:
//! - `config`: tamanhos fixos (BSIZE, NBUF, NBUCKET).
//! - `bcache`: buffer cache com buckets e lock global de eviction.
//!
//! Inodes, diretórios e journal consomem esta camada de fora: pegam um
//! buffer travado e válido, alteram, gravam e soltam.

pub mod bcache;
pub mod config;

pub use bcache::{BlockCache, BufGuard, CacheStats, PinnedBuf};
