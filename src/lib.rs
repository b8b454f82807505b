//! Rescore — núcleo de recursos do kernel.
//!
//! Dois subsistemas concorrentes que o resto do kernel consome:
//!
//! - `fs::bcache` — buffer cache de blocos de disco, particionado em buckets
//!   com lock próprio e um lock global para o caminho de eviction.
//! - `mm::pfm` — alocador de páginas físicas com contagem de referências,
//!   usado pelo fork copy-on-write.
//!
//! Ambos são objetos de serviço construídos uma vez no boot
//! (`core::init::KernelResources`) e passados por referência.

#![cfg_attr(not(test), no_std)]

// Alocação dinâmica para as tabelas de slots/frames (Box/Vec)
extern crate alloc;

// --- Infraestrutura ---
pub mod core; // Logging, sinal fatal, boot, self-test
pub mod drivers; // Console serial (sink de log) e dispositivos de bloco
pub mod klib; // Alinhamento e framework de testes
pub mod sync; // Sleeplock

// --- Subsistemas ---
pub mod fs; // Buffer cache
pub mod mm; // Alocador de páginas físicas

pub use crate::core::fatal::{kpanic, Fatal};
pub use crate::core::init::KernelResources;
pub use crate::drivers::block::{BlockDevice, BlockError, RamDisk};
pub use crate::fs::bcache::{BlockCache, BufGuard, PinnedBuf};
pub use crate::mm::{DirectMap, MmError, MmResult, PageAllocator, PhysAddr};
