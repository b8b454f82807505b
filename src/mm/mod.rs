//! # Memory Management Subsystem (MM)
//!
//! Gerência de páginas físicas do núcleo de recursos.
//!
//! | Módulo   | Responsabilidade                                          |
//! |----------|-----------------------------------------------------------|
//! | `config` | Tamanho de página, layout físico, padrões de preenchimento |
//! | `addr`   | `PhysAddr`                                                |
//! | `hhdm`   | `DirectMap`: acesso ao conteúdo das páginas gerenciadas   |
//! | `error`  | `MmError` / `MmResult` (falhas recuperáveis)              |
//! | `pfm`    | `PageAllocator` com refcount para COW                     |
//!
//! ```text
//! boot ──▶ MemoryLayout + DirectMap ──▶ PageAllocator::new
//!                                          │
//!         VM / fork (COW) ◀── alloc / free / add_ref / break_cow
//! ```

pub mod addr;
pub mod config;
pub mod error;
pub mod hhdm;
pub mod pfm;

pub use addr::PhysAddr;
pub use config::{MemoryLayout, PAGE_SIZE};
pub use error::{MmError, MmResult};
pub use hhdm::{DirectMap, Frame};
pub use pfm::{PageAllocator, PageStats};
