//! # Synchronization Primitives
//!
//! ## Hierarquia de Uso
//!
//! ```text
//! spin::Mutex → Seções críticas curtas (buckets, lock global, alocador)
//! SleepLock   → Posse exclusiva de um buffer, mantida durante I/O
//! ```
//!
//! ## Regras
//!
//! - **spin::Mutex**: nunca mantido durante operação bloqueante
//! - **SleepLock**: nunca adquirido com um spin::Mutex na mão
//! - **Ordem de Lock**: global do cache → bucket origem → bucket destino

/// Sleeplock (posse longa, com ticket de dono)
pub mod sleeplock;

pub use sleeplock::{SleepLock, SleepLockGuard};
