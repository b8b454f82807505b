//! # Driver Layer
//!
//! Apenas o que o núcleo de recursos precisa para rodar e ser observado:
//!
//! | Driver   | Arquivo    | Papel                                     |
//! |----------|------------|-------------------------------------------|
//! | Serial   | `serial.rs`| Sink dos macros de log                    |
//! | Block    | `block/`   | Trait `BlockDevice` (DiskIO) + `RamDisk`  |
//!
//! ```text
//! ┌──────────────────────────┐
//! │     fs::bcache           │
//! └──────────────────────────┘
//!              ↓ read_block / write_block
//! ┌──────────────────────────┐
//! │  BlockDevice (virtio,    │
//! │  ATA, RamDisk, ...)      │
//! └──────────────────────────┘
//! ```

pub mod block;
pub mod serial;
