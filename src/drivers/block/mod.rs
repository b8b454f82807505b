//! # Dispositivos de Bloco
//!
//! | Driver      | Descrição                               |
//! |-------------|-----------------------------------------|
//! | `RamDisk`   | Disco em memória (boot de teste, testes) |
//!
//! Drivers de hardware implementam `BlockDevice` fora deste núcleo.

pub mod ramdisk;
pub mod traits;

pub use ramdisk::RamDisk;
pub use traits::{BlockDevice, BlockError};
