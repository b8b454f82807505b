//! # Addr - Wrapper Type-Safe para Endereços Físicos

mod phys;

pub use phys::PhysAddr;
