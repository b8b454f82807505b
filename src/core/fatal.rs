//! Sinal Fatal do Kernel.
//!
//! Condições que indicam corrupção de estado ou bug no chamador não têm
//! caminho de recuperação: o kernel para. Tudo que é recuperável (ex.: falta
//! de páginas livres) volta como `Result` comum, nunca por aqui.
//!
//! # Comportamento
//! 1. Loga o motivo na console (`kerror!`), sem depender de `core::fmt`.
//! 2. Entra em `panic!` com a mensagem completa. Em bare metal o
//!    `#[panic_handler]` do kernel trava a CPU; em testes o harness
//!    captura o pânico.

use crate::drivers::block::BlockError;
use crate::mm::PhysAddr;
use core::fmt;

/// Motivo de parada do kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fatal {
    /// Nenhum buffer com refcount zero em nenhum bucket.
    CacheExhausted,
    /// Operação de buffer sem posse do sleeplock (`op` = "bwrite", "brelse").
    BufferNotHeld { op: &'static str },
    /// brelse com refcount já em zero.
    BufferRefUnderflow { dev: u32, blockno: u32 },
    /// O dispositivo falhou numa transferência.
    DiskTransfer {
        dev: u32,
        blockno: u32,
        write: bool,
        error: BlockError,
    },
    /// kfree de endereço não alinhado a página.
    PageMisaligned(PhysAddr),
    /// kfree fora da faixa gerenciada.
    PageOutOfRange(PhysAddr),
    /// kfree de página com refcount já em zero.
    PageDoubleFree(PhysAddr),
    /// add_reference em página livre ou fora da faixa.
    PageNotOwned(PhysAddr),
}

impl Fatal {
    /// Tag curta usada no log (sem formatação).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::CacheExhausted => "(BIO) bget: no buffers",
            Self::BufferNotHeld { op } => op,
            Self::BufferRefUnderflow { .. } => "(BIO) brelse: refcnt underflow blockno=",
            Self::DiskTransfer { .. } => "(BIO) disk transfer failed blockno=",
            Self::PageMisaligned(_) => "(PFM) kfree: misaligned pa=",
            Self::PageOutOfRange(_) => "(PFM) kfree: out of range pa=",
            Self::PageDoubleFree(_) => "(PFM) kfree cow: already free pa=",
            Self::PageNotOwned(_) => "(PFM) add_reference(): not owned pa=",
        }
    }

    /// Valor numérico associado ao motivo, se houver.
    pub fn value(&self) -> Option<u64> {
        match *self {
            Self::CacheExhausted | Self::BufferNotHeld { .. } => None,
            Self::BufferRefUnderflow { blockno, .. } | Self::DiskTransfer { blockno, .. } => {
                Some(blockno as u64)
            }
            Self::PageMisaligned(pa)
            | Self::PageOutOfRange(pa)
            | Self::PageDoubleFree(pa)
            | Self::PageNotOwned(pa) => Some(pa.as_u64()),
        }
    }
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CacheExhausted => write!(f, "bget: no buffers"),
            Self::BufferNotHeld { op } => write!(f, "{}: buffer not locked by caller", op),
            Self::BufferRefUnderflow { dev, blockno } => {
                write!(f, "brelse: refcnt underflow dev={} blockno={}", dev, blockno)
            }
            Self::DiskTransfer {
                dev,
                blockno,
                write,
                error,
            } => write!(
                f,
                "disk {} failed dev={} blockno={}: {}",
                if *write { "write" } else { "read" },
                dev,
                blockno,
                error
            ),
            Self::PageMisaligned(pa) => write!(f, "kfree: misaligned pa {:x}", pa),
            Self::PageOutOfRange(pa) => write!(f, "kfree: pa {:x} outside managed range", pa),
            Self::PageDoubleFree(pa) => write!(f, "kfree cow: pa {:x} already free", pa),
            Self::PageNotOwned(pa) => {
                write!(f, "add_reference(): pa {:x} not allocated or out of range", pa)
            }
        }
    }
}

/// Para o kernel.
#[cold]
#[inline(never)]
pub fn kpanic(reason: Fatal) -> ! {
    crate::kerror!("================ KERNEL PANIC ================");
    match reason.value() {
        Some(v) => crate::kerror!(reason.tag(), v),
        None => crate::kerror!(reason.tag()),
    }
    panic!("kernel panic: {}", reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages_carry_the_kernel_names() {
        assert_eq!(Fatal::CacheExhausted.to_string(), "bget: no buffers");
        assert!(Fatal::BufferNotHeld { op: "bwrite" }
            .to_string()
            .starts_with("bwrite"));
        assert!(Fatal::PageDoubleFree(PhysAddr::new(0x8010_0000))
            .to_string()
            .contains("0x80100000"));
    }

    #[test]
    #[should_panic(expected = "kernel panic: bget: no buffers")]
    fn kpanic_panics_with_reason() {
        kpanic(Fatal::CacheExhausted);
    }
}
