//! Erros recuperáveis do alocador de páginas
//!
//! Uso indevido (double free, endereço fora da faixa no `free`) não passa
//! por aqui: é fatal e vai para `core::fatal`.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MmError {
    /// Lista livre vazia
    OutOfMemory,
    /// Fora da faixa gerenciada ou fora do `DirectMap`
    InvalidAddress,
    /// Não é início de página
    NotAligned,
}

impl fmt::Display for MmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::OutOfMemory => "sem páginas livres",
            Self::InvalidAddress => "endereço fora da faixa gerenciada",
            Self::NotAligned => "endereço não alinhado a página",
        })
    }
}

pub type MmResult<T> = Result<T, MmError>;
