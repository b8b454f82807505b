//! # Funções de Alinhamento
//!
//! Operam sobre endereços físicos (`u64`). `align` deve ser potência de 2.

/// Alinha para cima ao próximo múltiplo de `align`.
///
/// `align_up(10, 4) -> 12`
#[inline(always)]
pub const fn align_up(val: u64, align: u64) -> u64 {
    (val + align - 1) & !(align - 1)
}

/// Alinha para baixo ao múltiplo anterior de `align`.
///
/// `align_down(10, 4) -> 8`
#[inline(always)]
pub const fn align_down(val: u64, align: u64) -> u64 {
    val & !(align - 1)
}

#[inline(always)]
pub const fn is_aligned(val: u64, align: u64) -> bool {
    val & (align - 1) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_rounding() {
        assert_eq!(align_up(0x8000_0001, 4096), 0x8000_1000);
        assert_eq!(align_up(0x8000_1000, 4096), 0x8000_1000);
        assert_eq!(align_down(0x8000_1FFF, 4096), 0x8000_1000);
        assert!(is_aligned(0x8000_2000, 4096));
        assert!(!is_aligned(0x8000_2008, 4096));
    }
}
