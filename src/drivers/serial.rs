// =============================================================================
// CONSOLE SERIAL - SINK DE LOG
// =============================================================================
//
// Ponto único por onde passa toda a saída dos macros k*!.
//
// ARQUITETURA:
// - O núcleo de recursos não conhece o hardware da console: quem faz o boot
//   registra um `ConsoleWriter` (UART, framebuffer, buffer de teste...)
// - Registro único via `spin::Once`; antes disso a saída é descartada
// - SEM core::fmt - apenas bytes, strings literais e hexadecimal
// - SEM alocação
//
// FUNÇÕES DISPONÍVEIS:
// - emit_str(s)      : Envia string literal
// - emit_hex(v)      : Envia u64 em hexadecimal
// - emit_nl()        : Envia newline (\r\n)
//
// NOTA IMPORTANTE:
// Não há exclusão mútua entre CPUs aqui. Linhas de contextos diferentes
// podem se intercalar; o writer decide se serializa ou não.
//
// =============================================================================

use spin::Once;

/// Destino dos bytes de log.
pub trait ConsoleWriter: Sync {
    /// Escreve os bytes na console. Nunca pode bloquear por muito tempo.
    fn write_bytes(&self, bytes: &[u8]);
}

static SINK: Once<&'static dyn ConsoleWriter> = Once::new();

// =============================================================================
// FUNÇÕES DE INICIALIZAÇÃO
// =============================================================================

/// Registra o writer da console.
///
/// Apenas o primeiro registro vale; chamadas seguintes retornam `false`.
pub fn install(writer: &'static dyn ConsoleWriter) -> bool {
    let mut installed = false;
    SINK.call_once(|| {
        installed = true;
        writer
    });
    installed
}

/// Indica se algum writer já foi registrado.
pub fn is_installed() -> bool {
    SINK.is_completed()
}

// =============================================================================
// FUNÇÕES DE ESCRITA - CORE
// =============================================================================

#[inline(always)]
fn write(bytes: &[u8]) {
    if let Some(sink) = SINK.get() {
        sink.write_bytes(bytes);
    }
}

/// Envia uma string.
#[inline(never)]
pub fn emit_str(s: &str) {
    write(s.as_bytes());
}

/// Envia uma nova linha (CRLF).
#[inline(never)]
pub fn emit_nl() {
    write(b"\r\n");
}

// =============================================================================
// FUNÇÕES DE ESCRITA - FORMATAÇÃO NUMÉRICA
// =============================================================================

/// Envia um valor u64 em formato hexadecimal.
///
/// Formato de saída: 0x0123456789ABCDEF (sempre 18 caracteres)
#[inline(never)]
pub fn emit_hex(value: u64) {
    write(&hex_digits(value));
}

// =============================================================================
// FUNÇÕES AUXILIARES
// =============================================================================

fn hex_digits(value: u64) -> [u8; 18] {
    let mut out = [0u8; 18];
    out[0] = b'0';
    out[1] = b'x';
    for i in 0..16 {
        let shift = 60 - i * 4;
        out[2 + i] = nibble_to_ascii(((value >> shift) & 0xF) as u8);
    }
    out
}

/// Converte nibble (0-15) para caractere ASCII ('0'-'9', 'A'-'F').
#[inline(always)]
const fn nibble_to_ascii(n: u8) -> u8 {
    if n < 10 {
        b'0' + n
    } else {
        b'A' + (n - 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_is_fixed_width_uppercase() {
        assert_eq!(&hex_digits(0), b"0x0000000000000000");
        assert_eq!(&hex_digits(0xDEAD_BEEF), b"0x00000000DEADBEEF");
        assert_eq!(&hex_digits(u64::MAX), b"0xFFFFFFFFFFFFFFFF");
    }

    #[test]
    fn nibbles() {
        assert_eq!(nibble_to_ascii(0), b'0');
        assert_eq!(nibble_to_ascii(9), b'9');
        assert_eq!(nibble_to_ascii(10), b'A');
        assert_eq!(nibble_to_ascii(15), b'F');
    }
}
