// =============================================================================
// KERNEL LOGGING SYSTEM - ZERO OVERHEAD
// =============================================================================
//
// Logging do núcleo de recursos com custo ZERO quando desabilitado.
//
// ARQUITETURA:
// - Features do Cargo fazem a filtragem em tempo de compilação
// - Com "no_logs", TODOS os macros viram blocos que não avaliam nada
// - SEM core::fmt - apenas strings literais + um valor em hexadecimal
// - Escreve via drivers::serial (sink instalado no boot)
//
// NÍVEIS DE LOG (do mais crítico ao menos):
// - ERROR: Erros fatais (cache esgotado, double free, falha de disco)
// - WARN:  Situações suspeitas mas recuperáveis (OOM de páginas)
// - INFO:  Inicialização dos subsistemas
// - DEBUG: Eventos do caminho lento (eviction, migração entre buckets)
// - TRACE: Cada transferência de disco, cada alocação
//
// COMO USAR:
//   kinfo!("(BIO) Inicializando...");          // Apenas string
//   kinfo!("(PFM) Páginas livres=", count);    // String + hex
//
// =============================================================================

// =============================================================================
// PREFIXOS COM CORES ANSI
// =============================================================================

pub const P_ERROR: &str = "\x1b[1;31m[ERRO]\x1b[0m ";
pub const P_WARN: &str = "\x1b[1;33m[WARN]\x1b[0m ";
pub const P_INFO: &str = "\x1b[32m[INFO]\x1b[0m ";
pub const P_DEBUG: &str = "\x1b[36m[DEBG]\x1b[0m ";
pub const P_TRACE: &str = "\x1b[35m[TRAC]\x1b[0m ";
pub const P_OK: &str = "\x1b[32m[OK]\x1b[0m ";

/// Emite uma linha completa: prefixo + mensagem (+ valor hex) + newline.
#[doc(hidden)]
#[inline]
pub fn emit_line(prefix: &str, msg: &str, val: Option<u64>) {
    crate::drivers::serial::emit_str(prefix);
    crate::drivers::serial::emit_str(msg);
    if let Some(v) = val {
        crate::drivers::serial::emit_hex(v);
    }
    crate::drivers::serial::emit_nl();
}

// =============================================================================
// MACROS DE LOG - NÍVEL ERROR
// =============================================================================

#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kerror {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_ERROR, $msg, None);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_ERROR, $msg, Some($val as u64));
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kerror {
    ($msg:expr) => {{
        if false {
            let _ = $msg;
        }
    }};
    ($msg:expr, $val:expr) => {{
        if false {
            let _ = ($msg, $val);
        }
    }};
}

// =============================================================================
// MACROS DE LOG - NÍVEL WARN
// =============================================================================

#[cfg(not(any(feature = "no_logs", feature = "log_error")))]
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_WARN, $msg, None);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_WARN, $msg, Some($val as u64));
    }};
}

#[cfg(any(feature = "no_logs", feature = "log_error"))]
#[macro_export]
macro_rules! kwarn {
    ($msg:expr) => {{
        if false {
            let _ = $msg;
        }
    }};
    ($msg:expr, $val:expr) => {{
        if false {
            let _ = ($msg, $val);
        }
    }};
}

// =============================================================================
// MACROS DE LOG - NÍVEL INFO
// =============================================================================

#[cfg(not(any(feature = "no_logs", feature = "log_error")))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_INFO, $msg, None);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_INFO, $msg, Some($val as u64));
    }};
}

#[cfg(any(feature = "no_logs", feature = "log_error"))]
#[macro_export]
macro_rules! kinfo {
    ($msg:expr) => {{
        if false {
            let _ = $msg;
        }
    }};
    ($msg:expr, $val:expr) => {{
        if false {
            let _ = ($msg, $val);
        }
    }};
}

// =============================================================================
// MACROS DE LOG - NÍVEL DEBUG
// =============================================================================

#[cfg(all(
    any(feature = "log_debug", feature = "log_trace"),
    not(feature = "no_logs")
))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_DEBUG, $msg, None);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_DEBUG, $msg, Some($val as u64));
    }};
}

#[cfg(not(all(
    any(feature = "log_debug", feature = "log_trace"),
    not(feature = "no_logs")
)))]
#[macro_export]
macro_rules! kdebug {
    ($msg:expr) => {{
        if false {
            let _ = $msg;
        }
    }};
    ($msg:expr, $val:expr) => {{
        if false {
            let _ = ($msg, $val);
        }
    }};
}

// =============================================================================
// MACROS DE LOG - NÍVEL TRACE
// =============================================================================

#[cfg(all(feature = "log_trace", not(feature = "no_logs")))]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_TRACE, $msg, None);
    }};
    ($msg:expr, $val:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_TRACE, $msg, Some($val as u64));
    }};
}

#[cfg(not(all(feature = "log_trace", not(feature = "no_logs"))))]
#[macro_export]
macro_rules! ktrace {
    ($msg:expr) => {{
        if false {
            let _ = $msg;
        }
    }};
    ($msg:expr, $val:expr) => {{
        if false {
            let _ = ($msg, $val);
        }
    }};
}

// =============================================================================
// MACROS DE STATUS (OK)
// =============================================================================

/// kok! - Log de sucesso (prefixo verde [OK]).
#[cfg(not(feature = "no_logs"))]
#[macro_export]
macro_rules! kok {
    ($msg:expr) => {{
        $crate::core::logging::emit_line($crate::core::logging::P_OK, $msg, None);
    }};
}

#[cfg(feature = "no_logs")]
#[macro_export]
macro_rules! kok {
    ($msg:expr) => {{
        if false {
            let _ = $msg;
        }
    }};
}
