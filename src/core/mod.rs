//! Core Module
//!
//! Infraestrutura comum aos subsistemas: logging, sinal fatal,
//! construção dos serviços no boot e self-test.

pub mod fatal;
pub mod init;
pub mod logging;
#[cfg(any(test, feature = "self_test"))]
pub mod selftest;
