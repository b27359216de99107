//! Error types for Bus A and the verification harness.
//!
//! The CPU core itself never raises errors for normal operation (spec
//! §7): illegal/undocumented opcodes execute documented-by-convention
//! semantics rather than failing. Errors here are confined to the two
//! places spec §7 calls out as real failure modes: misconfiguration at
//! setup time, and harness-level mismatches.

use thiserror::Error;

/// Errors that can occur while configuring or driving Bus A.
#[derive(Debug, Error)]
pub enum BusError {
    /// `set_page_speed`/`install_accessor` was called with a page index
    /// outside the 24-bit address space.
    #[error("page index {0:#08x} exceeds the 24-bit address space")]
    PageOutOfRange(u32),

    /// A divisor passed to the speed-table builder does not fit in 4 bits.
    #[error("speed divisor {0:#x} does not fit in a nibble (must be <= 0xF)")]
    DivisorOutOfRange(u8),
}

/// Errors surfaced by the verification harness (spec §4.4, §6).
///
/// A verification mismatch is never fatal (spec §7): callers get a
/// structured diagnostic back and decide what to do with it.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The JSON test object didn't parse.
    #[error("failed to parse test case: {0}")]
    Parse(#[from] serde_json::Error),

    /// The test named an address/value pair that didn't fit in the
    /// declared widths (e.g. an address above 0xFFFFFF).
    #[error("test case {name:?} has an out-of-range value: {detail}")]
    MalformedCase { name: String, detail: String },
}
