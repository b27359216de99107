//! Ricoh 5A22 CPU core + Bus A
//!
//! A cycle-accurate emulation of the 65C816-derived CPU at the heart of
//! the Ricoh 5A22, and the 24-bit address bus ("Bus A") it drives. No
//! OS APIs are used — all state lives in plain Rust structs driven by
//! whatever host the caller builds around this crate.
//!
//! # Architecture
//!
//! - `bus`: the 24-bit address bus — per-page accessor table, speed
//!   table, open-bus data latch (components C1-C3)
//! - `cpu`: the CPU core — register file, instruction table, addressing
//!   modes, micro-op engine, interrupt/RDY controller, clock accounting
//!   (components C4-C7, C9-C10)
//! - `error`: the small local error types for bus misconfiguration and
//!   verification-harness failures
//! - `verify`: the single-step JSON verification harness (component C8)
//!
//! # Emulation vs. native mode
//!
//! The 65816 at the heart of the 5A22 boots into 6502-compatible
//! emulation mode (`Registers::e == true`) and only enters its full
//! 16-bit native mode after software executes `CLC; XCE`. Nearly every
//! addressing mode and instruction in `cpu` branches on this flag (and
//! on the `P.M`/`P.X` width flags that only mean anything once native
//! mode is entered) — see `cpu`'s module doc for the full breakdown.
//!
//! # Out of scope
//!
//! PPU/APU/DMA/HDMA/joypad, Bus B, save-state serialization, file I/O,
//! decompression, rendering, audio, input, and disassembly beyond bare
//! opcode metadata are all out of scope for this crate; see `DESIGN.md`
//! for the full non-goal list and the reasoning behind each cut.

pub mod bus;
pub mod cpu;
pub mod error;
pub mod verify;

pub use bus::BusA;
pub use cpu::Cpu;
pub use error::{BusError, VerifyError};
