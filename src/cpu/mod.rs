//! The Ricoh 5A22 CPU core: a 65C816-derived processor in its
//! emulation-mode/native-mode duality (spec §2-§4, components C4-C7,
//! C9-C10).
//!
//! # Module organization
//!
//! - `flags`: `P` status-register bit constants
//! - `registers`: the visible register file and its width/emulation
//!   invariants (component C4)
//! - `table`: the static 256-entry opcode table, mnemonics and
//!   addressing modes (component C5)
//! - `addressing`: addressing-mode effective-address resolution
//! - `microcode`: the tagged micro-op type and its dispatch (component C6)
//! - `ops`: the ~100 instruction semantic implementations (component C10)
//! - `interrupt`: the NMI/IRQ/RESET controller (component C7)
//! - `clock`: per-`step()` cycle accounting (component C9)
//! - `state`: per-instruction scratch and the DMA freeze/restore unit
//!
//! Grounded throughout in the teacher's `cpu/mod.rs` module layout and
//! its `step(&mut self, bus: &mut Bus) -> u32` shape — this crate
//! follows the same "CPU borrows the bus for the duration of one call"
//! convention rather than storing a bus reference as a `Cpu` field,
//! which is the idiomatic-Rust reading of spec §3's "the CPU is
//! constructed with a reference to the bus" (a stored `&'a mut BusA`
//! field would tie `Cpu`'s lifetime to the bus's for no benefit, since
//! every public entry point already takes `&mut BusA`).
//!
//! [`Cpu::tick`] is the real external stepping primitive: one call runs
//! exactly one [`microcode::MicroOp`] (or, at an instruction boundary,
//! either the next opcode fetch or a full interrupt-service sequence)
//! and returns to the caller, per spec §5's "each tick call completes
//! and returns to the host scheduler" concurrency model. [`Cpu::step`]
//! is a thin convenience loop over `tick` that runs until an
//! instruction (or interrupt sequence) completes, for callers that
//! don't need the finer granularity. See `DESIGN.md` for where this
//! still falls short of spec §4.2's literal per-Phi1/Phi2-half-cycle
//! `Tick`/`TickPhi2` split, and why.

pub mod flags;
mod addressing;
mod clock;
mod interrupt;
mod microcode;
mod ops;
mod registers;
mod state;
mod table;

#[cfg(test)]
mod tests;

pub use clock::ClockAccounting;
pub use interrupt::{InterruptController, PendingInterrupt};
pub use registers::Registers;
pub use state::FullState;
pub use table::{AddressingMode, Mnemonic};

use crate::bus::{AccessSource, BusA};
use state::ExecState;

/// The CPU core: register file, interrupt/RDY controller, clock
/// accounting, and the scratch state threaded through one in-progress
/// instruction (spec §3, component C4/C6/C7/C9).
pub struct Cpu {
    pub regs: Registers,
    pub interrupt: InterruptController,
    pub clock: ClockAccounting,
    state: ExecState,
    /// Set by `STP`; cleared only by a hardware reset (spec §4.2.2).
    stopped: bool,
    /// Set by `WAI`; cleared once an enabled interrupt line asserts
    /// (spec §4.2.2). Whether the interrupt is then actually serviced
    /// still depends on `P.I` for IRQ, same as normal.
    waiting: bool,
    /// Pauses `tick()` while low (spec §4.3's RDY pin). Checked on every
    /// `tick()` call, so a RDY deassertion mid-instruction freezes the
    /// CPU between micro-ops rather than only at instruction boundaries;
    /// still coarser than spec §4.3's literal "paused only on read
    /// cycles" wording, since a micro-op that issues more than one bus
    /// access can't be interrupted partway through — see `DESIGN.md`.
    ready: bool,
    /// The opcode and micro-op cursor of the instruction currently in
    /// flight, or `None` at an instruction boundary. Lets [`Cpu::tick`]
    /// suspend and resume one micro-op at a time instead of running an
    /// entire instruction per call.
    pending: Option<(u8, usize)>,
}

/// What one [`Cpu::tick`] call did (spec §4.2's per-tick host-visible
/// outcome).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickResult {
    /// RDY was low, or the CPU is stopped/waiting; nothing happened.
    Idle,
    /// Ran one micro-op; the instruction (or interrupt sequence) in
    /// flight is not yet complete.
    Progressed,
    /// The micro-op just run was the last one in its instruction.
    InstructionComplete,
    /// RESET/NMI/IRQ was serviced in full at this instruction boundary.
    InterruptServiced(PendingInterrupt),
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self {
            regs: Registers::reset(),
            interrupt: InterruptController::new(),
            clock: ClockAccounting::new(),
            state: ExecState::default(),
            stopped: false,
            waiting: false,
            ready: true,
            pending: None,
        }
    }

    /// Drive a hardware RESET (spec §4.2/§4.3, §8 scenario 1): two
    /// dummy opcode-shaped fetches, three "aborted" stack pushes that
    /// read instead of write without moving `S`, then the vector
    /// fetch, entering emulation mode throughout.
    ///
    /// Real 65816 hardware decrements `S` on each aborted push; this
    /// crate instead leaves `S` at its post-reset `0x01FF` (see spec
    /// §8 scenario 1's concrete expectation) since the pre-reset value
    /// `S` would have decremented from is architecturally undefined
    /// anyway — resolved this way per `DESIGN.md`.
    pub fn reset(&mut self, bus: &mut BusA) {
        self.regs = Registers::reset();
        self.interrupt = InterruptController::new();
        self.state = ExecState::default();
        self.stopped = false;
        self.waiting = false;
        self.ready = true;
        self.pending = None;
        self.clock.mark(bus.access_count());

        bus.read_bank0(self.regs.pc, AccessSource::Cpu);
        bus.read_bank0(self.regs.pc, AccessSource::Cpu);
        for _ in 0..3 {
            bus.read_bank0(self.regs.s, AccessSource::Cpu);
        }
        let lo = bus.read_bank0(interrupt::NATIVE_VECTORS.reset, AccessSource::Cpu);
        let hi = bus.read_bank0(interrupt::NATIVE_VECTORS.reset.wrapping_add(1), AccessSource::Cpu);
        self.regs.pc = u16::from_le_bytes([lo, hi]);
        self.regs.pbr = 0;
        self.regs.enforce_emulation_invariants();
    }

    /// Feed the `/NMI` line level; call once per instruction boundary
    /// (spec §4.3).
    pub fn set_nmi_line(&mut self, level: bool) {
        self.interrupt.set_nmi_line(level);
    }

    /// Feed the `/IRQ` line level (spec §4.3).
    pub fn set_irq_line(&mut self, level: bool) {
        self.interrupt.set_irq_line(level);
    }

    /// Assert the RDY pin low, pausing `tick()` until released (spec §4.3).
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    /// Snapshot state for a DMA hijack (spec §4.3, component C7). Can
    /// land mid-instruction, between any two micro-ops — see
    /// `state::FullState`'s doc comment for the residual gap against a
    /// literal per-half-cycle freeze point.
    pub fn freeze_for_dma(&self) -> FullState {
        FullState::new(self.regs, self.state, self.pending)
    }

    /// Restore state captured by `freeze_for_dma` once DMA releases
    /// the bus.
    pub fn resume_from_dma(&mut self, snapshot: FullState) {
        self.regs = snapshot.registers;
        self.state = snapshot.exec;
        self.pending = snapshot.pending;
    }

    /// Charge cycles consumed by an external bus master (DMA/HDMA,
    /// spec §4.3) so the next `step()`'s reported delta reflects them.
    pub fn charge_external_cycles(&mut self, cycles: u64) {
        self.clock.charge_external(cycles);
    }

    /// Advance by exactly one [`microcode::MicroOp`] (spec §4.2's
    /// per-tick granularity). A mid-instruction DMA hijack, or RDY
    /// dropping low, can only ever land between two calls to this
    /// function — never inside one, since a single micro-op's bus
    /// accesses always run to completion together.
    ///
    /// At an instruction boundary (`pending` is `None`), this either
    /// services a pending RESET/NMI/IRQ in full (spec §4.3's priority
    /// order) or fetches the next opcode and starts its micro-op
    /// sequence; otherwise it runs the next queued micro-op.
    pub fn tick(&mut self, bus: &mut BusA) -> TickResult {
        if self.stopped || !self.ready {
            return TickResult::Idle;
        }

        if let Some((opcode, cursor)) = self.pending {
            let ops = &table::INSTRUCTION_TABLE[opcode as usize].ops;
            let op = ops[cursor];
            let total = ops.len();
            microcode::dispatch(self, bus, op);
            if cursor + 1 >= total {
                self.pending = None;
                return TickResult::InstructionComplete;
            }
            self.pending = Some((opcode, cursor + 1));
            return TickResult::Progressed;
        }

        let which = self.interrupt.poll(self.regs.flag(flags::I));
        // Spec §4.2.2: WAI wakes on any asserted line, serviced or not —
        // a masked IRQ (P.I=1) still must clear `waiting` even though
        // `poll` won't select it for servicing, or the CPU would deadlock
        // forever on a line that's asserted but never unmasked.
        if which.is_some() || self.interrupt.any_asserted() {
            self.waiting = false;
        }

        if let Some(which) = which {
            self.service_interrupt(bus, which);
            return TickResult::InterruptServiced(which);
        }

        if self.waiting {
            return TickResult::Idle;
        }

        self.state.begin_instruction();
        let opcode = self.fetch_pc_byte(bus);
        self.pending = Some((opcode, 0));
        TickResult::Progressed
    }

    /// Advance the CPU by exactly one instruction, or one interrupt
    /// sequence if RESET/NMI/IRQ is pending at this boundary (spec
    /// §4.2's `fetch_opcode_inc_pc` interrupt-coercion rule, spec
    /// §4.3's priority order), by looping [`Cpu::tick`] until it signals
    /// completion. Returns the discrete CPU-cycle count (spec §8's
    /// `cycles_consumed` unit, not the master-clock tick count) the bus
    /// charged for this step, including any external cycles charged via
    /// `charge_external_cycles` since the prior call.
    pub fn step(&mut self, bus: &mut BusA) -> u64 {
        self.clock.mark(bus.access_count());
        loop {
            match self.tick(bus) {
                TickResult::Idle => break,
                TickResult::Progressed => continue,
                TickResult::InstructionComplete | TickResult::InterruptServiced(_) => break,
            }
        }
        let delta = self.clock.delta(bus.access_count());
        self.clock.reset_external();
        delta
    }

    /// Service RESET/NMI/IRQ at an instruction boundary (spec §4.3).
    /// RESET re-enters the full reset sequence; NMI/IRQ push PC (and
    /// PBR in native mode) and status, then load the cause's vector.
    fn service_interrupt(&mut self, bus: &mut BusA, which: PendingInterrupt) {
        if which == PendingInterrupt::Reset {
            self.interrupt.acknowledge(which);
            self.reset(bus);
            return;
        }

        self.internal_cycle(bus);

        if !self.regs.e {
            let pbr = self.regs.pbr;
            self.push_byte(bus, pbr);
        }
        let pc = self.regs.pc;
        self.push_byte(bus, (pc >> 8) as u8);
        self.push_byte(bus, pc as u8);
        // Hardware interrupts never set the B flag (spec §4.2.2: only
        // software BRK does, and only in emulation mode).
        let status = if self.regs.e { self.regs.p & !flags::B } else { self.regs.p };
        self.push_byte(bus, status);

        self.regs.set_flag(flags::I, true);
        self.regs.set_flag(flags::D, false);
        self.regs.pbr = 0;

        let vectors = if self.regs.e {
            interrupt::EMULATION_VECTORS
        } else {
            interrupt::NATIVE_VECTORS
        };
        let vector = match which {
            PendingInterrupt::Nmi => vectors.nmi,
            PendingInterrupt::Irq => vectors.irq,
            PendingInterrupt::Reset => unreachable!("handled above"),
        };
        let lo = bus.read_bank0(vector, AccessSource::Cpu);
        let hi = bus.read_bank0(vector.wrapping_add(1), AccessSource::Cpu);
        self.regs.pc = u16::from_le_bytes([lo, hi]);

        self.interrupt.acknowledge(which);
    }

    /// Push one byte onto the stack (bank 0 always) and decrement `S`,
    /// wrapping within the low byte only in emulation mode (spec
    /// §4.2: "E=1: S.h=0x01").
    pub(crate) fn push_byte(&mut self, bus: &mut BusA, value: u8) {
        bus.write_bank0(self.regs.s, value, AccessSource::Cpu);
        self.regs.s = if self.regs.e {
            0x0100 | self.regs.s.wrapping_sub(1) & 0x00FF
        } else {
            self.regs.s.wrapping_sub(1)
        };
    }

    /// Pop one byte off the stack, incrementing `S` first (spec §4.2).
    pub(crate) fn pop_byte(&mut self, bus: &mut BusA) -> u8 {
        self.regs.s = if self.regs.e {
            0x0100 | self.regs.s.wrapping_add(1) & 0x00FF
        } else {
            self.regs.s.wrapping_add(1)
        };
        bus.read_bank0(self.regs.s, AccessSource::Cpu)
    }

    pub(crate) fn push_word(&mut self, bus: &mut BusA, value: u16) {
        self.push_byte(bus, (value >> 8) as u8);
        self.push_byte(bus, value as u8);
    }

    pub(crate) fn pop_word(&mut self, bus: &mut BusA) -> u16 {
        let lo = self.pop_byte(bus);
        let hi = self.pop_byte(bus);
        u16::from_le_bytes([lo, hi])
    }

    pub(crate) fn stop(&mut self) {
        self.stopped = true;
    }

    pub(crate) fn wait(&mut self) {
        self.waiting = true;
    }

    /// Charge one internal-only cycle (no bus transfer) against the
    /// discrete CPU-cycle count, e.g. the mandatory index-add before an
    /// indexed-indirect dereference or the dead cycle before a taken
    /// branch (spec §4.2.1/§8).
    pub(super) fn internal_cycle(&mut self, bus: &mut BusA) {
        bus.add_internal_cycle(self.regs.full_pc());
    }
}
