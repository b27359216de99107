//! Interrupt & RDY controller (spec §4.3, component C7).
//!
//! NMI is edge-detected on the falling edge of `/NMI`; IRQ is
//! level-sampled and only takes effect while `P.I = 0`. Grounded in the
//! teacher's `cpu/mod.rs` priority-check order (EI-delay, then NMI,
//! then IRQ, then halted-wake checks) adapted to the 65816's simpler
//! two-source model — there is no EI-delay or ON-key wake here, just
//! NMI-over-IRQ priority and a RESET that always wins.
//!
//! The vector table addresses are the ones
//! `original_source/Src/CPU/LSNRicoh5A22.h`'s `LSN_VECTORS` enum names.

/// Interrupt vector addresses, native and emulation mode, spec §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorAddresses {
    pub cop: u16,
    pub brk: u16,
    pub abort: u16,
    pub nmi: u16,
    pub reset: u16,
    pub irq: u16,
}

/// Native-mode vectors ($FFE4-$FFEE).
pub const NATIVE_VECTORS: VectorAddresses = VectorAddresses {
    cop: 0xFFE4,
    brk: 0xFFE6,
    abort: 0xFFE8,
    nmi: 0xFFEA,
    reset: 0xFFFC, // unused in native mode, kept for completeness
    irq: 0xFFEE,
};

/// Emulation-mode vectors ($FFF4-$FFFE). `BRK` and `IRQ` share a
/// vector in emulation mode, per the 6502-compatible vector layout.
pub const EMULATION_VECTORS: VectorAddresses = VectorAddresses {
    cop: 0xFFF4,
    brk: 0xFFFE,
    abort: 0xFFF8,
    nmi: 0xFFFA,
    reset: 0xFFFC,
    irq: 0xFFFE,
};

/// Which pending interrupt, if any, should be serviced next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingInterrupt {
    Reset,
    Nmi,
    Irq,
}

/// Edge/level interrupt line state, independent of the `Registers` it
/// gates (kept as plain `Cpu` fields in practice; this struct groups
/// them for clarity and is embedded directly, not boxed or behind a
/// trait object, per spec.md's C7 addition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterruptController {
    /// Raw `/NMI` line level sampled last cycle, for edge detection.
    nmi_line_prev: bool,
    /// Latched true on a high-to-low `/NMI` transition; cleared once
    /// serviced.
    nmi_pending: bool,
    /// Raw `/IRQ` line level, sampled continuously (level-triggered).
    irq_line: bool,
    /// Latched true while a reset is outstanding; cleared once the
    /// reset sequence has fully run.
    reset_pending: bool,
}

impl InterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current `/NMI` line level; call once per instruction
    /// boundary (spec §4.3's edge-detect timing). Latches `nmi_pending`
    /// on a high-to-low transition only.
    pub fn set_nmi_line(&mut self, level: bool) {
        if self.nmi_line_prev && !level {
            self.nmi_pending = true;
        }
        self.nmi_line_prev = level;
    }

    /// Feed the current `/IRQ` line level. Level-triggered: there is
    /// no latch, `irq_pending` just reflects the wire.
    pub fn set_irq_line(&mut self, level: bool) {
        self.irq_line = level;
    }

    pub fn request_reset(&mut self) {
        self.reset_pending = true;
    }

    /// Decide which interrupt, if any, should be taken at the next
    /// instruction boundary, given whether `P.I` currently masks IRQ.
    /// RESET always wins; NMI is next (never maskable); IRQ is taken
    /// only when `irq_disabled` is false.
    pub fn poll(&self, irq_disabled: bool) -> Option<PendingInterrupt> {
        if self.reset_pending {
            Some(PendingInterrupt::Reset)
        } else if self.nmi_pending {
            Some(PendingInterrupt::Nmi)
        } else if self.irq_line && !irq_disabled {
            Some(PendingInterrupt::Irq)
        } else {
            None
        }
    }

    /// Whether any interrupt line is currently asserted, regardless of
    /// whether `P.I` would actually let it be serviced. Spec §4.2.2's
    /// `WAI` only needs a line to *wake* the CPU up — masked IRQ still
    /// wakes `WAI` even though it won't be vectored until `P.I` clears
    /// (or never, if it stays set) — so this is deliberately broader
    /// than [`InterruptController::poll`].
    pub fn any_asserted(&self) -> bool {
        self.reset_pending || self.nmi_pending || self.irq_line
    }

    /// Clear the latch for whichever interrupt was just serviced.
    pub fn acknowledge(&mut self, which: PendingInterrupt) {
        match which {
            PendingInterrupt::Reset => self.reset_pending = false,
            PendingInterrupt::Nmi => self.nmi_pending = false,
            PendingInterrupt::Irq => {} // level-triggered, no latch to clear
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nmi_latches_only_on_falling_edge() {
        let mut ic = InterruptController::new();
        ic.set_nmi_line(true);
        assert_eq!(ic.poll(false), None);
        ic.set_nmi_line(true);
        assert_eq!(ic.poll(false), None);
        ic.set_nmi_line(false);
        assert_eq!(ic.poll(false), Some(PendingInterrupt::Nmi));
    }

    #[test]
    fn irq_is_masked_by_i_flag() {
        let mut ic = InterruptController::new();
        ic.set_irq_line(true);
        assert_eq!(ic.poll(true), None);
        assert_eq!(ic.poll(false), Some(PendingInterrupt::Irq));
    }

    #[test]
    fn reset_takes_priority_over_nmi_and_irq() {
        let mut ic = InterruptController::new();
        ic.set_nmi_line(true);
        ic.set_nmi_line(false);
        ic.set_irq_line(true);
        ic.request_reset();
        assert_eq!(ic.poll(false), Some(PendingInterrupt::Reset));
    }

    #[test]
    fn acknowledge_clears_the_serviced_latch_only() {
        let mut ic = InterruptController::new();
        ic.set_nmi_line(true);
        ic.set_nmi_line(false);
        ic.set_irq_line(true);
        ic.acknowledge(PendingInterrupt::Nmi);
        assert_eq!(ic.poll(false), Some(PendingInterrupt::Irq));
    }
}
