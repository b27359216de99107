//! Bus A: the 24-bit address bus (spec §3, §4.1, components C1-C3).
//!
//! Grounded in `original_source/Src/Bus/LSNBusA.h`'s `Read`/`Write`/
//! `ReadBank0`/`WriteBank0`/`SetRamSpeed`/`BuildSpeedTable` and the
//! teacher's `bus.rs` region-dispatch style (doc-comment density,
//! module layout), though the dispatch mechanism itself differs: the
//! teacher matches address ranges directly, while Bus A is a per-page
//! accessor table as spec.md requires.

mod accessor;
mod speed;

pub use accessor::{AccessSource, Accessor, DebugReadFn, DebugWriteFn, ReadFn, WriteFn};
pub use speed::{SpeedProfile, SpeedTable};

use crate::error::BusError;
use log::trace;
use std::sync::{Arc, Mutex};

/// One entry in a recorded bus trace (spec §4.4/§8): the address
/// driven, the byte value observed (`None` for an internal cycle with
/// no bus transaction), and what kind of cycle it was. Recording is
/// off by default ([`BusA::enable_trace`] turns it on) since most
/// callers never need it and it costs an allocation per access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusTraceEntry {
    pub addr: u32,
    pub value: Option<u8>,
    pub kind: BusAccessKind,
}

/// What a recorded [`BusTraceEntry`] represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusAccessKind {
    Read,
    Write,
    /// A cycle the CPU spends with no bus transaction (an address-math
    /// delay, a dummy read-modify-write cycle, a taken-branch cycle):
    /// still costs master clocks at the current region's divisor, but
    /// drives nothing onto the open-bus latch.
    Internal,
}

/// The 24-bit address bus shared by the CPU and (out of scope) DMA.
///
/// Holds one [`Accessor`] per page, the speed table, the current
/// MEMSEL (FastROM) latch, and the single shared open-bus data latch
/// byte that every read/write funnels through.
pub struct BusA {
    accessors: Box<[Accessor; 0x10000]>,
    speed: SpeedTable,
    mem_sel: bool,
    /// The open-bus latch: the last byte value driven onto the bus by
    /// any access, partial or full (spec §4.1).
    data_bus: u8,
    total_cycles: u64,
    /// The shared RAM backing the default passthrough accessor every
    /// page is constructed with (spec §3's Bus A lifecycle). A mapper
    /// installing its own accessor on a page shadows this buffer for
    /// that page only; it stays reachable via [`BusA::ram_pointer`].
    ram: Arc<Mutex<Vec<u8>>>,
    trace: Option<Vec<BusTraceEntry>>,
    /// Discrete CPU-cycle counter: incremented by exactly one per bus
    /// access or internal-only cycle, independent of the master-clock
    /// divisor any given access costs (spec §8's `cycles_consumed` unit).
    /// `total_cycles` stays the real master-clock tally; this is the
    /// separate unit `cpu::Cpu::step`'s return value is expressed in.
    access_count: u64,
}

impl BusA {
    /// Build a bus with every page defaulted to a passthrough accessor
    /// over a freshly allocated, shared 16 MiB RAM buffer (spec §3:
    /// "constructed with a default passthrough accessor installed on
    /// every page... reads/writes the supplied RAM at the full 24-bit
    /// address"), and the speed table built from `profile`'s divisors.
    pub fn new(profile: SpeedProfile) -> Self {
        let (fast, slow, xslow) = profile.divisors();
        let ram = Arc::new(Mutex::new(vec![0u8; 1 << 24]));
        let default_accessor = Accessor::ram_backed(Arc::clone(&ram));
        Self {
            accessors: Box::new(std::array::from_fn(|_| default_accessor.clone())),
            speed: SpeedTable::build(fast, slow, xslow),
            mem_sel: false,
            data_bus: 0,
            total_cycles: 0,
            ram,
            trace: None,
            access_count: 0,
        }
    }

    /// The shared RAM buffer backing the default passthrough accessor.
    /// Lets a test harness or a host poke memory directly without first
    /// installing its own accessors.
    pub fn ram_pointer(&self) -> &Arc<Mutex<Vec<u8>>> {
        &self.ram
    }

    /// Start recording every read/write/internal cycle into a trace
    /// buffer (spec §4.4/§8). Clears any previously recorded entries.
    pub fn enable_trace(&mut self) {
        self.trace = Some(Vec::new());
    }

    /// Stop recording and discard any buffered entries.
    pub fn disable_trace(&mut self) {
        self.trace = None;
    }

    /// Take the entries recorded since the last [`BusA::enable_trace`]
    /// or [`BusA::drain_trace`] call, leaving the buffer empty but
    /// still recording.
    pub fn drain_trace(&mut self) -> Vec<BusTraceEntry> {
        match &mut self.trace {
            Some(buf) => std::mem::take(buf),
            None => Vec::new(),
        }
    }

    /// Install an accessor for one page (spec §4.1). `bank`/`page`
    /// address the same 65536-entry table the speed table uses.
    pub fn install_accessor(&mut self, bank: u8, page: u8, accessor: Accessor) {
        let index = (u16::from(bank) << 8) | u16::from(page);
        self.accessors[index as usize] = accessor;
        trace!("bus: installed accessor at bank {bank:#04x} page {page:#04x}");
    }

    /// Override the fast/slow/xslow divisors for one page directly,
    /// independent of the region defaults `SpeedTable::build` laid
    /// down (spec §4.1).
    pub fn set_page_speed(
        &mut self,
        bank: u8,
        page: u8,
        slow_nibble: u8,
        fast_nibble: u8,
    ) -> Result<(), BusError> {
        if slow_nibble > 0xF {
            return Err(BusError::DivisorOutOfRange(slow_nibble));
        }
        if fast_nibble > 0xF {
            return Err(BusError::DivisorOutOfRange(fast_nibble));
        }
        self.speed.set_page_speed(bank, page, slow_nibble, fast_nibble);
        Ok(())
    }

    /// Set the MEMSEL (FastROM enable) latch. Flipped by a write to
    /// $420D; the CPU core itself never touches this directly, a host
    /// register accessor does.
    pub fn set_mem_sel(&mut self, fast_rom: bool) {
        self.mem_sel = fast_rom;
    }

    pub fn mem_sel(&self) -> bool {
        self.mem_sel
    }

    /// Current value of the open-bus data latch.
    pub fn data_bus(&self) -> u8 {
        self.data_bus
    }

    /// Total master-clock cycles charged to bus accesses so far.
    pub fn total_cycles(&self) -> u64 {
        self.total_cycles
    }

    /// Total discrete CPU cycles (bus accesses plus internal-only
    /// cycles) charged so far, one per call to [`BusA::read`],
    /// [`BusA::write`], or [`BusA::add_internal_cycle`] regardless of
    /// the master-clock divisor any individual one cost. This is the
    /// unit spec §8's worked scenarios count in ("2 cycles consumed",
    /// "7 RESET cycles"), fed to [`crate::cpu::ClockAccounting`].
    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    fn page_index(addr24: u32) -> usize {
        ((addr24 >> 8) & 0xFFFF) as usize
    }

    /// Look up the master-clock divisor for a full 24-bit address
    /// under the current MEMSEL state (spec §4.1).
    pub fn speed_at(&self, addr24: u32) -> u8 {
        let bank = (addr24 >> 16) as u8;
        let page = (addr24 >> 8) as u8;
        self.speed.lookup(bank, page, self.mem_sel)
    }

    /// Charge the master-clock cost of one bus access and advance the
    /// running cycle total (component C9).
    fn add_cycles(&mut self, addr24: u32) -> u8 {
        let divisor = self.speed_at(addr24);
        self.total_cycles += u64::from(divisor);
        divisor
    }

    /// Charge a cycle with no bus transaction (an address-math delay,
    /// an RMW dummy cycle, a taken-branch cycle): priced at the speed
    /// of the region `addr24` falls in, same as a real access there,
    /// but drives nothing onto the open-bus latch.
    pub fn add_internal_cycle(&mut self, addr24: u32) -> u8 {
        let divisor = self.add_cycles(addr24);
        self.access_count += 1;
        if let Some(buf) = &mut self.trace {
            buf.push(BusTraceEntry {
                addr: addr24,
                value: None,
                kind: BusAccessKind::Internal,
            });
        }
        divisor
    }

    /// A full 24-bit CPU read: looks up the page accessor, applies the
    /// returned mask to the open-bus latch, advances the clock, and
    /// returns the byte value observed by the CPU (which is the latch
    /// value after the merge, not just the accessor's raw return).
    pub fn read(&mut self, addr24: u32, source: AccessSource) -> u8 {
        let index = Self::page_index(addr24);
        let (value, mask) = (self.accessors[index].read)(addr24, source);
        self.data_bus = (self.data_bus & !mask) | (value & mask);
        self.add_cycles(addr24);
        self.access_count += 1;
        if let Some(buf) = &mut self.trace {
            buf.push(BusTraceEntry {
                addr: addr24,
                value: Some(self.data_bus),
                kind: BusAccessKind::Read,
            });
        }
        self.data_bus
    }

    /// A full 24-bit CPU write: delegates to the page accessor, then
    /// unconditionally latches the written byte onto the open-bus
    /// latch (spec §4.1: writes always drive all 8 bits regardless of
    /// what the accessor itself claims to store).
    pub fn write(&mut self, addr24: u32, value: u8, source: AccessSource) {
        let index = Self::page_index(addr24);
        (self.accessors[index].write)(addr24, value, source);
        self.data_bus = value;
        self.add_cycles(addr24);
        self.access_count += 1;
        if let Some(buf) = &mut self.trace {
            buf.push(BusTraceEntry {
                addr: addr24,
                value: Some(value),
                kind: BusAccessKind::Write,
            });
        }
    }

    /// Bank-0 fast path (spec §4.1): identical semantics to `read`
    /// with bank forced to 0, used by direct-page and stack addressing
    /// modes that never leave bank 0.
    pub fn read_bank0(&mut self, offset: u16, source: AccessSource) -> u8 {
        self.read(u32::from(offset), source)
    }

    /// Bank-0 fast path for writes; see [`BusA::read_bank0`].
    pub fn write_bank0(&mut self, offset: u16, value: u8, source: AccessSource) {
        self.write(u32::from(offset), value, source);
    }

    /// Side-effect-free read for debuggers/disassemblers: never
    /// touches the open-bus latch or the cycle counter (spec §4.1).
    pub fn debug_read(&self, addr24: u32) -> u8 {
        let index = Self::page_index(addr24);
        (self.accessors[index].debug_read)(addr24)
    }

    /// Side-effect-free write for memory-editing tools; see
    /// [`BusA::debug_read`].
    pub fn debug_write(&self, addr24: u32, value: u8) {
        let index = Self::page_index(addr24);
        (self.accessors[index].debug_write)(addr24, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn ram_accessor(backing: Arc<Mutex<[u8; 0x100]>>) -> Accessor {
        let read_backing = Arc::clone(&backing);
        let write_backing = Arc::clone(&backing);
        Accessor::open(
            move |addr, _src| read_backing.lock().unwrap()[(addr & 0xFF) as usize],
            move |addr, value, _src| write_backing.lock().unwrap()[(addr & 0xFF) as usize] = value,
        )
    }

    #[test]
    fn fresh_bus_reads_and_writes_the_default_ram_passthrough() {
        let mut bus = BusA::new(SpeedProfile::Ntsc);
        bus.write(0x7E1234, 0x42, AccessSource::Cpu);
        assert_eq!(bus.read(0x7E1234, AccessSource::Cpu), 0x42);
        assert_eq!(bus.ram_pointer().lock().unwrap()[0x7E1234], 0x42);
    }

    #[test]
    fn unmapped_accessor_leaves_latch_untouched_when_explicitly_installed() {
        let mut bus = BusA::new(SpeedProfile::Ntsc);
        bus.install_accessor(0x00, 0x00, Accessor::unmapped());
        bus.data_bus = 0xAB;
        let value = bus.read(0x000000, AccessSource::Cpu);
        assert_eq!(value, 0xAB);
    }

    #[test]
    fn write_then_read_round_trips_through_installed_accessor() {
        let mut bus = BusA::new(SpeedProfile::Ntsc);
        let backing = Arc::new(Mutex::new([0u8; 0x100]));
        bus.install_accessor(0x7E, 0x00, ram_accessor(backing));
        bus.write(0x7E0010, 0x42, AccessSource::Cpu);
        assert_eq!(bus.read(0x7E0010, AccessSource::Cpu), 0x42);
    }

    #[test]
    fn write_always_fully_latches_the_open_bus() {
        let mut bus = BusA::new(SpeedProfile::Ntsc);
        bus.write(0x000000, 0x99, AccessSource::Cpu);
        assert_eq!(bus.data_bus(), 0x99);
    }

    #[test]
    fn mem_sel_selects_the_fast_nibble_in_banks_80_bf() {
        let mut bus = BusA::new(SpeedProfile::Ntsc);
        assert_eq!(bus.speed_at(0x808000), 8);
        bus.set_mem_sel(true);
        assert_eq!(bus.speed_at(0x808000), 6);
    }

    #[test]
    fn debug_read_does_not_touch_the_open_bus_latch() {
        let mut bus = BusA::new(SpeedProfile::Ntsc);
        let backing = Arc::new(Mutex::new([0u8; 0x100]));
        backing.lock().unwrap()[0x10] = 0x55;
        bus.install_accessor(0x7E, 0x00, ram_accessor(backing));
        bus.data_bus = 0xAA;
        let value = bus.debug_read(0x7E0010);
        assert_eq!(value, 0x55);
        assert_eq!(bus.data_bus(), 0xAA);
    }

    #[test]
    fn total_cycles_accumulates_per_access() {
        let mut bus = BusA::new(SpeedProfile::Ntsc);
        let before = bus.total_cycles();
        bus.read(0x000000, AccessSource::Cpu);
        assert!(bus.total_cycles() > before);
    }

    #[test]
    fn bank0_fast_path_matches_full_address_read() {
        let mut bus = BusA::new(SpeedProfile::Ntsc);
        let backing = Arc::new(Mutex::new([0u8; 0x100]));
        backing.lock().unwrap()[0x20] = 0x7A;
        bus.install_accessor(0x00, 0x00, ram_accessor(backing));
        assert_eq!(bus.read_bank0(0x0020, AccessSource::Cpu), 0x7A);
    }

    #[test]
    fn trace_records_reads_writes_and_internal_cycles_in_order() {
        let mut bus = BusA::new(SpeedProfile::Ntsc);
        bus.enable_trace();
        bus.read(0x000010, AccessSource::Cpu);
        bus.write(0x000011, 0x5A, AccessSource::Cpu);
        bus.add_internal_cycle(0x000011);
        let entries = bus.drain_trace();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].kind, BusAccessKind::Read);
        assert_eq!(entries[1], BusTraceEntry { addr: 0x000011, value: Some(0x5A), kind: BusAccessKind::Write });
        assert_eq!(entries[2].kind, BusAccessKind::Internal);
        assert_eq!(entries[2].value, None);
        assert!(bus.drain_trace().is_empty());
    }

    #[test]
    fn trace_is_off_by_default() {
        let mut bus = BusA::new(SpeedProfile::Ntsc);
        bus.read(0x000000, AccessSource::Cpu);
        assert!(bus.drain_trace().is_empty());
    }

    #[test]
    fn access_count_ignores_the_speed_divisor() {
        let mut bus = BusA::new(SpeedProfile::Ntsc);
        bus.read(0x000000, AccessSource::Cpu); // bank 0, slow region
        bus.read(0x808000, AccessSource::Cpu); // bank 80, fast region
        bus.add_internal_cycle(0x000000);
        assert_eq!(bus.access_count(), 3);
        assert!(bus.total_cycles() > bus.access_count());
    }
}
