//! Per-page accessor callbacks (spec §3, §4.1, component C2).
//!
//! Every one of the 65,536 pages in the 24-bit address space has an
//! installed accessor: a bundle of up to four callbacks (live
//! read/write, debug read/write) plus an opaque context pointer the
//! callback receives back on every call. `original_source`'s
//! `LSN_ADDR_ACCESSOR` carries raw `void *` context and bare function
//! pointers; here the context is an owned `Box<dyn Any>`-free closure
//! capture instead, since Rust gives us a real closure type rather than
//! reaching for an opaque pointer.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Distinguishes a CPU-driven bus access from a DMA-driven one (spec
/// §6). DMA itself is out of scope; this tag exists purely so an
/// external DMA controller sharing the same accessors can tell which
/// kind of access it's performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSource {
    Cpu,
    Dma,
}

/// A read callback: given the full 24-bit address and the access
/// source, returns the byte value and a mask of which bits it actually
/// drove (spec §4.1's open-bus mask rule).
pub type ReadFn = Arc<dyn Fn(u32, AccessSource) -> (u8, u8) + Send + Sync>;

/// A write callback: given the full 24-bit address, the byte being
/// written, and the access source, returns the mask of bits it
/// accepted (bits outside the mask never reach the open-bus latch).
pub type WriteFn = Arc<dyn Fn(u32, u8, AccessSource) + Send + Sync>;

/// A side-effect-free read, used by debuggers/disassemblers. Never
/// touches the open-bus latch (spec §4.1).
pub type DebugReadFn = Arc<dyn Fn(u32) -> u8 + Send + Sync>;

/// A side-effect-free write, used by memory-editing tools. Never
/// touches the open-bus latch.
pub type DebugWriteFn = Arc<dyn Fn(u32, u8) + Send + Sync>;

/// The four callbacks installed for one page.
#[derive(Clone)]
pub struct Accessor {
    pub read: ReadFn,
    pub write: WriteFn,
    pub debug_read: DebugReadFn,
    pub debug_write: DebugWriteFn,
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor").finish_non_exhaustive()
    }
}

impl Accessor {
    /// An accessor that reads return the open-bus latch untouched (mask
    /// 0x00, drives nothing) and discards writes. Not installed by
    /// default anywhere — [`BusA::new`](crate::bus::BusA::new) installs
    /// [`Accessor::ram_backed`] on every page instead — but available
    /// for a mapper to explicitly mark a page as truly unbacked (open
    /// MMIO register ranges with no device attached, for example).
    pub fn unmapped() -> Self {
        Self {
            read: Arc::new(|_addr, _src| (0, 0x00)),
            write: Arc::new(|_addr, _value, _src| {}),
            debug_read: Arc::new(|_addr| 0),
            debug_write: Arc::new(|_addr, _value| {}),
        }
    }

    /// The accessor installed on every page at construction (spec §3's
    /// lifecycle: "constructed with a default passthrough accessor on
    /// every page, reading/writing the supplied RAM at the full 24-bit
    /// address"). Shares one 16 MiB buffer across all 65,536 pages, so
    /// a freshly built [`crate::bus::BusA`] is immediately usable as a
    /// flat address space before any mapper overrides individual pages
    /// with real ROM/MMIO behavior.
    pub fn ram_backed(ram: Arc<Mutex<Vec<u8>>>) -> Self {
        let read_ram = Arc::clone(&ram);
        let write_ram = Arc::clone(&ram);
        let debug_read_ram = Arc::clone(&ram);
        let debug_write_ram = Arc::clone(&ram);
        Self {
            read: Arc::new(move |addr, _src| (read_ram.lock().unwrap()[addr as usize], 0xFF)),
            write: Arc::new(move |addr, value, _src| write_ram.lock().unwrap()[addr as usize] = value),
            debug_read: Arc::new(move |addr| debug_read_ram.lock().unwrap()[addr as usize]),
            debug_write: Arc::new(move |addr, value| debug_write_ram.lock().unwrap()[addr as usize] = value),
        }
    }

    /// An "open" accessor that fully drives every bit it returns (mask
    /// 0xFF) by delegating to plain byte-valued closures over a shared
    /// backing store. Convenience for the common case of a flat
    /// RAM/ROM array, where debug access is just the live access with
    /// the source tag dropped.
    pub fn open<R, W>(read: R, write: W) -> Self
    where
        R: Fn(u32, AccessSource) -> u8 + Send + Sync + 'static,
        W: Fn(u32, u8, AccessSource) + Send + Sync + 'static,
    {
        let read = Arc::new(read);
        let write = Arc::new(write);
        let read_for_debug = Arc::clone(&read);
        let write_for_debug = Arc::clone(&write);
        Self {
            read: {
                let read = Arc::clone(&read);
                Arc::new(move |addr, src| (read(addr, src), 0xFF))
            },
            write: {
                let write = Arc::clone(&write);
                Arc::new(move |addr, value, src| write(addr, value, src))
            },
            debug_read: Arc::new(move |addr| read_for_debug(addr, AccessSource::Cpu)),
            debug_write: Arc::new(move |addr, value| write_for_debug(addr, value, AccessSource::Cpu)),
        }
    }
}
