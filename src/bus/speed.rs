//! The Bus A speed table (spec §4.1, component C1).
//!
//! One byte per (bank, page) pair: low nibble is the master-clock
//! divisor used when MEMSEL=0, high nibble the divisor used when
//! MEMSEL=1 (FastROM). Both nibbles are always `1..=15`.
//!
//! Reference: `original_source/Src/Bus/LSNBusA.h`'s `BuildSpeedTable`.

/// A named master-clock divisor profile (spec §6).
///
/// Both profiles use the same region map; only the three divisors
/// differ. `original_source` models this as two type aliases
/// (`BusANtsc`/`BusAPal`) over one template; here it's a plain enum so
/// a caller can pick a profile at runtime instead of at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedProfile {
    /// NTSC timing: fast=6, slow=8, xslow=12 master-clock ticks.
    Ntsc,
    /// PAL timing: same region map, different divisors.
    Pal,
}

impl SpeedProfile {
    /// `(fast, slow, xslow)` master-clock divisors for this profile.
    pub const fn divisors(self) -> (u8, u8, u8) {
        match self {
            SpeedProfile::Ntsc => (6, 8, 12),
            SpeedProfile::Pal => (6, 9, 12),
        }
    }
}

/// 64 KiB packed speed table: one byte per (bank, page), i.e. per
/// 256-byte page across the full 24-bit address space.
pub struct SpeedTable {
    table: Box<[u8; 0x10000]>,
}

impl SpeedTable {
    /// Build a table with every page defaulted to `slow` for both
    /// MEMSEL states, then overlaid with the canonical SNES memory
    /// map's fast/xslow regions (spec §4.1).
    pub fn build(fast: u8, slow: u8, xslow: u8) -> Self {
        debug_assert!(fast <= 0xF && slow <= 0xF && xslow <= 0xF);

        let mut table = Box::new([Self::pack(slow, slow); 0x10000]);

        let lo_hi_bank_group = |table: &mut [u8; 0x10000], base_bank: u8| {
            for b in 0..0x40u32 {
                let bank = base_bank.wrapping_add(b as u8);
                // $2000-$3FFF: fast.
                for page in 0x20..=0x3Fu32 {
                    Self::set(table, bank, page as u8, fast, fast);
                }
                // $4000-$41FF: DMA/xslow registers.
                Self::set(table, bank, 0x40, xslow, xslow);
                Self::set(table, bank, 0x41, xslow, xslow);
                // $4200-$5FFF: fast.
                for page in 0x42..=0x5Fu32 {
                    Self::set(table, bank, page as u8, fast, fast);
                }
                // $8000-$FFFF: banks $80-$BF are FastROM-gated; $00-$3F stay slow (default).
                if base_bank == 0x80 {
                    for page in 0x80..=0xFFu32 {
                        Self::set(table, bank, page as u8, slow, fast);
                    }
                }
            }
        };

        lo_hi_bank_group(&mut table, 0x00);
        lo_hi_bank_group(&mut table, 0x80);

        // Banks $40-$7D and $7E-$7F (WRAM): all slow (already the default).

        // Banks $C0-$FF: every page is FastROM-gated.
        for bank in 0xC0..=0xFFu32 {
            for page in 0x00..=0xFFu32 {
                Self::set(&mut table, bank as u8, page as u8, slow, fast);
            }
        }

        Self { table }
    }

    const fn pack(speed0: u8, speed1: u8) -> u8 {
        ((speed1 & 0xF) << 4) | (speed0 & 0xF)
    }

    fn set(table: &mut [u8; 0x10000], bank: u8, page: u8, speed0: u8, speed1: u8) {
        let index = (u16::from(bank) << 8) | u16::from(page);
        table[index as usize] = Self::pack(speed0, speed1);
    }

    /// Override one page's pair of divisors directly (spec §4.1
    /// `set_page_speed`).
    pub fn set_page_speed(&mut self, bank: u8, page: u8, slow_nibble: u8, fast_nibble: u8) {
        Self::set(&mut self.table, bank, page, slow_nibble, fast_nibble);
    }

    /// Look up the packed byte for a (bank, page) pair, then select the
    /// nibble for the current MEMSEL state.
    #[inline]
    pub fn lookup(&self, bank: u8, page: u8, mem_sel: bool) -> u8 {
        let index = (u16::from(bank) << 8) | u16::from(page);
        let packed = self.table[index as usize];
        (packed >> (if mem_sel { 4 } else { 0 })) & 0x0F
    }
}
