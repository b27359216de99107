//! Instruction semantics — the ~100 distinct 65C816 operations (spec
//! §4.2.2, component C10).
//!
//! Every entry in [`super::table::Mnemonic`] has exactly one semantic
//! function here, dispatched from [`execute`]. Each function reads its
//! operand through [`read_source`]/[`write_source`] over the
//! `ExecState` an addressing-mode prefix left behind (`cpu/addressing.rs`,
//! `cpu/state.rs`), rather than re-deriving the addressing mode — the
//! suffix half of spec §4.2's "addressing-mode prefix + semantic
//! suffix" split.
//!
//! Flag and width handling follows the WDC 65C816 Programming Manual
//! throughout: `P.M` governs the accumulator/memory operand width,
//! `P.X` governs the index-register width, and several transfers
//! (`TCD`/`TDC`/`TCS`/`TSC`) are documented exceptions that always move
//! the full 16-bit accumulator regardless of `P.M`.

use super::flags;
use super::interrupt::{self, VectorAddresses};
use super::state::OperandSource;
use super::table::Mnemonic;
use super::Cpu;
use crate::bus::BusA;

pub fn execute(cpu: &mut Cpu, bus: &mut BusA, mnemonic: Mnemonic) {
    use Mnemonic::*;
    match mnemonic {
        Adc => alu_add(cpu, bus, false),
        And => logic_op(cpu, bus, |a, b| a & b),
        Asl => shift(cpu, bus, ShiftKind::Asl),
        Bcc => branch(cpu, bus, !cpu.regs.flag(flags::C)),
        Bcs => branch(cpu, bus, cpu.regs.flag(flags::C)),
        Beq => branch(cpu, bus, cpu.regs.flag(flags::Z)),
        Bit => bit(cpu, bus),
        Bmi => branch(cpu, bus, cpu.regs.flag(flags::N)),
        Bne => branch(cpu, bus, !cpu.regs.flag(flags::Z)),
        Bpl => branch(cpu, bus, !cpu.regs.flag(flags::N)),
        Bra => branch(cpu, bus, true),
        Brk => software_interrupt(cpu, bus, Cause::Brk),
        Brl => {
            cpu.internal_cycle(bus);
            let offset = cpu.state.operand;
            cpu.regs.pc = cpu.regs.pc.wrapping_add(offset);
        }
        Bvc => branch(cpu, bus, !cpu.regs.flag(flags::V)),
        Bvs => branch(cpu, bus, cpu.regs.flag(flags::V)),
        Clc => cpu.regs.set_flag(flags::C, false),
        Cld => cpu.regs.set_flag(flags::D, false),
        Cli => cpu.regs.set_flag(flags::I, false),
        Clv => cpu.regs.set_flag(flags::V, false),
        Cmp => compare(cpu, bus, cpu.regs.a, !cpu.regs.is_8bit_a()),
        Cop => software_interrupt(cpu, bus, Cause::Cop),
        Cpx => compare(cpu, bus, cpu.regs.x, !cpu.regs.is_8bit_index()),
        Cpy => compare(cpu, bus, cpu.regs.y, !cpu.regs.is_8bit_index()),
        Dec => inc_dec(cpu, bus, -1),
        Dex => {
            let width16 = !cpu.regs.is_8bit_index();
            cpu.regs.x = step_index(cpu.regs.x, -1, width16);
            set_nz(cpu, cpu.regs.x, width16);
        }
        Dey => {
            let width16 = !cpu.regs.is_8bit_index();
            cpu.regs.y = step_index(cpu.regs.y, -1, width16);
            set_nz(cpu, cpu.regs.y, width16);
        }
        Eor => logic_op(cpu, bus, |a, b| a ^ b),
        Inc => inc_dec(cpu, bus, 1),
        Inx => {
            let width16 = !cpu.regs.is_8bit_index();
            cpu.regs.x = step_index(cpu.regs.x, 1, width16);
            set_nz(cpu, cpu.regs.x, width16);
        }
        Iny => {
            let width16 = !cpu.regs.is_8bit_index();
            cpu.regs.y = step_index(cpu.regs.y, 1, width16);
            set_nz(cpu, cpu.regs.y, width16);
        }
        Jml => {
            let target = cpu.state.effective_addr;
            cpu.regs.pc = target as u16;
            cpu.regs.pbr = (target >> 16) as u8;
        }
        Jmp => {
            cpu.regs.pc = cpu.state.effective_addr as u16;
        }
        Jsl => {
            let target = cpu.state.effective_addr;
            let pbr = cpu.regs.pbr;
            cpu.push_byte(bus, pbr);
            let return_pc = cpu.regs.pc.wrapping_sub(1);
            cpu.push_word(bus, return_pc);
            cpu.regs.pc = target as u16;
            cpu.regs.pbr = (target >> 16) as u8;
        }
        Jsr => {
            let target = cpu.state.effective_addr as u16;
            let return_pc = cpu.regs.pc.wrapping_sub(1);
            cpu.push_word(bus, return_pc);
            cpu.regs.pc = target;
        }
        Lda => {
            let width16 = !cpu.regs.is_8bit_a();
            let value = read_source(cpu, bus, width16);
            if width16 {
                cpu.regs.a = value;
            } else {
                cpu.regs.set_a_low(value as u8);
            }
            set_nz(cpu, value, width16);
        }
        Ldx => {
            let width16 = !cpu.regs.is_8bit_index();
            let value = read_source(cpu, bus, width16);
            cpu.regs.x = value;
            set_nz(cpu, value, width16);
        }
        Ldy => {
            let width16 = !cpu.regs.is_8bit_index();
            let value = read_source(cpu, bus, width16);
            cpu.regs.y = value;
            set_nz(cpu, value, width16);
        }
        Lsr => shift(cpu, bus, ShiftKind::Lsr),
        Mvn => block_move(cpu, bus, true),
        Mvp => block_move(cpu, bus, false),
        Nop | Wdm => {}
        Ora => logic_op(cpu, bus, |a, b| a | b),
        Pea => {
            let value = cpu.state.effective_addr as u16;
            cpu.push_word(bus, value);
        }
        Pei => {
            let value = cpu.state.effective_addr as u16;
            cpu.push_word(bus, value);
        }
        Per => {
            let target = cpu.regs.pc.wrapping_add(cpu.state.operand);
            cpu.push_word(bus, target);
        }
        Pha => push_wide(cpu, bus, cpu.regs.a, !cpu.regs.is_8bit_a()),
        Phb => {
            let dbr = cpu.regs.dbr;
            cpu.push_byte(bus, dbr);
        }
        Phd => {
            let d = cpu.regs.d;
            cpu.push_word(bus, d);
        }
        Phk => {
            let pbr = cpu.regs.pbr;
            cpu.push_byte(bus, pbr);
        }
        Php => {
            let p = cpu.regs.p;
            cpu.push_byte(bus, p);
        }
        Phx => push_wide(cpu, bus, cpu.regs.x, !cpu.regs.is_8bit_index()),
        Phy => push_wide(cpu, bus, cpu.regs.y, !cpu.regs.is_8bit_index()),
        Pla => {
            let width16 = !cpu.regs.is_8bit_a();
            let value = pop_wide(cpu, bus, width16);
            if width16 {
                cpu.regs.a = value;
            } else {
                cpu.regs.set_a_low(value as u8);
            }
            set_nz(cpu, value, width16);
        }
        Plb => {
            let value = cpu.pop_byte(bus);
            cpu.regs.dbr = value;
            cpu.regs.set_nz_8(value);
        }
        Pld => {
            let value = cpu.pop_word(bus);
            cpu.regs.d = value;
            cpu.regs.set_nz_16(value);
        }
        Plp => {
            let value = cpu.pop_byte(bus);
            cpu.regs.p = value;
            cpu.regs.enforce_index_width();
            cpu.regs.enforce_emulation_invariants();
        }
        Plx => {
            let width16 = !cpu.regs.is_8bit_index();
            let value = pop_wide(cpu, bus, width16);
            cpu.regs.x = value;
            set_nz(cpu, value, width16);
        }
        Ply => {
            let width16 = !cpu.regs.is_8bit_index();
            let value = pop_wide(cpu, bus, width16);
            cpu.regs.y = value;
            set_nz(cpu, value, width16);
        }
        Rep => status_mask(cpu, false),
        Rol => shift(cpu, bus, ShiftKind::Rol),
        Ror => shift(cpu, bus, ShiftKind::Ror),
        Rti => {
            let status = cpu.pop_byte(bus);
            cpu.regs.p = status;
            cpu.regs.enforce_index_width();
            cpu.regs.enforce_emulation_invariants();
            let pc = cpu.pop_word(bus);
            cpu.regs.pc = pc;
            if !cpu.regs.e {
                let pbr = cpu.pop_byte(bus);
                cpu.regs.pbr = pbr;
            }
        }
        Rtl => {
            let pc = cpu.pop_word(bus);
            cpu.regs.pc = pc.wrapping_add(1);
            let pbr = cpu.pop_byte(bus);
            cpu.regs.pbr = pbr;
        }
        Rts => {
            let pc = cpu.pop_word(bus);
            cpu.regs.pc = pc.wrapping_add(1);
        }
        Sbc => alu_add(cpu, bus, true),
        Sec => cpu.regs.set_flag(flags::C, true),
        Sed => cpu.regs.set_flag(flags::D, true),
        Sei => cpu.regs.set_flag(flags::I, true),
        Sep => status_mask(cpu, true),
        Sta => {
            let width16 = !cpu.regs.is_8bit_a();
            let value = if width16 { cpu.regs.a } else { u16::from(cpu.regs.a_low()) };
            charge_indexed_store_cycle(cpu, bus);
            write_source(cpu, bus, width16, value);
        }
        Stp => cpu.stop(),
        Stx => {
            let width16 = !cpu.regs.is_8bit_index();
            charge_indexed_store_cycle(cpu, bus);
            write_source(cpu, bus, width16, cpu.regs.x);
        }
        Sty => {
            let width16 = !cpu.regs.is_8bit_index();
            charge_indexed_store_cycle(cpu, bus);
            write_source(cpu, bus, width16, cpu.regs.y);
        }
        Stz => {
            let width16 = !cpu.regs.is_8bit_a();
            charge_indexed_store_cycle(cpu, bus);
            write_source(cpu, bus, width16, 0);
        }
        Tax => {
            let width16 = !cpu.regs.is_8bit_index();
            cpu.regs.x = mask_to(cpu.regs.a, width16);
            set_nz(cpu, cpu.regs.x, width16);
        }
        Tay => {
            let width16 = !cpu.regs.is_8bit_index();
            cpu.regs.y = mask_to(cpu.regs.a, width16);
            set_nz(cpu, cpu.regs.y, width16);
        }
        Tcd => {
            cpu.regs.d = cpu.regs.a;
            cpu.regs.set_nz_16(cpu.regs.d);
        }
        Tcs => {
            cpu.regs.s = cpu.regs.a;
            cpu.regs.enforce_emulation_invariants();
        }
        Tdc => {
            cpu.regs.a = cpu.regs.d;
            cpu.regs.set_nz_16(cpu.regs.a);
        }
        Trb => test_bits(cpu, bus, false),
        Tsb => test_bits(cpu, bus, true),
        Tsc => {
            cpu.regs.a = cpu.regs.s;
            cpu.regs.set_nz_16(cpu.regs.a);
        }
        Tsx => {
            let width16 = !cpu.regs.is_8bit_index();
            cpu.regs.x = mask_to(cpu.regs.s, width16);
            set_nz(cpu, cpu.regs.x, width16);
        }
        Txa => {
            let width16 = !cpu.regs.is_8bit_a();
            if width16 {
                cpu.regs.a = cpu.regs.x;
            } else {
                cpu.regs.set_a_low(cpu.regs.x as u8);
            }
            set_nz(cpu, cpu.regs.a, width16);
        }
        Txs => {
            cpu.regs.s = cpu.regs.x;
            cpu.regs.enforce_emulation_invariants();
        }
        Txy => {
            let width16 = !cpu.regs.is_8bit_index();
            cpu.regs.y = mask_to(cpu.regs.x, width16);
            set_nz(cpu, cpu.regs.y, width16);
        }
        Tya => {
            let width16 = !cpu.regs.is_8bit_a();
            if width16 {
                cpu.regs.a = cpu.regs.y;
            } else {
                cpu.regs.set_a_low(cpu.regs.y as u8);
            }
            set_nz(cpu, cpu.regs.a, width16);
        }
        Tyx => {
            let width16 = !cpu.regs.is_8bit_index();
            cpu.regs.x = mask_to(cpu.regs.y, width16);
            set_nz(cpu, cpu.regs.x, width16);
        }
        Wai => cpu.wait(),
        Xba => {
            let lo = cpu.regs.a_low();
            let hi = cpu.regs.a_high_byte();
            cpu.regs.set_a_low(hi);
            cpu.regs.set_a_high_byte(lo);
            cpu.regs.set_nz_8(hi);
        }
        Xce => {
            let carry = cpu.regs.flag(flags::C);
            let old_e = cpu.regs.e;
            cpu.regs.e = carry;
            cpu.regs.set_flag(flags::C, old_e);
            cpu.regs.enforce_emulation_invariants();
        }
    }
}

// ---------------------------------------------------------------------
// Operand access
// ---------------------------------------------------------------------

/// Read the resolved operand at the given width, per the `ExecState`
/// an addressing-mode prefix left behind. Charges the indexed-read
/// boundary-cross cycle (spec §4.2.1) the first and only time the
/// operand is read, since a RMW's dummy-write/real-write re-reads
/// nothing.
fn read_source(cpu: &mut Cpu, bus: &mut BusA, width16: bool) -> u16 {
    match cpu.state.source {
        OperandSource::Accumulator => {
            if width16 {
                cpu.regs.a
            } else {
                u16::from(cpu.regs.a_low())
            }
        }
        OperandSource::Immediate => mask_to(cpu.state.operand, width16),
        OperandSource::Memory => {
            if cpu.state.indexed && cpu.state.boundary_crossed {
                cpu.internal_cycle(bus);
            }
            read_mem(cpu, bus, cpu.state.effective_addr, width16)
        }
        OperandSource::None => unreachable!("operation has no readable operand"),
    }
}

/// Charge the mandatory index-add cycle an indexed store always pays,
/// page-cross or not (spec §4.2.1): unlike an indexed *read*, which
/// only pays when the index addition actually crosses a page (the CPU
/// can speculatively read the wrong page and retry), a store has to
/// fully resolve its address before the single write fires, so there
/// is no "already charged via the read" case to avoid double-billing —
/// this always fires when the resolved address came from an indexed
/// mode, independent of `cpu.state.boundary_crossed`.
fn charge_indexed_store_cycle(cpu: &mut Cpu, bus: &mut BusA) {
    if cpu.state.indexed {
        cpu.internal_cycle(bus);
    }
}

fn write_source(cpu: &mut Cpu, bus: &mut BusA, width16: bool, value: u16) {
    match cpu.state.source {
        OperandSource::Accumulator => {
            if width16 {
                cpu.regs.a = value;
            } else {
                cpu.regs.set_a_low(value as u8);
            }
        }
        OperandSource::Memory => write_mem(cpu, bus, cpu.state.effective_addr, width16, value),
        OperandSource::Immediate | OperandSource::None => {
            unreachable!("operation has no writable operand")
        }
    }
}

/// The next address after `addr24`, wrapping the low 16 bits only —
/// the 65816 never lets a 16-bit operand's high byte roll into the
/// next bank (true for direct-page, absolute, and long addressing
/// alike).
fn next_in_bank(addr24: u32) -> u32 {
    (addr24 & 0xFF0000) | u32::from((addr24 as u16).wrapping_add(1))
}

fn read_mem(cpu: &mut Cpu, bus: &mut BusA, addr: u32, width16: bool) -> u16 {
    let lo = cpu.read(bus, addr);
    if width16 {
        let hi = cpu.read(bus, next_in_bank(addr));
        u16::from_le_bytes([lo, hi])
    } else {
        u16::from(lo)
    }
}

fn write_mem(cpu: &mut Cpu, bus: &mut BusA, addr: u32, width16: bool, value: u16) {
    cpu.write(bus, addr, value as u8);
    if width16 {
        cpu.write(bus, next_in_bank(addr), (value >> 8) as u8);
    }
}

fn mask_to(value: u16, width16: bool) -> u16 {
    if width16 {
        value
    } else {
        value & 0x00FF
    }
}

fn step_index(value: u16, delta: i16, width16: bool) -> u16 {
    let stepped = if delta >= 0 {
        value.wrapping_add(delta as u16)
    } else {
        value.wrapping_sub((-delta) as u16)
    };
    mask_to(stepped, width16)
}

fn set_nz(cpu: &mut Cpu, value: u16, width16: bool) {
    if width16 {
        cpu.regs.set_nz_16(value);
    } else {
        cpu.regs.set_nz_8(value as u8);
    }
}

// ---------------------------------------------------------------------
// Arithmetic
// ---------------------------------------------------------------------

/// ADC, and SBC by spec §4.2.2's "operand inverted, then ADC" rule
/// (`invert`).
fn alu_add(cpu: &mut Cpu, bus: &mut BusA, invert: bool) {
    let width16 = !cpu.regs.is_8bit_a();
    let raw = read_source(cpu, bus, width16);
    let operand = if invert { mask_to(!raw, width16) } else { raw };
    let a = if width16 { cpu.regs.a } else { u16::from(cpu.regs.a_low()) };
    let carry_in = cpu.regs.flag(flags::C) as u16;

    let (result, carry, overflow) = if cpu.regs.flag(flags::D) {
        add_decimal(a, operand, carry_in, width16)
    } else {
        add_binary(a, operand, carry_in, width16)
    };

    cpu.regs.set_flag(flags::C, carry);
    cpu.regs.set_flag(flags::V, overflow);
    if width16 {
        cpu.regs.a = result;
    } else {
        cpu.regs.set_a_low(result as u8);
    }
    set_nz(cpu, result, width16);
}

fn add_binary(a: u16, b: u16, carry_in: u16, width16: bool) -> (u16, bool, bool) {
    if width16 {
        let sum = u32::from(a) + u32::from(b) + u32::from(carry_in);
        let result = sum as u16;
        let carry = sum > 0xFFFF;
        let overflow = (!(a ^ b) & (a ^ result) & 0x8000) != 0;
        (result, carry, overflow)
    } else {
        let (a8, b8) = (a as u8, b as u8);
        let sum = u16::from(a8) + u16::from(b8) + carry_in;
        let result = sum as u8;
        let carry = sum > 0xFF;
        let overflow = (!(a8 ^ b8) & (a8 ^ result) & 0x80) != 0;
        (u16::from(result), carry, overflow)
    }
}

/// Nibble-wise BCD add with per-nibble half-carry propagation (spec
/// §4.2.2: "nibble-wise with half-carry propagation in both 8- and
/// 16-bit widths; V computed before decimal adjust"). `V` is taken
/// from the binary sum computed first, before any decimal correction.
fn add_decimal(a: u16, b: u16, carry_in: u16, width16: bool) -> (u16, bool, bool) {
    let (_, _, overflow) = add_binary(a, b, carry_in, width16);
    let nibbles = if width16 { 4 } else { 2 };
    let mut result: u16 = 0;
    let mut carry: u16 = carry_in;
    for i in 0..nibbles {
        let shift = i * 4;
        let da = (a >> shift) & 0xF;
        let db = (b >> shift) & 0xF;
        let mut sum = da + db + carry;
        carry = if sum > 9 {
            sum += 6;
            1
        } else {
            0
        };
        result |= (sum & 0xF) << shift;
    }
    (result, carry != 0, overflow)
}

fn compare(cpu: &mut Cpu, bus: &mut BusA, reg_value: u16, width16: bool) {
    let operand = read_source(cpu, bus, width16);
    let a = mask_to(reg_value, width16);
    let b = mask_to(operand, width16);
    let diff = i32::from(a) - i32::from(b);
    cpu.regs.set_flag(flags::C, diff >= 0);
    set_nz(cpu, diff as u16, width16);
}

fn logic_op(cpu: &mut Cpu, bus: &mut BusA, f: impl Fn(u16, u16) -> u16) {
    let width16 = !cpu.regs.is_8bit_a();
    let operand = read_source(cpu, bus, width16);
    let a = if width16 { cpu.regs.a } else { u16::from(cpu.regs.a_low()) };
    let result = mask_to(f(a, operand), width16);
    if width16 {
        cpu.regs.a = result;
    } else {
        cpu.regs.set_a_low(result as u8);
    }
    set_nz(cpu, result, width16);
}

fn bit(cpu: &mut Cpu, bus: &mut BusA) {
    let width16 = !cpu.regs.is_8bit_a();
    let is_immediate = cpu.state.source == OperandSource::Immediate;
    let operand = read_source(cpu, bus, width16);
    let a = if width16 { cpu.regs.a } else { u16::from(cpu.regs.a_low()) };
    let result = a & operand;
    cpu.regs.set_flag(flags::Z, mask_to(result, width16) == 0);
    if !is_immediate {
        if width16 {
            cpu.regs.set_flag(flags::N, operand & 0x8000 != 0);
            cpu.regs.set_flag(flags::V, operand & 0x4000 != 0);
        } else {
            cpu.regs.set_flag(flags::N, operand & 0x80 != 0);
            cpu.regs.set_flag(flags::V, operand & 0x40 != 0);
        }
    }
}

fn test_bits(cpu: &mut Cpu, bus: &mut BusA, set: bool) {
    let width16 = !cpu.regs.is_8bit_a();
    let operand = read_source(cpu, bus, width16);
    let a = if width16 { cpu.regs.a } else { u16::from(cpu.regs.a_low()) };
    cpu.regs.set_flag(flags::Z, mask_to(a & operand, width16) == 0);
    let result = if set { operand | a } else { operand & !a };
    write_source(cpu, bus, width16, mask_to(result, width16));
}

/// Write the unmodified value back before the real write, matching
/// real hardware's read-modify-write bus pattern (spec §4.2.1's
/// dummy-write cycle). Skipped for the accumulator form, which never
/// touches the bus at all.
fn rmw_dummy_write(cpu: &mut Cpu, bus: &mut BusA, width16: bool, value: u16) {
    if cpu.state.source == OperandSource::Memory {
        write_mem(cpu, bus, cpu.state.effective_addr, width16, value);
    }
}

fn inc_dec(cpu: &mut Cpu, bus: &mut BusA, delta: i16) {
    let width16 = !cpu.regs.is_8bit_a();
    let value = read_source(cpu, bus, width16);
    // RMW on an indexed absolute mode always pays the index-add cycle,
    // regardless of whether it actually crossed a page; `read_source`
    // already charged it when `boundary_crossed`, so only cover the
    // remaining case here to avoid charging it twice.
    if cpu.state.indexed && !cpu.state.boundary_crossed {
        cpu.internal_cycle(bus);
    }
    rmw_dummy_write(cpu, bus, width16, value);
    let result = step_index(value, delta, width16);
    write_source(cpu, bus, width16, result);
    set_nz(cpu, result, width16);
}

// ---------------------------------------------------------------------
// Shifts and rotates
// ---------------------------------------------------------------------

#[derive(Clone, Copy)]
enum ShiftKind {
    Asl,
    Lsr,
    Rol,
    Ror,
}

fn shift(cpu: &mut Cpu, bus: &mut BusA, kind: ShiftKind) {
    let width16 = !cpu.regs.is_8bit_a();
    let value = read_source(cpu, bus, width16);
    if cpu.state.indexed && !cpu.state.boundary_crossed {
        cpu.internal_cycle(bus);
    }
    rmw_dummy_write(cpu, bus, width16, value);
    let sign_bit = if width16 { 0x8000 } else { 0x0080 };
    let carry_in = u16::from(cpu.regs.flag(flags::C));

    let (result, carry_out) = match kind {
        ShiftKind::Asl => (mask_to(value << 1, width16), value & sign_bit != 0),
        ShiftKind::Lsr => (value >> 1, value & 0x0001 != 0),
        ShiftKind::Rol => (mask_to((value << 1) | carry_in, width16), value & sign_bit != 0),
        ShiftKind::Ror => {
            let rotated = (value >> 1) | (carry_in * sign_bit);
            (rotated, value & 0x0001 != 0)
        }
    };

    cpu.regs.set_flag(flags::C, carry_out);
    write_source(cpu, bus, width16, result);
    set_nz(cpu, result, width16);
}

// ---------------------------------------------------------------------
// Stack-width helpers
// ---------------------------------------------------------------------

fn push_wide(cpu: &mut Cpu, bus: &mut BusA, value: u16, width16: bool) {
    if width16 {
        cpu.push_word(bus, value);
    } else {
        cpu.push_byte(bus, value as u8);
    }
}

fn pop_wide(cpu: &mut Cpu, bus: &mut BusA, width16: bool) -> u16 {
    if width16 {
        cpu.pop_word(bus)
    } else {
        u16::from(cpu.pop_byte(bus))
    }
}

// ---------------------------------------------------------------------
// Status register
// ---------------------------------------------------------------------

fn status_mask(cpu: &mut Cpu, set: bool) {
    let mask = cpu.state.operand as u8;
    if set {
        cpu.regs.p |= mask;
    } else {
        cpu.regs.p &= !mask;
    }
    cpu.regs.enforce_index_width();
    cpu.regs.enforce_emulation_invariants();
}

// ---------------------------------------------------------------------
// Software interrupts (BRK/COP)
// ---------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
enum Cause {
    Brk,
    Cop,
}

/// Software BRK/COP (spec §4.2.2, §6's vector table). Hardware
/// NMI/IRQ are serviced by [`super::Cpu::step`] directly rather than
/// through this dispatch table, since they hijack the opcode fetch
/// before a mnemonic is ever selected (spec §4.3); this function only
/// ever runs for the user-executed `BRK`/`COP` instructions.
fn software_interrupt(cpu: &mut Cpu, bus: &mut BusA, cause: Cause) {
    if !cpu.regs.e {
        let pbr = cpu.regs.pbr;
        cpu.push_byte(bus, pbr);
    }
    let pc = cpu.regs.pc;
    cpu.push_byte(bus, (pc >> 8) as u8);
    cpu.push_byte(bus, pc as u8);

    let mut status = cpu.regs.p;
    if cpu.regs.e {
        // Spec §4.2.2: emulation-mode BRK pushes B=1, COP pushes B=0.
        if cause == Cause::Brk {
            status |= flags::B;
        } else {
            status &= !flags::B;
        }
    }
    cpu.push_byte(bus, status);

    cpu.regs.set_flag(flags::I, true);
    cpu.regs.set_flag(flags::D, false);
    cpu.regs.pbr = 0;

    let vectors: VectorAddresses = if cpu.regs.e {
        interrupt::EMULATION_VECTORS
    } else {
        interrupt::NATIVE_VECTORS
    };
    let vector = match cause {
        Cause::Brk => vectors.brk,
        Cause::Cop => vectors.cop,
    };
    let lo = cpu.read(bus, u32::from(vector));
    let hi = cpu.read(bus, u32::from(vector.wrapping_add(1)));
    cpu.regs.pc = u16::from_le_bytes([lo, hi]);
}

// ---------------------------------------------------------------------
// Branches and block move
// ---------------------------------------------------------------------

/// A taken branch always pays one extra internal cycle; a branch taken
/// in emulation mode that crosses a page boundary pays a second (spec
/// §4.2.2's branch-timing rule, native mode never charges the
/// page-cross cycle).
fn branch(cpu: &mut Cpu, bus: &mut BusA, taken: bool) {
    if taken {
        cpu.internal_cycle(bus);
        let old_pc = cpu.regs.pc;
        let offset = cpu.state.operand;
        let new_pc = cpu.regs.pc.wrapping_add(offset);
        if cpu.regs.e && (old_pc & 0xFF00) != (new_pc & 0xFF00) {
            cpu.internal_cycle(bus);
        }
        cpu.regs.pc = new_pc;
    }
}

/// MVN (`ascending`=true) / MVP (spec §4.2.2). This crate runs a whole
/// block move to completion within one [`Cpu::step`] call rather than
/// re-entering the same opcode byte once per moved byte the way real
/// hardware's PC-rewind trick does — see `DESIGN.md`'s note on
/// whole-instruction granularity. The net register state afterward
/// (`A=0xFFFF`, `X`/`Y` advanced, `DBR=dst`) matches spec §8's testable
/// property either way.
fn block_move(cpu: &mut Cpu, bus: &mut BusA, ascending: bool) {
    let dst_bank = cpu.state.bank;
    let src_bank = cpu.state.pointer as u8;
    cpu.regs.dbr = dst_bank;

    loop {
        let src_addr = (u32::from(src_bank) << 16) | u32::from(cpu.regs.x);
        let dst_addr = (u32::from(dst_bank) << 16) | u32::from(cpu.regs.y);
        let byte = cpu.read(bus, src_addr);
        cpu.write(bus, dst_addr, byte);

        if ascending {
            cpu.regs.x = cpu.regs.x.wrapping_add(1);
            cpu.regs.y = cpu.regs.y.wrapping_add(1);
        } else {
            cpu.regs.x = cpu.regs.x.wrapping_sub(1);
            cpu.regs.y = cpu.regs.y.wrapping_sub(1);
        }
        cpu.regs.a = cpu.regs.a.wrapping_sub(1);
        if cpu.regs.a == 0xFFFF {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{AccessSource, SpeedProfile};

    fn bus_with_ram() -> BusA {
        BusA::new(SpeedProfile::Ntsc)
    }

    #[test]
    fn adc_binary_sets_carry_and_overflow() {
        let mut cpu = Cpu::new();
        let mut bus = bus_with_ram();
        cpu.regs.e = false;
        cpu.regs.p &= !(flags::M | flags::D);
        cpu.regs.a = 0x7FFF;
        cpu.state.source = OperandSource::Immediate;
        cpu.state.operand = 0x0001;
        alu_add(&mut cpu, &mut bus, false);
        assert_eq!(cpu.regs.a, 0x8000);
        assert!(cpu.regs.flag(flags::V));
        assert!(!cpu.regs.flag(flags::C));
        assert!(cpu.regs.flag(flags::N));
    }

    #[test]
    fn adc_decimal_carries_across_nibbles() {
        let mut cpu = Cpu::new();
        let mut bus = bus_with_ram();
        cpu.regs.e = false;
        cpu.regs.p |= flags::D;
        cpu.regs.p |= flags::M;
        cpu.regs.set_a_low(0x58);
        cpu.state.source = OperandSource::Immediate;
        cpu.state.operand = 0x46;
        alu_add(&mut cpu, &mut bus, false);
        assert_eq!(cpu.regs.a_low(), 0x04);
        assert!(cpu.regs.flag(flags::C));
    }

    #[test]
    fn sbc_inverts_operand_before_adding() {
        let mut cpu = Cpu::new();
        let mut bus = bus_with_ram();
        cpu.regs.e = false;
        cpu.regs.p |= flags::M;
        cpu.regs.p |= flags::C; // no borrow
        cpu.regs.set_a_low(0x05);
        cpu.state.source = OperandSource::Immediate;
        cpu.state.operand = 0x03;
        alu_add(&mut cpu, &mut bus, true);
        assert_eq!(cpu.regs.a_low(), 0x02);
        assert!(cpu.regs.flag(flags::C));
    }

    #[test]
    fn cmp_sets_carry_when_accumulator_is_not_less() {
        let mut cpu = Cpu::new();
        let mut bus = bus_with_ram();
        cpu.regs.p |= flags::M;
        cpu.regs.set_a_low(0x0A);
        cpu.state.source = OperandSource::Immediate;
        cpu.state.operand = 0x05;
        compare(&mut cpu, &mut bus, cpu.regs.a, false);
        assert!(cpu.regs.flag(flags::C));
        assert!(!cpu.regs.flag(flags::Z));
    }

    #[test]
    fn asl_shifts_out_the_sign_bit_as_carry() {
        let mut cpu = Cpu::new();
        let mut bus = bus_with_ram();
        cpu.regs.p |= flags::M;
        cpu.regs.set_a_low(0x81);
        cpu.state.source = OperandSource::Accumulator;
        shift(&mut cpu, &mut bus, ShiftKind::Asl);
        assert_eq!(cpu.regs.a_low(), 0x02);
        assert!(cpu.regs.flag(flags::C));
    }

    #[test]
    fn ror_rotates_carry_into_the_sign_bit() {
        let mut cpu = Cpu::new();
        let mut bus = bus_with_ram();
        cpu.regs.p |= flags::M;
        cpu.regs.p |= flags::C;
        cpu.regs.set_a_low(0x01);
        cpu.state.source = OperandSource::Accumulator;
        shift(&mut cpu, &mut bus, ShiftKind::Ror);
        assert_eq!(cpu.regs.a_low(), 0x80);
        assert!(cpu.regs.flag(flags::C));
    }

    #[test]
    fn block_move_mvn_advances_registers_and_sets_dbr() {
        let mut cpu = Cpu::new();
        let mut bus = bus_with_ram();
        bus.write(0x010000, 0xAA, AccessSource::Cpu);
        bus.write(0x010001, 0xBB, AccessSource::Cpu);
        cpu.regs.x = 0x0000;
        cpu.regs.y = 0x2000;
        cpu.regs.a = 0x0001; // move 2 bytes
        cpu.state.bank = 0x02; // destination bank
        cpu.state.pointer = 0x01; // source bank
        block_move(&mut cpu, &mut bus, true);
        assert_eq!(cpu.regs.a, 0xFFFF);
        assert_eq!(cpu.regs.x, 0x0002);
        assert_eq!(cpu.regs.y, 0x2002);
        assert_eq!(cpu.regs.dbr, 0x02);
        assert_eq!(bus.debug_read(0x022000), 0xAA);
        assert_eq!(bus.debug_read(0x022001), 0xBB);
    }

    #[test]
    fn xce_swaps_carry_and_emulation_and_forces_widths() {
        let mut cpu = Cpu::new();
        cpu.regs.e = false;
        cpu.regs.set_flag(flags::C, true);
        cpu.regs.p &= !(flags::M | flags::X);
        cpu.regs.x = 0x1234;
        execute(&mut cpu, &mut bus_with_ram(), Mnemonic::Xce);
        assert!(cpu.regs.e);
        assert!(!cpu.regs.flag(flags::C));
        assert_eq!(cpu.regs.x, 0x0034);
    }

    #[test]
    fn rep_clears_masked_bits_and_sep_sets_them() {
        let mut cpu = Cpu::new();
        cpu.regs.e = false;
        cpu.regs.p = flags::M | flags::X | flags::C;
        cpu.state.operand = u16::from(flags::M);
        status_mask(&mut cpu, false);
        assert_eq!(cpu.regs.p & flags::M, 0);
        cpu.state.operand = u16::from(flags::M);
        status_mask(&mut cpu, true);
        assert_ne!(cpu.regs.p & flags::M, 0);
    }
}
