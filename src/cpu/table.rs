//! Mnemonics, addressing modes, and the static 256-entry instruction
//! table (spec §4.2.1, §4.2.2, component C5).
//!
//! `original_source/Src/CPU/LSNRicoh5A22Base.h`'s `LSN_INSTRUCTIONS` and
//! `LSN_ADDRESSING_MODES` enums are the base; `Mnemonic` here adds the
//! 65816-only operations that header's shared 6502-family enum never
//! grew (see SPEC_FULL.md [C5]).

use super::addressing::build_prefix;
use super::microcode::MicroOp;
use once_cell::sync::Lazy;

/// Every distinct operation the decoder can select, spanning the full
/// documented WDC 65C816 instruction set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum Mnemonic {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Bra, Brk, Brl, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cop, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny,
    Jml, Jmp, Jsl, Jsr, Lda, Ldx, Ldy, Lsr, Mvn, Mvp, Nop, Ora, Pea, Pei, Per,
    Pha, Phb, Phd, Phk, Php, Phx, Phy, Pla, Plb, Pld, Plp, Plx, Ply, Rep, Rol,
    Ror, Rti, Rtl, Rts, Sbc, Sec, Sed, Sei, Sep, Sta, Stp, Stx, Sty, Stz,
    Tax, Tay, Tcd, Tcs, Tdc, Trb, Tsb, Tsc, Tsx, Txa, Txs, Txy, Tya, Tyx, Wai,
    Wdm, Xba, Xce,
}

/// Every addressing mode the 65C816 decoder recognizes, 1:1 with the
/// original's 23-variant enum (spec §4.2.1). Each carries a one-line
/// doc comment naming its extra-cycle rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// No operand; the suffix runs directly on registers.
    Implied,
    /// Operand is the accumulator itself (shift/rotate family).
    Accumulator,
    /// One immediate byte, or two when the matching width flag (`M`/`X`) is clear.
    Immediate,
    /// One direct-page-relative byte; +1 cycle when `D` low byte is nonzero.
    Direct,
    /// Direct page indexed by X; +1 cycle when `D` low byte is nonzero.
    DirectIndexedX,
    /// Direct page indexed by Y; +1 cycle when `D` low byte is nonzero.
    DirectIndexedY,
    /// `(dp,X)`: direct-page indexed indirect; +1 cycle when `D` low byte is nonzero.
    DirectIndexedIndirectX,
    /// `(dp),Y`: direct-page indirect indexed; +1 cycle on page-boundary cross (emulation mode) or always in 16-bit index mode per the datasheet's conservative rule.
    DirectIndirectIndexedY,
    /// `(dp)`: direct-page indirect.
    DirectIndirect,
    /// `[dp]`: direct-page indirect long (24-bit pointer).
    DirectIndirectLong,
    /// `[dp],Y`: direct-page indirect long indexed by Y.
    DirectIndirectLongIndexedY,
    /// Two bytes, bank from DBR.
    Absolute,
    /// Absolute indexed by X; +1 cycle on page-boundary cross for read-modify-write-free ops.
    AbsoluteIndexedX,
    /// Absolute indexed by Y; same boundary-cross rule as `AbsoluteIndexedX`.
    AbsoluteIndexedY,
    /// Three bytes, explicit bank (`JML`/`JSL`/long loads-stores).
    AbsoluteLong,
    /// Absolute long indexed by X.
    AbsoluteLongIndexedX,
    /// `(addr)`: absolute indirect, bank 0 only (`JMP`).
    AbsoluteIndirect,
    /// `[addr]`: absolute indirect long, bank 0 only (`JML`).
    AbsoluteIndirectLong,
    /// `(addr,X)`: absolute indexed indirect, program bank (`JMP`/`JSR`).
    AbsoluteIndexedIndirectX,
    /// One signed byte, PC-relative (branches).
    Relative8,
    /// Two signed bytes, PC-relative (`BRL`, `PER`).
    Relative16,
    /// One byte offset from the stack pointer.
    StackRelative,
    /// `(sr,S),Y`: stack-relative indirect indexed by Y.
    StackRelativeIndirectIndexedY,
    /// Two bank bytes (`MVN`/`MVP`).
    BlockMove,
}

/// Static metadata for one opcode: its mnemonic, addressing mode,
/// encoded length in bytes, and a baseline cycle count (spec §3/§4.2.2,
/// component C5's "total-cycle counts alongside size/mode/mnemonic").
///
/// `base_cycles` is the number of discrete CPU cycles (bus accesses or
/// internal-only cycles, spec §8's `cycles_consumed` unit — *not*
/// master-clock ticks, which vary by memory region and are tracked
/// separately by `BusA::total_cycles`) this opcode takes under the
/// narrowest/no-penalty case: 8-bit (M=1/X=1) operands, direct page low
/// byte zero, no index-crossing, branch not taken. It is static
/// disassembly/timing-estimate metadata; the authoritative count for a
/// specific execution is always whatever `Cpu::step`/`Cpu::tick`
/// actually charge, since width flags, direct-page value, and indexed
/// boundary crossing are runtime state this field can't see.
#[derive(Debug, Clone, Copy)]
pub struct InstructionMeta {
    pub mnemonic: Mnemonic,
    pub mode: AddressingMode,
    pub bytes: u8,
    pub base_cycles: u8,
}

macro_rules! op {
    ($m:ident, $mode:ident, $bytes:expr) => {
        InstructionMeta {
            mnemonic: Mnemonic::$m,
            mode: AddressingMode::$mode,
            bytes: $bytes,
            base_cycles: base_cycles(AddressingMode::$mode, Mnemonic::$m, $bytes),
        }
    };
}

/// See [`InstructionMeta::base_cycles`] for what this baseline means
/// and does not mean.
const fn base_cycles(mode: AddressingMode, mnemonic: Mnemonic, bytes: u8) -> u8 {
    use AddressingMode::*;
    use Mnemonic::*;

    // Implied/stack-machine mnemonics don't scale with `bytes`; their
    // cost is a fixed function of what they push/pull/branch to.
    match mnemonic {
        Jsr | Jsl => return bytes + 3,
        Jmp | Jml => return bytes,
        Rts | Rtl => return 6,
        Rti => return 7,
        Brk | Cop => return 8,
        Pha | Phx | Phy | Phb | Phk | Php => return 3,
        Phd | Pea | Per => return 4,
        Pei => return 6,
        Pla | Plx | Ply | Plp | Plb => return 4,
        Pld => return 5,
        Wai | Stp | Xce | Xba => return 3,
        Mvn | Mvp => return 7,
        Nop | Wdm => return 2,
        Clc | Cld | Cli | Clv | Sec | Sed | Sei => return 2,
        Tax | Tay | Txa | Tya | Txs | Tsx | Txy | Tyx | Tcd | Tdc | Tcs | Tsc => return 2,
        Inx | Iny | Dex | Dey => return 2,
        _ => {}
    }

    // Mandatory internal cycle for the index addition itself (distinct
    // from the optional D-low-nonzero delay applied at runtime), for
    // every addressing mode that adds an index register to a
    // direct-page or pointer-sized base before dereferencing.
    let mandatory_index_add = matches!(mode, DirectIndexedX | DirectIndexedY | DirectIndexedIndirectX);

    let extra_deref = match mode {
        DirectIndirect | DirectIndexedIndirectX | DirectIndirectIndexedY | AbsoluteIndirect
        | AbsoluteIndexedIndirectX | StackRelativeIndirectIndexedY => 2,
        DirectIndirectLong | DirectIndirectLongIndexedY | AbsoluteIndirectLong => 3,
        _ => 0,
    };

    let data_access = match mnemonic {
        Asl | Lsr | Rol | Ror | Inc | Dec if !matches!(mode, Accumulator) => 3,
        Trb | Tsb => 2,
        Sta | Stx | Sty | Stz => 1,
        Lda | Ldx | Ldy | Adc | Sbc | And | Ora | Eor | Cmp | Cpx | Cpy | Bit
            if !matches!(mode, Accumulator | Immediate) =>
        {
            1
        }
        _ => 0,
    };

    bytes + extra_deref + data_access + if mandatory_index_add { 1 } else { 0 }
}

/// The canonical 256-entry WDC 65C816 opcode map (spec §4.2.2).
pub static OPCODE_TABLE: [InstructionMeta; 256] = [
    /* 0x00 */ op!(Brk, Immediate, 2),
    /* 0x01 */ op!(Ora, DirectIndexedIndirectX, 2),
    /* 0x02 */ op!(Cop, Immediate, 2),
    /* 0x03 */ op!(Ora, StackRelative, 2),
    /* 0x04 */ op!(Tsb, Direct, 2),
    /* 0x05 */ op!(Ora, Direct, 2),
    /* 0x06 */ op!(Asl, Direct, 2),
    /* 0x07 */ op!(Ora, DirectIndirectLong, 2),
    /* 0x08 */ op!(Php, Implied, 1),
    /* 0x09 */ op!(Ora, Immediate, 2),
    /* 0x0A */ op!(Asl, Accumulator, 1),
    /* 0x0B */ op!(Phd, Implied, 1),
    /* 0x0C */ op!(Tsb, Absolute, 3),
    /* 0x0D */ op!(Ora, Absolute, 3),
    /* 0x0E */ op!(Asl, Absolute, 3),
    /* 0x0F */ op!(Ora, AbsoluteLong, 4),
    /* 0x10 */ op!(Bpl, Relative8, 2),
    /* 0x11 */ op!(Ora, DirectIndirectIndexedY, 2),
    /* 0x12 */ op!(Ora, DirectIndirect, 2),
    /* 0x13 */ op!(Ora, StackRelativeIndirectIndexedY, 2),
    /* 0x14 */ op!(Trb, Direct, 2),
    /* 0x15 */ op!(Ora, DirectIndexedX, 2),
    /* 0x16 */ op!(Asl, DirectIndexedX, 2),
    /* 0x17 */ op!(Ora, DirectIndirectLongIndexedY, 2),
    /* 0x18 */ op!(Clc, Implied, 1),
    /* 0x19 */ op!(Ora, AbsoluteIndexedY, 3),
    /* 0x1A */ op!(Inc, Accumulator, 1),
    /* 0x1B */ op!(Tcs, Implied, 1),
    /* 0x1C */ op!(Trb, Absolute, 3),
    /* 0x1D */ op!(Ora, AbsoluteIndexedX, 3),
    /* 0x1E */ op!(Asl, AbsoluteIndexedX, 3),
    /* 0x1F */ op!(Ora, AbsoluteLongIndexedX, 4),
    /* 0x20 */ op!(Jsr, Absolute, 3),
    /* 0x21 */ op!(And, DirectIndexedIndirectX, 2),
    /* 0x22 */ op!(Jsl, AbsoluteLong, 4),
    /* 0x23 */ op!(And, StackRelative, 2),
    /* 0x24 */ op!(Bit, Direct, 2),
    /* 0x25 */ op!(And, Direct, 2),
    /* 0x26 */ op!(Rol, Direct, 2),
    /* 0x27 */ op!(And, DirectIndirectLong, 2),
    /* 0x28 */ op!(Plp, Implied, 1),
    /* 0x29 */ op!(And, Immediate, 2),
    /* 0x2A */ op!(Rol, Accumulator, 1),
    /* 0x2B */ op!(Pld, Implied, 1),
    /* 0x2C */ op!(Bit, Absolute, 3),
    /* 0x2D */ op!(And, Absolute, 3),
    /* 0x2E */ op!(Rol, Absolute, 3),
    /* 0x2F */ op!(And, AbsoluteLong, 4),
    /* 0x30 */ op!(Bmi, Relative8, 2),
    /* 0x31 */ op!(And, DirectIndirectIndexedY, 2),
    /* 0x32 */ op!(And, DirectIndirect, 2),
    /* 0x33 */ op!(And, StackRelativeIndirectIndexedY, 2),
    /* 0x34 */ op!(Bit, DirectIndexedX, 2),
    /* 0x35 */ op!(And, DirectIndexedX, 2),
    /* 0x36 */ op!(Rol, DirectIndexedX, 2),
    /* 0x37 */ op!(And, DirectIndirectLongIndexedY, 2),
    /* 0x38 */ op!(Sec, Implied, 1),
    /* 0x39 */ op!(And, AbsoluteIndexedY, 3),
    /* 0x3A */ op!(Dec, Accumulator, 1),
    /* 0x3B */ op!(Tsc, Implied, 1),
    /* 0x3C */ op!(Bit, AbsoluteIndexedX, 3),
    /* 0x3D */ op!(And, AbsoluteIndexedX, 3),
    /* 0x3E */ op!(Rol, AbsoluteIndexedX, 3),
    /* 0x3F */ op!(And, AbsoluteLongIndexedX, 4),
    /* 0x40 */ op!(Rti, Implied, 1),
    /* 0x41 */ op!(Eor, DirectIndexedIndirectX, 2),
    /* 0x42 */ op!(Wdm, Immediate, 2),
    /* 0x43 */ op!(Eor, StackRelative, 2),
    /* 0x44 */ op!(Mvp, BlockMove, 3),
    /* 0x45 */ op!(Eor, Direct, 2),
    /* 0x46 */ op!(Lsr, Direct, 2),
    /* 0x47 */ op!(Eor, DirectIndirectLong, 2),
    /* 0x48 */ op!(Pha, Implied, 1),
    /* 0x49 */ op!(Eor, Immediate, 2),
    /* 0x4A */ op!(Lsr, Accumulator, 1),
    /* 0x4B */ op!(Phk, Implied, 1),
    /* 0x4C */ op!(Jmp, Absolute, 3),
    /* 0x4D */ op!(Eor, Absolute, 3),
    /* 0x4E */ op!(Lsr, Absolute, 3),
    /* 0x4F */ op!(Eor, AbsoluteLong, 4),
    /* 0x50 */ op!(Bvc, Relative8, 2),
    /* 0x51 */ op!(Eor, DirectIndirectIndexedY, 2),
    /* 0x52 */ op!(Eor, DirectIndirect, 2),
    /* 0x53 */ op!(Eor, StackRelativeIndirectIndexedY, 2),
    /* 0x54 */ op!(Mvn, BlockMove, 3),
    /* 0x55 */ op!(Eor, DirectIndexedX, 2),
    /* 0x56 */ op!(Lsr, DirectIndexedX, 2),
    /* 0x57 */ op!(Eor, DirectIndirectLongIndexedY, 2),
    /* 0x58 */ op!(Cli, Implied, 1),
    /* 0x59 */ op!(Eor, AbsoluteIndexedY, 3),
    /* 0x5A */ op!(Phy, Implied, 1),
    /* 0x5B */ op!(Tcd, Implied, 1),
    /* 0x5C */ op!(Jml, AbsoluteLong, 4),
    /* 0x5D */ op!(Eor, AbsoluteIndexedX, 3),
    /* 0x5E */ op!(Lsr, AbsoluteIndexedX, 3),
    /* 0x5F */ op!(Eor, AbsoluteLongIndexedX, 4),
    /* 0x60 */ op!(Rts, Implied, 1),
    /* 0x61 */ op!(Adc, DirectIndexedIndirectX, 2),
    /* 0x62 */ op!(Per, Relative16, 3),
    /* 0x63 */ op!(Adc, StackRelative, 2),
    /* 0x64 */ op!(Stz, Direct, 2),
    /* 0x65 */ op!(Adc, Direct, 2),
    /* 0x66 */ op!(Ror, Direct, 2),
    /* 0x67 */ op!(Adc, DirectIndirectLong, 2),
    /* 0x68 */ op!(Pla, Implied, 1),
    /* 0x69 */ op!(Adc, Immediate, 2),
    /* 0x6A */ op!(Ror, Accumulator, 1),
    /* 0x6B */ op!(Rtl, Implied, 1),
    /* 0x6C */ op!(Jmp, AbsoluteIndirect, 3),
    /* 0x6D */ op!(Adc, Absolute, 3),
    /* 0x6E */ op!(Ror, Absolute, 3),
    /* 0x6F */ op!(Adc, AbsoluteLong, 4),
    /* 0x70 */ op!(Bvs, Relative8, 2),
    /* 0x71 */ op!(Adc, DirectIndirectIndexedY, 2),
    /* 0x72 */ op!(Adc, DirectIndirect, 2),
    /* 0x73 */ op!(Adc, StackRelativeIndirectIndexedY, 2),
    /* 0x74 */ op!(Stz, DirectIndexedX, 2),
    /* 0x75 */ op!(Adc, DirectIndexedX, 2),
    /* 0x76 */ op!(Ror, DirectIndexedX, 2),
    /* 0x77 */ op!(Adc, DirectIndirectLongIndexedY, 2),
    /* 0x78 */ op!(Sei, Implied, 1),
    /* 0x79 */ op!(Adc, AbsoluteIndexedY, 3),
    /* 0x7A */ op!(Ply, Implied, 1),
    /* 0x7B */ op!(Tdc, Implied, 1),
    /* 0x7C */ op!(Jmp, AbsoluteIndexedIndirectX, 3),
    /* 0x7D */ op!(Adc, AbsoluteIndexedX, 3),
    /* 0x7E */ op!(Ror, AbsoluteIndexedX, 3),
    /* 0x7F */ op!(Adc, AbsoluteLongIndexedX, 4),
    /* 0x80 */ op!(Bra, Relative8, 2),
    /* 0x81 */ op!(Sta, DirectIndexedIndirectX, 2),
    /* 0x82 */ op!(Brl, Relative16, 3),
    /* 0x83 */ op!(Sta, StackRelative, 2),
    /* 0x84 */ op!(Sty, Direct, 2),
    /* 0x85 */ op!(Sta, Direct, 2),
    /* 0x86 */ op!(Stx, Direct, 2),
    /* 0x87 */ op!(Sta, DirectIndirectLong, 2),
    /* 0x88 */ op!(Dey, Implied, 1),
    /* 0x89 */ op!(Bit, Immediate, 2),
    /* 0x8A */ op!(Txa, Implied, 1),
    /* 0x8B */ op!(Phb, Implied, 1),
    /* 0x8C */ op!(Sty, Absolute, 3),
    /* 0x8D */ op!(Sta, Absolute, 3),
    /* 0x8E */ op!(Stx, Absolute, 3),
    /* 0x8F */ op!(Sta, AbsoluteLong, 4),
    /* 0x90 */ op!(Bcc, Relative8, 2),
    /* 0x91 */ op!(Sta, DirectIndirectIndexedY, 2),
    /* 0x92 */ op!(Sta, DirectIndirect, 2),
    /* 0x93 */ op!(Sta, StackRelativeIndirectIndexedY, 2),
    /* 0x94 */ op!(Sty, DirectIndexedX, 2),
    /* 0x95 */ op!(Sta, DirectIndexedX, 2),
    /* 0x96 */ op!(Stx, DirectIndexedY, 2),
    /* 0x97 */ op!(Sta, DirectIndirectLongIndexedY, 2),
    /* 0x98 */ op!(Tya, Implied, 1),
    /* 0x99 */ op!(Sta, AbsoluteIndexedY, 3),
    /* 0x9A */ op!(Txs, Implied, 1),
    /* 0x9B */ op!(Txy, Implied, 1),
    /* 0x9C */ op!(Stz, Absolute, 3),
    /* 0x9D */ op!(Sta, AbsoluteIndexedX, 3),
    /* 0x9E */ op!(Stz, AbsoluteIndexedX, 3),
    /* 0x9F */ op!(Sta, AbsoluteLongIndexedX, 4),
    /* 0xA0 */ op!(Ldy, Immediate, 2),
    /* 0xA1 */ op!(Lda, DirectIndexedIndirectX, 2),
    /* 0xA2 */ op!(Ldx, Immediate, 2),
    /* 0xA3 */ op!(Lda, StackRelative, 2),
    /* 0xA4 */ op!(Ldy, Direct, 2),
    /* 0xA5 */ op!(Lda, Direct, 2),
    /* 0xA6 */ op!(Ldx, Direct, 2),
    /* 0xA7 */ op!(Lda, DirectIndirectLong, 2),
    /* 0xA8 */ op!(Tay, Implied, 1),
    /* 0xA9 */ op!(Lda, Immediate, 2),
    /* 0xAA */ op!(Tax, Implied, 1),
    /* 0xAB */ op!(Plb, Implied, 1),
    /* 0xAC */ op!(Ldy, Absolute, 3),
    /* 0xAD */ op!(Lda, Absolute, 3),
    /* 0xAE */ op!(Ldx, Absolute, 3),
    /* 0xAF */ op!(Lda, AbsoluteLong, 4),
    /* 0xB0 */ op!(Bcs, Relative8, 2),
    /* 0xB1 */ op!(Lda, DirectIndirectIndexedY, 2),
    /* 0xB2 */ op!(Lda, DirectIndirect, 2),
    /* 0xB3 */ op!(Lda, StackRelativeIndirectIndexedY, 2),
    /* 0xB4 */ op!(Ldy, DirectIndexedX, 2),
    /* 0xB5 */ op!(Lda, DirectIndexedX, 2),
    /* 0xB6 */ op!(Ldx, DirectIndexedY, 2),
    /* 0xB7 */ op!(Lda, DirectIndirectLongIndexedY, 2),
    /* 0xB8 */ op!(Clv, Implied, 1),
    /* 0xB9 */ op!(Lda, AbsoluteIndexedY, 3),
    /* 0xBA */ op!(Tsx, Implied, 1),
    /* 0xBB */ op!(Tyx, Implied, 1),
    /* 0xBC */ op!(Ldy, AbsoluteIndexedX, 3),
    /* 0xBD */ op!(Lda, AbsoluteIndexedX, 3),
    /* 0xBE */ op!(Ldx, AbsoluteIndexedY, 3),
    /* 0xBF */ op!(Lda, AbsoluteLongIndexedX, 4),
    /* 0xC0 */ op!(Cpy, Immediate, 2),
    /* 0xC1 */ op!(Cmp, DirectIndexedIndirectX, 2),
    /* 0xC2 */ op!(Rep, Immediate, 2),
    /* 0xC3 */ op!(Cmp, StackRelative, 2),
    /* 0xC4 */ op!(Cpy, Direct, 2),
    /* 0xC5 */ op!(Cmp, Direct, 2),
    /* 0xC6 */ op!(Dec, Direct, 2),
    /* 0xC7 */ op!(Cmp, DirectIndirectLong, 2),
    /* 0xC8 */ op!(Iny, Implied, 1),
    /* 0xC9 */ op!(Cmp, Immediate, 2),
    /* 0xCA */ op!(Dex, Implied, 1),
    /* 0xCB */ op!(Wai, Implied, 1),
    /* 0xCC */ op!(Cpy, Absolute, 3),
    /* 0xCD */ op!(Cmp, Absolute, 3),
    /* 0xCE */ op!(Dec, Absolute, 3),
    /* 0xCF */ op!(Cmp, AbsoluteLong, 4),
    /* 0xD0 */ op!(Bne, Relative8, 2),
    /* 0xD1 */ op!(Cmp, DirectIndirectIndexedY, 2),
    /* 0xD2 */ op!(Cmp, DirectIndirect, 2),
    /* 0xD3 */ op!(Cmp, StackRelativeIndirectIndexedY, 2),
    /* 0xD4 */ op!(Pei, DirectIndirect, 2),
    /* 0xD5 */ op!(Cmp, DirectIndexedX, 2),
    /* 0xD6 */ op!(Dec, DirectIndexedX, 2),
    /* 0xD7 */ op!(Cmp, DirectIndirectLongIndexedY, 2),
    /* 0xD8 */ op!(Cld, Implied, 1),
    /* 0xD9 */ op!(Cmp, AbsoluteIndexedY, 3),
    /* 0xDA */ op!(Phx, Implied, 1),
    /* 0xDB */ op!(Stp, Implied, 1),
    /* 0xDC */ op!(Jml, AbsoluteIndirectLong, 3),
    /* 0xDD */ op!(Cmp, AbsoluteIndexedX, 3),
    /* 0xDE */ op!(Dec, AbsoluteIndexedX, 3),
    /* 0xDF */ op!(Cmp, AbsoluteLongIndexedX, 4),
    /* 0xE0 */ op!(Cpx, Immediate, 2),
    /* 0xE1 */ op!(Sbc, DirectIndexedIndirectX, 2),
    /* 0xE2 */ op!(Sep, Immediate, 2),
    /* 0xE3 */ op!(Sbc, StackRelative, 2),
    /* 0xE4 */ op!(Cpx, Direct, 2),
    /* 0xE5 */ op!(Sbc, Direct, 2),
    /* 0xE6 */ op!(Inc, Direct, 2),
    /* 0xE7 */ op!(Sbc, DirectIndirectLong, 2),
    /* 0xE8 */ op!(Inx, Implied, 1),
    /* 0xE9 */ op!(Sbc, Immediate, 2),
    /* 0xEA */ op!(Nop, Implied, 1),
    /* 0xEB */ op!(Xba, Implied, 1),
    /* 0xEC */ op!(Cpx, Absolute, 3),
    /* 0xED */ op!(Sbc, Absolute, 3),
    /* 0xEE */ op!(Inc, Absolute, 3),
    /* 0xEF */ op!(Sbc, AbsoluteLong, 4),
    /* 0xF0 */ op!(Beq, Relative8, 2),
    /* 0xF1 */ op!(Sbc, DirectIndirectIndexedY, 2),
    /* 0xF2 */ op!(Sbc, DirectIndirect, 2),
    /* 0xF3 */ op!(Sbc, StackRelativeIndirectIndexedY, 2),
    /* 0xF4 */ op!(Pea, Absolute, 3),
    /* 0xF5 */ op!(Sbc, DirectIndexedX, 2),
    /* 0xF6 */ op!(Inc, DirectIndexedX, 2),
    /* 0xF7 */ op!(Sbc, DirectIndirectLongIndexedY, 2),
    /* 0xF8 */ op!(Sed, Implied, 1),
    /* 0xF9 */ op!(Sbc, AbsoluteIndexedY, 3),
    /* 0xFA */ op!(Plx, Implied, 1),
    /* 0xFB */ op!(Xce, Implied, 1),
    /* 0xFC */ op!(Jsr, AbsoluteIndexedIndirectX, 3),
    /* 0xFD */ op!(Sbc, AbsoluteIndexedX, 3),
    /* 0xFE */ op!(Inc, AbsoluteIndexedX, 3),
    /* 0xFF */ op!(Sbc, AbsoluteLongIndexedX, 4),
];

/// A fully built micro-op sequence for one opcode: the addressing-mode
/// prefix followed by the mnemonic's semantic suffix.
///
/// `original_source` keeps separate native/emulation function-pointer
/// arrays (`pfHandler[2][18]`) because a C++ vtable dispatch can't
/// branch on `P.E` cheaply mid-sequence. A tagged `MicroOp` can: every
/// width-sensitive step (immediate operand size, stack push width)
/// reads `P.E`/`P.M`/`P.X` at dispatch time instead, so one sequence
/// serves both modes. See SPEC_FULL.md [C6].
pub struct MicroOpSequence {
    pub ops: Vec<MicroOp>,
}

/// The 256-entry table of fully composed micro-op sequences, built
/// once at first use (component C6's "store both as static data").
/// Each entry composes the opcode's addressing-mode prefix with its
/// mnemonic's semantic suffix, per spec §4.2's "macros compose the
/// above."
pub static INSTRUCTION_TABLE: Lazy<Vec<MicroOpSequence>> = Lazy::new(|| {
    OPCODE_TABLE
        .iter()
        .map(|meta| MicroOpSequence {
            ops: build_prefix(meta.mode, meta.mnemonic)
                .into_iter()
                .chain(std::iter::once(MicroOp::Execute(meta.mnemonic)))
                .collect(),
        })
        .collect()
});

pub fn meta_for(opcode: u8) -> &'static InstructionMeta {
    &OPCODE_TABLE[opcode as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_all_256_opcodes() {
        assert_eq!(OPCODE_TABLE.len(), 256);
    }

    #[test]
    fn lda_immediate_is_opcode_a9() {
        let meta = meta_for(0xA9);
        assert_eq!(meta.mnemonic, Mnemonic::Lda);
        assert_eq!(meta.mode, AddressingMode::Immediate);
    }

    #[test]
    fn brk_is_opcode_00() {
        let meta = meta_for(0x00);
        assert_eq!(meta.mnemonic, Mnemonic::Brk);
    }

    #[test]
    fn instruction_table_lazily_builds_256_sequences() {
        assert_eq!(INSTRUCTION_TABLE.len(), 256);
        assert!(!INSTRUCTION_TABLE[0xA9].ops.is_empty());
    }

    #[test]
    fn base_cycles_matches_known_opcode_timings() {
        assert_eq!(meta_for(0xA9).base_cycles, 2); // LDA #imm
        assert_eq!(meta_for(0xAD).base_cycles, 4); // LDA absolute
        assert_eq!(meta_for(0xA1).base_cycles, 6); // LDA (dp,X)
        assert_eq!(meta_for(0x60).base_cycles, 6); // RTS
        assert_eq!(meta_for(0x00).base_cycles, 8); // BRK
    }
}
