//! End-to-end `Cpu::step` tests exercising the instruction table,
//! addressing modes, and interrupt sequencing together against a real
//! [`BusA`] — the integration layer `cpu/*.rs`'s per-module unit tests
//! don't cover. Scenarios are grounded in spec §8's worked examples.

use super::*;
use crate::bus::SpeedProfile;
use std::sync::{Arc, Mutex};

fn harness() -> (Cpu, BusA, Arc<Mutex<Vec<u8>>>) {
    let bus = BusA::new(SpeedProfile::Ntsc);
    let backing = Arc::clone(bus.ram_pointer());
    let cpu = Cpu::new();
    (cpu, bus, backing)
}

fn poke(ram: &Mutex<Vec<u8>>, addr: u32, value: u8) {
    ram.lock().unwrap()[addr as usize] = value;
}

#[test]
fn reset_sequence_loads_vector_and_enters_emulation_mode() {
    let (mut cpu, mut bus, ram) = harness();
    poke(&ram, 0xFFFC, 0x00);
    poke(&ram, 0xFFFD, 0x80);

    cpu.reset(&mut bus);

    assert_eq!(cpu.regs.pc, 0x8000);
    assert_eq!(cpu.regs.pbr, 0x00);
    assert!(cpu.regs.e);
    assert_eq!(cpu.regs.p & flags::I, flags::I);
    assert_eq!(cpu.regs.p & flags::D, 0);
    assert!(cpu.regs.is_8bit_a());
    assert!(cpu.regs.is_8bit_index());
    assert_eq!(cpu.regs.s, 0x01FF);
    // Two dummy fetches, three aborted pushes, two vector reads.
    assert_eq!(bus.access_count(), 7);
}

#[test]
fn lda_immediate_in_emulation_mode_loads_low_byte_and_sets_flags() {
    let (mut cpu, mut bus, ram) = harness();
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0x00;
    poke(&ram, 0x8000, 0xA9); // LDA #imm
    poke(&ram, 0x8001, 0x42);

    let cycles = cpu.step(&mut bus);

    assert_eq!(cpu.regs.a_low(), 0x42);
    assert_eq!(cpu.regs.pc, 0x8002);
    assert!(!cpu.regs.flag(flags::Z));
    assert!(!cpu.regs.flag(flags::N));
    assert_eq!(cycles, 2);
}

#[test]
fn ora_direct_indexed_indirect_x_dereferences_through_dbr() {
    let (mut cpu, mut bus, ram) = harness();
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0x00;
    cpu.regs.dbr = 0x00;
    cpu.regs.d = 0x0000;
    cpu.regs.x = 0x04;
    cpu.regs.set_a_low(0x0A);
    poke(&ram, 0x8000, 0x01); // ORA (dp,X)
    poke(&ram, 0x8001, 0x0C);
    poke(&ram, 0x0010, 0x20);
    poke(&ram, 0x0011, 0x30);
    poke(&ram, 0x3020, 0x55);

    let cycles = cpu.step(&mut bus);

    assert_eq!(cpu.regs.a_low(), 0x5F);
    assert!(!cpu.regs.flag(flags::Z));
    assert!(!cpu.regs.flag(flags::N));
    // Opcode, offset, mandatory index-add, ptr lo, ptr hi, data.
    assert_eq!(cycles, 6);
}

#[test]
fn irq_taken_in_native_mode_runs_brk_shaped_sequence() {
    let (mut cpu, mut bus, ram) = harness();
    cpu.regs.e = false;
    cpu.regs.p &= !flags::I;
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0x01;
    cpu.regs.s = 0x01FF;
    poke(&ram, 0xFFEE, 0x00);
    poke(&ram, 0xFFEF, 0x90);
    poke(&ram, 0x8000, 0xEA); // a NOP that never actually executes this tick

    cpu.set_irq_line(true);
    let cycles = cpu.step(&mut bus);

    assert_eq!(cpu.regs.pc, 0x9000);
    assert_eq!(cpu.regs.pbr, 0x00);
    assert!(cpu.regs.flag(flags::I));
    assert!(!cpu.regs.flag(flags::D));
    // PBR, PCH, PCL, P were pushed in that order; S decremented by 4.
    assert_eq!(cpu.regs.s, 0x01FB);
    // One internal cycle, four pushes, two vector reads.
    assert_eq!(cycles, 7);
    let ram = ram.lock().unwrap();
    assert_eq!(ram[0x01FF], 0x01); // PBR
    assert_eq!(ram[0x01FE], 0x80); // PCH
    assert_eq!(ram[0x01FD], 0x00); // PCL
}

#[test]
fn brk_in_emulation_mode_pushes_break_flag_set() {
    let (mut cpu, mut bus, ram) = harness();
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0x00;
    cpu.regs.s = 0x01FF;
    poke(&ram, 0xFFFE, 0x00);
    poke(&ram, 0xFFFF, 0x90);
    poke(&ram, 0x8000, 0x00); // BRK
    poke(&ram, 0x8001, 0xEA); // signature byte

    cpu.step(&mut bus);

    assert_eq!(cpu.regs.pc, 0x9000);
    let pushed_status = ram.lock().unwrap()[0x01FD];
    assert_eq!(pushed_status & flags::B, flags::B);
}

#[test]
fn xce_then_rep_widens_accumulator_and_index() {
    let (mut cpu, mut bus, ram) = harness();
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0x00;
    cpu.regs.set_flag(flags::C, false); // CLC; XCE is the canonical native-mode entry
    poke(&ram, 0x8000, 0xFB); // XCE
    poke(&ram, 0x8001, 0xC2); // REP #$30
    poke(&ram, 0x8002, 0x30);

    cpu.step(&mut bus);
    assert!(!cpu.regs.e);
    cpu.step(&mut bus);

    assert!(!cpu.regs.is_8bit_a());
    assert!(!cpu.regs.is_8bit_index());
}

#[test]
fn jsr_pushes_return_address_minus_one_and_rts_restores_it() {
    let (mut cpu, mut bus, ram) = harness();
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0x00;
    cpu.regs.s = 0x01FF;
    poke(&ram, 0x8000, 0x20); // JSR $9000
    poke(&ram, 0x8001, 0x00);
    poke(&ram, 0x8002, 0x90);
    poke(&ram, 0x9000, 0x60); // RTS

    cpu.step(&mut bus); // JSR
    assert_eq!(cpu.regs.pc, 0x9000);
    cpu.step(&mut bus); // RTS
    assert_eq!(cpu.regs.pc, 0x8003);
}

#[test]
fn mvn_block_move_copies_bytes_and_updates_registers() {
    let (mut cpu, mut bus, ram) = harness();
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0x00;
    cpu.regs.x = 0x2000;
    cpu.regs.y = 0x4000;
    cpu.regs.a = 0x0002; // 3 bytes
    poke(&ram, 0x8000, 0x54); // MVN dst=$02, src=$01
    poke(&ram, 0x8001, 0x02);
    poke(&ram, 0x8002, 0x01);
    poke(&ram, 0x012000, 0x11);
    poke(&ram, 0x012001, 0x22);
    poke(&ram, 0x012002, 0x33);

    cpu.step(&mut bus);

    assert_eq!(cpu.regs.a, 0xFFFF);
    assert_eq!(cpu.regs.x, 0x2003);
    assert_eq!(cpu.regs.y, 0x4003);
    assert_eq!(cpu.regs.dbr, 0x02);
    let ram = ram.lock().unwrap();
    assert_eq!(ram[0x024000], 0x11);
    assert_eq!(ram[0x024001], 0x22);
    assert_eq!(ram[0x024002], 0x33);
}

#[test]
fn wai_halts_until_an_interrupt_line_asserts() {
    let (mut cpu, mut bus, ram) = harness();
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0x00;
    cpu.regs.p &= !flags::I;
    poke(&ram, 0x8000, 0xCB); // WAI
    poke(&ram, 0xFFEE, 0x00);
    poke(&ram, 0xFFEF, 0xA0);
    cpu.regs.e = false;

    cpu.step(&mut bus);
    assert!(cpu.is_waiting());
    cpu.step(&mut bus); // still waiting, no line asserted
    assert!(cpu.is_waiting());

    cpu.set_irq_line(true);
    cpu.step(&mut bus);
    assert!(!cpu.is_waiting());
    assert_eq!(cpu.regs.pc, 0xA000);
}

#[test]
fn stp_halts_the_cpu_until_hardware_reset() {
    let (mut cpu, mut bus, ram) = harness();
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0x00;
    poke(&ram, 0x8000, 0xDB); // STP
    poke(&ram, 0xFFFC, 0x00);
    poke(&ram, 0xFFFD, 0x80);

    cpu.step(&mut bus);
    assert!(cpu.is_stopped());
    let pc_before = cpu.regs.pc;
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, pc_before);

    cpu.reset(&mut bus);
    assert!(!cpu.is_stopped());
}

#[test]
fn rdy_low_freezes_step_without_clearing_pending_nmi() {
    let (mut cpu, mut bus, ram) = harness();
    cpu.regs.e = false;
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0x00;
    poke(&ram, 0x8000, 0xEA); // NOP
    poke(&ram, 0xFFEA, 0x00);
    poke(&ram, 0xFFEB, 0xB0);

    cpu.set_nmi_line(true);
    cpu.set_nmi_line(false); // latch the falling edge
    cpu.set_ready(false);

    let pc_before = cpu.regs.pc;
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, pc_before);

    cpu.set_ready(true);
    cpu.step(&mut bus);
    assert_eq!(cpu.regs.pc, 0xB000);
}
