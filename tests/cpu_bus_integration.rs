//! End-to-end scenarios from spec §8, exercised entirely through the
//! public `Cpu`/`BusA` surface (no access to crate-private internals,
//! unlike `src/cpu/tests.rs`'s integration layer).

use ricoh5a22_core::bus::{AccessSource, Accessor, SpeedProfile};
use ricoh5a22_core::cpu::flags;
use ricoh5a22_core::{BusA, Cpu};
use std::sync::{Arc, Mutex};

fn flat_ram_bus() -> (BusA, Arc<Mutex<Vec<u8>>>) {
    let mut bus = BusA::new(SpeedProfile::Ntsc);
    let backing = Arc::new(Mutex::new(vec![0u8; 1 << 24]));
    for bank in 0..=0xFFu32 {
        for page in 0..=0xFFu32 {
            let read_backing = Arc::clone(&backing);
            let write_backing = Arc::clone(&backing);
            bus.install_accessor(
                bank as u8,
                page as u8,
                Accessor::open(
                    move |addr, _src| read_backing.lock().unwrap()[addr as usize],
                    move |addr, value, _src| write_backing.lock().unwrap()[addr as usize] = value,
                ),
            );
        }
    }
    (bus, backing)
}

fn poke(ram: &Mutex<Vec<u8>>, addr: u32, value: u8) {
    ram.lock().unwrap()[addr as usize] = value;
}

#[test]
fn reset_drives_the_documented_two_reads_three_aborted_pushes_vector_fetch_sequence() {
    let (mut bus, ram) = flat_ram_bus();
    poke(&ram, 0xFFFC, 0x34);
    poke(&ram, 0xFFFD, 0x12);

    let cycles_before = bus.total_cycles();
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);

    assert_eq!(cpu.regs.pc, 0x1234);
    assert_eq!(cpu.regs.pbr, 0);
    assert!(cpu.regs.e);
    assert!(bus.total_cycles() > cycles_before);
}

#[test]
fn a_full_program_can_run_across_many_steps_without_desyncing_the_bus_clock() {
    let (mut bus, ram) = flat_ram_bus();
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);

    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0;
    // CLC ; XCE ; REP #$30 ; LDA #$1234 ; STA $0200 ; INC A ; BRA -6
    poke(&ram, 0x8000, 0x18); // CLC
    poke(&ram, 0x8001, 0xFB); // XCE
    poke(&ram, 0x8002, 0xC2); // REP #$30
    poke(&ram, 0x8003, 0x30);
    poke(&ram, 0x8004, 0xA9); // LDA #$1234
    poke(&ram, 0x8005, 0x34);
    poke(&ram, 0x8006, 0x12);
    poke(&ram, 0x8007, 0x8D); // STA $0200
    poke(&ram, 0x8008, 0x00);
    poke(&ram, 0x8009, 0x02);

    let mut total_cycles = 0u64;
    for _ in 0..5 {
        total_cycles += cpu.step(&mut bus);
    }

    assert!(!cpu.regs.e);
    assert_eq!(cpu.regs.a, 0x1234);
    assert_eq!(ram.lock().unwrap()[0x000200], 0x34);
    assert_eq!(ram.lock().unwrap()[0x000201], 0x12);
    assert!(total_cycles > 0);
}

#[test]
fn nmi_preempts_a_pending_irq_per_the_documented_priority_order() {
    let (mut bus, ram) = flat_ram_bus();
    let mut cpu = Cpu::new();
    cpu.regs.e = false;
    cpu.regs.p &= !flags::I;
    cpu.regs.pc = 0x8000;
    cpu.regs.pbr = 0;
    cpu.regs.s = 0x01FF;
    poke(&ram, 0x8000, 0xEA); // NOP
    poke(&ram, 0xFFEA, 0x00); // NMI vector (native)
    poke(&ram, 0xFFEB, 0xA0);
    poke(&ram, 0xFFEE, 0x00); // IRQ vector (native)
    poke(&ram, 0xFFEF, 0xB0);

    cpu.set_irq_line(true);
    cpu.set_nmi_line(true);
    cpu.set_nmi_line(false); // latch the falling edge

    cpu.step(&mut bus);

    assert_eq!(cpu.regs.pc, 0xA000, "NMI must win priority over a pending IRQ");
}

#[test]
fn dma_freeze_and_resume_round_trips_register_state_across_an_external_hijack() {
    let (mut bus, _ram) = flat_ram_bus();
    let mut cpu = Cpu::new();
    cpu.reset(&mut bus);
    cpu.regs.a = 0xBEEF;
    cpu.regs.x = 0x1122;

    let snapshot = cpu.freeze_for_dma();
    cpu.regs.a = 0x0000;
    cpu.regs.x = 0x0000;
    cpu.charge_external_cycles(512);
    cpu.resume_from_dma(snapshot);

    assert_eq!(cpu.regs.a, 0xBEEF);
    assert_eq!(cpu.regs.x, 0x1122);
}

#[test]
fn open_bus_latch_survives_reads_from_unmapped_pages() {
    let mut bus = BusA::new(SpeedProfile::Ntsc);
    bus.write(0x7E0000, 0x42, AccessSource::Cpu);
    assert_eq!(bus.read(0x000000, AccessSource::Cpu), 0x42);
}
