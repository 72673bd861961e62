//! Address translation behavior: identity, page walks, faults and the page
//! color check.

mod common;

use common::*;
use gaia_core::cpu::{Config, Machine};
use gaia_core::exception::{Exception, TranslationFault};

const PRESENT: u32 = 1;

fn machine() -> Machine {
    Machine::new(Config::default())
}

#[test]
fn disabled_mmu_translates_to_identity() {
    let m = machine();
    assert_eq!(m.translate(0x100).unwrap(), 0x100);
    assert_eq!(m.translate(0xdead_bee0).unwrap(), 0xdead_bee0);
}

#[test]
fn disabled_mmu_load_reads_ram_unchanged() {
    let mut emu = emu_with_program(Config::default(), &[ld(1, 0, 0x40), HALT]);
    emu.machine.mem.write_word(0x100, 0xdead_beef);
    emu.run().unwrap();
    assert_eq!(emu.machine.regs.read(1), 0xdead_beef);
}

#[test]
fn two_level_walk_resolves_a_mapped_page() {
    let mut m = machine();
    m.mmu.enabled = true;
    m.mmu.pd_addr = 0x1000;
    // PDE[0] -> page table at 0x2000; PTE[0] -> frame 0, PTE[4] -> frame 0x8000
    m.mem.write_word(0x1000, 0x2000 | PRESENT);
    m.mem.write_word(0x2000, PRESENT);
    m.mem.write_word(0x2000 + 4 * 4, 0x8000 | PRESENT);

    assert_eq!(m.translate(0x234).unwrap(), 0x234);
    assert_eq!(m.translate(0x4234).unwrap(), 0x8234);
}

#[test]
fn missing_pde_is_a_page_fault() {
    let mut m = machine();
    m.mmu.enabled = true;
    m.mmu.pd_addr = 0x1000;
    // Present bit clear
    m.mem.write_word(0x1000, 0x2000);

    let err = m.translate(0x234).unwrap_err();
    assert!(matches!(
        err,
        Exception::Translation {
            fault: TranslationFault::InvalidPde,
            vaddr: 0x234
        }
    ));
}

#[test]
fn missing_pte_is_a_page_fault() {
    let mut m = machine();
    m.mmu.enabled = true;
    m.mmu.pd_addr = 0x1000;
    m.mem.write_word(0x1000, 0x2000 | PRESENT);
    m.mem.write_word(0x2000, 0x3000); // present bit clear

    let err = m.translate(0x10).unwrap_err();
    assert!(matches!(
        err,
        Exception::Translation {
            fault: TranslationFault::InvalidPte,
            ..
        }
    ));
}

#[test]
fn pde_address_out_of_ram_is_fatal() {
    let mut m = machine();
    m.mmu.enabled = true;
    m.mmu.pd_addr = m.mem.size();

    let err = m.translate(0).unwrap_err();
    assert!(matches!(
        err,
        Exception::Translation {
            fault: TranslationFault::PdeAddress { .. },
            ..
        }
    ));
}

#[test]
fn page_color_mismatch_is_fatal() {
    let mut m = machine();
    m.mmu.enabled = true;
    m.mmu.pd_addr = 0x1000;
    // Map virtual page 0 (color 0) to frame 0x1000 (color 1)
    m.mem.write_word(0x1000, 0x2000 | PRESENT);
    m.mem.write_word(0x2000, 0x1000 | PRESENT);

    let err = m.translate(0x10).unwrap_err();
    assert!(matches!(
        err,
        Exception::Translation {
            fault: TranslationFault::PageColor { paddr: 0x1010 },
            ..
        }
    ));
}

#[test]
fn translation_faults_are_flagged_for_the_reporter() {
    let mut m = machine();
    m.mmu.enabled = true;
    m.mmu.pd_addr = 0x1000;
    let err = m.translate(0).unwrap_err();
    assert!(err.is_translation_fault());
    assert!(err.to_string().starts_with("to_physical: "));
}

#[test]
fn mapped_page_can_point_at_device_registers() {
    let mut emu = emu_with_program(
        Config::default(),
        &[ldl(1, 0x1004), ld(2, 1, 0), HALT],
    );
    let m = &mut emu.machine;
    m.mmu.enabled = true;
    m.mmu.pd_addr = 0x4000;
    // Identity-map the low 4 MiB so code keeps fetching, except virtual
    // page 0x1000 which points at the device block (both color 1).
    m.mem.write_word(0x4000, 0x5000 | PRESENT);
    for i in 0..1024u32 {
        m.mem.write_word(0x5000 + 4 * i, (i << 12) | PRESENT);
    }
    m.mem.write_word(0x5000 + 4, 0x8000_1000 | PRESENT);

    emu.run().unwrap();
    // Virtual 0x1004 resolved to the Tx-ready register
    assert_eq!(emu.machine.regs.read(2), 1);
}

#[test]
fn page_fault_during_load_carries_the_virtual_address() {
    let mut emu = emu_with_program(
        Config::default(),
        &[ldl(1, 0), ldh(1, 1, 0x0040), ld(2, 1, 0), HALT],
    );
    let m = &mut emu.machine;
    m.mmu.enabled = true;
    m.mmu.pd_addr = 0x4000;
    // Identity-map the first 4 MiB; directory slot 1 stays not-present.
    m.mem.write_word(0x4000, 0x5000 | PRESENT);
    for i in 0..1024u32 {
        m.mem.write_word(0x5000 + 4 * i, (i << 12) | PRESENT);
    }

    // Virtual 0x00400000 has no directory entry
    let err = emu.run().unwrap_err();
    assert!(matches!(
        err,
        Exception::Translation {
            fault: TranslationFault::InvalidPde,
            vaddr: 0x0040_0000
        }
    ));
}
