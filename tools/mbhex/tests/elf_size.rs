//! Size check against tiny hand-built ELF32 files.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use mbhex::HexError;
use mbhex::elfcheck::check_elf;

const SHT_PROGBITS: u32 = 1;
const SHT_STRTAB: u32 = 3;
const SHT_NOBITS: u32 = 8;
const SHF_ALLOC: u32 = 0x2;
const SHF_EXECINSTR: u32 = 0x4;

struct Section {
    name: u32,
    kind: u32,
    flags: u32,
    offset: u32,
    size: u32,
}

/// Little-endian ARM executable: entry point, `.text` and `.data` allocated,
/// `.comment` not.
fn build_elf(entry: u32, text_size: u32, data_size: u32) -> Vec<u8> {
    let shstrtab = b"\0.text\0.data\0.comment\0.shstrtab\0";
    let shoff = 52 + shstrtab.len() as u32;
    let sections = [
        Section { name: 0, kind: 0, flags: 0, offset: 0, size: 0 },
        Section { name: 1, kind: SHT_NOBITS, flags: SHF_ALLOC | SHF_EXECINSTR, offset: 0, size: text_size },
        Section { name: 7, kind: SHT_NOBITS, flags: SHF_ALLOC, offset: 0, size: data_size },
        Section { name: 13, kind: SHT_PROGBITS, flags: 0, offset: 52, size: 0x20 },
        Section { name: 22, kind: SHT_STRTAB, flags: 0, offset: 52, size: shstrtab.len() as u32 },
    ];

    let mut out = Vec::new();
    out.extend_from_slice(&[0x7F, b'E', b'L', b'F', 1, 1, 1, 0]);
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    out.extend_from_slice(&40u16.to_le_bytes()); // EM_ARM
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&entry.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // e_phoff
    out.extend_from_slice(&shoff.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    out.extend_from_slice(&52u16.to_le_bytes());
    out.extend_from_slice(&32u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // e_phnum
    out.extend_from_slice(&40u16.to_le_bytes());
    out.extend_from_slice(&(sections.len() as u16).to_le_bytes());
    out.extend_from_slice(&4u16.to_le_bytes()); // e_shstrndx
    assert_eq!(out.len(), 52);

    out.extend_from_slice(shstrtab);
    for s in &sections {
        for field in [s.name, s.kind, s.flags, 0, s.offset, s.size, 0, 0, 1, 0] {
            out.extend_from_slice(&field.to_le_bytes());
        }
    }
    out
}

/// Little-endian 64-bit executable with one allocated `.text` section.
fn build_elf64(entry: u64, text_size: u64) -> Vec<u8> {
    let shstrtab = b"\0.text\0.shstrtab\0";
    // keep the section headers 8-aligned
    let shoff = (64 + shstrtab.len() as u64).next_multiple_of(8);

    let mut out = Vec::new();
    out.extend_from_slice(&[0x7F, b'E', b'L', b'F', 2, 1, 1, 0]);
    out.extend_from_slice(&[0; 8]);
    out.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    out.extend_from_slice(&183u16.to_le_bytes()); // EM_AARCH64
    out.extend_from_slice(&1u32.to_le_bytes());
    out.extend_from_slice(&entry.to_le_bytes());
    out.extend_from_slice(&0u64.to_le_bytes()); // e_phoff
    out.extend_from_slice(&shoff.to_le_bytes());
    out.extend_from_slice(&0u32.to_le_bytes()); // e_flags
    out.extend_from_slice(&64u16.to_le_bytes());
    out.extend_from_slice(&56u16.to_le_bytes());
    out.extend_from_slice(&0u16.to_le_bytes()); // e_phnum
    out.extend_from_slice(&64u16.to_le_bytes());
    out.extend_from_slice(&3u16.to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes()); // e_shstrndx
    assert_eq!(out.len(), 64);

    out.extend_from_slice(shstrtab);
    out.resize(shoff as usize, 0);

    let sections: [(u32, u32, u64, u64, u64); 3] = [
        (0, 0, 0, 0, 0),
        (1, SHT_NOBITS, u64::from(SHF_ALLOC | SHF_EXECINSTR), 0, text_size),
        (7, SHT_STRTAB, 0, 64, shstrtab.len() as u64),
    ];
    for (name, kind, flags, offset, size) in sections {
        out.extend_from_slice(&name.to_le_bytes());
        out.extend_from_slice(&kind.to_le_bytes());
        out.extend_from_slice(&flags.to_le_bytes());
        out.extend_from_slice(&0u64.to_le_bytes()); // sh_addr
        out.extend_from_slice(&offset.to_le_bytes());
        out.extend_from_slice(&size.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // sh_link
        out.extend_from_slice(&0u32.to_le_bytes()); // sh_info
        out.extend_from_slice(&1u64.to_le_bytes()); // sh_addralign
        out.extend_from_slice(&0u64.to_le_bytes()); // sh_entsize
    }
    out
}

#[test]
fn counts_only_allocated_sections() {
    let report = check_elf(&build_elf(0x18000, 0x20000, 0x400), 0x3E000).unwrap();
    assert_eq!(report.start, 0x18000);
    assert_eq!(report.flash_size, 0x20400);
    assert_eq!(report.end, 0x38400);
    assert!(report.fits());
}

#[test]
fn firmware_reaching_script_region_fails() {
    let report = check_elf(&build_elf(0x18000, 0x25000, 0x1000), 0x3E000).unwrap();
    assert_eq!(report.end, 0x3E000);
    assert!(!report.fits());
}

#[test]
fn check_command_exit_codes() {
    let dir = TempDir::new().unwrap();
    let small = dir.path().join("small.elf");
    let big = dir.path().join("big.elf");
    fs::write(&small, build_elf(0x18000, 0x1000, 0)).unwrap();
    fs::write(&big, build_elf(0x18000, 0x30000, 0)).unwrap();

    let mut cmd: Command = assert_cmd::cargo::cargo_bin_cmd!("mbhex");
    cmd.arg("check")
        .arg(&small)
        .assert()
        .success()
        .stdout(predicate::str::contains("end address: 0x19000"))
        .stdout(predicate::str::ends_with("pass\n"));

    let mut cmd: Command = assert_cmd::cargo::cargo_bin_cmd!("mbhex");
    cmd.arg("check")
        .arg(&big)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("python file address: 0x3e000"))
        .stdout(predicate::str::ends_with("fail\n"));

    // a lower script address given as bare hex
    let mut cmd: Command = assert_cmd::cargo::cargo_bin_cmd!("mbhex");
    cmd.arg("check")
        .arg(&small)
        .arg("19000")
        .assert()
        .code(2);
}

#[test]
fn sixty_four_bit_elf_is_measured() {
    let report = check_elf(&build_elf64(0x18000, 0x1000), 0x3E000).unwrap();
    assert_eq!(report.end, 0x19000);
    assert!(report.fits());
}

#[test]
fn end_past_address_space_is_an_error() {
    let elf = build_elf64(u64::MAX - 4, 0x100);
    assert!(matches!(check_elf(&elf, 0x3E000), Err(HexError::ElfOverflow)));

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wrapping.elf");
    fs::write(&path, elf).unwrap();

    let mut cmd: Command = assert_cmd::cargo::cargo_bin_cmd!("mbhex");
    cmd.arg("check")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("pass").not())
        .stderr(predicate::str::contains("past the end of the address space"));
}
