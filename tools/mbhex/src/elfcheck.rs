use std::fmt;

use elf::endian::AnyEndian;
use elf::ElfBytes;
use log::debug;

use crate::error::HexError;

// sh_flags bit for sections that occupy memory at run time
const SHF_ALLOC: u64 = 0x2;

/// Where a linked firmware image sits in flash relative to the script region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeReport {
    pub start: u64,
    pub flash_size: u64,
    pub end: u64,
    pub script_addr: u64,
}

impl SizeReport {
    pub fn fits(&self) -> bool {
        self.end < self.script_addr
    }
}

impl fmt::Display for SizeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "start address: 0x{:x}", self.start)?;
        writeln!(f, "flash size: 0x{:x}", self.flash_size)?;
        writeln!(f, "end address: 0x{:x}", self.end)?;
        writeln!(f, "python file address: 0x{:x}", self.script_addr)?;
        write!(f, "{}", if self.fits() { "pass" } else { "fail" })
    }
}

/// Measure the firmware as entry point plus the size of every allocated
/// section.
pub fn check_elf(bytes: &[u8], script_addr: u32) -> Result<SizeReport, HexError> {
    let file = ElfBytes::<AnyEndian>::minimal_parse(bytes)?;
    let sections = file.section_headers().ok_or(HexError::NoSections)?;

    let flash_size = sections
        .iter()
        .filter(|shdr| shdr.sh_flags & SHF_ALLOC != 0)
        .try_fold(0u64, |total, shdr| total.checked_add(shdr.sh_size))
        .ok_or(HexError::ElfOverflow)?;
    let start = file.ehdr.e_entry;
    debug!("entry 0x{:x}, {} allocated bytes", start, flash_size);
    let end = start.checked_add(flash_size).ok_or(HexError::ElfOverflow)?;

    Ok(SizeReport {
        start,
        flash_size,
        end,
        script_addr: u64::from(script_addr),
    })
}
