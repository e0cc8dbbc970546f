//! The UICR block tells the bootloader and the runtime how the firmware is
//! laid out: page size, how many pages of flash it occupies, and where its
//! version string lives.

use log::info;

use crate::error::HexError;
use crate::ihex::{render, HexFile, Record, RecordType, UICR_UPPER};

pub const NRF_PAGE_SIZE_LOG2: u32 = 10;
pub const NRF_PAGE_SIZE: u32 = 1 << NRF_PAGE_SIZE_LOG2;
pub const UICR_BASE_ADDR: u32 = 0x1000_10C0;
pub const UICR_MAGIC: u32 = 0x17EE_B07C;

/// The 28 byte block, little endian.
pub fn uicr_block(largest_addr: u32, version_addr: u32) -> Result<Vec<u8>, HexError> {
    let pages = largest_addr.div_ceil(NRF_PAGE_SIZE);
    let pages_used = u16::try_from(pages).map_err(|_| HexError::TooManyPages(pages))?;

    let mut block = Vec::with_capacity(28);
    block.extend_from_slice(&UICR_MAGIC.to_le_bytes());
    block.extend_from_slice(&u32::MAX.to_le_bytes());
    block.extend_from_slice(&NRF_PAGE_SIZE_LOG2.to_le_bytes());
    block.extend_from_slice(&0u16.to_le_bytes());
    block.extend_from_slice(&pages_used.to_le_bytes());
    block.extend_from_slice(&u32::MAX.to_le_bytes());
    block.extend_from_slice(&version_addr.to_le_bytes());
    block.extend_from_slice(&0u32.to_le_bytes());
    Ok(block)
}

pub fn uicr_records(largest_addr: u32, version_addr: u32) -> Result<Vec<Record>, HexError> {
    let block = uicr_block(largest_addr, version_addr)?;
    let mut records = vec![Record::extended_linear_address(UICR_UPPER)];
    for (i, chunk) in block.chunks(16).enumerate() {
        let at = UICR_BASE_ADDR + (i as u32) * 16;
        records.push(Record::new(at as u16, RecordType::Data, chunk.to_vec())?);
    }
    Ok(records)
}

/// Firmware with a UICR section inserted before its closing start-address
/// and end-of-file records.
pub fn add_uicr(firmware: &HexFile, version_addr: u32) -> Result<String, HexError> {
    let split = firmware.trailer_line().ok_or(HexError::MissingTrailer)?;
    let largest = firmware.largest_address();
    info!(
        "firmware ends at 0x{:X} ({} pages), version string at 0x{:X}",
        largest,
        largest.div_ceil(NRF_PAGE_SIZE),
        version_addr
    );

    let records = uicr_records(largest, version_addr)?;
    let eol = firmware.line_ending();
    let (head, tail) = firmware.lines().split_at(split);

    let mut out = String::new();
    for line in head {
        out.push_str(line);
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push_str(eol);
    }
    out.push_str(&render(&records, eol));
    out.push_str(eol);
    for line in tail {
        out.push_str(line);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_matches_reference() {
        let records = uicr_records(0x3DF10, 0x3D000).unwrap();
        assert_eq!(
            render(&records, "\n"),
            ":020000041000EA\n\
             :1010C0007CB0EE17FFFFFFFF0A0000000000F800F1\n\
             :0C10D000FFFFFFFF00D003000000000045"
        );
    }

    #[test]
    fn page_count_rounds_up() {
        let block = uicr_block(1025, 0).unwrap();
        assert_eq!(&block[14..16], &2u16.to_le_bytes());
        let block = uicr_block(1024, 0).unwrap();
        assert_eq!(&block[14..16], &1u16.to_le_bytes());
    }

    #[test]
    fn inserted_before_trailer() {
        let fw = HexFile::parse(
            ":020000040003F7\n\
             :10DF0000AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA71\n\
             :0400000500012C3199\n\
             :00000001FF\n",
        )
        .unwrap();
        let out = add_uicr(&fw, 0x3D000).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(
            lines,
            [
                ":020000040003F7",
                ":10DF0000AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA71",
                ":020000041000EA",
                ":1010C0007CB0EE17FFFFFFFF0A0000000000F800F1",
                ":0C10D000FFFFFFFF00D003000000000045",
                ":0400000500012C3199",
                ":00000001FF",
            ]
        );
    }

    #[test]
    fn end_of_file_only_trailer() {
        let fw = HexFile::parse(
            ":020000040003F7\n\
             :10DF0000AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA71\n\
             :00000001FF\n",
        )
        .unwrap();
        let out = add_uicr(&fw, 0x3D000).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(
            lines,
            [
                ":020000040003F7",
                ":10DF0000AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA71",
                ":020000041000EA",
                ":1010C0007CB0EE17FFFFFFFF0A0000000000F800F1",
                ":0C10D000FFFFFFFF00D003000000000045",
                ":00000001FF",
            ]
        );
    }

    #[test]
    fn needs_an_end_of_file_record() {
        let fw = HexFile::parse(
            ":020000040003F7\n:10DF0000AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA71\n",
        )
        .unwrap();
        assert!(matches!(add_uicr(&fw, 0), Err(HexError::MissingTrailer)));
    }
}
