//! Encode a user script for the script region of flash.
//!
//! The runtime looks for `MP` followed by a little-endian `u16` length at
//! [`SCRIPT_ADDR`] and runs that many bytes of source after it.

use log::debug;

use crate::error::HexError;
use crate::ihex::{Record, RecordType};

/// Where the firmware looks for an appended script.
pub const SCRIPT_ADDR: u32 = 0x3E000;

/// Size of the flash window reserved for the script.
pub const MAX_SCRIPT_REGION: usize = 0x2000;

const MAGIC: &[u8; 2] = b"MP";
const ROW: usize = 16;

/// Header, script, then zero padding up to the next 16-byte row.
///
/// Padding is always added, so a payload that already fills its last row
/// gets a whole row of zeros after it.
pub fn script_payload(script: &[u8]) -> Result<Vec<u8>, HexError> {
    let too_large = |size| HexError::ScriptTooLarge {
        size,
        max: MAX_SCRIPT_REGION,
    };
    let len = u16::try_from(script.len()).map_err(|_| too_large(script.len() + 4))?;

    let mut data = Vec::with_capacity(script.len() + 4 + ROW);
    data.extend_from_slice(MAGIC);
    data.extend_from_slice(&len.to_le_bytes());
    data.extend_from_slice(script);
    data.resize(data.len() + ROW - data.len() % ROW, 0);

    if data.len() > MAX_SCRIPT_REGION {
        return Err(too_large(data.len()));
    }
    Ok(data)
}

/// Records placing `script` at `addr`.
///
/// Starts with an extended linear address record and adds another whenever
/// the data crosses into the next 64 KiB.
pub fn hexlify_script(script: &[u8], addr: u32) -> Result<Vec<Record>, HexError> {
    if addr % ROW as u32 != 0 {
        return Err(HexError::MisalignedAddress(addr));
    }
    let payload = script_payload(script)?;
    debug!(
        "script: {} bytes, {} byte payload at 0x{:X}",
        script.len(),
        payload.len(),
        addr
    );

    let mut records = Vec::with_capacity(payload.len() / ROW + 2);
    let mut upper = None;
    for (i, chunk) in payload.chunks(ROW).enumerate() {
        let at = addr
            .checked_add((i * ROW) as u32)
            .ok_or(HexError::AddressOutOfRange(addr))?;
        let hi = (at >> 16) as u16;
        if upper != Some(hi) {
            records.push(Record::extended_linear_address(hi));
            upper = Some(hi);
        }
        records.push(Record::new(at as u16, RecordType::Data, chunk.to_vec())?);
    }
    Ok(records)
}
