use log::info;

use crate::error::HexError;
use crate::ihex::{render, HexFile};
use crate::script::hexlify_script;

/// Fail if any firmware data reaches `script_addr` or beyond.
pub fn check_room(firmware: &HexFile, script_addr: u32) -> Result<(), HexError> {
    let end = firmware.largest_address();
    info!("firmware ends at 0x{:X}, script region at 0x{:X}", end, script_addr);
    if end > script_addr {
        return Err(HexError::FirmwareOverflow { end, script_addr });
    }
    Ok(())
}

/// Firmware with `script` spliced in at `script_addr`.
///
/// The script records go right before the UICR section, or before the
/// closing start-address and end-of-file records when there is no UICR. Every
/// firmware line is copied unchanged. Nothing is produced on error.
pub fn combine(firmware: &HexFile, script: &[u8], script_addr: u32) -> Result<String, HexError> {
    check_room(firmware, script_addr)?;
    let records = hexlify_script(script, script_addr)?;
    let eol = firmware.line_ending();

    let split = firmware
        .uicr_line()
        .or_else(|| firmware.trailer_line())
        .ok_or(HexError::MissingTrailer)?;
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
