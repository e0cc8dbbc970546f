//! Host-side firmware tooling for MicroPython on the micro:bit.
//!
//! The firmware ships as an Intel HEX file. A user script is appended to it
//! by encoding the script as data records at a reserved flash address
//! ([`script::SCRIPT_ADDR`]) and splicing those records in before the
//! image's trailer. Everything here works on the text of the hex file and
//! leaves firmware lines exactly as they were.
//!
//! - [`ihex`]: parse and encode individual records and whole files
//! - [`script`]: turn a script into records
//! - [`combine`]: merge script records into a firmware image
//! - [`uicr`]: append the UICR block describing the firmware layout
//! - [`elfcheck`]: make sure a linked firmware ELF stops short of the script region

pub mod combine;
pub mod elfcheck;
pub mod error;
pub mod ihex;
pub mod script;
pub mod uicr;

pub use error::{HexError, RecordError};

/// Parse an address given on the command line: `0x`-prefixed hex or decimal.
pub fn parse_address(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", s, e))
}

/// Like [`parse_address`] but a bare number is hex.
pub fn parse_hex_address(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    u32::from_str_radix(digits, 16).map_err(|e| format!("invalid address '{}': {}", s, e))
}
