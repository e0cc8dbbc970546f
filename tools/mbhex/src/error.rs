use thiserror::Error;

/// Why a single hex record could not be read or built.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("record does not start with ':'")]
    MissingColon,

    #[error("record contains non-hex characters")]
    InvalidHex,

    #[error("record is too short")]
    TooShort,

    #[error("record declares {declared} data bytes but has {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("bad checksum: expected {expected:02X}, found {found:02X}")]
    Checksum { expected: u8, found: u8 },

    #[error("unknown record type {0:02X}")]
    UnknownType(u8),

    #[error("record data is {0} bytes, at most 255 fit in a record")]
    TooLong(usize),
}

#[derive(Error, Debug)]
pub enum HexError {
    #[error("line {line}")]
    Record {
        line: usize,
        #[source]
        source: RecordError,
    },

    #[error(transparent)]
    Encode(#[from] RecordError),

    #[error("firmware overflows into script region: firmware ends at 0x{end:X}, script starts at 0x{script_addr:X}")]
    FirmwareOverflow { end: u32, script_addr: u32 },

    #[error("script too large: {size} bytes after encoding, the script region holds {max}")]
    ScriptTooLarge { size: usize, max: usize },

    #[error("script address 0x{0:X} is not aligned to 16 bytes")]
    MisalignedAddress(u32),

    #[error("script at 0x{0:X} runs past the end of the address space")]
    AddressOutOfRange(u32),

    #[error("firmware does not end with an end-of-file record")]
    MissingTrailer,

    #[error("firmware spans {0} flash pages, more than the UICR can describe")]
    TooManyPages(u32),

    #[error("could not parse ELF: {0}")]
    Elf(#[from] elf::ParseError),

    #[error("ELF has no section headers")]
    NoSections,

    #[error("ELF entry point plus allocated sections runs past the end of the address space")]
    ElfOverflow,
}
