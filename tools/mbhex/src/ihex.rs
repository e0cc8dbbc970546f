//! Intel HEX records.
//!
//! A record is one line: `:LLAAAATT<data>CC`, with `LL` the data length,
//! `AAAA` the low 16 bits of the address, `TT` the type and `CC` the two's
//! complement of the sum of every preceding byte.

use std::fmt::Write as _;

use log::debug;

use crate::error::{HexError, RecordError};

/// Flash ends here; anything above is UICR/FICR configuration space.
pub const FLASH_LIMIT: u32 = 0x1000_0000;

/// Upper address half of the UICR region.
pub const UICR_UPPER: u16 = 0x1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    Data,
    EndOfFile,
    ExtendedSegmentAddress,
    StartSegmentAddress,
    ExtendedLinearAddress,
    StartLinearAddress,
}

impl RecordType {
    pub fn code(self) -> u8 {
        match self {
            Self::Data => 0x00,
            Self::EndOfFile => 0x01,
            Self::ExtendedSegmentAddress => 0x02,
            Self::StartSegmentAddress => 0x03,
            Self::ExtendedLinearAddress => 0x04,
            Self::StartLinearAddress => 0x05,
        }
    }
}

impl TryFrom<u8> for RecordType {
    type Error = RecordError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Ok(match code {
            0x00 => Self::Data,
            0x01 => Self::EndOfFile,
            0x02 => Self::ExtendedSegmentAddress,
            0x03 => Self::StartSegmentAddress,
            0x04 => Self::ExtendedLinearAddress,
            0x05 => Self::StartLinearAddress,
            other => return Err(RecordError::UnknownType(other)),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    address: u16,
    kind: RecordType,
    data: Vec<u8>,
}

fn decode_hex(s: &str) -> Result<Vec<u8>, RecordError> {
    if s.len() % 2 != 0 || !s.is_ascii() {
        return Err(RecordError::InvalidHex);
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| RecordError::InvalidHex))
        .collect()
}

impl Record {
    pub fn new(address: u16, kind: RecordType, data: Vec<u8>) -> Result<Self, RecordError> {
        if data.len() > u8::MAX as usize {
            return Err(RecordError::TooLong(data.len()));
        }
        Ok(Self { address, kind, data })
    }

    /// Sets the upper 16 bits for the data records that follow.
    pub fn extended_linear_address(upper: u16) -> Self {
        Self {
            address: 0,
            kind: RecordType::ExtendedLinearAddress,
            data: upper.to_be_bytes().to_vec(),
        }
    }

    pub fn end_of_file() -> Self {
        Self {
            address: 0,
            kind: RecordType::EndOfFile,
            data: Vec::new(),
        }
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    pub fn kind(&self) -> RecordType {
        self.kind
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    fn header(&self) -> [u8; 4] {
        let [hi, lo] = self.address.to_be_bytes();
        [self.data.len() as u8, hi, lo, self.kind.code()]
    }

    pub fn checksum(&self) -> u8 {
        let sum = self
            .header()
            .iter()
            .chain(&self.data)
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        sum.wrapping_neg()
    }

    /// The record as a line of text, without a terminator.
    pub fn encode(&self) -> String {
        let mut line = String::with_capacity(11 + self.data.len() * 2);
        line.push(':');
        for b in self.header().iter().chain(&self.data) {
            let _ = write!(line, "{:02X}", b);
        }
        let _ = write!(line, "{:02X}", self.checksum());
        line
    }

    /// Parse one line. Surrounding whitespace, including the line terminator,
    /// is ignored.
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let body = line
            .trim()
            .strip_prefix(':')
            .ok_or(RecordError::MissingColon)?;
        let bytes = decode_hex(body)?;
        if bytes.len() < 5 {
            return Err(RecordError::TooShort);
        }

        let declared = bytes[0] as usize;
        let actual = bytes.len() - 5;
        if declared != actual {
            return Err(RecordError::LengthMismatch { declared, actual });
        }

        let record = Self {
            address: u16::from_be_bytes([bytes[1], bytes[2]]),
            kind: RecordType::try_from(bytes[3])?,
            data: bytes[4..4 + declared].to_vec(),
        };

        let found = bytes[4 + declared];
        let expected = record.checksum();
        if found != expected {
            return Err(RecordError::Checksum { expected, found });
        }
        Ok(record)
    }

    /// Base address carried by an extended address record.
    fn base_address(&self) -> Option<u32> {
        let value = match self.data.as_slice() {
            [hi, lo] => u32::from(u16::from_be_bytes([*hi, *lo])),
            _ => return None,
        };
        match self.kind {
            RecordType::ExtendedLinearAddress => Some(value << 16),
            RecordType::ExtendedSegmentAddress => Some(value << 4),
            _ => None,
        }
    }
}

/// Encoded records joined by `line_ending`, no trailing terminator.
pub fn render(records: &[Record], line_ending: &str) -> String {
    records
        .iter()
        .map(Record::encode)
        .collect::<Vec<_>>()
        .join(line_ending)
}

/// A hex file kept as its original lines, each validated.
#[derive(Debug, Clone)]
pub struct HexFile {
    // lines keep their terminators
    lines: Vec<String>,
    records: Vec<Option<Record>>,
}

impl HexFile {
    pub fn parse(text: &str) -> Result<Self, HexError> {
        let mut lines = Vec::new();
        let mut records = Vec::new();

        for (i, line) in text.split_inclusive('\n').enumerate() {
            let record = if line.trim().is_empty() {
                None
            } else {
                Some(Record::parse(line).map_err(|source| HexError::Record {
                    line: i + 1,
                    source,
                })?)
            };
            lines.push(line.to_string());
            records.push(record);
        }

        debug!("parsed {} hex lines", lines.len());
        Ok(Self { lines, records })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter().flatten()
    }

    /// One past the highest flash byte written by a data record.
    ///
    /// Data above [`FLASH_LIMIT`] (the UICR) is not flash and is skipped.
    pub fn largest_address(&self) -> u32 {
        let mut base = 0u32;
        let mut largest = 0u32;
        for record in self.records() {
            match record.kind {
                RecordType::ExtendedLinearAddress | RecordType::ExtendedSegmentAddress => {
                    if let Some(b) = record.base_address() {
                        base = b;
                    }
                }
                RecordType::Data if base < FLASH_LIMIT => {
                    let end = base + u32::from(record.address) + record.data.len() as u32;
                    largest = largest.max(end);
                }
                _ => {}
            }
        }
        largest
    }

    /// Index of the line that switches to the UICR region, if any.
    pub fn uicr_line(&self) -> Option<usize> {
        self.records.iter().position(|r| {
            r.as_ref().is_some_and(|r| {
                r.kind == RecordType::ExtendedLinearAddress
                    && r.data == UICR_UPPER.to_be_bytes()
            })
        })
    }

    /// Index of the first line of the closing run of start-address and
    /// end-of-file records (blank lines included), or `None` when the file
    /// does not end in an end-of-file record.
    pub fn trailer_line(&self) -> Option<usize> {
        let mut start = self.records.len();
        let mut has_eof = false;
        for (i, record) in self.records.iter().enumerate().rev() {
            match record.as_ref().map(Record::kind) {
                None => {}
                Some(RecordType::EndOfFile) => has_eof = true,
                Some(RecordType::StartLinearAddress | RecordType::StartSegmentAddress) => {}
                Some(_) => break,
            }
            start = i;
        }
        has_eof.then_some(start)
    }

    /// The terminator used by the first line, `"\n"` if there is none.
    pub fn line_ending(&self) -> &'static str {
        match self.lines.first() {
            Some(l) if l.ends_with("\r\n") => "\r\n",
            _ => "\n",
        }
    }
}
