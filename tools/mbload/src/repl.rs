use std::io::{self, Read, Write};
use std::thread::sleep;
use std::time::{Duration, Instant};

use log::{debug, trace};
use serialport::{ClearBuffer, SerialPort};

use crate::error::LoadError;

const INTERRUPT: &[u8] = b"\r\x03\x03";
const ENTER_RAW: &[u8] = b"\r\x01";
const EXIT_RAW: &[u8] = b"\r\x02";
const END: u8 = 0x04;

const BANNER: &[u8] = b"raw REPL; CTRL-B to exit\r\n";
const PROMPT: &[u8] = b">";
const SOFT_REBOOT: &[u8] = b"soft reboot\r\n";

/// Commands are written in pieces this big with a short pause between them,
/// the board's UART buffer is small.
const WRITE_CHUNK: usize = 256;
const WRITE_PAUSE: Duration = Duration::from_millis(10);

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Byte stream to a board running MicroPython.
///
/// Reads are expected to give up after a short while with
/// [`io::ErrorKind::TimedOut`] or [`io::ErrorKind::WouldBlock`] when nothing
/// arrives; [`RawRepl`] keeps its own deadline on top of that.
pub trait Port: Read + Write {
    /// Throw away anything received but not yet read.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl Port for Box<dyn SerialPort> {
    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(ClearBuffer::Input).map_err(io::Error::from)
    }
}

/// Drives MicroPython's raw REPL over a [`Port`].
pub struct RawRepl<P> {
    port: P,
    timeout: Duration,
}

impl<P: Port> RawRepl<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// How long to wait for each expected response.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn into_inner(self) -> P {
        self.port
    }

    /// Interrupt whatever is running, switch to the raw REPL and soft reset
    /// so the command runs on a clean interpreter.
    pub fn enter(&mut self) -> Result<(), LoadError> {
        self.write(INTERRUPT)?;
        self.port.discard_input()?;

        self.write(ENTER_RAW)?;
        let (data, found) = self.read_until_or_timeout(&[BANNER, PROMPT].concat())?;
        if !found {
            return Err(LoadError::NoRawRepl(String::from_utf8_lossy(&data).into_owned()));
        }

        debug!("in raw REPL, soft resetting");
        self.write(&[END])?;
        self.read_until(SOFT_REBOOT)?;
        self.read_until(BANNER)?;
        Ok(())
    }

    /// Run one block of code. Returns what it printed and its error output;
    /// the latter is empty when it ran cleanly.
    pub fn exec(&mut self, command: &str) -> Result<(Vec<u8>, Vec<u8>), LoadError> {
        self.read_until(PROMPT)?;

        trace!("exec {:?}", command);
        for piece in command.as_bytes().chunks(WRITE_CHUNK) {
            self.write(piece)?;
            sleep(WRITE_PAUSE);
        }
        self.write(&[END])?;

        let ok = self.read_count(2)?;
        if ok != b"OK" {
            return Err(LoadError::NotOk(String::from_utf8_lossy(&ok).into_owned()));
        }

        let mut output = self.read_until(&[END])?;
        output.pop();
        let mut error = self.read_until(&[END])?;
        error.pop();
        Ok((output, error))
    }

    /// Back to the friendly REPL.
    pub fn exit(&mut self) -> Result<(), LoadError> {
        self.write(EXIT_RAW)
    }

    fn write(&mut self, data: &[u8]) -> Result<(), LoadError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_until(&mut self, ending: &[u8]) -> Result<Vec<u8>, LoadError> {
        match self.read_until_or_timeout(ending)? {
            (data, true) => Ok(data),
            (_, false) => Err(LoadError::Timeout(
                String::from_utf8_lossy(ending).into_owned(),
            )),
        }
    }

    /// Read until the data ends with `ending` or the deadline passes. The
    /// flag tells which one happened.
    fn read_until_or_timeout(&mut self, ending: &[u8]) -> Result<(Vec<u8>, bool), LoadError> {
        let deadline = Instant::now() + self.timeout;
        let mut data = Vec::new();
        let mut byte = [0u8; 1];

        while !data.ends_with(ending) {
            match self.port.read(&mut byte) {
                Ok(1) => data.push(byte[0]),
                Ok(_) => return Err(LoadError::Disconnected),
                Err(e) if is_idle(&e) => {
                    if Instant::now() >= deadline {
                        trace!("gave up after {:?}: {:?}", self.timeout, String::from_utf8_lossy(&data));
                        return Ok((data, false));
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok((data, true))
    }

    fn read_count(&mut self, count: usize) -> Result<Vec<u8>, LoadError> {
        let deadline = Instant::now() + self.timeout;
        let mut data = vec![0u8; count];
        let mut filled = 0;

        while filled < count {
            match self.port.read(&mut data[filled..]) {
                Ok(0) => return Err(LoadError::Disconnected),
                Ok(n) => filled += n,
                Err(e) if is_idle(&e) => {
                    if Instant::now() >= deadline {
                        data.truncate(filled);
                        return Err(LoadError::NotOk(String::from_utf8_lossy(&data).into_owned()));
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(data)
    }
}

fn is_idle(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}
