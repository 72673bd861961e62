//! Serial console bound to stdin/stdout.

use crate::exception::Exception;
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::io::{self, Read, Write};
use std::os::fd::AsFd;

/// The serial port. Reads come from stdin, writes go to stdout.
///
/// A byte consumed by the readiness probe is parked in `pending` and handed
/// out by the next data-register read, so probing never drops input.
#[derive(Debug)]
pub struct Serial {
    /// Blocking mode: reads wait for input and EOF is fatal. Used when the
    /// interrupt machinery is disabled.
    blocking: bool,
    pending: Option<u8>,
    eof: bool,
}

impl Serial {
    pub fn new(blocking: bool) -> Self {
        Self {
            blocking,
            pending: None,
            eof: false,
        }
    }

    /// True when a byte is waiting on stdin. Never consumes input as far as
    /// the caller can tell.
    pub fn has_input(&mut self) -> bool {
        if self.pending.is_some() {
            return true;
        }
        if self.eof || !Self::poll_ready() {
            return false;
        }
        // poll also reports readiness at end of stream; read one byte to
        // tell the two apart and park it if it exists.
        let mut buf = [0u8; 1];
        match io::stdin().read(&mut buf) {
            Ok(0) | Err(_) => {
                self.eof = true;
                false
            }
            Ok(_) => {
                self.pending = Some(buf[0]);
                true
            }
        }
    }

    fn poll_ready() -> bool {
        let stdin = io::stdin();
        let mut fds = [PollFd::new(stdin.as_fd(), PollFlags::POLLIN)];
        match poll(&mut fds, PollTimeout::ZERO) {
            Ok(n) if n > 0 => fds[0]
                .revents()
                .is_some_and(|r| r.contains(PollFlags::POLLIN)),
            _ => false,
        }
    }

    /// Read the serial data register: the next byte from stdin. In
    /// non-blocking mode an exhausted stream reads as `0xffffffff`.
    pub fn read_byte(&mut self) -> Result<u32, Exception> {
        if let Some(byte) = self.pending.take() {
            return Ok(byte as u32);
        }
        let mut buf = [0u8; 1];
        match io::stdin().read(&mut buf) {
            Ok(0) | Err(_) => {
                if self.blocking {
                    // Cooked-mode reads wait for input, so an empty read is
                    // a real end of stream.
                    self.eof = true;
                    Err(Exception::SerialEof)
                } else {
                    // Raw mode reads with VMIN=0 return empty whenever no
                    // byte is pending.
                    Ok(0xffff_ffff)
                }
            }
            Ok(_) => Ok(buf[0] as u32),
        }
    }

    /// Write a byte to stdout and flush it through immediately.
    pub fn write_byte(&mut self, value: u32) {
        let mut stdout = io::stdout();
        let _ = stdout.write_all(&[value as u8]);
        let _ = stdout.flush();
    }
}
