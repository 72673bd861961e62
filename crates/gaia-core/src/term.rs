//! Terminal raw-mode handling.
//!
//! While the simulator runs, stdin is switched to raw mode so guest code
//! sees individual key presses: no canonical buffering, no echo, `VMIN` and
//! `VTIME` zero so reads never block. Signal generation and output
//! post-processing stay enabled. The saved attributes are restored when the
//! guard drops, and the debugger REPL uses [`RawTerminal::suspend`] /
//! [`RawTerminal::resume`] to flip back to cooked mode around interactive
//! input.

use nix::sys::termios::{self, LocalFlags, OutputFlags, SetArg, SpecialCharacterIndices, Termios};
use std::io::{self, IsTerminal};

pub struct RawTerminal {
    saved: Option<Termios>,
    raw: Option<Termios>,
}

impl RawTerminal {
    /// Switch stdin to raw mode. A no-op when stdin is not a tty.
    pub fn enter() -> Self {
        let stdin = io::stdin();
        if !stdin.is_terminal() {
            return Self::disabled();
        }
        let Ok(saved) = termios::tcgetattr(&stdin) else {
            return Self::disabled();
        };
        let mut raw = saved.clone();
        termios::cfmakeraw(&mut raw);
        raw.local_flags |= LocalFlags::ISIG;
        raw.output_flags |= OutputFlags::OPOST;
        raw.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
        raw.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
        let _ = termios::tcsetattr(&stdin, SetArg::TCSANOW, &raw);
        Self {
            saved: Some(saved),
            raw: Some(raw),
        }
    }

    /// A guard that manages nothing, for runs without the interrupt
    /// machinery (blocking reads want cooked mode).
    pub fn disabled() -> Self {
        Self {
            saved: None,
            raw: None,
        }
    }

    /// Temporarily restore the saved cooked attributes.
    pub fn suspend(&self) {
        if let Some(saved) = &self.saved {
            let _ = termios::tcsetattr(&io::stdin(), SetArg::TCSANOW, saved);
        }
    }

    /// Re-apply raw mode after [`RawTerminal::suspend`].
    pub fn resume(&self) {
        if let Some(raw) = &self.raw {
            let _ = termios::tcsetattr(&io::stdin(), SetArg::TCSANOW, raw);
        }
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        self.suspend();
    }
}
