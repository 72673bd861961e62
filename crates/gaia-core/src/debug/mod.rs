//! Debugging support: crash trace, breakpoints, in-stream debug ops and the
//! interactive debugger.
//!
//! Guest code can embed debug instructions (opcode 10) that break into the
//! interactive loop, print the machine status or dump the trace. The trace
//! ring always records the last executed instructions so that a crash
//! report can show how the machine got there.

use crate::cpu::Machine;
use crate::disasm;
use crate::exception::{DecodePhase, Exception};
use crate::term::RawTerminal;
use colored::Colorize;
use rustyline::DefaultEditor;

/// Instructions kept in the crash trace.
pub const TRACE_CAPACITY: usize = 20;

const OP_BREAK: usize = 1;
const OP_PENV: usize = 2;
const OP_PTRACE: usize = 3;

/// Fixed-capacity ring of the most recently executed `(pc, instruction)`
/// pairs. Pushing is O(1); iteration yields newest first.
#[derive(Debug, Clone)]
pub struct TraceRing {
    entries: [(u32, u32); TRACE_CAPACITY],
    head: usize,
    len: usize,
}

impl TraceRing {
    pub fn new() -> Self {
        Self {
            entries: [(0, 0); TRACE_CAPACITY],
            head: 0,
            len: 0,
        }
    }

    pub fn push(&mut self, pc: u32, inst: u32) {
        self.head = (self.head + TRACE_CAPACITY - 1) % TRACE_CAPACITY;
        self.entries[self.head] = (pc, inst);
        self.len = (self.len + 1).min(TRACE_CAPACITY);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Newest-first iteration.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.len).map(move |i| self.entries[(self.head + i) % TRACE_CAPACITY])
    }
}

impl Default for TraceRing {
    fn default() -> Self {
        Self::new()
    }
}

/// Debugger bookkeeping, owned by the machine. The interactive loop and the
/// hooks below operate on the whole machine and only observe the rest of it.
#[derive(Debug)]
pub struct DebugState {
    pub enabled: bool,
    /// Single-stepping: enter the interactive loop before every cycle.
    pub stepping: bool,
    pub trace: TraceRing,
    break_disabled: [u32; 8],
}

impl DebugState {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            stepping: false,
            trace: TraceRing::new(),
            break_disabled: [0; 8],
        }
    }

    pub fn is_break_disabled(&self, id: u32) -> bool {
        let id = id as usize % 256;
        self.break_disabled[id / 32] & (1 << (id % 32)) != 0
    }

    pub fn disable_break(&mut self, id: u32) {
        let id = id as usize % 256;
        self.break_disabled[id / 32] |= 1 << (id % 32);
    }

    pub fn enable_break(&mut self, id: u32) {
        let id = id as usize % 256;
        self.break_disabled[id / 32] &= !(1 << (id % 32));
    }

    pub fn disable_break_all(&mut self) {
        self.break_disabled = [!0; 8];
    }

    pub fn enable_break_all(&mut self) {
        self.break_disabled = [0; 8];
    }
}

/// Execute an in-stream debug instruction (opcode 10, sub-op in the rx
/// field). All of them are no-ops when debugging is off.
pub fn execute_op(m: &mut Machine, op: usize, id: u32) -> Result<(), Exception> {
    if !m.debug.enabled {
        return Ok(());
    }
    match op {
        OP_BREAK => {
            if !m.debug.is_break_disabled(id) {
                eprintln!("{}", format!("break point {id}:").red().bold());
                m.print_env(true);
                m.debug.stepping = true;
            }
        }
        OP_PENV => {
            eprintln!("{}", format!("print status. id {id}:").red().bold());
            m.print_env(true);
        }
        OP_PTRACE => {
            eprintln!("{}", format!("print trace. id {id}:").red().bold());
            dump_trace(m);
        }
        _ => {
            return Err(Exception::Decode {
                phase: DecodePhase::Debug,
            })
        }
    }
    Ok(())
}

/// Per-cycle debugger hook: verify the r0 invariant, record the trace and
/// run the interactive loop when single-stepping.
pub fn hook(m: &mut Machine, term: &RawTerminal) -> Result<(), Exception> {
    if m.regs.read(0) != 0 {
        return Err(Exception::RegisterZeroClobbered);
    }
    let phys_pc = m.translate(m.pc)?;
    if phys_pc >= m.mem.size() {
        // The cycle loop reports this as a PC range error.
        return Ok(());
    }
    let inst = m.mem.read_word(phys_pc & !3);
    m.debug.trace.push(m.pc, inst);
    if m.debug.stepping {
        term.suspend();
        eprintln!("0x{:08x}: {}", m.pc, disasm::disassemble(inst));
        let result = interactive_loop(m);
        term.resume();
        result?;
    }
    Ok(())
}

/// Dump the trace ring, newest first.
pub fn dump_trace(m: &Machine) {
    if !m.debug.enabled {
        return;
    }
    eprintln!("  address  |    code    |      assembly");
    for (pc, inst) in m.debug.trace.iter() {
        eprintln!("0x{:08x} | 0x{:08x} | {}", pc, inst, disasm::disassemble(inst));
    }
}

/// Line-oriented debugger. Commands dispatch on the first token; each
/// command parses its own arguments. EOF leaves the loop and resumes
/// execution.
pub fn interactive_loop(m: &mut Machine) -> Result<(), Exception> {
    eprintln!("help: c, n, stat, trace, mem, list, disable and enable commands are available.");
    let Ok(mut editor) = DefaultEditor::new() else {
        return Ok(());
    };
    loop {
        let line = match editor.readline("> ") {
            Ok(line) => line,
            Err(_) => break,
        };
        let mut args = line.split_whitespace();
        let Some(command) = args.next() else {
            continue;
        };
        match command {
            "c" => {
                m.debug.stepping = false;
                break;
            }
            "n" => break,
            "stat" => m.print_env(true),
            "trace" => dump_trace(m),
            "mem" => cmd_mem(m, args)?,
            "list" => cmd_list(m, args)?,
            "disable" => cmd_toggle_break(m, args, false),
            "enable" => cmd_toggle_break(m, args, true),
            _ => eprintln!("unknown command {line}"),
        }
    }
    Ok(())
}

fn parse_hex(token: &str) -> Option<u32> {
    let token = token.strip_prefix("0x").unwrap_or(token);
    u32::from_str_radix(token, 16).ok()
}

/// `mem <hex-addr> [count]`: print words read through the normal translated
/// load path.
fn cmd_mem<'a>(m: &mut Machine, mut args: impl Iterator<Item = &'a str>) -> Result<(), Exception> {
    let addr = args.next().and_then(parse_hex);
    let Some(addr) = addr else {
        eprintln!("{}", "error. mem command usage: mem 0xaddr [count]".red().bold());
        return Ok(());
    };
    let count = args.next().and_then(|t| t.parse::<u32>().ok()).unwrap_or(1);
    let base = addr & !3;
    for i in 0..count {
        let vaddr = base.wrapping_add(i * 4);
        let value = m.load_word(vaddr)?;
        eprintln!("0x{:08x}: 0x{:08x}", vaddr, value);
    }
    Ok(())
}

/// `list [N]`: disassemble the next N instructions at the PC.
fn cmd_list<'a>(m: &mut Machine, mut args: impl Iterator<Item = &'a str>) -> Result<(), Exception> {
    let count = args.next().and_then(|t| t.parse::<u32>().ok()).unwrap_or(10);
    for i in 0..count {
        let vaddr = m.pc.wrapping_add(i * 4);
        let paddr = m.translate(vaddr)?;
        if paddr >= m.mem.size() {
            break;
        }
        eprintln!(
            "0x{:08x}: {}",
            vaddr,
            disasm::disassemble(m.mem.read_word(paddr & !3))
        );
    }
    Ok(())
}

/// `disable <id>|all` / `enable <id>|all`.
fn cmd_toggle_break<'a>(m: &mut Machine, mut args: impl Iterator<Item = &'a str>, enable: bool) {
    let verb = if enable { "enable" } else { "disable" };
    match args.next() {
        Some("all") => {
            if enable {
                m.debug.enable_break_all();
            } else {
                m.debug.disable_break_all();
            }
            eprintln!("{}", format!("all break point {verb}d.").red().bold());
        }
        Some(token) => match token.parse::<u32>() {
            Ok(id) => {
                if enable {
                    m.debug.enable_break(id);
                } else {
                    m.debug.disable_break(id);
                }
                eprintln!("{}", format!("break point {id} {verb}d.").red().bold());
            }
            Err(_) => print_toggle_usage(verb),
        },
        None => print_toggle_usage(verb),
    }
}

fn print_toggle_usage(verb: &str) {
    eprintln!(
        "{}",
        format!("error. {verb} command usage: {verb} [break point number] OR {verb} all")
            .red()
            .bold()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_ring_is_newest_first() {
        let mut ring = TraceRing::new();
        for i in 0..5u32 {
            ring.push(i * 4, i);
        }
        let entries: Vec<_> = ring.iter().collect();
        assert_eq!(entries.len(), 5);
        assert_eq!(entries[0], (16, 4));
        assert_eq!(entries[4], (0, 0));
    }

    #[test]
    fn trace_ring_keeps_the_last_twenty() {
        let mut ring = TraceRing::new();
        for i in 0..30u32 {
            ring.push(i * 4, i);
        }
        assert_eq!(ring.len(), TRACE_CAPACITY);
        let entries: Vec<_> = ring.iter().collect();
        assert_eq!(entries[0], (29 * 4, 29));
        assert_eq!(entries[19], (10 * 4, 10));
    }

    #[test]
    fn breakpoint_mask_covers_256_ids() {
        let mut debug = DebugState::new(true);
        assert!(!debug.is_break_disabled(7));
        debug.disable_break(7);
        debug.disable_break(255);
        assert!(debug.is_break_disabled(7));
        assert!(debug.is_break_disabled(255));
        debug.enable_break(7);
        assert!(!debug.is_break_disabled(7));
        debug.disable_break_all();
        assert!(debug.is_break_disabled(123));
        debug.enable_break_all();
        assert!(!debug.is_break_disabled(123));
    }
}
