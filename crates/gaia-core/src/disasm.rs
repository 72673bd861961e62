//! Disassembler pretty-printer for the debugger.

const REG_NAMES: [&str; 32] = [
    "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "r12", "r13", "r14",
    "r15", "r16", "r17", "r18", "r19", "r20", "r21", "r22", "r23", "r24", "r25", "r26", "r27",
    "r28", "r29", "rsp", "rbp",
];

fn alu_name(tag: u32) -> Option<&'static str> {
    Some(match tag {
        0 => "add",
        1 => "sub",
        2 => "shl",
        3 => "shr",
        4 => "sar",
        5 => "and",
        6 => "or",
        7 => "xor",
        8 => "lea",
        22 => "cmpult",
        23 => "cmpule",
        24 => "cmpne",
        25 => "cmpeq",
        26 => "cmplt",
        27 => "cmple",
        28 => "fcmpne",
        29 => "fcmpeq",
        30 => "fcmplt",
        31 => "fcmple",
        _ => return None,
    })
}

fn fpu_name(tag: u32) -> Option<&'static str> {
    Some(match tag {
        0 => "fadd",
        1 => "fsub",
        2 => "fmul",
        3 => "fdiv",
        4 => "finv",
        5 => "fsqrt",
        6 => "ftoi",
        7 => "itof",
        8 => "floor",
        _ => return None,
    })
}

fn sign_suffix(sig: u32) -> &'static str {
    match sig & 3 {
        1 => ".neg",
        2 => ".abs",
        3 => ".abs.neg",
        _ => "",
    }
}

/// Signed displacement in listing style: `0x10` / `-0x10`.
fn sdisp(value: i32) -> String {
    if value < 0 {
        format!("-{:#x}", -(value as i64))
    } else {
        format!("{:#x}", value)
    }
}

/// Render one instruction word as assembly. Undecodable words render as
/// `???`.
pub fn disassemble(inst: u32) -> String {
    let op = inst >> 28;
    let rx = REG_NAMES[((inst >> 23) & 31) as usize];
    let ra = REG_NAMES[((inst >> 18) & 31) as usize];
    let rb = REG_NAMES[((inst >> 13) & 31) as usize];
    let tag = inst & 31;
    let lit = ((inst >> 5) & 0xff) as u8 as i8 as i32;
    let sig = (inst >> 5) & 3;
    let disp = (inst & 0xffff) as u16;
    let sdisp16 = disp as i16 as i32;

    match op {
        0 => match alu_name(tag) {
            Some(name) if tag < 28 => format!("{name} {rx}, {ra}, {rb}, {lit}"),
            Some(name) => format!("{name} {rx}, {ra}, {rb}"),
            None => "???".to_string(),
        },
        1 => match fpu_name(tag) {
            Some(name) if tag < 5 => format!("{name}{} {rx}, {ra}, {rb}", sign_suffix(sig)),
            Some(name) => format!("{name}{} {rx}, {ra}", sign_suffix(sig)),
            None => "???".to_string(),
        },
        2 => format!("ldl {rx}, {:#x}", disp),
        3 => format!("ldh {rx}, {ra}, {:#x}", disp),
        4 => format!("jl {rx}, {}", sdisp(sdisp16 << 2)),
        5 => format!("jr {rx}, {ra}"),
        6 => format!("ld {rx}, {ra}, {}", sdisp(sdisp16 << 2)),
        7 => format!("ldb {rx}, {ra}, {}", sdisp(sdisp16)),
        8 => format!("st {rx}, {ra}, {}", sdisp(sdisp16 << 2)),
        9 => format!("stb {rx}, {ra}, {}", sdisp(sdisp16)),
        10 => match (inst >> 23) & 31 {
            1 => format!("break {disp}"),
            2 => format!("penv {disp}"),
            3 => format!("ptrace {disp}"),
            _ => "???".to_string(),
        },
        12 => "sysenter".to_string(),
        13 => "sysexit".to_string(),
        14 => format!("bne {rx}, {ra}, {}", sdisp(sdisp16 << 2)),
        15 => format!("beq {rx}, {ra}, {}", sdisp(sdisp16 << 2)),
        _ => "???".to_string(),
    }
}
