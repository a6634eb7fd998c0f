//! Opcode dispatch table for the 2A03.
//!
//! Every one of the 256 opcode bytes maps to an [`OpInfo`]: the operation, its addressing mode,
//! base cycle count, and whether an indexed read that crosses a page costs one more cycle.
//! Instruction width is implied by the addressing mode. Undocumented opcodes follow
//! [CPU unofficial opcodes](https://www.nesdev.org/wiki/CPU_unofficial_opcodes).

/// 6502 addressing modes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
}

impl Mode {
    /// Instruction width in bytes, opcode included.
    pub const fn len(self) -> u8 {
        match self {
            Mode::Implied | Mode::Accumulator => 1,
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::IndirectX
            | Mode::IndirectY
            | Mode::Relative => 2,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 3,
        }
    }
}

/// Operations, documented and undocumented.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    ADC,
    AND,
    ASL,
    BCC,
    BCS,
    BEQ,
    BIT,
    BMI,
    BNE,
    BPL,
    BRK,
    BVC,
    BVS,
    CLC,
    CLD,
    CLI,
    CLV,
    CMP,
    CPX,
    CPY,
    DEC,
    DEX,
    DEY,
    EOR,
    INC,
    INX,
    INY,
    JMP,
    JSR,
    LDA,
    LDX,
    LDY,
    LSR,
    NOP,
    ORA,
    PHA,
    PHP,
    PLA,
    PLP,
    ROL,
    ROR,
    RTI,
    RTS,
    SBC,
    SEC,
    SED,
    SEI,
    STA,
    STX,
    STY,
    TAX,
    TAY,
    TSX,
    TXA,
    TXS,
    TYA,
    // Undocumented
    ALR,
    ANC,
    ARR,
    AXS,
    DCP,
    ISC,
    JAM,
    LAS,
    LAX,
    LXA,
    RLA,
    RRA,
    SAX,
    SHA,
    SHX,
    SHY,
    SLO,
    SRE,
    TAS,
    XAA,
}

impl Op {
    /// Operations that write a register to memory without reading it first.
    pub fn is_store(self) -> bool {
        matches!(
            self,
            Op::STA | Op::STX | Op::STY | Op::SAX | Op::SHA | Op::SHX | Op::SHY | Op::TAS
        )
    }
}

/// Static decode information for one opcode byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpInfo {
    pub op: Op,
    pub mode: Mode,
    /// Base cycles, before page-cross and branch penalties.
    pub cycles: u8,
    /// Indexed read that costs +1 cycle when the effective address crosses a page.
    pub page_penalty: bool,
}

/// A fetched instruction: decode info plus its raw operand bytes (little-endian).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    pub op: Op,
    pub mode: Mode,
    pub operand: u16,
    pub len: u8,
    pub cycles: u8,
    pub page_penalty: bool,
}

impl Instruction {
    pub fn new(opcode: u8, operand: u16) -> Self {
        let info = OPCODES[opcode as usize];
        Self {
            opcode,
            op: info.op,
            mode: info.mode,
            operand,
            len: info.mode.len(),
            cycles: info.cycles,
            page_penalty: info.page_penalty,
        }
    }
}

const fn op(op: Op, mode: Mode, cycles: u8) -> OpInfo {
    OpInfo {
        op,
        mode,
        cycles,
        page_penalty: false,
    }
}

/// Indexed read with page-cross penalty.
const fn opx(op: Op, mode: Mode, cycles: u8) -> OpInfo {
    OpInfo {
        op,
        mode,
        cycles,
        page_penalty: true,
    }
}

pub static OPCODES: [OpInfo; 256] = build_table();

const fn build_table() -> [OpInfo; 256] {
    use Mode::*;
    use Op::*;

    // Anything not listed below locks up the CPU.
    let mut t = [op(JAM, Implied, 2); 256];

    t[0x69] = op(ADC, Immediate, 2);
    t[0x65] = op(ADC, ZeroPage, 3);
    t[0x75] = op(ADC, ZeroPageX, 4);
    t[0x6D] = op(ADC, Absolute, 4);
    t[0x7D] = opx(ADC, AbsoluteX, 4);
    t[0x79] = opx(ADC, AbsoluteY, 4);
    t[0x61] = op(ADC, IndirectX, 6);
    t[0x71] = opx(ADC, IndirectY, 5);

    t[0x29] = op(AND, Immediate, 2);
    t[0x25] = op(AND, ZeroPage, 3);
    t[0x35] = op(AND, ZeroPageX, 4);
    t[0x2D] = op(AND, Absolute, 4);
    t[0x3D] = opx(AND, AbsoluteX, 4);
    t[0x39] = opx(AND, AbsoluteY, 4);
    t[0x21] = op(AND, IndirectX, 6);
    t[0x31] = opx(AND, IndirectY, 5);

    t[0x0A] = op(ASL, Accumulator, 2);
    t[0x06] = op(ASL, ZeroPage, 5);
    t[0x16] = op(ASL, ZeroPageX, 6);
    t[0x0E] = op(ASL, Absolute, 6);
    t[0x1E] = op(ASL, AbsoluteX, 7);

    t[0x90] = op(BCC, Relative, 2);
    t[0xB0] = op(BCS, Relative, 2);
    t[0xF0] = op(BEQ, Relative, 2);
    t[0x30] = op(BMI, Relative, 2);
    t[0xD0] = op(BNE, Relative, 2);
    t[0x10] = op(BPL, Relative, 2);
    t[0x50] = op(BVC, Relative, 2);
    t[0x70] = op(BVS, Relative, 2);

    t[0x24] = op(BIT, ZeroPage, 3);
    t[0x2C] = op(BIT, Absolute, 4);

    t[0x00] = op(BRK, Implied, 7);

    t[0x18] = op(CLC, Implied, 2);
    t[0xD8] = op(CLD, Implied, 2);
    t[0x58] = op(CLI, Implied, 2);
    t[0xB8] = op(CLV, Implied, 2);
    t[0x38] = op(SEC, Implied, 2);
    t[0xF8] = op(SED, Implied, 2);
    t[0x78] = op(SEI, Implied, 2);

    t[0xC9] = op(CMP, Immediate, 2);
    t[0xC5] = op(CMP, ZeroPage, 3);
    t[0xD5] = op(CMP, ZeroPageX, 4);
    t[0xCD] = op(CMP, Absolute, 4);
    t[0xDD] = opx(CMP, AbsoluteX, 4);
    t[0xD9] = opx(CMP, AbsoluteY, 4);
    t[0xC1] = op(CMP, IndirectX, 6);
    t[0xD1] = opx(CMP, IndirectY, 5);

    t[0xE0] = op(CPX, Immediate, 2);
    t[0xE4] = op(CPX, ZeroPage, 3);
    t[0xEC] = op(CPX, Absolute, 4);
    t[0xC0] = op(CPY, Immediate, 2);
    t[0xC4] = op(CPY, ZeroPage, 3);
    t[0xCC] = op(CPY, Absolute, 4);

    t[0xC6] = op(DEC, ZeroPage, 5);
    t[0xD6] = op(DEC, ZeroPageX, 6);
    t[0xCE] = op(DEC, Absolute, 6);
    t[0xDE] = op(DEC, AbsoluteX, 7);
    t[0xCA] = op(DEX, Implied, 2);
    t[0x88] = op(DEY, Implied, 2);

    t[0x49] = op(EOR, Immediate, 2);
    t[0x45] = op(EOR, ZeroPage, 3);
    t[0x55] = op(EOR, ZeroPageX, 4);
    t[0x4D] = op(EOR, Absolute, 4);
    t[0x5D] = opx(EOR, AbsoluteX, 4);
    t[0x59] = opx(EOR, AbsoluteY, 4);
    t[0x41] = op(EOR, IndirectX, 6);
    t[0x51] = opx(EOR, IndirectY, 5);

    t[0xE6] = op(INC, ZeroPage, 5);
    t[0xF6] = op(INC, ZeroPageX, 6);
    t[0xEE] = op(INC, Absolute, 6);
    t[0xFE] = op(INC, AbsoluteX, 7);
    t[0xE8] = op(INX, Implied, 2);
    t[0xC8] = op(INY, Implied, 2);

    t[0x4C] = op(JMP, Absolute, 3);
    t[0x6C] = op(JMP, Indirect, 5);
    t[0x20] = op(JSR, Absolute, 6);
    t[0x40] = op(RTI, Implied, 6);
    t[0x60] = op(RTS, Implied, 6);

    t[0xA9] = op(LDA, Immediate, 2);
    t[0xA5] = op(LDA, ZeroPage, 3);
    t[0xB5] = op(LDA, ZeroPageX, 4);
    t[0xAD] = op(LDA, Absolute, 4);
    t[0xBD] = opx(LDA, AbsoluteX, 4);
    t[0xB9] = opx(LDA, AbsoluteY, 4);
    t[0xA1] = op(LDA, IndirectX, 6);
    t[0xB1] = opx(LDA, IndirectY, 5);

    t[0xA2] = op(LDX, Immediate, 2);
    t[0xA6] = op(LDX, ZeroPage, 3);
    t[0xB6] = op(LDX, ZeroPageY, 4);
    t[0xAE] = op(LDX, Absolute, 4);
    t[0xBE] = opx(LDX, AbsoluteY, 4);

    t[0xA0] = op(LDY, Immediate, 2);
    t[0xA4] = op(LDY, ZeroPage, 3);
    t[0xB4] = op(LDY, ZeroPageX, 4);
    t[0xAC] = op(LDY, Absolute, 4);
    t[0xBC] = opx(LDY, AbsoluteX, 4);

    t[0x4A] = op(LSR, Accumulator, 2);
    t[0x46] = op(LSR, ZeroPage, 5);
    t[0x56] = op(LSR, ZeroPageX, 6);
    t[0x4E] = op(LSR, Absolute, 6);
    t[0x5E] = op(LSR, AbsoluteX, 7);

    t[0x09] = op(ORA, Immediate, 2);
    t[0x05] = op(ORA, ZeroPage, 3);
    t[0x15] = op(ORA, ZeroPageX, 4);
    t[0x0D] = op(ORA, Absolute, 4);
    t[0x1D] = opx(ORA, AbsoluteX, 4);
    t[0x19] = opx(ORA, AbsoluteY, 4);
    t[0x01] = op(ORA, IndirectX, 6);
    t[0x11] = opx(ORA, IndirectY, 5);

    t[0x48] = op(PHA, Implied, 3);
    t[0x08] = op(PHP, Implied, 3);
    t[0x68] = op(PLA, Implied, 4);
    t[0x28] = op(PLP, Implied, 4);

    t[0x2A] = op(ROL, Accumulator, 2);
    t[0x26] = op(ROL, ZeroPage, 5);
    t[0x36] = op(ROL, ZeroPageX, 6);
    t[0x2E] = op(ROL, Absolute, 6);
    t[0x3E] = op(ROL, AbsoluteX, 7);

    t[0x6A] = op(ROR, Accumulator, 2);
    t[0x66] = op(ROR, ZeroPage, 5);
    t[0x76] = op(ROR, ZeroPageX, 6);
    t[0x6E] = op(ROR, Absolute, 6);
    t[0x7E] = op(ROR, AbsoluteX, 7);

    t[0xE9] = op(SBC, Immediate, 2);
    t[0xEB] = op(SBC, Immediate, 2);
    t[0xE5] = op(SBC, ZeroPage, 3);
    t[0xF5] = op(SBC, ZeroPageX, 4);
    t[0xED] = op(SBC, Absolute, 4);
    t[0xFD] = opx(SBC, AbsoluteX, 4);
    t[0xF9] = opx(SBC, AbsoluteY, 4);
    t[0xE1] = op(SBC, IndirectX, 6);
    t[0xF1] = opx(SBC, IndirectY, 5);

    t[0x85] = op(STA, ZeroPage, 3);
    t[0x95] = op(STA, ZeroPageX, 4);
    t[0x8D] = op(STA, Absolute, 4);
    t[0x9D] = op(STA, AbsoluteX, 5);
    t[0x99] = op(STA, AbsoluteY, 5);
    t[0x81] = op(STA, IndirectX, 6);
    t[0x91] = op(STA, IndirectY, 6);

    t[0x86] = op(STX, ZeroPage, 3);
    t[0x96] = op(STX, ZeroPageY, 4);
    t[0x8E] = op(STX, Absolute, 4);
    t[0x84] = op(STY, ZeroPage, 3);
    t[0x94] = op(STY, ZeroPageX, 4);
    t[0x8C] = op(STY, Absolute, 4);

    t[0xAA] = op(TAX, Implied, 2);
    t[0xA8] = op(TAY, Implied, 2);
    t[0xBA] = op(TSX, Implied, 2);
    t[0x8A] = op(TXA, Implied, 2);
    t[0x9A] = op(TXS, Implied, 2);
    t[0x98] = op(TYA, Implied, 2);

    // NOP family: the operand is read and discarded.
    t[0xEA] = op(NOP, Implied, 2);
    t[0x1A] = op(NOP, Implied, 2);
    t[0x3A] = op(NOP, Implied, 2);
    t[0x5A] = op(NOP, Implied, 2);
    t[0x7A] = op(NOP, Implied, 2);
    t[0xDA] = op(NOP, Implied, 2);
    t[0xFA] = op(NOP, Implied, 2);
    t[0x80] = op(NOP, Immediate, 2);
    t[0x82] = op(NOP, Immediate, 2);
    t[0x89] = op(NOP, Immediate, 2);
    t[0xC2] = op(NOP, Immediate, 2);
    t[0xE2] = op(NOP, Immediate, 2);
    t[0x04] = op(NOP, ZeroPage, 3);
    t[0x44] = op(NOP, ZeroPage, 3);
    t[0x64] = op(NOP, ZeroPage, 3);
    t[0x14] = op(NOP, ZeroPageX, 4);
    t[0x34] = op(NOP, ZeroPageX, 4);
    t[0x54] = op(NOP, ZeroPageX, 4);
    t[0x74] = op(NOP, ZeroPageX, 4);
    t[0xD4] = op(NOP, ZeroPageX, 4);
    t[0xF4] = op(NOP, ZeroPageX, 4);
    t[0x0C] = op(NOP, Absolute, 4);
    t[0x1C] = opx(NOP, AbsoluteX, 4);
    t[0x3C] = opx(NOP, AbsoluteX, 4);
    t[0x5C] = opx(NOP, AbsoluteX, 4);
    t[0x7C] = opx(NOP, AbsoluteX, 4);
    t[0xDC] = opx(NOP, AbsoluteX, 4);
    t[0xFC] = opx(NOP, AbsoluteX, 4);

    t[0xA7] = op(LAX, ZeroPage, 3);
    t[0xB7] = op(LAX, ZeroPageY, 4);
    t[0xAF] = op(LAX, Absolute, 4);
    t[0xBF] = opx(LAX, AbsoluteY, 4);
    t[0xA3] = op(LAX, IndirectX, 6);
    t[0xB3] = opx(LAX, IndirectY, 5);
    t[0xAB] = op(LXA, Immediate, 2);

    t[0x87] = op(SAX, ZeroPage, 3);
    t[0x97] = op(SAX, ZeroPageY, 4);
    t[0x8F] = op(SAX, Absolute, 4);
    t[0x83] = op(SAX, IndirectX, 6);

    // Read-modify-write combos share one cycle table.
    let rmw: [(Op, usize, usize, usize, usize, usize, usize, usize); 6] = [
        (DCP, 0xC7, 0xD7, 0xCF, 0xDF, 0xDB, 0xC3, 0xD3),
        (ISC, 0xE7, 0xF7, 0xEF, 0xFF, 0xFB, 0xE3, 0xF3),
        (SLO, 0x07, 0x17, 0x0F, 0x1F, 0x1B, 0x03, 0x13),
        (RLA, 0x27, 0x37, 0x2F, 0x3F, 0x3B, 0x23, 0x33),
        (SRE, 0x47, 0x57, 0x4F, 0x5F, 0x5B, 0x43, 0x53),
        (RRA, 0x67, 0x77, 0x6F, 0x7F, 0x7B, 0x63, 0x73),
    ];
    let mut i = 0;
    while i < rmw.len() {
        let (o, zp, zpx, abs, absx, absy, indx, indy) = rmw[i];
        t[zp] = op(o, ZeroPage, 5);
        t[zpx] = op(o, ZeroPageX, 6);
        t[abs] = op(o, Absolute, 6);
        t[absx] = op(o, AbsoluteX, 7);
        t[absy] = op(o, AbsoluteY, 7);
        t[indx] = op(o, IndirectX, 8);
        t[indy] = op(o, IndirectY, 8);
        i += 1;
    }

    t[0x0B] = op(ANC, Immediate, 2);
    t[0x2B] = op(ANC, Immediate, 2);
    t[0x4B] = op(ALR, Immediate, 2);
    t[0x6B] = op(ARR, Immediate, 2);
    t[0xCB] = op(AXS, Immediate, 2);
    t[0x8B] = op(XAA, Immediate, 2);
    t[0xBB] = opx(LAS, AbsoluteY, 4);

    t[0x9C] = op(SHY, AbsoluteX, 5);
    t[0x9E] = op(SHX, AbsoluteY, 5);
    t[0x9F] = op(SHA, AbsoluteY, 5);
    t[0x93] = op(SHA, IndirectY, 6);
    t[0x9B] = op(TAS, AbsoluteY, 5);

    t
}
