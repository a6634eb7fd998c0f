use crate::{
    bus::Bus,
    cpu::{
        flags::{
            FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE,
            FLAG_OVERFLOW, FLAG_UNUSED, FLAG_ZERO,
        },
        opcodes::{Instruction, Mode, Op},
    },
};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Writing a page number here starts an OAM DMA, which stalls the CPU.
const OAM_DMA: u16 = 0x4014;
const OAM_DMA_CYCLES: usize = 512;

/// Cycles burned per `step` once the CPU has jammed.
const JAM_CYCLES: usize = 2;

/// Magic constant for the unstable XAA/LXA opcodes.
const UNSTABLE_MAGIC: u8 = 0xEE;

/// Interrupt sources. All three share the push sequence; only BRK sets the B flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interrupt {
    Nmi,
    Irq,
    Brk,
}

impl Interrupt {
    pub fn vector(self) -> u16 {
        match self {
            Interrupt::Nmi => NMI_VECTOR,
            Interrupt::Irq | Interrupt::Brk => IRQ_VECTOR,
        }
    }
}

/// Resolved operand of an instruction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    Implied,
    Accumulator,
    Value(u8),
    Memory { addr: u16, page_crossed: bool },
}

pub struct CPU<B: Bus> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    pub cycles: usize,
    pub bus: B,
    /// Set by a JAM opcode; cleared only by reset.
    pub jammed: bool,
}

impl<B: Bus> CPU<B> {
    pub fn new(bus: B) -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: FLAG_INTERRUPT_DISABLE | FLAG_UNUSED,
            cycles: 0,
            bus,
            jammed: false,
        }
    }

    pub fn reset(&mut self) {
        self.pc = self.read_word(RESET_VECTOR);

        self.sp = 0xFD; // reset runs three phantom pushes from 0x00
        self.status = FLAG_INTERRUPT_DISABLE | FLAG_UNUSED;

        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.jammed = false;

        self.cycles = 7;
    }

    /// Run one unit of work: a pending interrupt or one instruction. The bus is ticked by the
    /// elapsed cycles afterwards, and those cycles are returned.
    pub fn step(&mut self) -> usize {
        let cycles = if self.jammed {
            self.cycles += JAM_CYCLES;
            JAM_CYCLES
        } else if self.bus.poll_nmi() {
            self.interrupt(Interrupt::Nmi)
        } else if self.bus.irq_pending() && !self.flag(FLAG_INTERRUPT_DISABLE) {
            self.interrupt(Interrupt::Irq)
        } else {
            if log::log_enabled!(log::Level::Trace) {
                log::trace!("{}", self.trace_line());
            }
            let instruction = self.fetch();
            self.execute(instruction)
        };
        self.bus.tick(cycles);
        cycles
    }

    /// Decode the instruction at PC without moving PC.
    pub fn fetch(&mut self) -> Instruction {
        let opcode = self.bus.read(self.pc);
        let info = Instruction::new(opcode, 0);
        let operand = match info.len {
            2 => self.bus.read(self.pc.wrapping_add(1)) as u16,
            3 => self.read_word(self.pc.wrapping_add(1)),
            _ => 0,
        };
        Instruction { operand, ..info }
    }

    /// Execute a fetched instruction and return the cycles it took.
    pub fn execute(&mut self, instruction: Instruction) -> usize {
        self.pc = self.pc.wrapping_add(instruction.len as u16);
        let operand = self.resolve(instruction.mode, instruction.operand);

        let mut cycles = instruction.cycles as usize;
        if let Operand::Memory { addr, page_crossed } = operand {
            if instruction.page_penalty && page_crossed {
                cycles += 1;
            }
            if instruction.op.is_store() && addr == OAM_DMA {
                cycles += OAM_DMA_CYCLES;
            }
        }
        cycles += self.run(instruction.op, operand);

        self.cycles += cycles;
        cycles
    }

    /// Push PC and status, set I, and jump through the vector. Returns the 7 cycles taken.
    pub fn interrupt(&mut self, kind: Interrupt) -> usize {
        self.enter_interrupt(kind);
        self.cycles += 7;
        7
    }

    fn enter_interrupt(&mut self, kind: Interrupt) {
        self.push_word(self.pc);
        let status = match kind {
            Interrupt::Brk => self.status | FLAG_BREAK | FLAG_UNUSED,
            Interrupt::Nmi | Interrupt::Irq => (self.status & !FLAG_BREAK) | FLAG_UNUSED,
        };
        self.push(status);
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read_word(kind.vector());
    }

    pub fn push(&mut self, value: u8) {
        self.bus.write(0x0100 | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub fn pull(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.bus.read(0x0100 | self.sp as u16)
    }

    fn push_word(&mut self, value: u16) {
        self.push((value >> 8) as u8);
        self.push(value as u8);
    }

    fn pull_word(&mut self) -> u16 {
        let lo = self.pull() as u16;
        let hi = self.pull() as u16;
        (hi << 8) | lo
    }

    fn read_word(&mut self, addr: u16) -> u16 {
        let lo = self.bus.read(addr) as u16;
        let hi = self.bus.read(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Read a pointer from zero page; the high byte wraps within page 0.
    fn read_zero_page_word(&mut self, ptr: u8) -> u16 {
        let lo = self.bus.read(ptr as u16) as u16;
        let hi = self.bus.read(ptr.wrapping_add(1) as u16) as u16;
        (hi << 8) | lo
    }

    /// nestest-style line for the instruction at PC.
    pub fn trace_line(&mut self) -> String {
        let instruction = self.fetch();
        let bytes = match instruction.len {
            1 => format!("{:02X}", instruction.opcode),
            2 => format!("{:02X} {:02X}", instruction.opcode, instruction.operand as u8),
            _ => format!(
                "{:02X} {:02X} {:02X}",
                instruction.opcode,
                instruction.operand as u8,
                instruction.operand >> 8
            ),
        };
        format!(
            "{:04X}  {:<8}  {:<4}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc,
            bytes,
            format!("{:?}", instruction.op),
            self.a,
            self.x,
            self.y,
            self.status,
            self.sp,
            self.cycles
        )
    }

    fn flag(&self, flag: u8) -> bool {
        self.status & flag != 0
    }

    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }

    /// Effective operand for `mode`. PC already points past the instruction.
    fn resolve(&mut self, mode: Mode, operand: u16) -> Operand {
        let indexed = |base: u16, index: u8| {
            let addr = base.wrapping_add(index as u16);
            Operand::Memory {
                addr,
                page_crossed: (base ^ addr) & 0xFF00 != 0,
            }
        };
        let direct = |addr: u16| Operand::Memory {
            addr,
            page_crossed: false,
        };

        match mode {
            Mode::Implied => Operand::Implied,
            Mode::Accumulator => Operand::Accumulator,
            Mode::Immediate => Operand::Value(operand as u8),
            Mode::ZeroPage => direct(operand & 0x00FF),
            Mode::ZeroPageX => direct((operand as u8).wrapping_add(self.x) as u16),
            Mode::ZeroPageY => direct((operand as u8).wrapping_add(self.y) as u16),
            Mode::Absolute => direct(operand),
            Mode::AbsoluteX => indexed(operand, self.x),
            Mode::AbsoluteY => indexed(operand, self.y),
            Mode::Indirect => {
                // The pointer's high byte is fetched without carrying into the next page.
                let lo = self.bus.read(operand) as u16;
                let hi_addr = (operand & 0xFF00) | (operand.wrapping_add(1) & 0x00FF);
                let hi = self.bus.read(hi_addr) as u16;
                direct((hi << 8) | lo)
            }
            Mode::IndirectX => {
                let ptr = (operand as u8).wrapping_add(self.x);
                direct(self.read_zero_page_word(ptr))
            }
            Mode::IndirectY => {
                let base = self.read_zero_page_word(operand as u8);
                indexed(base, self.y)
            }
            Mode::Relative => {
                let offset = operand as u8 as i8;
                let target = self.pc.wrapping_add(offset as i16 as u16);
                Operand::Memory {
                    addr: target,
                    page_crossed: (self.pc ^ target) & 0xFF00 != 0,
                }
            }
        }
    }

    fn load(&mut self, operand: Operand) -> u8 {
        match operand {
            Operand::Implied => 0,
            Operand::Accumulator => self.a,
            Operand::Value(value) => value,
            Operand::Memory { addr, .. } => self.bus.read(addr),
        }
    }

    fn store(&mut self, operand: Operand, value: u8) {
        match operand {
            Operand::Accumulator => self.a = value,
            Operand::Memory { addr, .. } => self.bus.write(addr, value),
            Operand::Implied | Operand::Value(_) => {}
        }
    }

    /// Perform `op`. Returns cycles beyond the table's base count (branches only).
    fn run(&mut self, op: Op, operand: Operand) -> usize {
        match op {
            // Loads, stores, transfers
            Op::LDA => {
                self.a = self.load(operand);
                self.update_zero_and_negative_flags(self.a);
            }
            Op::LDX => {
                self.x = self.load(operand);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::LDY => {
                self.y = self.load(operand);
                self.update_zero_and_negative_flags(self.y);
            }
            Op::STA => self.store(operand, self.a),
            Op::STX => self.store(operand, self.x),
            Op::STY => self.store(operand, self.y),
            Op::TAX => {
                self.x = self.a;
                self.update_zero_and_negative_flags(self.x);
            }
            Op::TAY => {
                self.y = self.a;
                self.update_zero_and_negative_flags(self.y);
            }
            Op::TSX => {
                self.x = self.sp;
                self.update_zero_and_negative_flags(self.x);
            }
            Op::TXA => {
                self.a = self.x;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::TXS => self.sp = self.x,
            Op::TYA => {
                self.a = self.y;
                self.update_zero_and_negative_flags(self.a);
            }

            // Arithmetic and logic
            Op::ADC => {
                let value = self.load(operand);
                self.add_with_carry(value);
            }
            Op::SBC => {
                let value = self.load(operand);
                self.add_with_carry(!value);
            }
            Op::AND => {
                let value = self.load(operand);
                self.a &= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::ORA => {
                let value = self.load(operand);
                self.a |= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::EOR => {
                let value = self.load(operand);
                self.a ^= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::BIT => {
                let value = self.load(operand);
                self.set_flag(FLAG_ZERO, self.a & value == 0);
                self.set_flag(FLAG_OVERFLOW, value & 0x40 != 0);
                self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
            }
            Op::CMP => {
                let value = self.load(operand);
                self.compare(self.a, value);
            }
            Op::CPX => {
                let value = self.load(operand);
                self.compare(self.x, value);
            }
            Op::CPY => {
                let value = self.load(operand);
                self.compare(self.y, value);
            }

            // Increments and shifts
            Op::INC => {
                let value = self.load(operand).wrapping_add(1);
                self.store(operand, value);
                self.update_zero_and_negative_flags(value);
            }
            Op::DEC => {
                let value = self.load(operand).wrapping_sub(1);
                self.store(operand, value);
                self.update_zero_and_negative_flags(value);
            }
            Op::INX => {
                self.x = self.x.wrapping_add(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::INY => {
                self.y = self.y.wrapping_add(1);
                self.update_zero_and_negative_flags(self.y);
            }
            Op::DEX => {
                self.x = self.x.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::DEY => {
                self.y = self.y.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.y);
            }
            Op::ASL => {
                self.shift_left(operand);
            }
            Op::LSR => {
                self.shift_right(operand);
            }
            Op::ROL => {
                self.rotate_left(operand);
            }
            Op::ROR => {
                self.rotate_right(operand);
            }

            // Control flow
            Op::JMP => self.pc = self.target(operand),
            Op::JSR => {
                // Pushes the address of the JSR's last byte.
                self.push_word(self.pc.wrapping_sub(1));
                self.pc = self.target(operand);
            }
            Op::RTS => self.pc = self.pull_word().wrapping_add(1),
            Op::RTI => {
                let status = self.pull();
                self.status = (status & !FLAG_BREAK) | FLAG_UNUSED;
                self.pc = self.pull_word();
            }
            Op::BRK => {
                // Skip the padding byte.
                self.pc = self.pc.wrapping_add(1);
                self.enter_interrupt(Interrupt::Brk);
            }
            Op::BCC => return self.branch(!self.flag(FLAG_CARRY), operand),
            Op::BCS => return self.branch(self.flag(FLAG_CARRY), operand),
            Op::BNE => return self.branch(!self.flag(FLAG_ZERO), operand),
            Op::BEQ => return self.branch(self.flag(FLAG_ZERO), operand),
            Op::BPL => return self.branch(!self.flag(FLAG_NEGATIVE), operand),
            Op::BMI => return self.branch(self.flag(FLAG_NEGATIVE), operand),
            Op::BVC => return self.branch(!self.flag(FLAG_OVERFLOW), operand),
            Op::BVS => return self.branch(self.flag(FLAG_OVERFLOW), operand),

            // Stack
            Op::PHA => self.push(self.a),
            Op::PHP => self.push(self.status | FLAG_BREAK | FLAG_UNUSED),
            Op::PLA => {
                self.a = self.pull();
                self.update_zero_and_negative_flags(self.a);
            }
            Op::PLP => {
                let status = self.pull();
                self.status = (status & !FLAG_BREAK) | FLAG_UNUSED;
            }

            // Flags
            Op::CLC => self.set_flag(FLAG_CARRY, false),
            Op::SEC => self.set_flag(FLAG_CARRY, true),
            Op::CLD => self.set_flag(FLAG_DECIMAL, false),
            Op::SED => self.set_flag(FLAG_DECIMAL, true),
            Op::CLI => self.set_flag(FLAG_INTERRUPT_DISABLE, false),
            Op::SEI => self.set_flag(FLAG_INTERRUPT_DISABLE, true),
            Op::CLV => self.set_flag(FLAG_OVERFLOW, false),

            Op::NOP => {
                if let Operand::Memory { .. } = operand {
                    self.load(operand);
                }
            }
            Op::JAM => {
                self.pc = self.pc.wrapping_sub(1);
                self.jammed = true;
                log::warn!("CPU jammed at ${:04X}", self.pc);
            }

            // Undocumented
            Op::LAX => {
                let value = self.load(operand);
                self.a = value;
                self.x = value;
                self.update_zero_and_negative_flags(value);
            }
            Op::LXA => {
                let value = (self.a | UNSTABLE_MAGIC) & self.load(operand);
                self.a = value;
                self.x = value;
                self.update_zero_and_negative_flags(value);
            }
            Op::SAX => self.store(operand, self.a & self.x),
            Op::DCP => {
                let value = self.load(operand).wrapping_sub(1);
                self.store(operand, value);
                self.compare(self.a, value);
            }
            Op::ISC => {
                let value = self.load(operand).wrapping_add(1);
                self.store(operand, value);
                self.add_with_carry(!value);
            }
            Op::SLO => {
                let value = self.shift_left(operand);
                self.a |= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::RLA => {
                let value = self.rotate_left(operand);
                self.a &= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::SRE => {
                let value = self.shift_right(operand);
                self.a ^= value;
                self.update_zero_and_negative_flags(self.a);
            }
            Op::RRA => {
                let value = self.rotate_right(operand);
                self.add_with_carry(value);
            }
            Op::ANC => {
                let value = self.load(operand);
                self.a &= value;
                self.update_zero_and_negative_flags(self.a);
                self.set_flag(FLAG_CARRY, self.a & 0x80 != 0);
            }
            Op::ALR => {
                let value = self.load(operand);
                self.a &= value;
                self.shift_right(Operand::Accumulator);
            }
            Op::ARR => {
                let value = self.a & self.load(operand);
                let carry_in = if self.flag(FLAG_CARRY) { 0x80 } else { 0 };
                self.a = (value >> 1) | carry_in;
                self.update_zero_and_negative_flags(self.a);
                let bit6 = self.a & 0x40 != 0;
                let bit5 = self.a & 0x20 != 0;
                self.set_flag(FLAG_CARRY, bit6);
                self.set_flag(FLAG_OVERFLOW, bit6 ^ bit5);
            }
            Op::AXS => {
                let value = self.load(operand);
                let masked = self.a & self.x;
                self.set_flag(FLAG_CARRY, masked >= value);
                self.x = masked.wrapping_sub(value);
                self.update_zero_and_negative_flags(self.x);
            }
            Op::XAA => {
                self.a = (self.a | UNSTABLE_MAGIC) & self.x & self.load(operand);
                self.update_zero_and_negative_flags(self.a);
            }
            Op::LAS => {
                let value = self.load(operand) & self.sp;
                self.a = value;
                self.x = value;
                self.sp = value;
                self.update_zero_and_negative_flags(value);
            }
            Op::SHY => self.store_high_and(operand, self.x, self.y),
            Op::SHX => self.store_high_and(operand, self.y, self.x),
            Op::SHA => self.store_high_and(operand, self.y, self.a & self.x),
            Op::TAS => {
                self.sp = self.a & self.x;
                self.store_high_and(operand, self.y, self.sp);
            }
        }
        0
    }

    fn target(&self, operand: Operand) -> u16 {
        match operand {
            Operand::Memory { addr, .. } => addr,
            _ => self.pc,
        }
    }

    /// Taken: +1 cycle, +1 more when the target is on another page. Flags are untouched.
    fn branch(&mut self, condition: bool, operand: Operand) -> usize {
        if !condition {
            return 0;
        }
        let Operand::Memory { addr, page_crossed } = operand else {
            return 0;
        };
        self.pc = addr;
        if page_crossed { 2 } else { 1 }
    }

    fn add_with_carry(&mut self, value: u8) {
        let carry = (self.status & FLAG_CARRY) as u16;
        let sum = self.a as u16 + value as u16 + carry;
        let result = sum as u8;

        self.set_flag(FLAG_CARRY, sum > 0xFF);
        self.set_flag(
            FLAG_OVERFLOW,
            (!(self.a ^ value) & (self.a ^ result) & 0x80) != 0,
        );

        self.a = result;
        self.update_zero_and_negative_flags(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.set_flag(FLAG_CARRY, register >= value);
        self.update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    fn shift_left(&mut self, operand: Operand) -> u8 {
        let value = self.load(operand);
        let result = value << 1;
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        self.store(operand, result);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn shift_right(&mut self, operand: Operand) -> u8 {
        let value = self.load(operand);
        let result = value >> 1;
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        self.store(operand, result);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn rotate_left(&mut self, operand: Operand) -> u8 {
        let value = self.load(operand);
        let result = (value << 1) | (self.status & FLAG_CARRY);
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        self.store(operand, result);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn rotate_right(&mut self, operand: Operand) -> u8 {
        let value = self.load(operand);
        let carry_in = if self.flag(FLAG_CARRY) { 0x80 } else { 0 };
        let result = (value >> 1) | carry_in;
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        self.store(operand, result);
        self.update_zero_and_negative_flags(result);
        result
    }

    /// SHY/SHX/SHA/TAS: store `value & (base high byte + 1)`. When indexing crosses a page the
    /// stored value also replaces the high byte of the target address.
    fn store_high_and(&mut self, operand: Operand, index: u8, value: u8) {
        let Operand::Memory { addr, page_crossed } = operand else {
            return;
        };
        let base = addr.wrapping_sub(index as u16);
        let value = value & ((base >> 8) as u8).wrapping_add(1);
        let addr = if page_crossed {
            ((value as u16) << 8) | (addr & 0x00FF)
        } else {
            addr
        };
        self.bus.write(addr, value);
    }
}
