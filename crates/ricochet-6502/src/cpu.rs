//! 6502 CPU execution.

use ricochet_core::{Bus, Cpu};

use crate::decode::{AddressingMode, CYCLE_COUNTS, Instruction, decode};
use crate::flags::{B, C, D, I, N, Status, U, V, Z};

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

/// The MOS 6502 CPU.
///
/// `tick` advances exactly one cycle. When the pending-cycle counter hits
/// zero the next opcode is fetched, decoded and executed in full, and the
/// counter is reloaded from the timing table (plus penalty cycles). The
/// remaining ticks of the instruction are idle.
pub struct Cpu6502 {
    /// Program counter.
    pub pc: u16,
    /// Stack pointer (stack lives at $0100-$01FF).
    pub s: u8,
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Processor status.
    pub p: Status,

    opcode: u8,
    instruction: Instruction,
    mode: AddressingMode,
    /// Effective address resolved by the addressing mode.
    address: u16,
    /// Operand fetched from the effective address (or the accumulator).
    data: u8,
    /// Cycles left in the current instruction.
    cycles: u32,
}

impl Cpu6502 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pc: 0,
            s: 0xFD,
            a: 0,
            x: 0,
            y: 0,
            p: Status::new(),
            opcode: 0,
            instruction: Instruction::Nop,
            mode: AddressingMode::Imp,
            address: 0,
            data: 0,
            cycles: 0,
        }
    }

    /// Cycles remaining in the in-flight instruction. Zero means the next
    /// tick fetches a fresh opcode — an instruction boundary.
    #[must_use]
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Opcode of the instruction currently executing.
    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    /// Decoded instruction currently executing.
    #[must_use]
    pub fn instruction(&self) -> Instruction {
        self.instruction
    }

    /// Addressing mode of the instruction currently executing.
    #[must_use]
    pub fn addressing_mode(&self) -> AddressingMode {
        self.mode
    }

    fn read_vector<B2: Bus>(bus: &mut B2, vector: u16) -> u16 {
        let lo = bus.read(vector);
        let hi = bus.read(vector.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    // =====================================================================
    // Stack
    // =====================================================================

    fn push<B2: Bus>(&mut self, bus: &mut B2, value: u8) {
        bus.write(0x0100 + u16::from(self.s), value);
        self.s = self.s.wrapping_sub(1);
    }

    fn pop<B2: Bus>(&mut self, bus: &mut B2) -> u8 {
        self.s = self.s.wrapping_add(1);
        bus.read(0x0100 + u16::from(self.s))
    }

    fn push_pc<B2: Bus>(&mut self, bus: &mut B2) {
        self.push(bus, (self.pc >> 8) as u8);
        self.push(bus, (self.pc & 0x00FF) as u8);
    }

    /// Push the status byte. The B and U bits exist only in pushed copies;
    /// BRK/PHP set them, interrupt entry leaves them clear.
    fn push_status<B2: Bus>(&mut self, bus: &mut B2, brk: bool, bit5: bool) {
        let mut value = self.p.bits();
        if brk {
            value |= B;
        }
        if bit5 {
            value |= U;
        }
        self.push(bus, value);
    }

    fn pop_pc<B2: Bus>(&mut self, bus: &mut B2) {
        let lo = self.pop(bus);
        let hi = self.pop(bus);
        self.pc = u16::from_le_bytes([lo, hi]);
    }

    fn pop_status<B2: Bus>(&mut self, bus: &mut B2) {
        let bits = self.pop(bus);
        self.p = Status::from_bits(bits);
    }

    // =====================================================================
    // Addressing modes
    // =====================================================================

    fn fetch_byte<B2: Bus>(&mut self, bus: &mut B2) -> u8 {
        let value = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    /// Resolve the effective address for the current addressing mode.
    /// Returns true when an indexed mode crossed a page boundary — the
    /// potential extra cycle, charged only if the instruction agrees.
    fn resolve_address<B2: Bus>(&mut self, bus: &mut B2) -> bool {
        match self.mode {
            AddressingMode::Acc => {
                self.data = self.a;
                false
            }
            AddressingMode::Imp => false,
            AddressingMode::Imm => {
                self.address = self.pc;
                self.pc = self.pc.wrapping_add(1);
                false
            }
            AddressingMode::Zpg => {
                self.address = u16::from(self.fetch_byte(bus));
                false
            }
            AddressingMode::Zpx => {
                self.address = u16::from(self.fetch_byte(bus).wrapping_add(self.x));
                false
            }
            AddressingMode::Zpy => {
                self.address = u16::from(self.fetch_byte(bus).wrapping_add(self.y));
                false
            }
            AddressingMode::Abs => {
                let lo = self.fetch_byte(bus);
                let hi = self.fetch_byte(bus);
                self.address = u16::from_le_bytes([lo, hi]);
                false
            }
            AddressingMode::Abx => {
                let lo = self.fetch_byte(bus);
                let hi = self.fetch_byte(bus);
                let base = u16::from_le_bytes([lo, hi]);
                self.address = base.wrapping_add(u16::from(self.x));
                (self.address & 0xFF00) != (base & 0xFF00)
            }
            AddressingMode::Aby => {
                let lo = self.fetch_byte(bus);
                let hi = self.fetch_byte(bus);
                let base = u16::from_le_bytes([lo, hi]);
                self.address = base.wrapping_add(u16::from(self.y));
                (self.address & 0xFF00) != (base & 0xFF00)
            }
            AddressingMode::Ind => {
                let lo = self.fetch_byte(bus);
                let hi = self.fetch_byte(bus);
                let pointer = u16::from_le_bytes([lo, hi]);
                // Hardware bug: when the pointer sits at $xxFF the high
                // byte is fetched from the start of the same page, not the
                // next one.
                let hi_addr = if lo == 0xFF {
                    pointer & 0xFF00
                } else {
                    pointer.wrapping_add(1)
                };
                let target_lo = bus.read(pointer);
                let target_hi = bus.read(hi_addr);
                self.address = u16::from_le_bytes([target_lo, target_hi]);
                false
            }
            AddressingMode::Izx => {
                let offset = self.fetch_byte(bus).wrapping_add(self.x);
                let lo = bus.read(u16::from(offset));
                let hi = bus.read(u16::from(offset.wrapping_add(1)));
                self.address = u16::from_le_bytes([lo, hi]);
                false
            }
            AddressingMode::Izy => {
                let offset = self.fetch_byte(bus);
                let lo = bus.read(u16::from(offset));
                let hi = bus.read(u16::from(offset.wrapping_add(1)));
                let base = u16::from_le_bytes([lo, hi]);
                self.address = base.wrapping_add(u16::from(self.y));
                (self.address & 0xFF00) != (base & 0xFF00)
            }
            AddressingMode::Rel => {
                // Sign-extended branch offset; applied to PC by the branch.
                let offset = self.fetch_byte(bus);
                self.address = u16::from(offset);
                if offset & 0x80 != 0 {
                    self.address |= 0xFF00;
                }
                false
            }
        }
    }

    /// Read the operand for the current instruction. Accumulator mode uses
    /// the value latched at address-resolution time.
    fn fetch<B2: Bus>(&mut self, bus: &mut B2) -> u8 {
        if self.mode != AddressingMode::Acc {
            self.data = bus.read(self.address);
        }
        self.data
    }

    /// Write back a shift/rotate result to the accumulator or memory.
    fn write_back<B2: Bus>(&mut self, bus: &mut B2, value: u8) {
        if self.mode == AddressingMode::Acc {
            self.a = value;
        } else {
            bus.write(self.address, value);
        }
    }

    fn set_zn(&mut self, value: u8) {
        self.p.set(Z, value == 0);
        self.p.set(N, value & 0x80 != 0);
    }

    // =====================================================================
    // Instructions
    // =====================================================================

    /// Taken branches cost one extra cycle, two when the target lies on a
    /// different page than the updated PC.
    fn branch(&mut self, condition: bool) {
        if condition {
            self.cycles += 1;
            let target = self.pc.wrapping_add(self.address);
            if (target & 0xFF00) != (self.pc & 0xFF00) {
                self.cycles += 1;
            }
            self.pc = target;
        }
    }

    /// CMP/CPX/CPY: carry means register >= operand; nothing written back.
    fn compare<B2: Bus>(&mut self, bus: &mut B2, register: u8) {
        let operand = self.fetch(bus);
        let result = register.wrapping_sub(operand);
        self.p.set(C, register >= operand);
        self.set_zn(result);
    }

    fn adc<B2: Bus>(&mut self, bus: &mut B2) {
        let operand = self.fetch(bus);
        let carry = u16::from(self.p.is_set(C));
        let temp = u16::from(self.a) + u16::from(operand) + carry;
        let result = (temp & 0x00FF) as u8;

        self.p.set(C, temp & 0xFF00 != 0);
        // Overflow: both operands share a sign the result does not.
        self.p
            .set(V, (!(self.a ^ operand) & (self.a ^ result)) & 0x80 != 0);
        self.set_zn(result);
        self.a = result;
    }

    fn sbc<B2: Bus>(&mut self, bus: &mut B2) {
        // Subtraction is addition of the one's complement plus carry.
        let operand = self.fetch(bus) ^ 0xFF;
        let carry = u16::from(self.p.is_set(C));
        let temp = u16::from(self.a) + u16::from(operand) + carry;
        let result = (temp & 0x00FF) as u8;

        self.p.set(C, temp & 0xFF00 != 0);
        self.p
            .set(V, (!(self.a ^ operand) & (self.a ^ result)) & 0x80 != 0);
        self.set_zn(result);
        self.a = result;
    }

    /// Execute the decoded instruction. Returns true when the instruction
    /// honors the indexed-addressing page-cross penalty: only the
    /// read-and-operate instructions do, which is why the extra cycle is a
    /// joint condition with the addressing mode.
    fn execute<B2: Bus>(&mut self, bus: &mut B2) -> bool {
        use Instruction as In;
        match self.instruction {
            In::Adc => {
                self.adc(bus);
                true
            }
            In::Sbc => {
                self.sbc(bus);
                true
            }
            In::And => {
                let operand = self.fetch(bus);
                self.a &= operand;
                self.set_zn(self.a);
                true
            }
            In::Ora => {
                let operand = self.fetch(bus);
                self.a |= operand;
                self.set_zn(self.a);
                true
            }
            In::Eor => {
                let operand = self.fetch(bus);
                self.a ^= operand;
                self.set_zn(self.a);
                true
            }
            In::Asl => {
                let operand = self.fetch(bus);
                self.p.set(C, operand & 0x80 != 0);
                let result = operand << 1;
                self.set_zn(result);
                self.write_back(bus, result);
                false
            }
            In::Lsr => {
                let operand = self.fetch(bus);
                self.p.set(C, operand & 0x01 != 0);
                let result = operand >> 1;
                self.set_zn(result);
                self.write_back(bus, result);
                false
            }
            In::Rol => {
                let operand = self.fetch(bus);
                let result = (operand << 1) | u8::from(self.p.is_set(C));
                self.p.set(C, operand & 0x80 != 0);
                self.set_zn(result);
                self.write_back(bus, result);
                false
            }
            In::Ror => {
                let operand = self.fetch(bus);
                let result = (operand >> 1) | (u8::from(self.p.is_set(C)) << 7);
                self.p.set(C, operand & 0x01 != 0);
                self.set_zn(result);
                self.write_back(bus, result);
                false
            }
            In::Bit => {
                let operand = self.fetch(bus);
                self.p.set(Z, self.a & operand == 0);
                self.p.set(N, operand & 0x80 != 0);
                self.p.set(V, operand & 0x40 != 0);
                false
            }
            In::Bcc => {
                self.branch(!self.p.is_set(C));
                false
            }
            In::Bcs => {
                self.branch(self.p.is_set(C));
                false
            }
            In::Beq => {
                self.branch(self.p.is_set(Z));
                false
            }
            In::Bne => {
                self.branch(!self.p.is_set(Z));
                false
            }
            In::Bmi => {
                self.branch(self.p.is_set(N));
                false
            }
            In::Bpl => {
                self.branch(!self.p.is_set(N));
                false
            }
            In::Bvc => {
                self.branch(!self.p.is_set(V));
                false
            }
            In::Bvs => {
                self.branch(self.p.is_set(V));
                false
            }
            In::Brk => {
                // BRK has a padding byte: the pushed return address skips it.
                self.pc = self.pc.wrapping_add(1);
                self.push_pc(bus);
                self.push_status(bus, true, false);
                self.p.set(I, true);
                self.pc = Self::read_vector(bus, IRQ_VECTOR);
                false
            }
            In::Clc => {
                self.p.set(C, false);
                false
            }
            In::Cld => {
                self.p.set(D, false);
                false
            }
            In::Cli => {
                self.p.set(I, false);
                false
            }
            In::Clv => {
                self.p.set(V, false);
                false
            }
            In::Sec => {
                self.p.set(C, true);
                false
            }
            In::Sed => {
                self.p.set(D, true);
                false
            }
            In::Sei => {
                self.p.set(I, true);
                false
            }
            In::Cmp => {
                self.compare(bus, self.a);
                true
            }
            In::Cpx => {
                self.compare(bus, self.x);
                false
            }
            In::Cpy => {
                self.compare(bus, self.y);
                false
            }
            In::Dec => {
                let result = self.fetch(bus).wrapping_sub(1);
                self.set_zn(result);
                bus.write(self.address, result);
                false
            }
            In::Inc => {
                let result = self.fetch(bus).wrapping_add(1);
                self.set_zn(result);
                bus.write(self.address, result);
                false
            }
            In::Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zn(self.x);
                false
            }
            In::Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zn(self.y);
                false
            }
            In::Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zn(self.x);
                false
            }
            In::Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zn(self.y);
                false
            }
            In::Jmp => {
                self.pc = self.address;
                false
            }
            In::Jsr => {
                // Pushes the address of the last byte of the JSR.
                self.pc = self.pc.wrapping_sub(1);
                self.push_pc(bus);
                self.pc = self.address;
                false
            }
            In::Rts => {
                self.pop_pc(bus);
                self.pc = self.pc.wrapping_add(1);
                false
            }
            In::Rti => {
                self.pop_status(bus);
                self.pop_pc(bus);
                false
            }
            In::Lda => {
                self.a = self.fetch(bus);
                self.set_zn(self.a);
                true
            }
            In::Ldx => {
                self.x = self.fetch(bus);
                self.set_zn(self.x);
                true
            }
            In::Ldy => {
                self.y = self.fetch(bus);
                self.set_zn(self.y);
                true
            }
            In::Sta => {
                bus.write(self.address, self.a);
                false
            }
            In::Stx => {
                bus.write(self.address, self.x);
                false
            }
            In::Sty => {
                bus.write(self.address, self.y);
                false
            }
            In::Pha => {
                let a = self.a;
                self.push(bus, a);
                false
            }
            In::Php => {
                self.push_status(bus, true, true);
                false
            }
            In::Pla => {
                self.a = self.pop(bus);
                self.set_zn(self.a);
                false
            }
            In::Plp => {
                self.pop_status(bus);
                false
            }
            In::Tax => {
                self.x = self.a;
                self.set_zn(self.x);
                false
            }
            In::Tay => {
                self.y = self.a;
                self.set_zn(self.y);
                false
            }
            In::Tsx => {
                self.x = self.s;
                self.set_zn(self.x);
                false
            }
            In::Txa => {
                self.a = self.x;
                self.set_zn(self.a);
                false
            }
            In::Txs => {
                self.s = self.x;
                false
            }
            In::Tya => {
                self.a = self.y;
                self.set_zn(self.a);
                false
            }
            In::Nop => false,
        }
    }
}

impl Default for Cpu6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu for Cpu6502 {
    fn tick<B2: Bus>(&mut self, bus: &mut B2) {
        if self.cycles == 0 {
            self.opcode = bus.read(self.pc);
            self.pc = self.pc.wrapping_add(1);
            let (instruction, mode) = decode(self.opcode);
            self.instruction = instruction;
            self.mode = mode;
            self.cycles = u32::from(CYCLE_COUNTS[self.opcode as usize]);

            let address_penalty = self.resolve_address(bus);
            let instruction_penalty = self.execute(bus);
            // The page-cross cycle is only charged when both the addressing
            // mode crossed and the instruction is one that re-reads on the
            // fixed-up address.
            if address_penalty && instruction_penalty {
                self.cycles += 1;
            }
        }

        self.cycles -= 1;
    }

    fn reset<B2: Bus>(&mut self, bus: &mut B2) {
        self.pc = Self::read_vector(bus, RESET_VECTOR);

        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.s = 0xFD;
        self.p = Status::new();

        self.opcode = 0;
        self.instruction = Instruction::Nop;
        self.mode = AddressingMode::Imp;
        self.address = 0;
        self.data = 0;

        // Power-on startup takes a fixed number of cycles.
        self.cycles = 8;
    }

    fn irq<B2: Bus>(&mut self, bus: &mut B2) {
        if !self.p.is_set(I) {
            self.push_pc(bus);
            self.push_status(bus, false, false);
            self.p.set(I, true);

            self.pc = Self::read_vector(bus, IRQ_VECTOR);
            self.cycles = 7;
        }
    }

    fn nmi<B2: Bus>(&mut self, bus: &mut B2) {
        self.push_pc(bus);
        self.push_status(bus, false, false);
        self.p.set(I, true);

        self.pc = Self::read_vector(bus, NMI_VECTOR);
        self.cycles = 8;
    }

    fn pc(&self) -> u16 {
        self.pc
    }
}
