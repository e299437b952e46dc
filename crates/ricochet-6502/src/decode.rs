//! Opcode decoding.
//!
//! The 6502 opcode byte splits into three bit fields `aaabbbcc` that select
//! the operation and addressing mode almost regularly; the handful of
//! irregular opcodes (BRK, JSR, RTI, RTS, indirect JMP) are patched in
//! afterwards. See <https://www.masswerk.at/6502/6502_instruction_set.html#layout>.
//!
//! The decomposition is evaluated once at compile time into [`DECODE`], a
//! total function over the opcode byte. Undocumented opcodes come out as
//! NOP/implied.

/// The 56 documented 6502 instructions.
#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi,
    Bne, Bpl, Brk, Bvc, Bvs, Clc, Cld, Cli,
    Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor,
    Inc, Inx, Iny, Jmp, Jsr, Lda, Ldx, Ldy,
    Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol,
    Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta,
    Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
}

impl Instruction {
    /// Assembler mnemonic.
    #[rustfmt::skip]
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Adc => "ADC", Self::And => "AND", Self::Asl => "ASL", Self::Bcc => "BCC",
            Self::Bcs => "BCS", Self::Beq => "BEQ", Self::Bit => "BIT", Self::Bmi => "BMI",
            Self::Bne => "BNE", Self::Bpl => "BPL", Self::Brk => "BRK", Self::Bvc => "BVC",
            Self::Bvs => "BVS", Self::Clc => "CLC", Self::Cld => "CLD", Self::Cli => "CLI",
            Self::Clv => "CLV", Self::Cmp => "CMP", Self::Cpx => "CPX", Self::Cpy => "CPY",
            Self::Dec => "DEC", Self::Dex => "DEX", Self::Dey => "DEY", Self::Eor => "EOR",
            Self::Inc => "INC", Self::Inx => "INX", Self::Iny => "INY", Self::Jmp => "JMP",
            Self::Jsr => "JSR", Self::Lda => "LDA", Self::Ldx => "LDX", Self::Ldy => "LDY",
            Self::Lsr => "LSR", Self::Nop => "NOP", Self::Ora => "ORA", Self::Pha => "PHA",
            Self::Php => "PHP", Self::Pla => "PLA", Self::Plp => "PLP", Self::Rol => "ROL",
            Self::Ror => "ROR", Self::Rti => "RTI", Self::Rts => "RTS", Self::Sbc => "SBC",
            Self::Sec => "SEC", Self::Sed => "SED", Self::Sei => "SEI", Self::Sta => "STA",
            Self::Stx => "STX", Self::Sty => "STY", Self::Tax => "TAX", Self::Tay => "TAY",
            Self::Tsx => "TSX", Self::Txa => "TXA", Self::Txs => "TXS", Self::Tya => "TYA",
        }
    }
}

/// The 13 addressing modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// Accumulator.
    Acc,
    /// Absolute.
    Abs,
    /// Absolute, X-indexed.
    Abx,
    /// Absolute, Y-indexed.
    Aby,
    /// Immediate.
    Imm,
    /// Implied.
    Imp,
    /// Indirect (JMP only, with the page-wrap bug).
    Ind,
    /// X-indexed zero-page indirect.
    Izx,
    /// Zero-page indirect, Y-indexed.
    Izy,
    /// Relative (branches).
    Rel,
    /// Zero page.
    Zpg,
    /// Zero page, X-indexed.
    Zpx,
    /// Zero page, Y-indexed.
    Zpy,
}

/// Base cycle count per opcode. Penalty cycles (page crossing, taken
/// branches) are added at execution time.
pub const CYCLE_COUNTS: [u8; 256] = [
    7, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 4, 4, 6, 6, // 0x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 1x
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 4, 4, 6, 6, // 2x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 3x
    6, 6, 2, 8, 3, 3, 5, 5, 3, 2, 2, 2, 3, 4, 6, 6, // 4x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 5x
    6, 6, 2, 8, 3, 3, 5, 5, 4, 2, 2, 2, 5, 4, 6, 6, // 6x
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // 7x
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // 8x
    2, 6, 2, 6, 4, 4, 4, 4, 2, 5, 2, 5, 5, 5, 5, 5, // 9x
    2, 6, 2, 6, 3, 3, 3, 3, 2, 2, 2, 2, 4, 4, 4, 4, // Ax
    2, 5, 2, 5, 4, 4, 4, 4, 2, 4, 2, 4, 4, 4, 4, 4, // Bx
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // Cx
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // Dx
    2, 6, 2, 8, 3, 3, 5, 5, 2, 2, 2, 2, 4, 4, 6, 6, // Ex
    2, 5, 2, 8, 4, 4, 6, 6, 2, 4, 2, 7, 4, 4, 7, 7, // Fx
];

const fn decode_opcode(opcode: u8) -> (Instruction, AddressingMode) {
    use AddressingMode as M;
    use Instruction as I;

    let a = (opcode >> 5) & 0b111;
    let b = (opcode >> 2) & 0b111;
    let c = opcode & 0b11;

    let mut instruction = I::Nop;
    let mut mode = M::Imp;

    match c {
        0b01 => {
            instruction = match a {
                0 => I::Ora,
                1 => I::And,
                2 => I::Eor,
                3 => I::Adc,
                4 => I::Sta,
                5 => I::Lda,
                6 => I::Cmp,
                _ => I::Sbc,
            };
            mode = match b {
                0 => M::Izx,
                1 => M::Zpg,
                2 => M::Imm,
                3 => M::Abs,
                4 => M::Izy,
                5 => M::Zpx,
                6 => M::Aby,
                _ => M::Abx,
            };
        }
        0b10 => {
            instruction = match a {
                0 => I::Asl,
                1 => I::Rol,
                2 => I::Lsr,
                3 => I::Ror,
                4 => match b {
                    2 => I::Txa,
                    6 => I::Txs,
                    _ => I::Stx,
                },
                5 => match b {
                    2 => I::Tax,
                    6 => I::Tsx,
                    _ => I::Ldx,
                },
                6 => match b {
                    2 => I::Dex,
                    _ => I::Dec,
                },
                _ => match b {
                    2 => I::Nop,
                    _ => I::Inc,
                },
            };
            mode = match b {
                0 => M::Imm,
                1 => M::Zpg,
                2 => M::Acc,
                3 => M::Abs,
                4 | 6 => M::Imp,
                5 => {
                    if a == 4 || a == 5 {
                        M::Zpy
                    } else {
                        M::Zpx
                    }
                }
                _ => {
                    if a == 5 {
                        M::Aby
                    } else {
                        M::Abx
                    }
                }
            };
        }
        0b00 => {
            mode = match b {
                0 => M::Imm,
                1 => M::Zpg,
                2 | 6 => M::Imp,
                3 => M::Abs,
                4 => M::Rel,
                5 => M::Zpx,
                _ => M::Abx,
            };
            instruction = match b {
                0 | 1 | 3 | 5 | 7 => match a {
                    0 => I::Nop,
                    1 => I::Bit,
                    2 | 3 => I::Jmp,
                    4 => I::Sty,
                    5 => I::Ldy,
                    6 => I::Cpy,
                    _ => I::Cpx,
                },
                2 => match a {
                    0 => I::Php,
                    1 => I::Plp,
                    2 => I::Pha,
                    3 => I::Pla,
                    4 => I::Dey,
                    5 => I::Tay,
                    6 => I::Iny,
                    _ => I::Inx,
                },
                4 => match a {
                    0 => I::Bpl,
                    1 => I::Bmi,
                    2 => I::Bvc,
                    3 => I::Bvs,
                    4 => I::Bcc,
                    5 => I::Bcs,
                    6 => I::Bne,
                    _ => I::Beq,
                },
                _ => match a {
                    0 => I::Clc,
                    1 => I::Sec,
                    2 => I::Cli,
                    3 => I::Sei,
                    4 => I::Tya,
                    5 => I::Clv,
                    6 => I::Cld,
                    _ => I::Sed,
                },
            };
            // Irregular column-0 opcodes and the indirect JMP.
            match (a, b) {
                (0, 0) => {
                    instruction = I::Brk;
                    mode = M::Imp;
                }
                (1, 0) => {
                    instruction = I::Jsr;
                    mode = M::Abs;
                }
                (2, 0) => {
                    instruction = I::Rti;
                    mode = M::Imp;
                }
                (3, 0) => {
                    instruction = I::Rts;
                    mode = M::Imp;
                }
                (3, 3) => mode = M::Ind,
                _ => {}
            }
        }
        _ => {}
    }

    (instruction, mode)
}

const fn build_decode_table() -> [(Instruction, AddressingMode); 256] {
    let mut table = [(Instruction::Nop, AddressingMode::Imp); 256];
    let mut opcode = 0;
    while opcode < 256 {
        table[opcode] = decode_opcode(opcode as u8);
        opcode += 1;
    }
    table
}

/// Opcode → (instruction, addressing mode), total over the whole byte.
pub static DECODE: [(Instruction, AddressingMode); 256] = build_decode_table();

/// Decode one opcode byte.
#[must_use]
pub fn decode(opcode: u8) -> (Instruction, AddressingMode) {
    DECODE[opcode as usize]
}
