//! 6502 disassembler.
//!
//! Decodes without touching CPU state: the caller supplies the memory
//! reader, typically a side-effect-free peek.

use crate::decode::{AddressingMode, decode};

/// One disassembled instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disassembly {
    /// Opcode plus 0-2 operand bytes.
    pub bytes: Vec<u8>,
    /// `MNE operand` text, e.g. `LDA #$42`.
    pub text: String,
}

impl Disassembly {
    /// Address of the next instruction given this one's address.
    #[must_use]
    pub fn next_address(&self, address: u16) -> u16 {
        address.wrapping_add(self.bytes.len() as u16)
    }
}

/// Disassemble the instruction at `address`.
pub fn disassemble(mut read: impl FnMut(u16) -> u8, address: u16) -> Disassembly {
    use AddressingMode as M;

    let opcode = read(address);
    let (instruction, mode) = decode(opcode);

    let operand_count = match mode {
        M::Abs | M::Abx | M::Aby | M::Ind => 2,
        M::Imm | M::Zpg | M::Zpx | M::Zpy | M::Izx | M::Izy | M::Rel => 1,
        M::Acc | M::Imp => 0,
    };

    let mut bytes = vec![opcode];
    for i in 0..operand_count {
        bytes.push(read(address.wrapping_add(1 + i)));
    }
    // Address of the instruction that follows — relative branches resolve
    // against it.
    let next = address.wrapping_add(1 + operand_count);

    let operand = match mode {
        M::Acc => "A".to_string(),
        M::Imp => String::new(),
        M::Abs => format!("${:02X}{:02X}", bytes[2], bytes[1]),
        M::Abx => format!("${:02X}{:02X},X", bytes[2], bytes[1]),
        M::Aby => format!("${:02X}{:02X},Y", bytes[2], bytes[1]),
        M::Imm => format!("#${:02X}", bytes[1]),
        M::Ind => format!("(${:02X}{:02X})", bytes[2], bytes[1]),
        M::Izx => format!("(${:02X},X)", bytes[1]),
        M::Izy => format!("(${:02X}),Y", bytes[1]),
        M::Rel => {
            let offset = i16::from(bytes[1] as i8);
            let target = next.wrapping_add(offset as u16);
            format!("${target:04X}")
        }
        M::Zpg => format!("${:02X}", bytes[1]),
        M::Zpx => format!("${:02X},X", bytes[1]),
        M::Zpy => format!("${:02X},Y", bytes[1]),
    };

    let text = if operand.is_empty() {
        instruction.mnemonic().to_string()
    } else {
        format!("{} {}", instruction.mnemonic(), operand)
    };

    Disassembly { bytes, text }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disasm(code: &[u8], address: u16) -> Disassembly {
        let code = code.to_vec();
        disassemble(
            move |addr| code[(addr.wrapping_sub(address)) as usize],
            address,
        )
    }

    #[test]
    fn immediate() {
        let d = disasm(&[0xA9, 0x42], 0x8000);
        assert_eq!(d.bytes, vec![0xA9, 0x42]);
        assert_eq!(d.text, "LDA #$42");
        assert_eq!(d.next_address(0x8000), 0x8002);
    }

    #[test]
    fn absolute_and_indexed() {
        assert_eq!(disasm(&[0xAD, 0x02, 0x20], 0x8000).text, "LDA $2002");
        assert_eq!(disasm(&[0xBD, 0x00, 0x30], 0x8000).text, "LDA $3000,X");
        assert_eq!(disasm(&[0xB9, 0xFF, 0x00], 0x8000).text, "LDA $00FF,Y");
    }

    #[test]
    fn indirect_modes() {
        assert_eq!(disasm(&[0x6C, 0xFF, 0x02], 0x8000).text, "JMP ($02FF)");
        assert_eq!(disasm(&[0xA1, 0x40], 0x8000).text, "LDA ($40,X)");
        assert_eq!(disasm(&[0xB1, 0x40], 0x8000).text, "LDA ($40),Y");
    }

    #[test]
    fn relative_branch_targets() {
        // BPL $FB: next = $8007, target = $8007 - 5 = $8002
        let d = disasm(&[0x10, 0xFB], 0x8005);
        assert_eq!(d.text, "BPL $8002");
        // Forward branch: BNE +$10 from $8000, next = $8002, target $8012
        let d = disasm(&[0xD0, 0x10], 0x8000);
        assert_eq!(d.text, "BNE $8012");
    }

    #[test]
    fn implied_and_accumulator() {
        assert_eq!(disasm(&[0xEA], 0x8000).text, "NOP");
        assert_eq!(disasm(&[0x0A], 0x8000).text, "ASL A");
        assert_eq!(disasm(&[0x0A], 0x8000).bytes.len(), 1);
    }

    #[test]
    fn does_not_read_past_operands() {
        // A reader that panics outside the instruction's bytes.
        let d = disassemble(
            |addr| match addr {
                0x8000 => 0xEA,
                _ => panic!("read past instruction"),
            },
            0x8000,
        );
        assert_eq!(d.bytes, vec![0xEA]);
    }
}
