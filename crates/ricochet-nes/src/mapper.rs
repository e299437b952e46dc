//! NES mapper implementations.
//!
//! Mappers are the cartridge-resident banking logic that remaps the fixed
//! CPU/PPU address windows onto larger physical ROM/RAM. The cartridge owns
//! the PRG/CHR arrays; mappers only translate addresses (or service the
//! access themselves, for cartridge-internal PRG RAM).
//!
//! The five supported boards are a closed set, dispatched through
//! [`Mapper`] — an enum, not a trait object, since no other variants can
//! exist at runtime.

use crate::cartridge::Mirroring;

/// Result of translating a CPU read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuRead {
    /// Address not claimed by the cartridge.
    None,
    /// Physical offset into PRG memory.
    Offset(usize),
    /// Serviced by mapper-internal RAM; this is the byte.
    Value(u8),
}

/// Result of translating a CPU write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuWrite {
    /// Address not claimed by the cartridge.
    None,
    /// Physical offset into PRG memory.
    Offset(usize),
    /// Consumed by the mapper (bank register or internal RAM).
    Handled,
}

/// CHR reads pass through untranslated on boards that do not bank CHR.
fn chr_identity_read(address: u16) -> Option<usize> {
    (address < 0x2000).then_some(usize::from(address))
}

/// CHR writes only land on boards whose CHR is RAM (bank count zero).
fn chr_ram_write(address: u16, chr_banks: u8) -> Option<usize> {
    (address < 0x2000 && chr_banks == 0).then_some(usize::from(address))
}

// ---------------------------------------------------------------------------
// Mapper 0: NROM
// ---------------------------------------------------------------------------

/// Mapper 0 (NROM): fixed mapping, no registers.
///
/// PRG is a 16 KiB window mirrored across $8000-$FFFF, or a straight
/// 32 KiB window when two banks are present.
#[derive(Debug)]
pub struct Nrom {
    prg_banks: u8,
    chr_banks: u8,
}

impl Nrom {
    #[must_use]
    pub fn new(prg_banks: u8, chr_banks: u8) -> Self {
        Self {
            prg_banks,
            chr_banks,
        }
    }

    fn prg_offset(&self, address: u16) -> Option<usize> {
        if address >= 0x8000 {
            let mask = if self.prg_banks > 1 { 0x7FFF } else { 0x3FFF };
            Some(usize::from(address & mask))
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Mapper 2: UxROM
// ---------------------------------------------------------------------------

/// Mapper 2 (UxROM): 16 KiB switchable PRG window at $8000-$BFFF, last
/// bank fixed at $C000-$FFFF. Any write at $8000+ selects the low window
/// from the low four bits.
#[derive(Debug)]
pub struct UxRom {
    prg_banks: u8,
    chr_banks: u8,
    prg_bank: u8,
}

impl UxRom {
    #[must_use]
    pub fn new(prg_banks: u8, chr_banks: u8) -> Self {
        Self {
            prg_banks,
            chr_banks,
            prg_bank: 0,
        }
    }

    fn reset(&mut self) {
        self.prg_bank = 0;
    }

    fn map_cpu_read(&self, address: u16) -> CpuRead {
        match address {
            0x8000..=0xBFFF => CpuRead::Offset(
                usize::from(self.prg_bank) * 0x4000 + usize::from(address & 0x3FFF),
            ),
            0xC000..=0xFFFF => CpuRead::Offset(
                usize::from(self.prg_banks - 1) * 0x4000 + usize::from(address & 0x3FFF),
            ),
            _ => CpuRead::None,
        }
    }

    fn map_cpu_write(&mut self, address: u16, value: u8) -> CpuWrite {
        if address >= 0x8000 {
            // UNROM uses bits 2-0, UOROM bits 3-0.
            self.prg_bank = value & 0b1111;
            CpuWrite::Handled
        } else {
            CpuWrite::None
        }
    }
}

// ---------------------------------------------------------------------------
// Mapper 3: CNROM
// ---------------------------------------------------------------------------

/// Mapper 3 (CNROM): fixed PRG, 8 KiB switchable CHR selected by the low
/// two bits of any write at $8000+ (caps CHR at 32 KiB).
#[derive(Debug)]
pub struct CnRom {
    prg_banks: u8,
    chr_banks: u8,
    chr_bank: u8,
}

impl CnRom {
    #[must_use]
    pub fn new(prg_banks: u8, chr_banks: u8) -> Self {
        Self {
            prg_banks,
            chr_banks,
            chr_bank: 0,
        }
    }

    fn reset(&mut self) {
        self.chr_bank = 0;
    }

    fn prg_offset(&self, address: u16) -> Option<usize> {
        if address >= 0x8000 {
            let mask = if self.prg_banks > 1 { 0x7FFF } else { 0x3FFF };
            Some(usize::from(address & mask))
        } else {
            None
        }
    }

    fn map_cpu_write(&mut self, address: u16, value: u8) -> CpuWrite {
        if address >= 0x8000 {
            // CNROM only wires the lowest two bits, capping CHR at 32 KiB.
            self.chr_bank = value & 0b11;
            CpuWrite::Handled
        } else {
            CpuWrite::None
        }
    }

    fn map_ppu_read(&self, address: u16) -> Option<usize> {
        (address < 0x2000)
            .then(|| usize::from(self.chr_bank) * 0x2000 + usize::from(address & 0x1FFF))
    }
}

// ---------------------------------------------------------------------------
// Mapper 1: MMC1
// ---------------------------------------------------------------------------

/// Mapper 1 (MMC1, SxROM): serial-loaded banking.
///
/// Writes at $8000+ shift bit 0 into a 5-bit load register, MSB-first
/// (right-shift-in at bit 4). The fifth write flushes to one of four
/// internal registers selected by address bits 13-14. A write with bit 7
/// set resets the load register and forces PRG mode 3 (fix last bank).
/// Carries 8 KiB of battery-backable PRG RAM at $6000-$7FFF.
#[derive(Debug)]
pub struct Mmc1 {
    prg_banks: u8,
    chr_banks: u8,
    prg_ram: [u8; 0x2000],

    load: u8,
    load_count: u8,

    /// 0: one-screen lower, 1: one-screen upper, 2: vertical, 3: horizontal.
    mirroring: u8,
    prg_mode: u8,
    chr_mode: u8,

    chr_bank_4k: [u8; 2],
    chr_bank_8k: u8,
    prg_bank_16k: [u8; 2],
    prg_bank_32k: u8,
}

impl Mmc1 {
    #[must_use]
    pub fn new(prg_banks: u8, chr_banks: u8) -> Self {
        let mut mapper = Self {
            prg_banks,
            chr_banks,
            prg_ram: [0; 0x2000],
            load: 0,
            load_count: 0,
            mirroring: 0,
            prg_mode: 0,
            chr_mode: 0,
            chr_bank_4k: [0; 2],
            chr_bank_8k: 0,
            prg_bank_16k: [0; 2],
            prg_bank_32k: 0,
        };
        mapper.reset();
        mapper
    }

    fn reset(&mut self) {
        self.prg_ram = [0; 0x2000];

        self.load = 0b1_0000;
        self.load_count = 0;

        self.mirroring = 0;
        self.prg_mode = 3;
        self.chr_mode = 1;

        self.chr_bank_4k = [0; 2];
        self.chr_bank_8k = 0;
        self.prg_bank_16k = [0, self.prg_banks - 1];
        self.prg_bank_32k = 0;
    }

    fn map_cpu_read(&self, address: u16) -> CpuRead {
        match address {
            0x6000..=0x7FFF => CpuRead::Value(self.prg_ram[usize::from(address & 0x1FFF)]),
            0x8000..=0xFFFF => {
                let offset = match self.prg_mode {
                    0 | 1 => {
                        usize::from(self.prg_bank_32k) * 0x8000 + usize::from(address & 0x7FFF)
                    }
                    _ => {
                        let bank = if address < 0xC000 {
                            self.prg_bank_16k[0]
                        } else {
                            self.prg_bank_16k[1]
                        };
                        usize::from(bank) * 0x4000 + usize::from(address & 0x3FFF)
                    }
                };
                CpuRead::Offset(offset)
            }
            _ => CpuRead::None,
        }
    }

    fn map_cpu_write(&mut self, address: u16, value: u8) -> CpuWrite {
        match address {
            0x6000..=0x7FFF => {
                self.prg_ram[usize::from(address & 0x1FFF)] = value;
                CpuWrite::Handled
            }
            0x8000..=0xFFFF => {
                self.write_register(address, value);
                CpuWrite::Handled
            }
            _ => CpuWrite::None,
        }
    }

    fn write_register(&mut self, address: u16, value: u8) {
        if value & 0x80 != 0 {
            // Reset the load register; PRG mode returns to 3.
            self.load = 0b1_0000;
            self.load_count = 0;
            self.prg_mode = 3;
            return;
        }

        // Shift bit 0 of the write in at the top of the 5-bit register.
        self.load = (self.load >> 1) | ((value & 1) << 4);
        self.load_count += 1;

        if self.load_count == 5 {
            let data = self.load;
            // Destination register from address bits 13-14.
            match (address >> 13) & 0b11 {
                0 => {
                    self.mirroring = data & 0b11;
                    self.prg_mode = (data >> 2) & 0b11;
                    self.chr_mode = (data >> 4) & 0b1;
                }
                1 => {
                    if self.chr_mode == 0 {
                        // 8 KiB mode ignores bit 0; the bank is in 4 KiB units.
                        self.chr_bank_8k = data & 0b1_1110;
                    } else {
                        self.chr_bank_4k[0] = data & 0b1_1111;
                    }
                }
                2 => {
                    if self.chr_mode != 0 {
                        self.chr_bank_4k[1] = data & 0b1_1111;
                    }
                }
                _ => match self.prg_mode {
                    0 | 1 => self.prg_bank_32k = (data & 0b0_1110) >> 1,
                    2 => {
                        self.prg_bank_16k[0] = 0;
                        self.prg_bank_16k[1] = data & 0b0_1111;
                    }
                    _ => {
                        self.prg_bank_16k[0] = data & 0b0_1111;
                        self.prg_bank_16k[1] = self.prg_banks - 1;
                    }
                },
            }

            self.load = 0b1_0000;
            self.load_count = 0;
        }
    }

    fn map_ppu_read(&self, address: u16) -> Option<usize> {
        if address >= 0x2000 {
            return None;
        }
        if self.chr_banks == 0 {
            return Some(usize::from(address));
        }
        if self.chr_mode == 0 {
            Some(usize::from(self.chr_bank_8k) * 0x1000 + usize::from(address & 0x1FFF))
        } else {
            let bank = if address < 0x1000 {
                self.chr_bank_4k[0]
            } else {
                self.chr_bank_4k[1]
            };
            Some(usize::from(bank) * 0x1000 + usize::from(address & 0x0FFF))
        }
    }

    fn mirroring(&self) -> Mirroring {
        match self.mirroring {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
    }
}

// ---------------------------------------------------------------------------
// Mapper 4: MMC3
// ---------------------------------------------------------------------------

/// Mapper 4 (MMC3, TxROM): eight bank-data registers, PRG/CHR mode bits,
/// and a scanline IRQ counter.
///
/// PRG mode swaps which of the four 8 KiB windows is switchable vs fixed
/// to the second-to-last bank; CHR mode (A12 inversion) swaps the
/// two-2 KiB / four-1 KiB layout halves. The IRQ counter reloads from its
/// latch when it is zero or a reload was requested, otherwise decrements
/// once per end-of-visible-scanline; it raises the IRQ line when it
/// reaches zero while enabled. Carries 8 KiB PRG RAM at $6000-$7FFF.
#[derive(Debug)]
pub struct Mmc3 {
    prg_banks: u8,
    prg_ram: [u8; 0x2000],

    bank_registers: [u8; 8],
    bank_select: u8,
    prg_mode: u8,
    chr_inversion: u8,
    prg_offsets: [usize; 4],
    chr_offsets: [usize; 8],

    /// 0: vertical, 1: horizontal.
    mirroring: u8,

    irq_latch: u8,
    irq_counter: u8,
    irq_enabled: bool,
    irq_pending: bool,
    irq_reload: bool,
}

impl Mmc3 {
    #[must_use]
    pub fn new(prg_banks: u8, _chr_banks: u8) -> Self {
        let mut mapper = Self {
            prg_banks,
            prg_ram: [0; 0x2000],
            bank_registers: [0; 8],
            bank_select: 0,
            prg_mode: 0,
            chr_inversion: 0,
            prg_offsets: [0; 4],
            chr_offsets: [0; 8],
            mirroring: 0,
            irq_latch: 0,
            irq_counter: 0,
            irq_enabled: false,
            irq_pending: false,
            irq_reload: false,
        };
        mapper.reset();
        mapper
    }

    /// Number of 8 KiB PRG banks.
    fn prg_8k_count(&self) -> usize {
        usize::from(self.prg_banks) * 2
    }

    fn reset(&mut self) {
        self.prg_ram = [0; 0x2000];

        self.bank_registers = [0; 8];
        self.bank_select = 0;
        self.prg_mode = 0;
        self.chr_inversion = 0;
        self.chr_offsets = [0; 8];

        self.mirroring = 0;

        self.irq_latch = 0;
        self.irq_counter = 0;
        self.irq_enabled = false;
        self.irq_pending = false;
        self.irq_reload = false;

        self.bank_registers[6] = 0;
        self.bank_registers[7] = 1;
        self.prg_offsets = [
            0,
            0x2000,
            (self.prg_8k_count() - 2) * 0x2000,
            (self.prg_8k_count() - 1) * 0x2000,
        ];
    }

    fn update_banks(&mut self) {
        let last = (self.prg_8k_count() - 1) * 0x2000;
        let second_last = (self.prg_8k_count() - 2) * 0x2000;
        let r6 = usize::from(self.bank_registers[6] & 0x3F) * 0x2000;
        let r7 = usize::from(self.bank_registers[7] & 0x3F) * 0x2000;

        self.prg_offsets = if self.prg_mode == 0 {
            [r6, r7, second_last, last]
        } else {
            [second_last, r7, r6, last]
        };

        let r = &self.bank_registers;
        let pair0 = usize::from(r[0] & 0xFE) * 0x0400;
        let pair1 = usize::from(r[1] & 0xFE) * 0x0400;
        let fine = [
            usize::from(r[2]) * 0x0400,
            usize::from(r[3]) * 0x0400,
            usize::from(r[4]) * 0x0400,
            usize::from(r[5]) * 0x0400,
        ];

        self.chr_offsets = if self.chr_inversion == 0 {
            [
                pair0,
                pair0 + 0x0400,
                pair1,
                pair1 + 0x0400,
                fine[0],
                fine[1],
                fine[2],
                fine[3],
            ]
        } else {
            [
                fine[0],
                fine[1],
                fine[2],
                fine[3],
                pair0,
                pair0 + 0x0400,
                pair1,
                pair1 + 0x0400,
            ]
        };
    }

    fn map_cpu_read(&self, address: u16) -> CpuRead {
        match address {
            0x6000..=0x7FFF => CpuRead::Value(self.prg_ram[usize::from(address & 0x1FFF)]),
            0x8000..=0xFFFF => CpuRead::Offset(
                self.prg_offsets[usize::from((address >> 13) & 0b11)]
                    + usize::from(address & 0x1FFF),
            ),
            _ => CpuRead::None,
        }
    }

    fn map_cpu_write(&mut self, address: u16, value: u8) -> CpuWrite {
        match address {
            0x6000..=0x7FFF => {
                self.prg_ram[usize::from(address & 0x1FFF)] = value;
                CpuWrite::Handled
            }
            0x8000..=0xFFFF => {
                match address & 0xE001 {
                    0x8000 => {
                        self.bank_select = value & 0b111;
                        self.prg_mode = (value >> 6) & 0b1;
                        self.chr_inversion = (value >> 7) & 0b1;
                    }
                    0x8001 => {
                        self.bank_registers[usize::from(self.bank_select)] = value;
                        self.update_banks();
                    }
                    0xA000 => self.mirroring = value & 0b1,
                    0xA001 => {
                        // PRG RAM protect: left permissive.
                    }
                    0xC000 => self.irq_latch = value,
                    0xC001 => {
                        self.irq_counter = 0;
                        self.irq_reload = true;
                    }
                    0xE000 => {
                        self.irq_enabled = false;
                        self.irq_pending = false;
                    }
                    _ => self.irq_enabled = true,
                }
                CpuWrite::Handled
            }
            _ => CpuWrite::None,
        }
    }

    fn map_ppu_read(&self, address: u16) -> Option<usize> {
        (address < 0x2000).then(|| {
            self.chr_offsets[usize::from((address >> 10) & 0b111)] + usize::from(address & 0x03FF)
        })
    }

    fn end_of_scanline(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }

        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    fn mirroring(&self) -> Mirroring {
        if self.mirroring == 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

/// The mapper family: a closed set of banking behaviors.
#[derive(Debug)]
pub enum Mapper {
    Nrom(Nrom),
    Mmc1(Mmc1),
    UxRom(UxRom),
    CnRom(CnRom),
    Mmc3(Mmc3),
}

impl Mapper {
    /// Build the mapper for an iNES mapper id. Unrecognized ids fall back
    /// to the fixed mapping — a compatibility choice, not an error.
    #[must_use]
    pub fn for_id(id: u8, prg_banks: u8, chr_banks: u8) -> Self {
        match id {
            1 => Self::Mmc1(Mmc1::new(prg_banks, chr_banks)),
            2 => Self::UxRom(UxRom::new(prg_banks, chr_banks)),
            3 => Self::CnRom(CnRom::new(prg_banks, chr_banks)),
            4 => Self::Mmc3(Mmc3::new(prg_banks, chr_banks)),
            _ => Self::Nrom(Nrom::new(prg_banks, chr_banks)),
        }
    }

    /// Restore power-on register state.
    pub fn reset(&mut self) {
        match self {
            Self::Nrom(_) => {}
            Self::Mmc1(m) => m.reset(),
            Self::UxRom(m) => m.reset(),
            Self::CnRom(m) => m.reset(),
            Self::Mmc3(m) => m.reset(),
        }
    }

    pub fn map_cpu_read(&self, address: u16) -> CpuRead {
        match self {
            Self::Nrom(m) => m
                .prg_offset(address)
                .map_or(CpuRead::None, CpuRead::Offset),
            Self::Mmc1(m) => m.map_cpu_read(address),
            Self::UxRom(m) => m.map_cpu_read(address),
            Self::CnRom(m) => m
                .prg_offset(address)
                .map_or(CpuRead::None, CpuRead::Offset),
            Self::Mmc3(m) => m.map_cpu_read(address),
        }
    }

    pub fn map_cpu_write(&mut self, address: u16, value: u8) -> CpuWrite {
        match self {
            Self::Nrom(m) => m
                .prg_offset(address)
                .map_or(CpuWrite::None, CpuWrite::Offset),
            Self::Mmc1(m) => m.map_cpu_write(address, value),
            Self::UxRom(m) => m.map_cpu_write(address, value),
            Self::CnRom(m) => m.map_cpu_write(address, value),
            Self::Mmc3(m) => m.map_cpu_write(address, value),
        }
    }

    pub fn map_ppu_read(&self, address: u16) -> Option<usize> {
        match self {
            Self::Nrom(_) => chr_identity_read(address),
            Self::Mmc1(m) => m.map_ppu_read(address),
            Self::UxRom(_) => chr_identity_read(address),
            Self::CnRom(m) => m.map_ppu_read(address),
            Self::Mmc3(m) => m.map_ppu_read(address),
        }
    }

    pub fn map_ppu_write(&self, address: u16) -> Option<usize> {
        match self {
            Self::Nrom(m) => chr_ram_write(address, m.chr_banks),
            Self::Mmc1(m) => chr_ram_write(address, m.chr_banks),
            Self::UxRom(m) => chr_ram_write(address, m.chr_banks),
            Self::CnRom(m) => chr_ram_write(address, m.chr_banks),
            // MMC3 boards ship CHR ROM; writes are dropped.
            Self::Mmc3(_) => None,
        }
    }

    /// Nametable-mirroring override, when this board controls it.
    #[must_use]
    pub fn mirroring(&self) -> Option<Mirroring> {
        match self {
            Self::Nrom(_) | Self::UxRom(_) | Self::CnRom(_) => None,
            Self::Mmc1(m) => Some(m.mirroring()),
            Self::Mmc3(m) => Some(m.mirroring()),
        }
    }

    /// Whether the mapper is asserting its IRQ line.
    #[must_use]
    pub fn irq_pending(&self) -> bool {
        match self {
            Self::Mmc3(m) => m.irq_enabled && m.irq_pending,
            _ => false,
        }
    }

    /// Acknowledge a delivered IRQ.
    pub fn clear_irq(&mut self) {
        if let Self::Mmc3(m) = self {
            m.irq_pending = false;
        }
    }

    /// End-of-visible-scanline notification from the PPU.
    pub fn end_of_scanline(&mut self) {
        if let Self::Mmc3(m) = self {
            m.end_of_scanline();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Shift a 5-bit value into an MMC1 register, LSB of the value first.
    fn mmc1_serial_write(mapper: &mut Mmc1, address: u16, value: u8) {
        for bit in 0..5 {
            mapper.write_register(address, (value >> bit) & 1);
        }
    }

    #[test]
    fn nrom_single_bank_mirrors_16k() {
        let m = Nrom::new(1, 1);
        assert_eq!(m.prg_offset(0x8000), Some(0x0000));
        assert_eq!(m.prg_offset(0xC000), Some(0x0000));
        assert_eq!(m.prg_offset(0xFFFF), Some(0x3FFF));
        assert_eq!(m.prg_offset(0x7FFF), None);
    }

    #[test]
    fn nrom_two_banks_map_32k() {
        let m = Nrom::new(2, 1);
        assert_eq!(m.prg_offset(0x8000), Some(0x0000));
        assert_eq!(m.prg_offset(0xC000), Some(0x4000));
        assert_eq!(m.prg_offset(0xFFFF), Some(0x7FFF));
    }

    #[test]
    fn unrecognized_id_falls_back_to_nrom() {
        let m = Mapper::for_id(7, 2, 1);
        assert!(matches!(m, Mapper::Nrom(_)));
        assert_eq!(m.map_cpu_read(0x8000), CpuRead::Offset(0));
    }

    #[test]
    fn uxrom_switches_low_window() {
        let mut m = UxRom::new(8, 0);
        assert_eq!(m.map_cpu_read(0x8000), CpuRead::Offset(0));
        // Last bank fixed at $C000.
        assert_eq!(m.map_cpu_read(0xC000), CpuRead::Offset(7 * 0x4000));

        m.map_cpu_write(0x8000, 0x03);
        assert_eq!(m.map_cpu_read(0x8000), CpuRead::Offset(3 * 0x4000));
        assert_eq!(m.map_cpu_read(0xC000), CpuRead::Offset(7 * 0x4000));

        // Only the low four bits select.
        m.map_cpu_write(0x8000, 0xF5);
        assert_eq!(m.map_cpu_read(0x8000), CpuRead::Offset(5 * 0x4000));
    }

    #[test]
    fn cnrom_switches_chr() {
        let mut m = Mapper::for_id(3, 2, 4);
        assert_eq!(m.map_ppu_read(0x0000), Some(0));
        m.map_cpu_write(0x8000, 0x02);
        assert_eq!(m.map_ppu_read(0x0000), Some(2 * 0x2000));
        assert_eq!(m.map_ppu_read(0x1FFF), Some(2 * 0x2000 + 0x1FFF));
        // Only two bits of the select are wired.
        m.map_cpu_write(0x8000, 0x07);
        assert_eq!(m.map_ppu_read(0x0000), Some(3 * 0x2000));
        // CHR ROM: no writes.
        assert_eq!(m.map_ppu_write(0x0000), None);
    }

    #[test]
    fn mmc1_serial_load_populates_control() {
        let mut m = Mmc1::new(8, 2);
        // Shift in 1,0,1,0,1 → %10101: mirroring 1, PRG mode 1, CHR mode 1.
        mmc1_serial_write(&mut m, 0x8000, 0b10101);
        assert_eq!(m.mirroring, 0b01);
        assert_eq!(m.prg_mode, 1);
        assert_eq!(m.chr_mode, 1);
        // The load register is ready for a fresh sequence.
        assert_eq!(m.load_count, 0);
        assert_eq!(m.load, 0b1_0000);
    }

    #[test]
    fn mmc1_bit7_write_resets_prg_mode() {
        let mut m = Mmc1::new(8, 2);
        mmc1_serial_write(&mut m, 0x8000, 0b00000); // PRG mode 0 (32 KiB)
        assert_eq!(m.prg_mode, 0);

        // Partial sequence, then a reset write.
        m.write_register(0x8000, 1);
        m.write_register(0x8000, 1);
        m.write_register(0x8000, 0x80);

        assert_eq!(m.prg_mode, 3, "reset forces 16 KiB fix-last mode");
        assert_eq!(m.load_count, 0);
        // Mode 3 maps the last bank at $C000 again.
        assert_eq!(
            m.map_cpu_read(0xC000),
            CpuRead::Offset(7 * 0x4000),
            "fix-last window after reset"
        );
    }

    #[test]
    fn mmc1_prg_bank_modes() {
        let mut m = Mmc1::new(8, 2);
        // Power-on: mode 3, bank 0 low, last bank high.
        assert_eq!(m.map_cpu_read(0x8000), CpuRead::Offset(0));
        assert_eq!(m.map_cpu_read(0xC000), CpuRead::Offset(7 * 0x4000));

        // Select PRG bank 5 in mode 3.
        mmc1_serial_write(&mut m, 0xE000, 5);
        assert_eq!(m.map_cpu_read(0x8000), CpuRead::Offset(5 * 0x4000));
        assert_eq!(m.map_cpu_read(0xC000), CpuRead::Offset(7 * 0x4000));

        // Mode 2 fixes the first bank low and switches the high window.
        mmc1_serial_write(&mut m, 0x8000, 0b01000);
        mmc1_serial_write(&mut m, 0xE000, 6);
        assert_eq!(m.map_cpu_read(0x8000), CpuRead::Offset(0));
        assert_eq!(m.map_cpu_read(0xC000), CpuRead::Offset(6 * 0x4000));

        // 32 KiB mode: bit 0 of the bank value is ignored.
        mmc1_serial_write(&mut m, 0x8000, 0b00000);
        mmc1_serial_write(&mut m, 0xE000, 0b00011);
        assert_eq!(m.map_cpu_read(0x8000), CpuRead::Offset(1 * 0x8000));
        assert_eq!(m.map_cpu_read(0xFFFF), CpuRead::Offset(1 * 0x8000 + 0x7FFF));
    }

    #[test]
    fn mmc1_chr_banking() {
        let mut m = Mmc1::new(2, 4);
        // Power-on CHR mode is 4 KiB.
        mmc1_serial_write(&mut m, 0xA000, 3);
        mmc1_serial_write(&mut m, 0xC000, 5);
        assert_eq!(m.map_ppu_read(0x0000), Some(3 * 0x1000));
        assert_eq!(m.map_ppu_read(0x1000), Some(5 * 0x1000));

        // 8 KiB mode: bank value in 4 KiB units, bit 0 ignored.
        mmc1_serial_write(&mut m, 0x8000, 0b00011); // CHR mode 0
        mmc1_serial_write(&mut m, 0xA000, 0b00111);
        assert_eq!(m.map_ppu_read(0x0000), Some(6 * 0x1000));
        assert_eq!(m.map_ppu_read(0x1FFF), Some(6 * 0x1000 + 0x1FFF));
    }

    #[test]
    fn mmc1_prg_ram_is_internal() {
        let mut m = Mmc1::new(2, 0);
        assert_eq!(m.map_cpu_write(0x6000, 0xAB), CpuWrite::Handled);
        assert_eq!(m.map_cpu_write(0x7FFF, 0xCD), CpuWrite::Handled);
        assert_eq!(m.map_cpu_read(0x6000), CpuRead::Value(0xAB));
        assert_eq!(m.map_cpu_read(0x7FFF), CpuRead::Value(0xCD));
    }

    #[test]
    fn mmc3_power_on_prg_layout() {
        let m = Mmc3::new(8, 8); // 16 x 8 KiB PRG banks
        assert_eq!(m.map_cpu_read(0x8000), CpuRead::Offset(0));
        assert_eq!(m.map_cpu_read(0xA000), CpuRead::Offset(0x2000));
        assert_eq!(m.map_cpu_read(0xC000), CpuRead::Offset(14 * 0x2000));
        assert_eq!(m.map_cpu_read(0xE000), CpuRead::Offset(15 * 0x2000));
    }

    #[test]
    fn mmc3_prg_mode_swaps_windows() {
        let mut m = Mmc3::new(8, 8);
        // R6 = 4, mode 0: switchable at $8000.
        m.map_cpu_write(0x8000, 6);
        m.map_cpu_write(0x8001, 4);
        assert_eq!(m.map_cpu_read(0x8000), CpuRead::Offset(4 * 0x2000));
        assert_eq!(m.map_cpu_read(0xC000), CpuRead::Offset(14 * 0x2000));

        // Mode 1: R6 moves to $C000, second-to-last to $8000.
        m.map_cpu_write(0x8000, 0x40 | 6);
        m.map_cpu_write(0x8001, 4);
        assert_eq!(m.map_cpu_read(0x8000), CpuRead::Offset(14 * 0x2000));
        assert_eq!(m.map_cpu_read(0xC000), CpuRead::Offset(4 * 0x2000));
        // Last bank never moves.
        assert_eq!(m.map_cpu_read(0xE000), CpuRead::Offset(15 * 0x2000));
    }

    #[test]
    fn mmc3_chr_inversion() {
        let mut m = Mmc3::new(8, 8);
        // R0 = 4 (2 KiB pair), R2 = 9 (1 KiB).
        m.map_cpu_write(0x8000, 0);
        m.map_cpu_write(0x8001, 4);
        m.map_cpu_write(0x8000, 2);
        m.map_cpu_write(0x8001, 9);

        // Normal layout: pair at $0000, fine banks at $1000.
        assert_eq!(m.map_ppu_read(0x0000), Some(4 * 0x0400));
        assert_eq!(m.map_ppu_read(0x0400), Some(5 * 0x0400));
        assert_eq!(m.map_ppu_read(0x1000), Some(9 * 0x0400));

        // Inverted layout swaps the halves.
        m.map_cpu_write(0x8000, 0x80);
        assert_eq!(m.map_ppu_read(0x0000), Some(9 * 0x0400));
        assert_eq!(m.map_ppu_read(0x1000), Some(4 * 0x0400));
    }

    #[test]
    fn mmc3_scanline_irq_counts_down() {
        let mut m = Mmc3::new(8, 8);
        m.map_cpu_write(0xC000, 3); // latch
        m.map_cpu_write(0xC001, 0); // request reload
        m.map_cpu_write(0xE001, 0); // enable

        let mut mapper = Mapper::Mmc3(m);
        // Scanline 1: reload to 3. Scanlines 2-4: 2, 1, 0 → pending.
        for _ in 0..3 {
            mapper.end_of_scanline();
            assert!(!mapper.irq_pending());
        }
        mapper.end_of_scanline();
        assert!(mapper.irq_pending());

        mapper.clear_irq();
        assert!(!mapper.irq_pending());
    }

    #[test]
    fn mmc3_irq_disable_acknowledges() {
        let mut m = Mmc3::new(8, 8);
        m.map_cpu_write(0xC000, 0);
        m.map_cpu_write(0xC001, 0);
        m.map_cpu_write(0xE001, 0);
        m.end_of_scanline();
        assert!(m.irq_enabled && m.irq_pending);

        m.map_cpu_write(0xE000, 0);
        assert!(!m.irq_pending);
        assert!(!m.irq_enabled);
    }

    #[test]
    fn mmc3_mirroring_register() {
        let mut m = Mmc3::new(8, 8);
        assert_eq!(m.mirroring(), Mirroring::Vertical);
        m.map_cpu_write(0xA000, 1);
        assert_eq!(m.mirroring(), Mirroring::Horizontal);
    }
}
